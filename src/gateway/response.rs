//! Response envelope and serialization.
//!
//! Every response, success or failure, carries the same fixed header set so
//! callers can treat error handling uniformly.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bigdecimal::{BigDecimal, ToPrimitive};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::store::{AttrValue, Item};

pub const ALLOWED_METHODS: &str = "GET,POST,OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type,X-Tenant-Id,Authorization";

/// Transport-level response: status plus JSON body. Rendering attaches the
/// CORS header set with the configured origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn from_error(err: &AppError) -> Self {
        Self {
            status: err.status_code(),
            body: err.body(),
        }
    }

    pub fn render(self, allowed_origin: &str) -> Response {
        let mut response = (self.status, self.body.to_string()).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            header::HeaderValue::from_str(allowed_origin)
                .unwrap_or_else(|_| header::HeaderValue::from_static("*")),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            header::HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            header::HeaderValue::from_static(ALLOWED_HEADERS),
        );
        response
    }
}

/// Display conversion for exact decimals: integers when there is no
/// fractional part, floating point otherwise. One-way only; stored values
/// never pass back through this.
pub fn decimal_to_json(n: &BigDecimal) -> Value {
    let normalized = n.normalized();
    let (_, exponent) = normalized.as_bigint_and_exponent();
    if exponent <= 0 {
        if let Some(i) = normalized.to_i64() {
            return Value::from(i);
        }
    }
    let text = normalized.to_string();
    serde_json::from_str::<serde_json::Number>(&text)
        .map(Value::Number)
        .unwrap_or(Value::String(text))
}

pub fn item_to_json(item: &Item) -> Value {
    let mut map = Map::new();
    for (name, value) in item {
        let json = match value {
            AttrValue::S(s) => Value::String(s.clone()),
            AttrValue::N(n) => decimal_to_json(n),
            AttrValue::Bool(b) => Value::Bool(*b),
        };
        map.insert(name.clone(), json);
    }
    Value::Object(map)
}

pub fn items_to_json(items: &[Item]) -> Value {
    Value::Array(items.iter().map(item_to_json).collect())
}
