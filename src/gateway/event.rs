//! Inbound request envelopes and their normalization.
//!
//! Deployments deliver requests in two shapes: REST-style
//! (`httpMethod` / `path` / `pathParameters`) and HTTP-API-style
//! (`requestContext.http.method` / `rawPath`). Neither shape can be assumed,
//! so every field is optional and normalization checks both.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;

/// Raw inbound request envelope.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayEvent {
    #[serde(rename = "httpMethod")]
    pub http_method: Option<String>,
    pub path: Option<String>,
    #[serde(rename = "rawPath")]
    pub raw_path: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    #[serde(rename = "pathParameters")]
    pub path_parameters: Option<HashMap<String, String>>,
    #[serde(rename = "queryStringParameters")]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(rename = "requestContext")]
    pub request_context: Option<RequestContext>,
    pub body: Option<Value>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    pub http: Option<HttpDescriptor>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct HttpDescriptor {
    pub method: Option<String>,
}

/// Envelope-independent view of a request. Everything downstream of the
/// normalizer works on this record only.
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    pub method: String,
    pub path: String,
    pub tenant_id: Option<String>,
    pub path_params: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    pub body: Value,
}

/// Produces the normalized record. Side-effect free; the only failure mode
/// is a string body that is not valid JSON.
pub fn normalize(event: GatewayEvent) -> Result<NormalizedRequest, AppError> {
    let method = event
        .http_method
        .or_else(|| {
            event
                .request_context
                .and_then(|ctx| ctx.http)
                .and_then(|http| http.method)
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "GET".to_string())
        .to_ascii_uppercase();

    let raw = event
        .path
        .or(event.raw_path)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "/".to_string());
    let (path, raw_query) = split_query(&raw);

    let tenant_id = event.headers.as_ref().and_then(tenant_header);

    let query_params = event
        .query_string_parameters
        .unwrap_or_else(|| raw_query.map(parse_query).unwrap_or_default());

    let body = match event.body {
        Some(Value::String(raw)) => {
            serde_json::from_str(&raw).map_err(|e| AppError::InvalidJson(e.to_string()))?
        }
        Some(parsed) => parsed,
        None => Value::Object(Default::default()),
    };

    Ok(NormalizedRequest {
        method,
        path: path.to_string(),
        tenant_id,
        path_params: event.path_parameters.unwrap_or_default(),
        query_params,
        body,
    })
}

/// Header maps arrive with either casing depending on the envelope shape.
fn tenant_header(headers: &HashMap<String, String>) -> Option<String> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("x-tenant-id"))
        .map(|(_, value)| value.clone())
        .filter(|value| !value.trim().is_empty())
}

fn split_query(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw, None),
    }
}

pub(crate) fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}
