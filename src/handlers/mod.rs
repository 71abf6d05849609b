//! Axum entry points. The gateway fallback converts live HTTP requests into
//! the REST-style envelope and hands them to the dispatcher, so routing and
//! response shaping live in one place for every envelope source.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::gateway::{ApiResponse, GatewayEvent};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub uptime_seconds: u64,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthStatus {
        status: "ok",
        service: "lotus-core",
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Catch-all handler: every non-health request flows through here.
pub async fn gateway_entry(State(state): State<AppState>, req: Request<Body>) -> Response {
    let (parts, body) = req.into_parts();

    let bytes = match hyper::body::to_bytes(body).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let error = AppError::BadRequest(format!("failed to read request body: {err}"));
            return ApiResponse::from_error(&error).render(&state.cors_allowed_origin);
        }
    };

    let mut headers = HashMap::new();
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            headers.insert(name.as_str().to_string(), value.to_string());
        }
    }

    let event = GatewayEvent {
        http_method: Some(parts.method.to_string()),
        path: Some(parts.uri.path().to_string()),
        raw_path: None,
        headers: Some(headers),
        path_parameters: None,
        query_string_parameters: parts.uri.query().map(crate::gateway::event::parse_query),
        request_context: None,
        body: if bytes.is_empty() {
            None
        } else {
            Some(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        },
    };

    state
        .dispatcher
        .dispatch(event)
        .await
        .render(&state.cors_allowed_origin)
}
