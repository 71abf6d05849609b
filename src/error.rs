use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::store::StoreError;

/// Application error taxonomy. Every variant maps to a status code and a
/// JSON body; the gateway formatter wraps both into the response envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("missing required header X-Tenant-Id")]
    MissingTenantHeader,
    #[error("invalid JSON in request body: {0}")]
    InvalidJson(String),
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("invalid status value: {0}")]
    InvalidStatus(String),
    #[error("invalid amount value")]
    InvalidAmount,
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("course not found")]
    CourseNotFound,
    #[error("user mapping not found for {0}")]
    UserMappingNotFound(String),
    #[error("no route matches the request")]
    UnknownRoute,
    #[error("failed to store transaction: {0}")]
    TransactionStoreFailed(String),
    #[error("failed to create order: {0}")]
    OrderCreationFailed(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingTenantHeader
            | AppError::InvalidJson(_)
            | AppError::MissingFields(_)
            | AppError::InvalidStatus(_)
            | AppError::InvalidAmount
            | AppError::MissingParameter(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::CourseNotFound
            | AppError::UserMappingNotFound(_)
            | AppError::UnknownRoute => StatusCode::NOT_FOUND,
            AppError::TransactionStoreFailed(_)
            | AppError::OrderCreationFailed(_)
            | AppError::Store(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error body. Shapes match what callers of the HTTP
    /// surface already depend on, so they stay stable across variants.
    pub fn body(&self) -> Value {
        match self {
            AppError::MissingTenantHeader => json!({
                "error": "Missing required header",
                "details": "X-Tenant-Id header is required",
            }),
            AppError::InvalidJson(details) => json!({
                "error": "Invalid JSON format",
                "details": details,
            }),
            AppError::MissingFields(fields) => json!({
                "error": "Missing required fields",
                "missing_fields": fields,
            }),
            AppError::InvalidStatus(_) => json!({
                "error": "Invalid status value",
                "details": "Status must be either 'success' or 'failed'",
            }),
            AppError::InvalidAmount => json!({
                "error": "Invalid amount value",
                "details": "Amount must be a valid number",
            }),
            AppError::MissingParameter(name) => json!({
                "error": format!("Missing required parameter: {name}"),
            }),
            AppError::BadRequest(message) => json!({ "error": message }),
            AppError::CourseNotFound => json!({ "error": "Course not found" }),
            AppError::UserMappingNotFound(user_id) => json!({
                "error": "User mapping not found",
                "user_id": user_id,
            }),
            AppError::UnknownRoute => json!({ "error": "Not found" }),
            AppError::TransactionStoreFailed(details) => json!({
                "error": "Failed to store transaction",
                "details": details,
            }),
            AppError::OrderCreationFailed(details) => json!({
                "error": "Failed to create order",
                "details": details,
            }),
            AppError::Store(err) => json!({
                "error": "Internal server error",
                "details": err.to_string(),
            }),
            AppError::Internal(details) => json!({
                "error": "Internal server error",
                "details": details,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        assert_eq!(
            AppError::MissingTenantHeader.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MissingFields(vec!["status".into()]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidStatus("pending".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn missing_fields_body_lists_every_field() {
        let err = AppError::MissingFields(vec![
            "razorpay_payment_id".to_string(),
            "status".to_string(),
        ]);
        let body = err.body();
        assert_eq!(body["error"], "Missing required fields");
        assert_eq!(
            body["missing_fields"],
            json!(["razorpay_payment_id", "status"])
        );
    }

    #[test]
    fn store_errors_surface_diagnostics() {
        let err = AppError::TransactionStoreFailed("connection reset".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body()["details"], "connection reset");
    }
}
