pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod orders;
pub mod razorpay;
pub mod store;
pub mod users;
pub mod utils;

use std::sync::Arc;
use std::time::Instant;

use axum::{routing::get, Router};

use crate::gateway::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub cors_allowed_origin: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, cors_allowed_origin: Option<String>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            cors_allowed_origin: cors_allowed_origin.unwrap_or_else(|| "*".to_string()),
            start_time: Instant::now(),
        }
    }
}

pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .fallback(handlers::gateway_entry)
        .layer(axum::middleware::from_fn(
            middleware::request_logger::request_logger_middleware,
        ))
        .with_state(app_state)
}
