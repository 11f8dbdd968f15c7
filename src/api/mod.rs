//! HTTP surface of the service
//!
//! All measurement routes live under `/api/v1`. The root and health routes
//! never touch the network.

pub mod error;
pub mod handlers;

pub use error::ApiError;

use crate::{
    logging::{ErrorEventLogger, Logger},
    service::SpeedTestService,
    types::TestMode,
};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub const API_PREFIX: &str = "/api/v1";

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn SpeedTestService>,
    pub logger: Logger,
    pub error_logger: ErrorEventLogger,
}

impl AppState {
    pub fn new(service: Arc<dyn SpeedTestService>, logger: Logger, error_logger: ErrorEventLogger) -> Self {
        Self {
            service,
            logger,
            error_logger,
        }
    }
}

/// Build the application router with permissive CORS
pub fn router(state: AppState) -> Router {
    let speed_test = Router::new()
        .route(TestMode::Full.path(), get(handlers::full_test))
        .route(TestMode::Quick.path(), get(handlers::quick_test))
        .route(TestMode::DownloadOnly.path(), get(handlers::download_test))
        .route(TestMode::UploadOnly.path(), get(handlers::upload_test))
        .route(TestMode::LatencyOnly.path(), get(handlers::latency_test));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest(API_PREFIX, speed_test)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
