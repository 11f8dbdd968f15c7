//! Route handlers

use super::{ApiError, AppState};
use crate::{
    error::Result,
    models::{DownloadResult, HealthStatus, LatencyResult, MeasurementResult, ServiceInfo, UploadResult},
    stats::duration_ms,
    types::TestMode,
};
use axum::{debug_handler, extract::State, Json};
use std::future::Future;
use std::time::Instant;
use uuid::Uuid;

#[debug_handler]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

#[debug_handler]
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::healthy())
}

#[debug_handler]
pub async fn full_test(State(state): State<AppState>) -> std::result::Result<Json<MeasurementResult>, ApiError> {
    let id = Uuid::new_v4().to_string();
    run(&state, TestMode::Full, &id, state.service.full_test(&id)).await
}

#[debug_handler]
pub async fn quick_test(State(state): State<AppState>) -> std::result::Result<Json<MeasurementResult>, ApiError> {
    let id = Uuid::new_v4().to_string();
    run(&state, TestMode::Quick, &id, state.service.quick_test(&id)).await
}

#[debug_handler]
pub async fn download_test(State(state): State<AppState>) -> std::result::Result<Json<DownloadResult>, ApiError> {
    let id = Uuid::new_v4().to_string();
    run(&state, TestMode::DownloadOnly, &id, state.service.download_only(&id)).await
}

#[debug_handler]
pub async fn upload_test(State(state): State<AppState>) -> std::result::Result<Json<UploadResult>, ApiError> {
    let id = Uuid::new_v4().to_string();
    run(&state, TestMode::UploadOnly, &id, state.service.upload_only(&id)).await
}

#[debug_handler]
pub async fn latency_test(State(state): State<AppState>) -> std::result::Result<Json<LatencyResult>, ApiError> {
    let id = Uuid::new_v4().to_string();
    run(&state, TestMode::LatencyOnly, &id, state.service.latency_only(&id)).await
}

/// Await a measurement inside the request future and log its outcome.
///
/// Dropping the request future (client gone) drops the measurement with it.
async fn run<T, F>(state: &AppState, mode: TestMode, correlation_id: &str, measurement: F) -> std::result::Result<Json<T>, ApiError>
where
    F: Future<Output = Result<T>>,
{
    let logger = state.logger.with_correlation_id(correlation_id);
    logger
        .info(&format!("GET {}{}", super::API_PREFIX, mode.path()))
        .field("mode", mode.name())
        .log()
        .await;

    let start = Instant::now();
    match measurement.await {
        Ok(result) => {
            logger
                .info(&format!("{} speed test completed", mode))
                .field("mode", mode.name())
                .field("duration_ms", duration_ms(start.elapsed()))
                .log()
                .await;
            Ok(Json(result))
        }
        Err(error) => {
            let context = format!("{} speed test failed", mode);
            state
                .error_logger
                .error_event(&error, Some(&context), Some(correlation_id))
                .log()
                .await;
            Err(ApiError(error))
        }
    }
}
