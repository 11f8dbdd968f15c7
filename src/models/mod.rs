//! Data models and structures for the speed test service

pub mod config;
pub mod result;

// Re-export main model types
pub use config::Config;
pub use result::{
    now_timestamp, DownloadResult, HealthStatus, LatencyMeasurement, LatencyResult,
    MeasurementResult, ServiceInfo, ThroughputMeasurement, UploadResult,
};
