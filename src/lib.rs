//! QoS Speed Test Service
//!
//! An HTTP service that measures the network quality of the host it runs on:
//! download throughput against a list of public mirrors, upload throughput
//! against an echo endpoint, and round-trip latency with jitter.

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod probes;
pub mod server;
pub mod service;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{
    Config, DownloadResult, HealthStatus, LatencyMeasurement, LatencyResult, MeasurementResult,
    ServiceInfo, ThroughputMeasurement, UploadResult,
};
pub use service::{SpeedTestService, SpeedTester};
pub use types::TestMode;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const SERVICE_NAME: &str = "QoS Network Monitoring API";

    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8000;

    pub const DEFAULT_LATENCY_URL: &str = "https://www.google.com";
    pub const DEFAULT_DOWNLOAD_URLS: &[&str] = &[
        "https://proof.ovh.net/files/10Mb.dat",
        "https://bouygues.testdebit.info/10M.iso",
        "http://ipv4.download.thinkbroadband.com/10MB.zip",
        "https://speed.hetzner.de/10MB.bin",
    ];
    pub const DEFAULT_UPLOAD_URL: &str = "https://httpbin.org/post";
    pub const DEFAULT_UPLOAD_SIZE_MB: u32 = 5;

    pub const DEFAULT_FULL_LATENCY_SAMPLES: u32 = 5;
    pub const DEFAULT_QUICK_LATENCY_SAMPLES: u32 = 3;
    pub const DEFAULT_LATENCY_ONLY_SAMPLES: u32 = 10;

    pub const DEFAULT_FULL_DOWNLOAD_DURATION: Duration = Duration::from_secs(10);
    pub const DEFAULT_QUICK_DOWNLOAD_DURATION: Duration = Duration::from_secs(5);
    pub const DEFAULT_FAST_ACCEPT_MBPS: f64 = 0.5;

    pub const DEFAULT_LATENCY_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_DOWNLOAD_GRACE: Duration = Duration::from_secs(10);
    pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

    /// Granularity at which download bytes are counted and the deadline checked
    pub const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;
    /// Shortest download window that produces a throughput figure
    pub const MIN_MEASUREMENT_WINDOW: Duration = Duration::from_secs(1);
    pub const BYTES_PER_MB: usize = 1024 * 1024;

    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
