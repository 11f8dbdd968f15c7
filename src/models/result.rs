//! Measurement records returned by the probes and the API

use crate::defaults;
use crate::stats::round2;
use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Current local time as an ISO-8601 string with offset
pub fn now_timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Outcome of one latency sampling run
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatencyMeasurement {
    /// Mean round trip of the successful samples, in milliseconds
    pub latency_ms: f64,
    /// Sample standard deviation of the successful samples, in milliseconds
    pub jitter_ms: f64,
    pub successful_samples: u32,
    pub attempted_samples: u32,
}

impl LatencyMeasurement {
    /// Measurement for a run where no sample completed
    pub fn empty(attempted_samples: u32) -> Self {
        Self {
            attempted_samples,
            ..Default::default()
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.attempted_samples == 0 {
            0.0
        } else {
            self.successful_samples as f64 / self.attempted_samples as f64 * 100.0
        }
    }
}

/// Outcome of a download or upload probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputMeasurement {
    /// Throughput in megabits per second
    pub mbps: f64,
    /// Reported measurement window
    pub duration: Duration,
    pub bytes_transferred: u64,
    /// Endpoint that produced the figure, if any did
    pub source_url: Option<String>,
}

impl ThroughputMeasurement {
    pub fn new(mbps: f64, duration: Duration, bytes_transferred: u64, source_url: impl Into<String>) -> Self {
        Self {
            mbps,
            duration,
            bytes_transferred,
            source_url: Some(source_url.into()),
        }
    }

    /// Zero throughput over the given window, attributed to no endpoint
    pub fn none(duration: Duration) -> Self {
        Self {
            mbps: 0.0,
            duration,
            bytes_transferred: 0,
            source_url: None,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// Result of the full and quick speed tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    /// Mbps
    pub download_speed: f64,
    /// Mbps
    pub upload_speed: f64,
    /// ms
    pub latency: f64,
    /// ms
    pub jitter: f64,
    pub timestamp: String,
    /// Wall-clock span of the whole run, in seconds
    pub test_duration: f64,
}

impl MeasurementResult {
    pub fn new(
        latency: &LatencyMeasurement,
        download: &ThroughputMeasurement,
        upload: Option<&ThroughputMeasurement>,
        elapsed: Duration,
    ) -> Self {
        Self {
            download_speed: round2(download.mbps),
            upload_speed: upload.map(|u| round2(u.mbps)).unwrap_or(0.0),
            latency: round2(latency.latency_ms),
            jitter: round2(latency.jitter_ms),
            timestamp: now_timestamp(),
            test_duration: round2(elapsed.as_secs_f64()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub download_speed: f64,
    pub test_duration: f64,
    pub timestamp: String,
}

impl From<&ThroughputMeasurement> for DownloadResult {
    fn from(measurement: &ThroughputMeasurement) -> Self {
        Self {
            download_speed: round2(measurement.mbps),
            test_duration: round2(measurement.duration_secs()),
            timestamp: now_timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub upload_speed: f64,
    pub test_duration: f64,
    pub timestamp: String,
}

impl From<&ThroughputMeasurement> for UploadResult {
    fn from(measurement: &ThroughputMeasurement) -> Self {
        Self {
            upload_speed: round2(measurement.mbps),
            test_duration: round2(measurement.duration_secs()),
            timestamp: now_timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyResult {
    pub latency: f64,
    pub jitter: f64,
    pub timestamp: String,
}

impl From<&LatencyMeasurement> for LatencyResult {
    fn from(measurement: &LatencyMeasurement) -> Self {
        Self {
            latency: round2(measurement.latency_ms),
            jitter: round2(measurement.jitter_ms),
            timestamp: now_timestamp(),
        }
    }
}

/// Body of `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub status: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            message: defaults::SERVICE_NAME.to_string(),
            version: crate::VERSION.to_string(),
            status: "active".to_string(),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}
