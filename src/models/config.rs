//! Configuration data model and validation

use crate::defaults;
use crate::logging::{LogFormat, LogLevel};
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for any probe duration or timeout, in seconds
pub const MAX_DURATION_SECONDS: u64 = 300;

/// Upper bound for latency sample counts
pub const MAX_LATENCY_SAMPLES: u32 = 100;

/// Upper bound for the synthetic upload payload, in MB
pub const MAX_UPLOAD_SIZE_MB: u32 = 100;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Endpoint sampled by the latency probe
    #[serde(default = "default_latency_url")]
    pub latency_url: String,

    /// Download candidates, tried in order
    #[serde(default = "default_download_urls")]
    pub download_urls: Vec<String>,

    /// Echo endpoint receiving the upload payload
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// Upload payload size in MB (1 MB = 1,048,576 bytes)
    #[serde(default = "default_upload_size_mb")]
    pub upload_size_mb: u32,

    /// Latency samples taken by the full test
    #[serde(default = "default_full_latency_samples")]
    pub full_latency_samples: u32,

    /// Latency samples taken by the quick test
    #[serde(default = "default_quick_latency_samples")]
    pub quick_latency_samples: u32,

    /// Latency samples taken by the latency-only test
    #[serde(default = "default_latency_only_samples")]
    pub latency_only_samples: u32,

    /// Download budget of the full and download-only tests
    #[serde(default = "default_full_download_seconds")]
    pub full_download_seconds: u64,

    /// Download budget of the quick test
    #[serde(default = "default_quick_download_seconds")]
    pub quick_download_seconds: u64,

    /// Throughput above which a download candidate is accepted immediately
    #[serde(default = "default_fast_accept_mbps")]
    pub fast_accept_mbps: f64,

    /// Total timeout of one latency sample
    #[serde(default = "default_latency_timeout_seconds")]
    pub latency_timeout_seconds: u64,

    /// Connect timeout shared by every outbound request
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Added to the download budget to form the download request timeout
    #[serde(default = "default_download_grace_seconds")]
    pub download_grace_seconds: u64,

    /// Total timeout of the upload request
    #[serde(default = "default_upload_timeout_seconds")]
    pub upload_timeout_seconds: u64,

    /// Run the probes of a full/quick test concurrently instead of one after another
    #[serde(default)]
    pub concurrent_probes: bool,

    /// Minimum level written by the logger
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Log line layout
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            latency_url: default_latency_url(),
            download_urls: default_download_urls(),
            upload_url: default_upload_url(),
            upload_size_mb: default_upload_size_mb(),
            full_latency_samples: default_full_latency_samples(),
            quick_latency_samples: default_quick_latency_samples(),
            latency_only_samples: default_latency_only_samples(),
            full_download_seconds: default_full_download_seconds(),
            quick_download_seconds: default_quick_download_seconds(),
            fast_accept_mbps: default_fast_accept_mbps(),
            latency_timeout_seconds: default_latency_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            download_grace_seconds: default_download_grace_seconds(),
            upload_timeout_seconds: default_upload_timeout_seconds(),
            concurrent_probes: false,
            log_level: default_log_level(),
            log_format: default_log_format(),
            enable_color: default_enable_color(),
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> Result<SocketAddr> {
        let ip = IpAddr::from_str(&self.host)
            .map_err(|e| AppError::config(format!("Invalid server host '{}': {}", self.host, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn full_download_duration(&self) -> Duration {
        Duration::from_secs(self.full_download_seconds)
    }

    pub fn quick_download_duration(&self) -> Duration {
        Duration::from_secs(self.quick_download_seconds)
    }

    pub fn latency_timeout(&self) -> Duration {
        Duration::from_secs(self.latency_timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn download_grace(&self) -> Duration {
        Duration::from_secs(self.download_grace_seconds)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_seconds)
    }

    /// Validate the configuration and return the first hard error
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(AppError::config("Server host cannot be empty"));
        }
        self.bind_address()?;

        validate_http_url("latency URL", &self.latency_url)?;
        validate_http_url("upload URL", &self.upload_url)?;

        if self.download_urls.is_empty() {
            return Err(AppError::config("At least one download URL is required"));
        }
        for url in &self.download_urls {
            validate_http_url("download URL", url)?;
        }

        for (name, count) in [
            ("Full test latency samples", self.full_latency_samples),
            ("Quick test latency samples", self.quick_latency_samples),
            ("Latency-only samples", self.latency_only_samples),
        ] {
            if count == 0 {
                return Err(AppError::config(format!("{} must be greater than 0", name)));
            }
            if count > MAX_LATENCY_SAMPLES {
                return Err(AppError::config(format!(
                    "{} cannot exceed {}",
                    name, MAX_LATENCY_SAMPLES
                )));
            }
        }

        for (name, seconds) in [
            ("Full download duration", self.full_download_seconds),
            ("Quick download duration", self.quick_download_seconds),
            ("Latency timeout", self.latency_timeout_seconds),
            ("Connect timeout", self.connect_timeout_seconds),
            ("Upload timeout", self.upload_timeout_seconds),
        ] {
            if seconds == 0 {
                return Err(AppError::config(format!("{} must be greater than 0", name)));
            }
            if seconds > MAX_DURATION_SECONDS {
                return Err(AppError::config(format!(
                    "{} cannot exceed {} seconds",
                    name, MAX_DURATION_SECONDS
                )));
            }
        }

        if self.download_grace_seconds > MAX_DURATION_SECONDS {
            return Err(AppError::config(format!(
                "Download grace period cannot exceed {} seconds",
                MAX_DURATION_SECONDS
            )));
        }

        if self.upload_size_mb == 0 {
            return Err(AppError::config("Upload size must be greater than 0"));
        }
        if self.upload_size_mb > MAX_UPLOAD_SIZE_MB {
            return Err(AppError::config(format!(
                "Upload size cannot exceed {} MB",
                MAX_UPLOAD_SIZE_MB
            )));
        }

        if !self.fast_accept_mbps.is_finite() || self.fast_accept_mbps < 0.0 {
            return Err(AppError::config(format!(
                "Fast-accept threshold must be a non-negative number, got: {}",
                self.fast_accept_mbps
            )));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host.trim().to_string();
        }

        if let Ok(port) = std::env::var("SERVER_PORT") {
            self.port = parse_env("SERVER_PORT", &port)?;
        }

        if let Ok(url) = std::env::var("LATENCY_URL") {
            self.latency_url = url.trim().to_string();
        }

        if let Ok(urls) = std::env::var("DOWNLOAD_URLS") {
            self.download_urls = split_list(&urls);
        }

        if let Ok(url) = std::env::var("UPLOAD_URL") {
            self.upload_url = url.trim().to_string();
        }

        if let Ok(size) = std::env::var("UPLOAD_SIZE_MB") {
            self.upload_size_mb = parse_env("UPLOAD_SIZE_MB", &size)?;
        }

        if let Ok(count) = std::env::var("LATENCY_SAMPLES_FULL") {
            self.full_latency_samples = parse_env("LATENCY_SAMPLES_FULL", &count)?;
        }

        if let Ok(count) = std::env::var("LATENCY_SAMPLES_QUICK") {
            self.quick_latency_samples = parse_env("LATENCY_SAMPLES_QUICK", &count)?;
        }

        if let Ok(count) = std::env::var("LATENCY_SAMPLES_ONLY") {
            self.latency_only_samples = parse_env("LATENCY_SAMPLES_ONLY", &count)?;
        }

        if let Ok(seconds) = std::env::var("DOWNLOAD_SECONDS_FULL") {
            self.full_download_seconds = parse_env("DOWNLOAD_SECONDS_FULL", &seconds)?;
        }

        if let Ok(seconds) = std::env::var("DOWNLOAD_SECONDS_QUICK") {
            self.quick_download_seconds = parse_env("DOWNLOAD_SECONDS_QUICK", &seconds)?;
        }

        if let Ok(threshold) = std::env::var("FAST_ACCEPT_MBPS") {
            self.fast_accept_mbps = parse_env("FAST_ACCEPT_MBPS", &threshold)?;
        }

        if let Ok(seconds) = std::env::var("LATENCY_TIMEOUT_SECONDS") {
            self.latency_timeout_seconds = parse_env("LATENCY_TIMEOUT_SECONDS", &seconds)?;
        }

        if let Ok(seconds) = std::env::var("CONNECT_TIMEOUT_SECONDS") {
            self.connect_timeout_seconds = parse_env("CONNECT_TIMEOUT_SECONDS", &seconds)?;
        }

        if let Ok(seconds) = std::env::var("DOWNLOAD_GRACE_SECONDS") {
            self.download_grace_seconds = parse_env("DOWNLOAD_GRACE_SECONDS", &seconds)?;
        }

        if let Ok(seconds) = std::env::var("UPLOAD_TIMEOUT_SECONDS") {
            self.upload_timeout_seconds = parse_env("UPLOAD_TIMEOUT_SECONDS", &seconds)?;
        }

        if let Ok(concurrent) = std::env::var("CONCURRENT_PROBES") {
            self.concurrent_probes = parse_env("CONCURRENT_PROBES", &concurrent)?;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.log_level = LogLevel::from_str(level.trim())
                .map_err(|e| AppError::config(format!("Invalid LOG_LEVEL value '{}': {}", level, e)))?;
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.log_format = LogFormat::from_str(format.trim())
                .map_err(|e| AppError::config(format!("Invalid LOG_FORMAT value '{}': {}", format, e)))?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = parse_env("ENABLE_COLOR", &enable_color)?;
        }

        Ok(())
    }
}

/// Split a comma-separated list, dropping empty entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

fn validate_http_url(name: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(AppError::config(format!("The {} cannot be empty", name)));
    }

    let parsed = url::Url::parse(url)
        .map_err(|e| AppError::config(format!("Invalid {} '{}': {}", name, url, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::config(format!(
                "The {} '{}' uses unsupported scheme '{}'",
                name, url, scheme
            )))
        }
    }

    if parsed.host().is_none() {
        return Err(AppError::config(format!("The {} '{}' has no host", name, url)));
    }

    Ok(())
}

fn default_host() -> String {
    defaults::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    defaults::DEFAULT_PORT
}

fn default_latency_url() -> String {
    defaults::DEFAULT_LATENCY_URL.to_string()
}

fn default_download_urls() -> Vec<String> {
    defaults::DEFAULT_DOWNLOAD_URLS.iter().map(|s| s.to_string()).collect()
}

fn default_upload_url() -> String {
    defaults::DEFAULT_UPLOAD_URL.to_string()
}

fn default_upload_size_mb() -> u32 {
    defaults::DEFAULT_UPLOAD_SIZE_MB
}

fn default_full_latency_samples() -> u32 {
    defaults::DEFAULT_FULL_LATENCY_SAMPLES
}

fn default_quick_latency_samples() -> u32 {
    defaults::DEFAULT_QUICK_LATENCY_SAMPLES
}

fn default_latency_only_samples() -> u32 {
    defaults::DEFAULT_LATENCY_ONLY_SAMPLES
}

fn default_full_download_seconds() -> u64 {
    defaults::DEFAULT_FULL_DOWNLOAD_DURATION.as_secs()
}

fn default_quick_download_seconds() -> u64 {
    defaults::DEFAULT_QUICK_DOWNLOAD_DURATION.as_secs()
}

fn default_fast_accept_mbps() -> f64 {
    defaults::DEFAULT_FAST_ACCEPT_MBPS
}

fn default_latency_timeout_seconds() -> u64 {
    defaults::DEFAULT_LATENCY_TIMEOUT.as_secs()
}

fn default_connect_timeout_seconds() -> u64 {
    defaults::DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_download_grace_seconds() -> u64 {
    defaults::DEFAULT_DOWNLOAD_GRACE.as_secs()
}

fn default_upload_timeout_seconds() -> u64 {
    defaults::DEFAULT_UPLOAD_TIMEOUT.as_secs()
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_log_format() -> LogFormat {
    LogFormat::Console
}

fn default_enable_color() -> bool {
    defaults::DEFAULT_ENABLE_COLOR
}
