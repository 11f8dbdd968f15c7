//! Structured logging for the speed test service
//!
//! This module provides:
//! - Structured log entries with levels, fields and correlation IDs
//! - Console, JSON and compact output formats
//! - A probe logger for outbound request and mirror events
//! - An error event logger carrying error classification fields

use crate::client::HttpUtils;
use crate::error::{AppError, Result};
use crate::models::{Config, LatencyMeasurement, ThroughputMeasurement};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::panic::Location;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most detailed
    Trace = 0,
    /// Debug level - detailed information for debugging
    Debug = 1,
    /// Info level - general application information
    Info = 2,
    /// Warning level - potentially harmful situations
    Warn = 3,
    /// Error level - error events but application can continue
    Error = 4,
    /// Fatal level - severe error events that cause application termination
    Fatal = 5,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m", // White
            LogLevel::Debug => "\x1b[36m", // Cyan
            LogLevel::Info => "\x1b[32m",  // Green
            LogLevel::Warn => "\x1b[33m",  // Yellow
            LogLevel::Error => "\x1b[31m", // Red
            LogLevel::Fatal => "\x1b[35m", // Magenta
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" => Ok(LogFormat::Console),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Invalid log format '{}' (expected console, json or compact)", s)),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
    pub thread_id: Option<String>,
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl From<&Location<'_>> for LogLocation {
    fn from(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            column: location.column(),
        }
    }
}

/// Shared logging context for session tracking
#[derive(Debug, Default)]
struct LogContext {
    /// Global correlation ID for the process
    session_id: Option<String>,
}

/// Logger implementation with multiple output formats
///
/// Clones share the session context; a clone made with
/// [`Logger::with_correlation_id`] stamps its own correlation ID on every entry.
/// With `include_location` set (`--debug`), every entry records the source
/// location of the call that created it.
#[derive(Debug, Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    correlation_id: Option<String>,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name,
            correlation_id: None,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger with specific configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        Self {
            min_level: config.log_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: config.log_format,
            name,
            correlation_id: None,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// A clone that tags every entry with the given correlation ID
    pub fn with_correlation_id(&self, correlation_id: &str) -> Self {
        Self {
            correlation_id: Some(correlation_id.to_string()),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Create a log entry builder
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        let caller = Location::caller();
        let location = self.include_location.then(|| LogLocation::from(caller));
        LogEntryBuilder::new(self, level, message.to_string(), location)
    }

    #[track_caller]
    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    #[track_caller]
    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    #[track_caller]
    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    #[track_caller]
    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Fill in context fields and render the entry, or `None` when it is filtered out
    async fn render(&self, mut entry: LogEntry) -> Option<(LogLevel, String)> {
        if entry.level < self.min_level {
            return None;
        }

        if entry.correlation_id.is_none() {
            entry.correlation_id = self.correlation_id.clone();
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry
                .fields
                .insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        drop(context);

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => self.format_json(&entry),
            LogFormat::Compact => self.format_compact(&entry),
        };

        Some((entry.level, output))
    }

    async fn write_entry(&self, entry: LogEntry) {
        let Some((level, output)) = self.render(entry).await else {
            return;
        };

        // Write to stderr for errors/warnings, stdout for others
        if level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            // First 8 chars are enough to follow a request
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        if let Some(location) = &entry.location {
            output.push_str(&format!(" @ {}:{}", location.file, location.line));
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => serde_json::json!({
                "error": "Failed to serialize log entry",
                "message": entry.message,
            })
            .to_string(),
        }
    }

    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S");
        format!(
            "{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String, location: Option<LogLocation>) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
                thread_id: std::thread::current().name().map(String::from),
                location,
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add throughput figures
    pub fn throughput(self, measurement: &ThroughputMeasurement) -> Self {
        self.field("mbps", measurement.mbps)
            .field("duration_s", measurement.duration_secs())
            .field("bytes", measurement.bytes_transferred)
            .field("source_url", &measurement.source_url)
    }

    /// Add latency figures
    pub fn latency(self, measurement: &LatencyMeasurement) -> Self {
        self.field("latency_ms", measurement.latency_ms)
            .field("jitter_ms", measurement.jitter_ms)
            .field("successful_samples", measurement.successful_samples)
            .field("attempted_samples", measurement.attempted_samples)
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Entries for outbound probe traffic
///
/// Every method returns a builder stamped with the caller's location; finish it
/// with `.log().await`.
#[derive(Debug, Clone)]
pub struct ProbeLogger {
    logger: Logger,
}

impl ProbeLogger {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Logger::with_config("PROBE".to_string(), config))
    }

    /// The same probe logger bound to a request correlation ID
    pub fn with_correlation_id(&self, correlation_id: &str) -> Self {
        Self::new(self.logger.with_correlation_id(correlation_id))
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// A completed HTTP exchange
    #[track_caller]
    pub fn http_request(&self, url: &str, method: &str, status_code: Option<u16>, duration_ms: f64) -> LogEntryBuilder<'_> {
        let success = status_code.is_some_and(|code| (200..400).contains(&code));
        let level = if success { LogLevel::Debug } else { LogLevel::Warn };

        let message = format!(
            "{} {} -> {} in {:.1}ms",
            method,
            url,
            status_code.map_or("FAILED".to_string(), |c| c.to_string()),
            duration_ms
        );

        self.logger
            .log(level, &message)
            .field("url", url)
            .field("host", HttpUtils::extract_domain(url).ok())
            .field("method", method)
            .field("status_code", status_code)
            .field("success", success)
            .field("duration_ms", duration_ms)
    }

    /// A latency sample that did not complete
    #[track_caller]
    pub fn sample_failure(&self, url: &str, sample: u32, cause: &str) -> LogEntryBuilder<'_> {
        self.logger
            .warn(&format!("Latency sample {} to {} failed: {}", sample, url, cause))
            .field("url", url)
            .field("sample", sample)
            .field("cause", cause)
    }

    /// A download mirror that was skipped
    #[track_caller]
    pub fn candidate_failure(&self, url: &str, cause: &str) -> LogEntryBuilder<'_> {
        self.logger
            .warn(&format!("Download mirror {} failed: {}", url, cause))
            .field("url", url)
            .field("cause", cause)
    }

    /// The figure a download mirror produced
    #[track_caller]
    pub fn candidate_result(&self, measurement: &ThroughputMeasurement, accepted: bool) -> LogEntryBuilder<'_> {
        let url = measurement.source_url.as_deref().unwrap_or("-");
        self.logger
            .debug(&format!(
                "Download mirror {} measured {:.2} Mbps ({})",
                url,
                measurement.mbps,
                if accepted { "accepted" } else { "below threshold" }
            ))
            .throughput(measurement)
            .field("accepted", accepted)
    }

    /// Outcome of a latency run
    #[track_caller]
    pub fn latency_summary(&self, url: &str, measurement: &LatencyMeasurement) -> LogEntryBuilder<'_> {
        let level = if measurement.successful_samples == 0 {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };

        self.logger
            .log(
                level,
                &format!(
                    "Latency to {}: {:.2}ms (jitter {:.2}ms, {}/{} samples)",
                    url,
                    measurement.latency_ms,
                    measurement.jitter_ms,
                    measurement.successful_samples,
                    measurement.attempted_samples
                ),
            )
            .field("url", url)
            .field("success_rate", measurement.success_rate())
            .latency(measurement)
    }

    /// Outcome of a download or upload probe
    #[track_caller]
    pub fn throughput(&self, direction: &str, measurement: &ThroughputMeasurement) -> LogEntryBuilder<'_> {
        self.logger
            .info(&format!(
                "{} throughput: {:.2} Mbps over {:.2}s",
                direction,
                measurement.mbps,
                measurement.duration_secs()
            ))
            .field("direction", direction)
            .throughput(measurement)
    }
}

/// Error event logger with enhanced context
#[derive(Debug, Clone)]
pub struct ErrorEventLogger {
    logger: Logger,
}

impl ErrorEventLogger {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Logger::with_config("ERR".to_string(), config))
    }

    /// An application error with its classification fields
    #[track_caller]
    pub fn error_event(&self, error: &AppError, context: Option<&str>, correlation_id: Option<&str>) -> LogEntryBuilder<'_> {
        let message = if let Some(ctx) = context {
            format!("{}: {}", ctx, error)
        } else {
            error.to_string()
        };

        let mut builder = self.logger.error(&message).error_info(error);

        if let Some(id) = correlation_id {
            builder = builder.correlation_id(id);
        }

        if let Some(ctx) = context {
            builder = builder.field("context", ctx);
        }

        builder
    }
}

/// Global logger factory and management
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_probe_logger(&self) -> ProbeLogger {
        ProbeLogger::new(self.create_logger("PROBE").await)
    }

    pub async fn create_error_logger(&self) -> ErrorEventLogger {
        ErrorEventLogger::new(self.create_logger("ERR").await)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
