//! Environment variable handling and .env file management

use crate::client::HttpUtils;
use crate::error::{AppError, Result};
use crate::models::config::{split_list, MAX_DURATION_SECONDS, MAX_LATENCY_SAMPLES, MAX_UPLOAD_SIZE_MB};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load a specific .env file if it exists. Variables already set in the
    /// process environment are not overwritten. Returns whether a file was loaded.
    pub fn load_env_file_from(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

        Ok(true)
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# QoS Speed Test Service Configuration
#
# Values set here are used as defaults and can be overridden by
# environment variables and command-line arguments.

# Listening address and port
# SERVER_HOST=0.0.0.0
# SERVER_PORT=8000

# Endpoint sampled for latency and jitter
# LATENCY_URL=https://www.google.com

# Download mirrors, tried in order (comma-separated)
# DOWNLOAD_URLS=https://proof.ovh.net/files/10Mb.dat,https://speed.hetzner.de/10MB.bin

# Echo endpoint accepting the upload payload
# UPLOAD_URL=https://httpbin.org/post
# UPLOAD_SIZE_MB=5

# Latency samples per test
# LATENCY_SAMPLES_FULL=5
# LATENCY_SAMPLES_QUICK=3
# LATENCY_SAMPLES_ONLY=10

# Download budgets in seconds
# DOWNLOAD_SECONDS_FULL=10
# DOWNLOAD_SECONDS_QUICK=5

# A mirror faster than this (Mbps) is accepted without trying the rest
# FAST_ACCEPT_MBPS=0.5

# Timeouts in seconds
# LATENCY_TIMEOUT_SECONDS=5
# CONNECT_TIMEOUT_SECONDS=5
# DOWNLOAD_GRACE_SECONDS=10
# UPLOAD_TIMEOUT_SECONDS=30

# Run latency, download and upload probes at the same time (true/false)
# CONCURRENT_PROBES=false

# Logging
# LOG_LEVEL=info
# LOG_FORMAT=console
# ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "LATENCY_URL" | "UPLOAD_URL" => validate_url_entry(key, value)?,
            "DOWNLOAD_URLS" => {
                let urls = split_list(value);
                if urls.is_empty() {
                    return Err(AppError::config("DOWNLOAD_URLS must list at least one URL"));
                }
                for url in urls {
                    validate_url_entry(key, &url)?;
                }
            }
            "SERVER_HOST" => {
                value
                    .parse::<std::net::IpAddr>()
                    .map_err(|e| AppError::config(format!("Invalid SERVER_HOST value '{}': {}", value, e)))?;
            }
            "SERVER_PORT" => {
                value
                    .parse::<u16>()
                    .map_err(|e| AppError::config(format!("Invalid SERVER_PORT value '{}': {}", value, e)))?;
            }
            "LATENCY_SAMPLES_FULL" | "LATENCY_SAMPLES_QUICK" | "LATENCY_SAMPLES_ONLY" => {
                let count = parse_u64(key, value)?;
                if count == 0 || count > MAX_LATENCY_SAMPLES as u64 {
                    return Err(AppError::config(format!(
                        "{} must be between 1 and {}, got: {}",
                        key, MAX_LATENCY_SAMPLES, count
                    )));
                }
            }
            "DOWNLOAD_SECONDS_FULL" | "DOWNLOAD_SECONDS_QUICK" | "LATENCY_TIMEOUT_SECONDS"
            | "CONNECT_TIMEOUT_SECONDS" | "UPLOAD_TIMEOUT_SECONDS" => {
                let seconds = parse_u64(key, value)?;
                if seconds == 0 || seconds > MAX_DURATION_SECONDS {
                    return Err(AppError::config(format!(
                        "{} must be between 1 and {}, got: {}",
                        key, MAX_DURATION_SECONDS, seconds
                    )));
                }
            }
            "DOWNLOAD_GRACE_SECONDS" => {
                let seconds = parse_u64(key, value)?;
                if seconds > MAX_DURATION_SECONDS {
                    return Err(AppError::config(format!(
                        "{} must be at most {}, got: {}",
                        key, MAX_DURATION_SECONDS, seconds
                    )));
                }
            }
            "UPLOAD_SIZE_MB" => {
                let size = parse_u64(key, value)?;
                if size == 0 || size > MAX_UPLOAD_SIZE_MB as u64 {
                    return Err(AppError::config(format!(
                        "UPLOAD_SIZE_MB must be between 1 and {}, got: {}",
                        MAX_UPLOAD_SIZE_MB, size
                    )));
                }
            }
            "FAST_ACCEPT_MBPS" => {
                let threshold: f64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid FAST_ACCEPT_MBPS value '{}': {}", value, e)))?;
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(AppError::config(format!(
                        "FAST_ACCEPT_MBPS must be a non-negative number, got: {}",
                        value
                    )));
                }
            }
            "CONCURRENT_PROBES" | "ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "LOG_LEVEL" => {
                value
                    .parse::<crate::logging::LogLevel>()
                    .map_err(|e| AppError::config(format!("Invalid LOG_LEVEL value '{}': {}", value, e)))?;
            }
            "LOG_FORMAT" => {
                value
                    .parse::<crate::logging::LogFormat>()
                    .map_err(|e| AppError::config(format!("Invalid LOG_FORMAT value '{}': {}", value, e)))?;
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("SERVER_HOST", "Address the HTTP server binds to", "0.0.0.0"),
            ("SERVER_PORT", "Port the HTTP server listens on", "8000"),
            ("LATENCY_URL", "Endpoint sampled for latency", "https://www.google.com"),
            ("DOWNLOAD_URLS", "Comma-separated download mirrors", "https://proof.ovh.net/files/10Mb.dat"),
            ("UPLOAD_URL", "Echo endpoint for uploads", "https://httpbin.org/post"),
            ("UPLOAD_SIZE_MB", "Upload payload size in MB (1-100)", "5"),
            ("LATENCY_SAMPLES_FULL", "Latency samples in the full test (1-100)", "5"),
            ("LATENCY_SAMPLES_QUICK", "Latency samples in the quick test (1-100)", "3"),
            ("LATENCY_SAMPLES_ONLY", "Latency samples in the latency test (1-100)", "10"),
            ("DOWNLOAD_SECONDS_FULL", "Download budget of the full test (1-300)", "10"),
            ("DOWNLOAD_SECONDS_QUICK", "Download budget of the quick test (1-300)", "5"),
            ("FAST_ACCEPT_MBPS", "Mirror acceptance threshold in Mbps", "0.5"),
            ("LATENCY_TIMEOUT_SECONDS", "Timeout of one latency sample (1-300)", "5"),
            ("CONNECT_TIMEOUT_SECONDS", "Connect timeout of every request (1-300)", "5"),
            ("DOWNLOAD_GRACE_SECONDS", "Extra time allowed per download request (0-300)", "10"),
            ("UPLOAD_TIMEOUT_SECONDS", "Timeout of the upload request (1-300)", "30"),
            ("CONCURRENT_PROBES", "Run probes concurrently", "false"),
            ("LOG_LEVEL", "Minimum log level", "info"),
            ("LOG_FORMAT", "Log format: console, json or compact", "console"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<24} {}\n", var, description));
            help.push_str(&format!("  {:<24} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n\n");
        help.push_str("The .env file defaults to ./.env; set QOS_ENV_FILE or pass --env-file to change it.\n\n");

        help.push_str("Example .env file:\n\n");
        help.push_str(&Self::create_example_env_content());

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        for (var_name, _, _) in Self::get_supported_env_vars() {
            if let Ok(value) = std::env::var(var_name) {
                if let Err(e) = Self::validate_env_var(var_name, &value) {
                    warnings.push(format!("Warning: {}", e));
                }
            }
        }

        Ok(warnings)
    }

    /// Check a .env file and validate its contents without loading it
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut warnings = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                if let Err(e) = Self::validate_env_var(key.trim(), value.trim()) {
                    warnings.push(format!("Line '{}': {}", line, e));
                }
            }
        }

        Ok(Some(warnings))
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

fn validate_url_entry(key: &str, value: &str) -> Result<()> {
    HttpUtils::validate_url(value)
        .map_err(|e| AppError::config(format!("Invalid {} entry '{}': {}", key, value, e.detail())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_env_manager_create_example_content() {
        let content = EnvManager::create_example_env_content();

        for (var, _, _) in EnvManager::get_supported_env_vars() {
            assert!(content.contains(&format!("{}=", var)), "missing {}", var);
        }
    }

    #[test]
    fn test_load_env_file_from_reports_whether_loaded() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "QOS_TEST_LOADED_MARKER=1").unwrap();

        assert!(EnvManager::load_env_file_from(temp_file.path()).unwrap());
        assert_eq!(std::env::var("QOS_TEST_LOADED_MARKER").as_deref(), Ok("1"));

        let missing = temp_file.path().with_extension("missing");
        assert!(!EnvManager::load_env_file_from(&missing).unwrap());
    }

    #[test]
    fn test_env_manager_validate_env_var() {
        // Valid cases
        assert!(EnvManager::validate_env_var("LATENCY_URL", "https://www.google.com").is_ok());
        assert!(EnvManager::validate_env_var("DOWNLOAD_URLS", "https://a.example/f, http://b.example/f").is_ok());
        assert!(EnvManager::validate_env_var("SERVER_HOST", "127.0.0.1").is_ok());
        assert!(EnvManager::validate_env_var("SERVER_PORT", "8080").is_ok());
        assert!(EnvManager::validate_env_var("UPLOAD_SIZE_MB", "5").is_ok());
        assert!(EnvManager::validate_env_var("LATENCY_SAMPLES_ONLY", "10").is_ok());
        assert!(EnvManager::validate_env_var("DOWNLOAD_GRACE_SECONDS", "0").is_ok());
        assert!(EnvManager::validate_env_var("FAST_ACCEPT_MBPS", "0.5").is_ok());
        assert!(EnvManager::validate_env_var("CONCURRENT_PROBES", "true").is_ok());
        assert!(EnvManager::validate_env_var("LOG_FORMAT", "json").is_ok());

        // Invalid cases
        assert!(EnvManager::validate_env_var("LATENCY_URL", "not-a-url").is_err());
        assert!(EnvManager::validate_env_var("UPLOAD_URL", "ftp://files.example").is_err());
        assert!(EnvManager::validate_env_var("DOWNLOAD_URLS", " , ").is_err());
        assert!(EnvManager::validate_env_var("SERVER_HOST", "not-an-ip").is_err());
        assert!(EnvManager::validate_env_var("SERVER_PORT", "70000").is_err());
        assert!(EnvManager::validate_env_var("UPLOAD_SIZE_MB", "0").is_err());
        assert!(EnvManager::validate_env_var("LATENCY_SAMPLES_FULL", "101").is_err());
        assert!(EnvManager::validate_env_var("DOWNLOAD_SECONDS_FULL", "0").is_err());
        assert!(EnvManager::validate_env_var("UPLOAD_TIMEOUT_SECONDS", "301").is_err());
        assert!(EnvManager::validate_env_var("FAST_ACCEPT_MBPS", "-1").is_err());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "maybe").is_err());
        assert!(EnvManager::validate_env_var("LOG_LEVEL", "loud").is_err());
    }

    #[test]
    fn test_get_supported_env_vars() {
        let vars = EnvManager::get_supported_env_vars();

        assert_eq!(vars.len(), 20);
        assert!(vars.iter().any(|(name, _, _)| *name == "DOWNLOAD_URLS"));
        assert!(vars.iter().any(|(name, _, _)| *name == "FAST_ACCEPT_MBPS"));
        assert!(vars.iter().any(|(name, _, _)| *name == "CONCURRENT_PROBES"));
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();

        assert!(help.contains("Supported Environment Variables:"));
        assert!(help.contains("UPLOAD_URL"));
        assert!(help.contains("Configuration Priority"));
        assert!(help.contains("Command-line arguments"));
        assert!(help.contains("QOS_ENV_FILE"));
        assert!(help.contains("Example .env file:"));
        assert!(help.contains("# UPLOAD_SIZE_MB=5"));
    }

    #[test]
    fn test_check_env_file_reports_bad_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "SERVER_PORT=8080").unwrap();
        writeln!(file, "UPLOAD_SIZE_MB=0").unwrap();
        writeln!(file, "LATENCY_URL=gopher://old.example").unwrap();

        let warnings = EnvManager::check_env_file(file.path()).unwrap().unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("UPLOAD_SIZE_MB"));
    }

    #[test]
    fn test_check_env_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = EnvManager::check_env_file(&dir.path().join(".env")).unwrap();
        assert!(result.is_none());
    }
}
