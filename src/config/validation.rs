//! Configuration validation utilities and rules

use crate::{client::HttpUtils, error::Result, models::Config};
use colored::Colorize;

/// Configuration validator producing non-fatal warnings on top of `Config::validate`
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run the hard checks, then collect warnings for settings that work but look odd
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        config.validate()?;

        warnings.extend(Self::validate_endpoints(config));
        warnings.extend(Self::validate_measurement_settings(config));

        Ok(warnings)
    }

    fn validate_endpoints(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        let all_urls = std::iter::once(&config.latency_url)
            .chain(config.download_urls.iter())
            .chain(std::iter::once(&config.upload_url));

        for url in all_urls {
            let Ok(parsed) = url::Url::parse(url) else {
                continue;
            };

            if !HttpUtils::is_https(url) {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("URL '{}' uses plain HTTP; transparent proxies may distort the measurement", url),
                ));
            }

            match parsed.host() {
                Some(url::Host::Ipv4(ip)) if ip.is_private() || ip.is_loopback() => {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Info,
                        format!("URL '{}' targets a private/local network", url),
                    ));
                }
                Some(url::Host::Domain("localhost")) => {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Info,
                        format!("URL '{}' targets localhost", url),
                    ));
                }
                _ => {}
            }
        }

        let mut seen = std::collections::HashSet::new();
        for url in &config.download_urls {
            if !seen.insert(url) {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Download URL '{}' is listed more than once", url),
                ));
            }
        }

        warnings
    }

    fn validate_measurement_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.fast_accept_mbps == 0.0 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "Fast-accept threshold is 0; the first mirror delivering any data is accepted".to_string(),
            ));
        }

        for (name, count) in [
            ("Full test", config.full_latency_samples),
            ("Quick test", config.quick_latency_samples),
            ("Latency-only test", config.latency_only_samples),
        ] {
            if count < 2 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("{} takes {} latency sample; jitter will always be 0", name, count),
                ));
            }
        }

        if config.quick_download_seconds < 2 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Quick download budget of {}s leaves little room above the 1s minimum window",
                    config.quick_download_seconds
                ),
            ));
        }

        if config.upload_timeout_seconds < 5 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Upload timeout of {}s may be too short for a {} MB payload",
                    config.upload_timeout_seconds, config.upload_size_mb
                ),
            ));
        }

        let worst_case = config.full_latency_samples as u64 * config.latency_timeout_seconds
            + config.download_urls.len() as u64
                * (config.full_download_seconds + config.download_grace_seconds)
            + config.upload_timeout_seconds;
        if worst_case > 120 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("A full test can take up to {}s when every endpoint is unreachable", worst_case),
            ));
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        let tag = format!("[{}]", self.level.as_str());
        if !use_color {
            return format!("{} {}", tag, self.message);
        }

        let tag = match self.level {
            ValidationLevel::Info => tag.blue(),
            ValidationLevel::Warning => tag.yellow(),
            ValidationLevel::Error => tag.red(),
        };
        format!("{} {}", tag, self.message)
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_warns_about_plain_http_mirror() {
        let warnings = validate_config(&Config::default()).unwrap();

        assert!(warnings
            .iter()
            .any(|w| w.level == ValidationLevel::Warning && w.message.contains("thinkbroadband")));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let config = Config {
            download_urls: vec![],
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_threshold_warns() {
        let config = Config {
            fast_accept_mbps: 0.0,
            ..Default::default()
        };
        let warnings = validate_config(&config).unwrap();
        assert!(warnings.iter().any(|w| w.message.contains("Fast-accept threshold is 0")));
    }

    #[test]
    fn test_single_sample_and_duplicates_warn() {
        let config = Config {
            quick_latency_samples: 1,
            download_urls: vec![
                "https://mirror.example/10MB.bin".to_string(),
                "https://mirror.example/10MB.bin".to_string(),
            ],
            ..Default::default()
        };
        let warnings = validate_config(&config).unwrap();

        assert!(warnings.iter().any(|w| w.message.contains("jitter will always be 0")));
        assert!(warnings.iter().any(|w| w.message.contains("more than once")));
    }

    #[test]
    fn test_local_endpoints_are_info() {
        let config = Config {
            latency_url: "https://127.0.0.1:8443/".to_string(),
            ..Default::default()
        };
        let warnings = validate_config(&config).unwrap();
        assert!(warnings
            .iter()
            .any(|w| w.level == ValidationLevel::Info && w.message.contains("private/local")));
    }

    #[test]
    fn test_warning_format() {
        let warning = ValidationWarning::new(ValidationLevel::Warning, "check this".to_string());
        assert_eq!(warning.format(false), "[WARNING] check this");
        assert!(warning.format(true).contains("check this"));
    }
}
