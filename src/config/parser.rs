//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, logging::LogLevel, models::Config};
use std::path::PathBuf;

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        self.parse_with_source().map(|(config, _)| config)
    }

    /// Parse the configuration and also report which .env file was loaded
    pub fn parse_with_source(&self) -> Result<(Config, Option<PathBuf>)> {
        // Start with default configuration
        let mut config = Config::default();

        // Load from environment file if it exists
        let env_file = self.env_file_path();
        let loaded = EnvManager::load_env_file_from(&env_file)?.then_some(env_file);

        // Merge environment variables into config
        config.merge_from_env()?;

        // Override with CLI arguments
        self.apply_cli_overrides(&mut config);

        // Validate the final configuration
        config.validate()?;

        Ok((config, loaded))
    }

    /// The .env file to read: `--env-file` / `QOS_ENV_FILE`, else `./.env`
    pub fn env_file_path(&self) -> PathBuf {
        self.cli.env_file.clone().unwrap_or_else(|| PathBuf::from(".env"))
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(ref host) = cli.host {
            config.host = host.clone();
        }

        if let Some(port) = cli.port {
            config.port = port;
        }

        if let Some(ref url) = cli.latency_url {
            config.latency_url = url.clone();
        }

        if !cli.download_url.is_empty() {
            config.download_urls = cli.download_url.clone();
        }

        if let Some(ref url) = cli.upload_url {
            config.upload_url = url.clone();
        }

        if let Some(size) = cli.upload_size_mb {
            config.upload_size_mb = size;
        }

        if let Some(threshold) = cli.fast_accept_mbps {
            config.fast_accept_mbps = threshold;
        }

        if cli.concurrent_probes {
            config.concurrent_probes = true;
        }

        if let Some(format) = cli.log_format {
            config.log_format = format;
        }

        // Override color setting if --no-color is specified
        if cli.no_color {
            config.enable_color = false;
        }

        // --debug wins over --verbose
        config.debug = cli.debug;
        if cli.debug {
            config.log_level = LogLevel::Debug;
        } else if cli.verbose && config.log_level > LogLevel::Debug {
            config.log_level = LogLevel::Debug;
        }
    }
}

/// Display configuration summary for startup logs and `--show-config`
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Listen Address: {}:{}", config.host, config.port));
    summary.push(format!("Latency URL: {}", config.latency_url));
    summary.push(format!("Download URLs: {}", config.download_urls.join(", ")));
    summary.push(format!("Upload URL: {} ({} MB)", config.upload_url, config.upload_size_mb));
    summary.push(format!(
        "Latency Samples: full={} quick={} only={}",
        config.full_latency_samples, config.quick_latency_samples, config.latency_only_samples
    ));
    summary.push(format!(
        "Download Budget: full={}s quick={}s (+{}s grace)",
        config.full_download_seconds, config.quick_download_seconds, config.download_grace_seconds
    ));
    summary.push(format!("Fast Accept: {} Mbps", config.fast_accept_mbps));
    summary.push(format!(
        "Timeouts: latency={}s connect={}s upload={}s",
        config.latency_timeout_seconds, config.connect_timeout_seconds, config.upload_timeout_seconds
    ));
    summary.push(format!("Concurrent Probes: {}", config.concurrent_probes));
    summary.push(format!("Log: {} ({:?})", config.log_level.as_str(), config.log_format));
    summary.push(format!("Color Output: {}", config.enable_color));

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use clap::Parser;

    fn overridden(args: &[&str]) -> Config {
        let cli = Cli::parse_from(args);
        let parser = ConfigParser::new(cli);
        let mut config = Config::default();
        parser.apply_cli_overrides(&mut config);
        config
    }

    #[test]
    fn test_no_flags_keeps_defaults() {
        let config = overridden(&["qos-speedtest"]);
        let defaults = Config::default();

        assert_eq!(config.port, defaults.port);
        assert_eq!(config.download_urls, defaults.download_urls);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.enable_color);
        assert!(!config.debug);
    }

    #[test]
    fn test_cli_overrides() {
        let config = overridden(&[
            "qos-speedtest",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--download-url",
            "http://127.0.0.1:1/a",
            "--download-url",
            "http://127.0.0.1:1/b",
            "--upload-size-mb",
            "2",
            "--fast-accept-mbps",
            "10",
            "--concurrent-probes",
            "--log-format",
            "json",
            "--no-color",
        ]);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.download_urls.len(), 2);
        assert_eq!(config.upload_size_mb, 2);
        assert_eq!(config.fast_accept_mbps, 10.0);
        assert!(config.concurrent_probes);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.enable_color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_and_verbose_lower_log_level() {
        assert_eq!(overridden(&["qos-speedtest", "--verbose"]).log_level, LogLevel::Debug);

        let config = overridden(&["qos-speedtest", "--debug"]);
        assert!(config.debug);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_env_file_path_defaults_to_dot_env() {
        let parser = ConfigParser::new(Cli::parse_from(["qos-speedtest"]));
        assert_eq!(parser.env_file_path(), PathBuf::from(".env"));

        let parser = ConfigParser::new(Cli::parse_from(["qos-speedtest", "--env-file", "/etc/qos.env"]));
        assert_eq!(parser.env_file_path(), PathBuf::from("/etc/qos.env"));
    }

    #[test]
    fn test_parse_reports_loaded_env_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let present = dir.path().join("present.env");
        std::fs::write(&present, "# nothing to set\n").unwrap();
        let missing = dir.path().join("missing.env");

        let args = |path: &PathBuf| Cli::parse_from(["qos-speedtest", "--env-file", path.to_str().unwrap()]);

        let (_, loaded) = ConfigParser::new(args(&present)).parse_with_source().unwrap();
        assert_eq!(loaded, Some(present.clone()));

        let (_, loaded) = ConfigParser::new(args(&missing)).parse_with_source().unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn test_config_summary() {
        let config = Config::default();
        let summary = display_config_summary(&config);

        assert!(summary.contains("Listen Address: 0.0.0.0:8000"));
        assert!(summary.contains("Download URLs:"));
        assert!(summary.contains("Fast Accept: 0.5 Mbps"));
        assert!(summary.contains("Concurrent Probes: false"));
    }
}
