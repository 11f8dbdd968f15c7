//! Command-line interface module

use crate::logging::LogFormat;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// QoS Speed Test Service - HTTP API measuring download, upload, latency and jitter
#[derive(Parser, Debug, Clone)]
#[command(name = "qos-speedtest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, value_name = "IP")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Endpoint sampled for latency and jitter
    #[arg(long, value_name = "URL")]
    pub latency_url: Option<String>,

    /// Download mirror, tried in the given order (can be used multiple times)
    #[arg(long = "download-url", value_name = "URL", action = ArgAction::Append)]
    pub download_url: Vec<String>,

    /// Echo endpoint receiving the upload payload
    #[arg(long, value_name = "URL")]
    pub upload_url: Option<String>,

    /// Upload payload size in MB
    #[arg(long, value_name = "MB")]
    pub upload_size_mb: Option<u32>,

    /// Throughput in Mbps above which a download mirror is accepted immediately
    #[arg(long, value_name = "MBPS", value_parser = parse_threshold)]
    pub fast_accept_mbps: Option<f64>,

    /// Run the probes of full and quick tests concurrently
    #[arg(long)]
    pub concurrent_probes: bool,

    /// Log output format (console, json, compact)
    #[arg(long, value_name = "FORMAT", value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,

    /// Load settings from this .env file instead of ./.env
    #[arg(long, value_name = "PATH", env = "QOS_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// List supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,
}

impl Cli {
    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("Invalid threshold: {}", s))?;
    if !value.is_finite() || value < 0.0 {
        return Err("Threshold must be a non-negative number".to_string());
    }
    Ok(value)
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    s.parse()
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    cfg!(unix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_defaults() {
        let cli = Cli::parse_from(["qos-speedtest"]);
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
        assert!(cli.download_url.is_empty());
        assert!(!cli.concurrent_probes);
        assert!(!cli.verbose);
        assert!(!cli.debug);
        assert!(!cli.show_config);
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "qos-speedtest",
            "--host", "127.0.0.1",
            "--port", "9000",
            "--latency-url", "https://latency.example",
            "--download-url", "https://a.example/10MB.bin",
            "--download-url", "https://b.example/10MB.bin",
            "--upload-url", "https://echo.example/post",
            "--upload-size-mb", "3",
            "--fast-accept-mbps", "2.5",
            "--concurrent-probes",
            "--log-format", "compact",
            "--env-file", "/tmp/qos.env",
            "--no-color",
            "--verbose",
            "--debug",
            "--show-config",
        ]);

        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.latency_url.as_deref(), Some("https://latency.example"));
        assert_eq!(cli.download_url.len(), 2);
        assert_eq!(cli.download_url[1], "https://b.example/10MB.bin");
        assert_eq!(cli.upload_url.as_deref(), Some("https://echo.example/post"));
        assert_eq!(cli.upload_size_mb, Some(3));
        assert_eq!(cli.fast_accept_mbps, Some(2.5));
        assert!(cli.concurrent_probes);
        assert_eq!(cli.log_format, Some(LogFormat::Compact));
        assert_eq!(cli.env_file, Some(PathBuf::from("/tmp/qos.env")));
        assert!(cli.no_color);
        assert!(!cli.use_colors());
        assert!(cli.verbose);
        assert!(cli.debug);
        assert!(cli.show_config);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Cli::try_parse_from(["qos-speedtest", "--port", "70000"]).is_err());
        assert!(Cli::try_parse_from(["qos-speedtest", "--fast-accept-mbps", "-1"]).is_err());
        assert!(Cli::try_parse_from(["qos-speedtest", "--fast-accept-mbps", "fast"]).is_err());
        assert!(Cli::try_parse_from(["qos-speedtest", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn test_threshold_parsing() {
        assert_eq!(parse_threshold("0"), Ok(0.0));
        assert_eq!(parse_threshold("0.5"), Ok(0.5));
        assert!(parse_threshold("NaN").is_err());
        assert!(parse_threshold("inf").is_err());
    }
}
