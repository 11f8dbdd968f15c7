//! QoS Speed Test Service - HTTP server entry point
//!
//! Serves download, upload and latency measurements of the host's network
//! connection over a small JSON API.

use clap::Parser;
use qos_speedtest::{
    cli::Cli,
    config::{display_config_summary, validate_config, ConfigParser, EnvManager},
    error::{AppError, Result},
    logging::{LogLevel, LoggerFactory},
    server::run_server,
    BUILD_TIME, GIT_COMMIT, PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    let cli = Cli::parse();
    let use_color = cli.use_colors();

    if let Err(e) = run_application(cli).await {
        eprintln!("{}", e.format_for_console(use_color));
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

async fn run_application(cli: Cli) -> Result<()> {
    if cli.env_help {
        println!("{}", EnvManager::display_env_help());
        for warning in EnvManager::validate_current_env()? {
            println!("{}", warning);
        }
        return Ok(());
    }

    let parser = ConfigParser::new(cli.clone());
    let env_file = parser.env_file_path();
    let env_file_warnings = if cli.debug {
        EnvManager::check_env_file(&env_file)?
    } else {
        None
    };

    let (config, loaded_env_file) = parser.parse_with_source()?;
    let warnings = validate_config(&config)?;

    if cli.show_config {
        println!("{} v{}", PKG_NAME, VERSION);
        println!("{}", display_config_summary(&config));
        if !warnings.is_empty() {
            println!("\nConfiguration Warnings:");
            for warning in &warnings {
                println!("  {}", warning.format(config.enable_color));
            }
        }
        return Ok(());
    }

    let factory = LoggerFactory::new(config.clone());
    let logger = factory.create_logger("MAIN").await;

    logger
        .info(&format!("{} v{} starting", PKG_NAME, VERSION))
        .field("session_id", factory.session_id())
        .field("build_time", BUILD_TIME)
        .field("git_commit", GIT_COMMIT)
        .log()
        .await;

    match &loaded_env_file {
        Some(path) => {
            logger
                .debug(&format!("Loaded configuration from {}", path.display()))
                .field("env_file", path.display().to_string())
                .log()
                .await
        }
        None => {
            logger
                .debug("No .env file found, using defaults and CLI arguments")
                .field("env_file", env_file.display().to_string())
                .log()
                .await
        }
    }

    logger
        .debug("Applied CLI overrides to configuration")
        .field("bind", format!("{}:{}", config.host, config.port))
        .field("download_urls", config.download_urls.len())
        .field("concurrent_probes", config.concurrent_probes)
        .log()
        .await;

    if logger.would_log(LogLevel::Debug) {
        for line in display_config_summary(&config).lines().filter(|l| !l.trim().is_empty()) {
            logger.debug(line.trim()).log().await;
        }
    }

    for warning in &warnings {
        logger
            .warn(&warning.message)
            .field("level", warning.level.as_str())
            .log()
            .await;
    }

    for warning in env_file_warnings.unwrap_or_default() {
        logger
            .warn(&warning)
            .field("env_file", env_file.display().to_string())
            .log()
            .await;
    }

    run_server(config, &factory).await
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Run with --env-help to list supported variables");
            eprintln!("  - URLs must start with http:// or https://");
            eprintln!("  - Check your .env file format");
        }
        AppError::Network(_) => {
            eprintln!();
            eprintln!("Network troubleshooting:");
            eprintln!("  - Check that the port is free");
            eprintln!("  - Binding to ports below 1024 may need extra privileges");
        }
        _ => {}
    }
}
