//! Listener setup and graceful shutdown

use crate::{
    api::{self, AppState},
    error::{AppError, ErrorContext, Result},
    logging::LoggerFactory,
    models::Config,
    service::{SpeedTestService, SpeedTester},
};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Build the production router state from a validated configuration
pub async fn build_state(config: Config, factory: &LoggerFactory) -> AppState {
    let probe_logger = factory.create_probe_logger().await;
    let service: Arc<dyn SpeedTestService> = Arc::new(SpeedTester::new(Arc::new(config), probe_logger));

    AppState::new(
        service,
        factory.create_logger("API").await,
        factory.create_error_logger().await,
    )
}

/// Bind the configured address and serve until Ctrl-C or SIGTERM
pub async fn run_server(config: Config, factory: &LoggerFactory) -> Result<()> {
    let address = config.bind_address()?;
    let logger = factory.create_logger("SERVER").await;

    let listener = TcpListener::bind(address)
        .await
        .map_err(|e| AppError::network(format!("Failed to bind {}: {}", address, e)))?;

    let app = api::router(build_state(config, factory).await);

    logger
        .info(&format!("Listening on http://{}", address))
        .field("address", address.to_string())
        .log()
        .await;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated")?;

    logger.info("Server stopped").log().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        // Without a handler only SIGTERM can stop the server
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
