//! Upload throughput against an echo endpoint

use crate::{
    client::HttpClient,
    defaults::BYTES_PER_MB,
    error::{AppError, Result},
    logging::ProbeLogger,
    models::ThroughputMeasurement,
    stats::{duration_ms, throughput_mbps},
};
use std::sync::Arc;
use std::time::Duration;

/// POSTs a synthetic payload and times the exchange
pub struct UploadProber {
    client: Arc<dyn HttpClient>,
    logger: ProbeLogger,
    timeout: Duration,
}

impl UploadProber {
    pub fn new(client: Arc<dyn HttpClient>, logger: ProbeLogger, timeout: Duration) -> Self {
        Self {
            client,
            logger,
            timeout,
        }
    }

    /// Upload `size_mb` MB to `url`. Any failure is fatal to the measurement and
    /// reported as `Upload test failed: <cause>`.
    pub async fn measure(&self, url: &str, size_mb: u32) -> Result<ThroughputMeasurement> {
        let measurement = self
            .try_measure(url, size_mb)
            .await
            .map_err(|e| e.with_detail_prefix("Upload test failed"))?;

        self.logger.throughput("upload", &measurement).log().await;
        Ok(measurement)
    }

    async fn try_measure(&self, url: &str, size_mb: u32) -> Result<ThroughputMeasurement> {
        if size_mb == 0 {
            return Err(AppError::measurement("payload size must be greater than 0"));
        }

        let payload = vec![b'0'; size_mb as usize * BYTES_PER_MB];
        let bytes = payload.len() as u64;

        let response = self.client.post(url, payload, self.timeout).await?;
        self.logger
            .http_request(url, "POST", Some(response.status_code), duration_ms(response.elapsed))
            .log()
            .await;

        if !response.is_success() {
            return Err(AppError::http_request(format!(
                "echo endpoint returned status {}",
                response.status_code
            )));
        }

        if response.elapsed.is_zero() {
            return Err(AppError::measurement("elapsed time was zero"));
        }

        Ok(ThroughputMeasurement::new(
            throughput_mbps(bytes, response.elapsed),
            response.elapsed,
            bytes,
            url,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::integration_tests::{unreachable_url, MockHttpServer};
    use crate::client::ProbeClient;
    use crate::models::Config;

    fn prober() -> UploadProber {
        let client = ProbeClient::new(Duration::from_secs(2)).unwrap();
        UploadProber::new(
            Arc::new(client),
            ProbeLogger::from_config(&Config::default()),
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn test_elapsed_scales_with_payload_size() {
        let mock_server = MockHttpServer::new().await;
        // Simulated link of 10 MB/s
        mock_server.mock_upload("/post", 10 * 1024 * 1024).await;
        let url = mock_server.url_for("/post");

        let small = prober().measure(&url, 1).await.unwrap();
        let large = prober().measure(&url, 4).await.unwrap();

        assert_eq!(small.bytes_transferred, BYTES_PER_MB as u64);
        assert_eq!(large.bytes_transferred, 4 * BYTES_PER_MB as u64);
        assert_eq!(mock_server.last_upload_size().await, Some(4 * BYTES_PER_MB));
        assert!(large.duration > small.duration * 2);
        assert!(small.mbps > 0.0);
        assert_eq!(large.source_url.as_deref(), Some(url.as_str()));
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal() {
        let url = unreachable_url().await;

        let error = prober().measure(&url, 1).await.unwrap_err();

        assert!(error.detail().starts_with("Upload test failed: "));
    }

    #[tokio::test]
    async fn test_error_status_is_fatal() {
        let mock_server = MockHttpServer::new().await;
        mock_server.mock_upload_status("/post", 500).await;

        let error = prober().measure(&mock_server.url_for("/post"), 1).await.unwrap_err();

        assert_eq!(error.detail(), "Upload test failed: echo endpoint returned status 500");
    }

    #[tokio::test]
    async fn test_zero_size_is_rejected() {
        let mock_server = MockHttpServer::new().await;
        mock_server.mock_upload("/post", 10 * 1024 * 1024).await;

        let error = prober().measure(&mock_server.url_for("/post"), 0).await.unwrap_err();

        assert!(matches!(error, AppError::Measurement(_)));
        assert_eq!(mock_server.request_count().await, 0);
    }
}
