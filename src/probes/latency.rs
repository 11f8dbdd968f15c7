//! Round-trip latency and jitter sampling

use crate::{
    client::HttpClient,
    logging::ProbeLogger,
    models::LatencyMeasurement,
    stats::{duration_ms, LatencySummary},
};
use std::sync::Arc;
use std::time::Duration;

/// Times repeated small GETs against one endpoint
pub struct LatencySampler {
    client: Arc<dyn HttpClient>,
    logger: ProbeLogger,
    timeout: Duration,
}

impl LatencySampler {
    pub fn new(client: Arc<dyn HttpClient>, logger: ProbeLogger, timeout: Duration) -> Self {
        Self {
            client,
            logger,
            timeout,
        }
    }

    /// Take `count` sequential samples of `url`.
    ///
    /// A sample counts once the response body has been read, whatever the
    /// status. Failed or timed-out samples are skipped, not retried. Never fails:
    /// when nothing succeeds the result is zero latency and zero jitter.
    pub async fn measure(&self, url: &str, count: u32) -> LatencyMeasurement {
        let mut summary = LatencySummary::with_capacity(count as usize);

        for sample in 1..=count {
            match self.client.get(url, self.timeout).await {
                Ok(response) => {
                    self.logger
                        .http_request(url, "GET", Some(response.status_code), duration_ms(response.elapsed))
                        .log()
                        .await;
                    summary.record_success(response.elapsed);
                }
                Err(e) => {
                    self.logger.sample_failure(url, sample, e.detail()).log().await;
                    summary.record_failure();
                }
            }
        }

        let measurement = LatencyMeasurement {
            latency_ms: summary.mean_ms(),
            jitter_ms: summary.jitter_ms(),
            successful_samples: summary.successful(),
            attempted_samples: summary.attempted(),
        };

        self.logger
            .latency_summary(url, &measurement)
            .field("samples_ms", summary.samples_ms())
            .log()
            .await;
        measurement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::integration_tests::{unreachable_url, MockHttpServer};
    use crate::client::ProbeClient;
    use crate::models::Config;

    fn sampler(timeout: Duration) -> LatencySampler {
        let client = ProbeClient::new(Duration::from_secs(2)).unwrap();
        LatencySampler::new(Arc::new(client), ProbeLogger::from_config(&Config::default()), timeout)
    }

    #[tokio::test]
    async fn test_jitter_is_sample_std_dev_of_round_trips() {
        let mock_server = MockHttpServer::new().await;
        mock_server
            .mock_delay_sequence("/ping", vec![Duration::from_millis(20), Duration::from_millis(120)])
            .await;

        let result = sampler(Duration::from_secs(5)).measure(&mock_server.url_for("/ping"), 4).await;

        assert_eq!(result.successful_samples, 4);
        assert_eq!(result.attempted_samples, 4);
        assert!(result.latency_ms >= 70.0);
        // Alternating 20/120 ms gives a sample std-dev of about 57.7 ms
        assert!(result.jitter_ms > 30.0, "jitter was {}", result.jitter_ms);
        assert!(result.jitter_ms < 90.0, "jitter was {}", result.jitter_ms);
    }

    #[tokio::test]
    async fn test_failed_samples_are_skipped() {
        let mock_server = MockHttpServer::new().await;
        mock_server
            .mock_delay_sequence("/ping", vec![Duration::from_millis(10), Duration::from_secs(2)])
            .await;

        let result = sampler(Duration::from_millis(300))
            .measure(&mock_server.url_for("/ping"), 4)
            .await;

        assert_eq!(result.attempted_samples, 4);
        assert_eq!(result.successful_samples, 2);
        assert!(result.latency_ms > 0.0);
        assert!(result.latency_ms < 300.0);
    }

    #[tokio::test]
    async fn test_all_samples_failing_yields_zeroes() {
        let url = unreachable_url().await;

        let result = sampler(Duration::from_secs(1)).measure(&url, 3).await;

        assert_eq!(result.latency_ms, 0.0);
        assert_eq!(result.jitter_ms, 0.0);
        assert_eq!(result.successful_samples, 0);
        assert_eq!(result.attempted_samples, 3);
    }

    #[tokio::test]
    async fn test_single_success_has_zero_jitter() {
        let mock_server = MockHttpServer::new().await;
        mock_server.mock_success("/ping", Some(30)).await;

        let result = sampler(Duration::from_secs(5)).measure(&mock_server.url_for("/ping"), 1).await;

        assert_eq!(result.successful_samples, 1);
        assert!(result.latency_ms >= 30.0);
        assert_eq!(result.jitter_ms, 0.0);
    }

    #[tokio::test]
    async fn test_error_status_still_counts_as_round_trip() {
        let mock_server = MockHttpServer::new().await;
        mock_server.mock_error("/ping", 404).await;

        let result = sampler(Duration::from_secs(5)).measure(&mock_server.url_for("/ping"), 3).await;

        assert_eq!(result.successful_samples, 3);
        assert!(result.latency_ms > 0.0);
    }
}
