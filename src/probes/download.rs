//! Download throughput against an ordered list of mirrors

use crate::{
    client::HttpClient,
    defaults::{DOWNLOAD_CHUNK_SIZE, MIN_MEASUREMENT_WINDOW},
    error::{AppError, Result},
    logging::ProbeLogger,
    models::ThroughputMeasurement,
    stats::throughput_mbps,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Streams from candidate mirrors in order until one is fast enough
pub struct DownloadProber {
    client: Arc<dyn HttpClient>,
    logger: ProbeLogger,
    fast_accept_mbps: f64,
    grace: Duration,
}

impl DownloadProber {
    pub fn new(client: Arc<dyn HttpClient>, logger: ProbeLogger, fast_accept_mbps: f64, grace: Duration) -> Self {
        Self {
            client,
            logger,
            fast_accept_mbps,
            grace,
        }
    }

    /// Measure download throughput with a budget of `duration` per mirror.
    ///
    /// The first mirror above the fast-accept threshold is returned with its
    /// own elapsed time. Otherwise the best figure seen is returned paired with
    /// `duration`, or zero when no mirror produced one. Never fails.
    pub async fn measure(&self, urls: &[String], duration: Duration) -> ThroughputMeasurement {
        let mut best: Option<ThroughputMeasurement> = None;

        for url in urls {
            match self.probe_candidate(url, duration).await {
                Ok(Some(measurement)) => {
                    let accepted = self.is_fast(measurement.mbps);
                    self.logger.candidate_result(&measurement, accepted).log().await;

                    if accepted {
                        self.logger.throughput("download", &measurement).log().await;
                        return measurement;
                    }

                    if best.as_ref().map_or(true, |b| measurement.mbps > b.mbps) {
                        best = Some(measurement);
                    }
                }
                Ok(None) => {
                    self.logger
                        .logger()
                        .debug(&format!(
                            "Download mirror {} finished under the {}s minimum window",
                            url,
                            MIN_MEASUREMENT_WINDOW.as_secs()
                        ))
                        .field("url", url)
                        .log()
                        .await;
                }
                Err(e) => {
                    self.logger.candidate_failure(url, e.detail()).log().await;
                }
            }
        }

        let result = match best {
            Some(best) => ThroughputMeasurement { duration, ..best },
            None => ThroughputMeasurement::none(duration),
        };
        self.logger.throughput("download", &result).log().await;
        result
    }

    /// Strictly above the threshold; a rate equal to it keeps searching
    fn is_fast(&self, mbps: f64) -> bool {
        mbps > self.fast_accept_mbps
    }

    /// Stream one mirror until it ends or the budget runs out.
    ///
    /// Returns `None` when the window was shorter than the minimum or no bytes
    /// arrived.
    async fn probe_candidate(&self, url: &str, duration: Duration) -> Result<Option<ThroughputMeasurement>> {
        let start = Instant::now();
        let response = self.client.get_stream(url, duration + self.grace).await?;

        if response.status_code != 200 {
            return Err(AppError::http_request(format!("unexpected status {}", response.status_code)));
        }

        let mut body = response.body;
        let mut bytes: u64 = 0;

        'stream: while let Some(frame) = body.next().await {
            let mut remaining = frame?;
            while remaining > 0 {
                let chunk = remaining.min(DOWNLOAD_CHUNK_SIZE);
                bytes += chunk as u64;
                remaining -= chunk;

                if start.elapsed() >= duration {
                    break 'stream;
                }
            }
        }

        let elapsed = start.elapsed();
        if elapsed < MIN_MEASUREMENT_WINDOW || bytes == 0 {
            return Ok(None);
        }

        Ok(Some(ThroughputMeasurement::new(
            throughput_mbps(bytes, elapsed),
            elapsed,
            bytes,
            url,
        )))
    }
}
