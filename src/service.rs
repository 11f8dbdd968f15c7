//! Speed test orchestration
//!
//! Each invocation builds its own HTTP client, runs the probes its mode needs
//! and converts the raw measurements into the rounded API results.

use crate::{
    client::{ClientFactory, HttpClient},
    error::{AppError, Result},
    logging::ProbeLogger,
    models::{
        Config, DownloadResult, LatencyMeasurement, LatencyResult, MeasurementResult,
        ThroughputMeasurement, UploadResult,
    },
    probes::{DownloadProber, LatencySampler, UploadProber},
    types::TestMode,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The five measurement operations exposed over HTTP
#[async_trait]
pub trait SpeedTestService: Send + Sync {
    /// Latency, download and upload. An upload failure fails the whole test.
    async fn full_test(&self, correlation_id: &str) -> Result<MeasurementResult>;

    /// Latency and a shorter download; `upload_speed` is always 0.
    async fn quick_test(&self, correlation_id: &str) -> Result<MeasurementResult>;

    async fn download_only(&self, correlation_id: &str) -> Result<DownloadResult>;

    async fn upload_only(&self, correlation_id: &str) -> Result<UploadResult>;

    async fn latency_only(&self, correlation_id: &str) -> Result<LatencyResult>;
}

/// Probes wired up for a single test invocation
struct ProbeSet {
    latency: LatencySampler,
    download: DownloadProber,
    upload: UploadProber,
}

/// Production implementation backed by real outbound HTTP
pub struct SpeedTester {
    config: Arc<Config>,
    factory: ClientFactory,
    logger: ProbeLogger,
}

impl SpeedTester {
    pub fn new(config: Arc<Config>, logger: ProbeLogger) -> Self {
        let factory = ClientFactory::new(&config);
        Self {
            config,
            factory,
            logger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn probes(&self, correlation_id: &str) -> Result<ProbeSet> {
        let client: Arc<dyn HttpClient> = Arc::new(self.factory.create_probe_client()?);
        let logger = self.logger.with_correlation_id(correlation_id);

        Ok(ProbeSet {
            latency: LatencySampler::new(client.clone(), logger.clone(), self.config.latency_timeout()),
            download: DownloadProber::new(
                client.clone(),
                logger.clone(),
                self.config.fast_accept_mbps,
                self.config.download_grace(),
            ),
            upload: UploadProber::new(client, logger, self.config.upload_timeout()),
        })
    }

    async fn log_start(&self, mode: TestMode, correlation_id: &str) {
        self.logger
            .logger()
            .info(&format!("Starting {} speed test", mode))
            .correlation_id(correlation_id)
            .field("mode", mode.name())
            .field("concurrent", self.config.concurrent_probes)
            .log()
            .await;
    }

    fn latency_samples(&self, mode: TestMode) -> u32 {
        match mode {
            TestMode::Quick => self.config.quick_latency_samples,
            TestMode::LatencyOnly => self.config.latency_only_samples,
            _ => self.config.full_latency_samples,
        }
    }

    fn download_duration(&self, mode: TestMode) -> Duration {
        match mode {
            TestMode::Quick => self.config.quick_download_duration(),
            _ => self.config.full_download_duration(),
        }
    }

    /// Run the probes `mode` selects, joined when `concurrent_probes` is set.
    /// Only an upload failure is an error.
    async fn run_mode(&self, mode: TestMode, correlation_id: &str) -> Result<ModeRun> {
        self.log_start(mode, correlation_id).await;
        let start = Instant::now();
        let probes = self.probes(correlation_id)?;
        let config = &self.config;

        let latency = async {
            if mode.runs_latency() {
                Some(probes.latency.measure(&config.latency_url, self.latency_samples(mode)).await)
            } else {
                None
            }
        };
        let download = async {
            if mode.runs_download() {
                Some(probes.download.measure(&config.download_urls, self.download_duration(mode)).await)
            } else {
                None
            }
        };
        let upload = async {
            if mode.runs_upload() {
                probes.upload.measure(&config.upload_url, config.upload_size_mb).await.map(Some)
            } else {
                Ok(None)
            }
        };

        let (latency, download, upload) = if config.concurrent_probes {
            tokio::join!(latency, download, upload)
        } else {
            (latency.await, download.await, upload.await)
        };

        Ok(ModeRun {
            latency,
            download,
            upload: upload?,
            elapsed: start.elapsed(),
        })
    }
}

/// Raw measurements of one invocation; probes the mode skipped stay `None`
struct ModeRun {
    latency: Option<LatencyMeasurement>,
    download: Option<ThroughputMeasurement>,
    upload: Option<ThroughputMeasurement>,
    elapsed: Duration,
}

impl ModeRun {
    fn latency(&self) -> LatencyMeasurement {
        self.latency.unwrap_or_default()
    }

    fn download(&self) -> ThroughputMeasurement {
        self.download
            .clone()
            .unwrap_or_else(|| ThroughputMeasurement::none(Duration::ZERO))
    }

    fn measurement_result(&self) -> MeasurementResult {
        MeasurementResult::new(&self.latency(), &self.download(), self.upload.as_ref(), self.elapsed)
    }
}

#[async_trait]
impl SpeedTestService for SpeedTester {
    async fn full_test(&self, correlation_id: &str) -> Result<MeasurementResult> {
        let run = self.run_mode(TestMode::Full, correlation_id).await?;
        Ok(run.measurement_result())
    }

    async fn quick_test(&self, correlation_id: &str) -> Result<MeasurementResult> {
        let run = self.run_mode(TestMode::Quick, correlation_id).await?;
        Ok(run.measurement_result())
    }

    async fn download_only(&self, correlation_id: &str) -> Result<DownloadResult> {
        let run = self.run_mode(TestMode::DownloadOnly, correlation_id).await?;
        Ok(DownloadResult::from(&run.download()))
    }

    async fn upload_only(&self, correlation_id: &str) -> Result<UploadResult> {
        let run = self.run_mode(TestMode::UploadOnly, correlation_id).await?;
        let upload = run
            .upload
            .ok_or_else(|| AppError::internal("upload probe did not run"))?;
        Ok(UploadResult::from(&upload))
    }

    async fn latency_only(&self, correlation_id: &str) -> Result<LatencyResult> {
        let run = self.run_mode(TestMode::LatencyOnly, correlation_id).await?;
        Ok(LatencyResult::from(&run.latency()))
    }
}
