//! HTTP client used by the probes


use crate::{
    error::{AppError, Result},
    models::Config,
};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, Url};
use std::time::{Duration, Instant};

/// User agent sent with every probe request
pub const USER_AGENT: &str = concat!("qos-speedtest/", env!("CARGO_PKG_VERSION"));

/// HTTP client trait for abstraction and testing
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL and read the whole body
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse>;

    /// GET a URL and hand back the body as a stream of frame sizes
    async fn get_stream(&self, url: &str, timeout: Duration) -> Result<StreamingResponse>;

    /// POST an opaque payload and read the whole response body
    async fn post(&self, url: &str, body: Vec<u8>, timeout: Duration) -> Result<HttpResponse>;
}

/// Completed exchange with its wall-clock time
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body_size: usize,
    /// From just before the request was sent to just after the body was read
    pub elapsed: Duration,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Response whose body has not been read yet
pub struct StreamingResponse {
    pub status_code: u16,
    /// Sizes of the body frames as they arrive
    pub body: BoxStream<'static, Result<usize>>,
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status_code", &self.status_code)
            .finish_non_exhaustive()
    }
}

/// reqwest-backed client for probe traffic
#[derive(Debug, Clone)]
pub struct ProbeClient {
    client: Client,
}

impl ProbeClient {
    /// Create a client with the given connect timeout. Total timeouts are set per request.
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ProbeClient {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        let start = Instant::now();
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status_code = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status_code,
            body_size: body.len(),
            elapsed: start.elapsed(),
        })
    }

    async fn get_stream(&self, url: &str, timeout: Duration) -> Result<StreamingResponse> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status_code = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|frame| frame.map(|bytes| bytes.len()).map_err(AppError::from))
            .boxed();

        Ok(StreamingResponse { status_code, body })
    }

    async fn post(&self, url: &str, body: Vec<u8>, timeout: Duration) -> Result<HttpResponse> {
        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .timeout(timeout)
            .send()
            .await?;
        let status_code = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status_code,
            body_size: body.len(),
            elapsed: start.elapsed(),
        })
    }
}

/// HTTP client factory; every test run gets a fresh client and connection pool
#[derive(Debug, Clone)]
pub struct ClientFactory {
    connect_timeout: Duration,
}

impl ClientFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn create_probe_client(&self) -> Result<ProbeClient> {
        ProbeClient::new(self.connect_timeout)
    }
}

/// Utility functions for HTTP operations
pub struct HttpUtils;

impl HttpUtils {
    /// Validate that a URL is absolute http(s) with a host
    pub fn validate_url(url: &str) -> Result<()> {
        let parsed = Url::parse(url).map_err(|e| AppError::validation(format!("Invalid URL format: {}", e)))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => return Err(AppError::validation(format!("Unsupported URL scheme: {}", scheme))),
        }

        if parsed.host().is_none() {
            return Err(AppError::validation("URL must have a host"));
        }

        Ok(())
    }

    /// Extract host from URL, for log fields
    pub fn extract_domain(url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| AppError::parse(format!("Invalid URL: {}", e)))?;

        parsed
            .host_str()
            .ok_or_else(|| AppError::validation("URL must have a host"))
            .map(|s| s.to_string())
    }

    pub fn is_https(url: &str) -> bool {
        url.starts_with("https://")
    }
}
