//! End-to-end tests of the HTTP API
//!
//! The real router is served on an ephemeral port and queried with reqwest.
//! Outbound traffic goes to wiremock servers or to a closed local port.

use async_trait::async_trait;
use qos_speedtest::{
    api::{router, AppState},
    logging::{ErrorEventLogger, Logger, ProbeLogger},
    service::{SpeedTestService, SpeedTester},
    AppError, Config, DownloadResult, LatencyResult, MeasurementResult, Result, UploadResult,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Serve `service` on 127.0.0.1 and return the base URL
async fn spawn_app(service: Arc<dyn SpeedTestService>) -> String {
    let config = Config::default();
    let state = AppState::new(
        service,
        Logger::with_config("API".to_string(), &config),
        ErrorEventLogger::from_config(&config),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    format!("http://{}", address)
}

fn real_service(config: Config) -> Arc<dyn SpeedTestService> {
    let logger = ProbeLogger::from_config(&config);
    Arc::new(SpeedTester::new(Arc::new(config), logger))
}

async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", address)
}

async fn offline_config() -> Config {
    let dead = closed_port_url().await;
    let mut config = Config::default();
    config.latency_url = dead.clone();
    config.download_urls = vec![dead.clone()];
    config.upload_url = dead;
    config.latency_only_samples = 2;
    config.full_download_seconds = 2;
    config.latency_timeout_seconds = 1;
    config.connect_timeout_seconds = 1;
    config
}

async fn get_json(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

fn assert_keys(body: &Value, keys: &[&str]) {
    let object = body.as_object().expect("JSON object");
    assert_eq!(object.len(), keys.len(), "unexpected keys in {}", body);
    for key in keys {
        assert!(object.contains_key(*key), "missing '{}' in {}", key, body);
    }
}

/// Service that must never be reached
struct UnreachableService;

#[async_trait]
impl SpeedTestService for UnreachableService {
    async fn full_test(&self, _: &str) -> Result<MeasurementResult> {
        Err(AppError::internal("full test should not run"))
    }
    async fn quick_test(&self, _: &str) -> Result<MeasurementResult> {
        Err(AppError::internal("quick test should not run"))
    }
    async fn download_only(&self, _: &str) -> Result<DownloadResult> {
        Err(AppError::internal("download test should not run"))
    }
    async fn upload_only(&self, _: &str) -> Result<UploadResult> {
        Err(AppError::internal("upload test should not run"))
    }
    async fn latency_only(&self, _: &str) -> Result<LatencyResult> {
        Err(AppError::internal("latency test should not run"))
    }
}

#[tokio::test]
async fn test_health_has_no_network_dependency() {
    let base = spawn_app(Arc::new(UnreachableService)).await;

    let (status, body) = get_json(&format!("{}/health", base)).await;

    assert_eq!(status, 200);
    assert_eq!(body, serde_json::json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_root_describes_service() {
    let base = spawn_app(Arc::new(UnreachableService)).await;

    let (status, body) = get_json(&format!("{}/", base)).await;

    assert_eq!(status, 200);
    assert_eq!(body["message"], "QoS Network Monitoring API");
    assert_eq!(body["status"], "active");
    assert_eq!(body["version"], qos_speedtest::VERSION);
}

#[tokio::test]
async fn test_service_errors_become_500_with_detail() {
    let base = spawn_app(Arc::new(UnreachableService)).await;

    let (status, body) = get_json(&format!("{}/api/v1/speed-test/latency", base)).await;

    assert_eq!(status, 500);
    assert_eq!(body, serde_json::json!({"detail": "latency test should not run"}));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let base = spawn_app(Arc::new(UnreachableService)).await;

    let response = reqwest::Client::new()
        .get(format!("{}/health", base))
        .header("Origin", "https://dashboard.example")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_quick_test_reports_zero_upload() {
    let mirror = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&mirror)
        .await;
    Mock::given(method("GET"))
        .and(path("/file"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0u8; 1024 * 1024])
                .set_delay(Duration::from_millis(1_100)),
        )
        .mount(&mirror)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mirror)
        .await;

    let mut config = Config::default();
    config.latency_url = format!("{}/ping", mirror.uri());
    config.download_urls = vec![format!("{}/file", mirror.uri())];
    config.upload_url = format!("{}/post", mirror.uri());
    config.quick_download_seconds = 3;
    let base = spawn_app(real_service(config)).await;

    let (status, body) = get_json(&format!("{}/api/v1/speed-test/quick", base)).await;

    assert_eq!(status, 200);
    assert_keys(&body, &["download_speed", "upload_speed", "latency", "jitter", "timestamp", "test_duration"]);
    assert_eq!(body["upload_speed"].as_f64(), Some(0.0));
    assert!(body["download_speed"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_latency_degrades_to_zero_offline() {
    let base = spawn_app(real_service(offline_config().await)).await;

    let (status, body) = get_json(&format!("{}/api/v1/speed-test/latency", base)).await;

    assert_eq!(status, 200);
    assert_keys(&body, &["latency", "jitter", "timestamp"]);
    assert_eq!(body["latency"].as_f64(), Some(0.0));
    assert_eq!(body["jitter"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_download_degrades_to_zero_offline() {
    let base = spawn_app(real_service(offline_config().await)).await;

    let (status, body) = get_json(&format!("{}/api/v1/speed-test/download", base)).await;

    assert_eq!(status, 200);
    assert_keys(&body, &["download_speed", "test_duration", "timestamp"]);
    assert_eq!(body["download_speed"].as_f64(), Some(0.0));
    assert_eq!(body["test_duration"].as_f64(), Some(2.0));
}

#[tokio::test]
async fn test_upload_fails_offline() {
    let base = spawn_app(real_service(offline_config().await)).await;

    let (status, body) = get_json(&format!("{}/api/v1/speed-test/upload", base)).await;

    assert_eq!(status, 500);
    assert_keys(&body, &["detail"]);
    assert!(body["detail"].as_str().unwrap().starts_with("Upload test failed"));
}

#[tokio::test]
async fn test_full_test_fails_when_upload_fails() {
    let base = spawn_app(real_service(offline_config().await)).await;

    let (status, body) = get_json(&format!("{}/api/v1/speed-test", base)).await;

    assert_eq!(status, 500);
    assert!(body["detail"].as_str().unwrap().starts_with("Upload test failed"));
}
