//! End-to-end tests for the HTTP server.
//!
//! These tests spawn the server binary against `example/provider.yaml` and
//! make HTTP requests to verify resolution, auth and caching headers.

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use reqwest::{StatusCode, header};

/// Find an available port for testing
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to address")
        .local_addr()
        .expect("Failed to get local address")
        .port()
}

fn provider_file() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("example/provider.yaml")
}

fn spawn_server(port: u16) -> Child {
    Command::new(env!("CARGO_BIN_EXE_server"))
        .args([
            "--config",
            provider_file().to_str().unwrap(),
            "--port",
            &port.to_string(),
        ])
        .env_remove("OTEL_EXPORTER_OTLP_ENDPOINT")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for the server to be ready
async fn wait_for_server(port: u16, timeout: Duration) -> bool {
    let start = std::time::Instant::now();
    let client = reqwest::Client::new();

    while start.elapsed() < timeout {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/healthz", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

struct TestServer {
    port: u16,
    process: Child,
}

impl TestServer {
    async fn new() -> Self {
        let port = find_available_port();
        let process = spawn_server(port);

        if !wait_for_server(port, Duration::from_secs(30)).await {
            panic!("Server failed to start within timeout");
        }

        Self { port, process }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

#[tokio::test]
async fn test_server_health_check() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/api/v1/healthz"))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_config_requires_api_key() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/api/v1/config"))
        .header("X-Goma-Meta-Env", "prod")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(server.url("/api/v1/config"))
        .header("X-Goma-Meta-Env", "prod")
        .header("X-API-Key", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_config_resolved_from_headers() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/api/v1/config"))
        .header("X-Goma-Meta-Env", "prod")
        .header("X-API-Key", "prod-key")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let etag = response.headers()[header::ETAG].to_str().unwrap().to_string();
    assert!(etag.starts_with('"') && etag.ends_with('"'));
    let cache_control = response.headers()[header::CACHE_CONTROL].to_str().unwrap();
    assert!(cache_control.contains("max-age="));
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["version"], "1.0");
    assert_eq!(body["routes"].as_array().unwrap().len(), 2);
    assert_eq!(body["middlewares"][0]["name"], "rate-limit");
    assert_eq!(body["metadata"]["env"], "prod");
    assert_eq!(format!("\"{}\"", body["checksum"].as_str().unwrap()), etag);
}

#[tokio::test]
async fn test_conditional_request_returns_not_modified() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let first = client
        .get(server.url("/api/v1/config"))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let etag = first.headers()[header::ETAG].clone();

    let second = client
        .get(server.url("/api/v1/config"))
        .header(header::IF_NONE_MATCH, etag.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(second.headers()[header::ETAG], etag);

    let stale = client
        .get(server.url("/api/v1/config"))
        .header(header::IF_NONE_MATCH, "\"outdated\"")
        .send()
        .await
        .unwrap();
    assert_eq!(stale.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_query_metadata_with_basic_auth_as_yaml() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/api/v1/config?env=staging"))
        .basic_auth("admin", Some("secret"))
        .header(header::ACCEPT, "application/yaml")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/yaml"
    );
    let body = response.text().await.unwrap();
    assert!(body.contains("routes:"));
    assert!(body.contains("basic-auth"));

    let response = client
        .get(server.url("/api/v1/config?env=staging"))
        .basic_auth("admin", Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unmatched_metadata_serves_default() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/api/v1/config"))
        .header("X-Goma-Meta-Env", "dev")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["routes"][0]["name"], "maintenance");
}

#[tokio::test]
async fn test_stats_and_reload() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let stats: serde_json::Value = client
        .get(server.url("/api/v1/config/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["configsLoaded"], 4);
    assert_eq!(stats["generation"], 1);

    let response = client
        .get(server.url("/api/v1/config/reload"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "reloaded");
    assert_eq!(body["generation"], 2);
}

#[tokio::test]
async fn test_server_metrics_endpoint() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    client
        .get(server.url("/api/v1/config"))
        .send()
        .await
        .unwrap();

    let response = client
        .get(server.url("/metrics"))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(body.contains("config_resolutions_total"));
    assert!(body.contains("http_requests_total"));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/api/v1/nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
