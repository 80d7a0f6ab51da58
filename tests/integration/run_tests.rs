//! Integration tests for a full monitoring run
//!
//! These tests use wiremock to stand in for the search API and the webhook,
//! and a temporary directory for the state file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vin_watch::config::{
    load_config, BingConfig, Config, NotifyConfig, ProviderConfig, SearchConfig, SlackConfig,
};
use vin_watch::monitor::{run_once, NotificationStatus};
use vin_watch::storage::{JsonFileStore, StateStore};
use vin_watch::{BaselinePolicy, VinError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VIN_A: &str = "1HGCM82633A004352";
const VIN_B: &str = "JH4KA7561PC008269";

/// Creates a run configuration pointing at the mock server
fn create_test_config(server: &MockServer, state_path: &Path, vins: &[&str]) -> Config {
    Config {
        identifiers: vins.iter().map(|v| v.to_string()).collect(),
        state_path: state_path.to_path_buf(),
        baseline: BaselinePolicy::Alert,
        search: SearchConfig {
            providers: vec![ProviderConfig::Bing(BingConfig {
                api_key: "test-key".to_string(),
                endpoint: format!("{}/v7.0/search", server.uri()),
            })],
            max_results: 25,
            user_agent: "vin-watch-test/1.0".to_string(),
            timeout_secs: 5,
        },
        notify: NotifyConfig {
            email: None,
            slack: Some(SlackConfig {
                webhook_url: format!("{}/hooks/alert", server.uri()),
            }),
            timeout_secs: 5,
        },
    }
}

fn bing_body(urls: &[&str]) -> serde_json::Value {
    let value: Vec<_> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            serde_json::json!({
                "name": format!("Listing {}", i + 1),
                "url": url,
                "snippet": "2003 Honda Accord for sale",
            })
        })
        .collect();
    serde_json::json!({ "webPages": { "value": value } })
}

/// Mounts a Bing answer for one VIN
async fn mount_search(server: &MockServer, vin: &str, urls: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/v7.0/search"))
        .and(header("Ocp-Apim-Subscription-Key", "test-key"))
        .and(query_param("q", format!("\"{}\"", vin)))
        .respond_with(ResponseTemplate::new(200).set_body_json(bing_body(urls)))
        .mount(server)
        .await;
}

async fn mount_webhook(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/hooks/alert"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Bodies of every webhook call so far
async fn webhook_texts(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/hooks/alert")
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["text"].as_str().unwrap().to_string()
        })
        .collect()
}

fn state_file(dir: &TempDir) -> PathBuf {
    dir.path().join("state.json")
}

#[tokio::test]
async fn test_repeat_run_alerts_only_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(
        &server,
        VIN_A,
        &[
            "https://Cars.example.com/listing/42/?utm_source=feed",
            "https://cars.example.com/listing/42",
        ],
    )
    .await;
    mount_webhook(&server, 200).await;

    let config = create_test_config(&server, &state_file(&dir), &[VIN_A]);

    let first = run_once(config.clone()).await.unwrap();
    assert_eq!(
        first.new_urls(VIN_A),
        ["https://cars.example.com/listing/42".to_string()]
    );
    assert_eq!(
        first.notification,
        NotificationStatus::Delivered { channel: "slack" }
    );

    let second = run_once(config).await.unwrap();
    assert!(second.new_urls(VIN_A).is_empty());
    assert_eq!(second.notification, NotificationStatus::NotNeeded);

    let texts = webhook_texts(&server).await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains(VIN_A));
    assert!(texts[0].contains("https://cars.example.com/listing/42"));

    let state = JsonFileStore::new(state_file(&dir)).load().unwrap();
    assert!(state.contains(VIN_A, "https://cars.example.com/listing/42"));
    assert_eq!(state.url_count(), 1);
}

#[tokio::test]
async fn test_new_listing_is_alerted_alone() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_webhook(&server, 200).await;

    let config = create_test_config(&server, &state_file(&dir), &[VIN_A]);

    mount_search(&server, VIN_A, &["https://a.example.com/1"]).await;
    run_once(config.clone()).await.unwrap();

    server.reset().await;
    mount_webhook(&server, 200).await;
    mount_search(
        &server,
        VIN_A,
        &["https://a.example.com/1", "https://b.example.com/2"],
    )
    .await;

    let report = run_once(config).await.unwrap();
    assert_eq!(report.new_urls(VIN_A), ["https://b.example.com/2".to_string()]);

    let texts = webhook_texts(&server).await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("https://b.example.com/2"));
    assert!(!texts[0].contains("https://a.example.com/1"));
}

#[tokio::test]
async fn test_failed_search_does_not_block_other_vins() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/v7.0/search"))
        .and(query_param("q", format!("\"{}\"", VIN_A)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_search(&server, VIN_B, &["https://b.example.com/listing"]).await;
    mount_webhook(&server, 200).await;

    let config = create_test_config(&server, &state_file(&dir), &[VIN_A, VIN_B]);
    let report = run_once(config).await.unwrap();

    assert_eq!(report.failed().len(), 1);
    assert_eq!(report.failed()[0].identifier, VIN_A);
    assert_eq!(report.exit_code(), 0);

    let texts = webhook_texts(&server).await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains(VIN_B));
    assert!(!texts[0].contains(VIN_A));

    let state = JsonFileStore::new(state_file(&dir)).load().unwrap();
    assert!(!state.has_entry(VIN_A));
    assert!(state.contains(VIN_B, "https://b.example.com/listing"));
}

#[tokio::test]
async fn test_every_search_failing_exits_non_zero() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/v7.0/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let config = create_test_config(&server, &state_file(&dir), &[VIN_A, VIN_B]);
    let report = run_once(config).await.unwrap();

    assert!(report.all_failed());
    assert_eq!(report.exit_code(), 1);
    assert!(state_file(&dir).exists());
}

#[tokio::test]
async fn test_webhook_failure_realerts_next_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_search(&server, VIN_A, &["https://a.example.com/1"]).await;
    mount_webhook(&server, 500).await;

    let config = create_test_config(&server, &state_file(&dir), &[VIN_A]);
    let report = run_once(config.clone()).await.unwrap();
    assert!(matches!(
        report.notification,
        NotificationStatus::Failed { .. }
    ));

    let state = JsonFileStore::new(state_file(&dir)).load().unwrap();
    assert!(!state.contains(VIN_A, "https://a.example.com/1"));

    server.reset().await;
    mount_search(&server, VIN_A, &["https://a.example.com/1"]).await;
    mount_webhook(&server, 200).await;

    let report = run_once(config).await.unwrap();
    assert_eq!(report.new_urls(VIN_A), ["https://a.example.com/1".to_string()]);
    assert_eq!(webhook_texts(&server).await.len(), 1);
}

#[tokio::test]
async fn test_seed_baseline_stays_quiet() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_search(&server, VIN_A, &["https://a.example.com/1"]).await;
    mount_webhook(&server, 200).await;

    let mut config = create_test_config(&server, &state_file(&dir), &[VIN_A]);
    config.baseline = BaselinePolicy::Seed;

    let report = run_once(config).await.unwrap();
    assert_eq!(report.notification, NotificationStatus::NotNeeded);
    assert!(webhook_texts(&server).await.is_empty());

    let state = JsonFileStore::new(state_file(&dir)).load().unwrap();
    assert!(state.contains(VIN_A, "https://a.example.com/1"));
}

#[tokio::test]
async fn test_corrupt_state_aborts_before_searching() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(state_file(&dir), "{ not json").unwrap();
    mount_search(&server, VIN_A, &["https://a.example.com/1"]).await;

    let config = create_test_config(&server, &state_file(&dir), &[VIN_A]);
    let err = run_once(config).await.unwrap_err();

    assert!(matches!(err, VinError::Storage(_)));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(
        std::fs::read_to_string(state_file(&dir)).unwrap(),
        "{ not json"
    );
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_run_from_environment() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_search(&server, VIN_A, &["https://a.example.com/1"]).await;
    mount_webhook(&server, 200).await;

    let state = state_file(&dir);
    let env: HashMap<&str, String> = [
        ("VIN", VIN_A.to_string()),
        ("STATE_PATH", state.display().to_string()),
        ("BING_KEY", "test-key".to_string()),
        ("BING_ENDPOINT", format!("{}/v7.0/search", server.uri())),
        ("SLACK_WEBHOOK_URL", format!("{}/hooks/alert", server.uri())),
    ]
    .into_iter()
    .collect();

    let config = load_config(None, |key| env.get(key).cloned()).unwrap();
    let report = run_once(config).await.unwrap();

    assert_eq!(report.new_urls(VIN_A), ["https://a.example.com/1".to_string()]);
    assert_eq!(webhook_texts(&server).await.len(), 1);
    assert!(state.exists());
}

#[tokio::test]
async fn test_missing_vin_is_a_config_error() {
    let env: HashMap<&str, String> = [("BING_KEY", "test-key".to_string())]
        .into_iter()
        .collect();

    let err: VinError = load_config(None, |key| env.get(key).cloned())
        .unwrap_err()
        .into();
    assert_eq!(err.exit_code(), 2);
}
