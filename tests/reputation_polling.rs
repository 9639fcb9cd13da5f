// Reputation lookup against a mock reputation service.

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use safe_surf::reputation::{
    url_id, ReputationLookup, ReputationSource, ReputationStats, VirusTotalClient,
};
use safe_surf::SignalType;

const URL: &str = "http://phish.test/login";

fn client(server: &MockServer, max_polls: usize) -> VirusTotalClient {
    VirusTotalClient::new(reqwest::Client::new(), "test-key")
        .with_base_url(server.uri())
        .with_polling(Duration::from_millis(10), max_polls)
}

fn stats_body(malicious: u32, suspicious: u32) -> serde_json::Value {
    json!({"malicious": malicious, "suspicious": suspicious, "harmless": 60, "undetected": 9})
}

async fn mount_cache_miss(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/urls/{}", url_id(URL))))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": {"code": "NotFoundError"}})))
        .mount(server)
        .await;
}

async fn mount_submission(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/urls"))
        .and(header("x-apikey", "test-key"))
        .and(body_string_contains("url=http"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"type": "analysis", "id": "an-1"}
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cached_result_skips_submission() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/urls/{}", url_id(URL))))
        .and(header("x-apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"attributes": {"last_analysis_stats": stats_body(3, 1)}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let scan = client(&server, 3).scan(URL, &CancellationToken::new()).await;
    assert_eq!(scan.source, ReputationSource::Cached);
    assert_eq!(scan.stats.malicious, 3);
    assert_eq!(scan.stats.suspicious, 1);
    assert_eq!(scan.degraded_signal(), None);
}

#[tokio::test]
async fn test_miss_submits_and_polls_until_completed() {
    let server = MockServer::start().await;
    mount_cache_miss(&server).await;
    mount_submission(&server).await;

    // First poll is still queued, the second completes
    Mock::given(method("GET"))
        .and(path("/analyses/an-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"attributes": {"status": "queued", "stats": stats_body(0, 0)}}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/analyses/an-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"attributes": {"status": "completed", "stats": stats_body(0, 2)}}
        })))
        .mount(&server)
        .await;

    let scan = client(&server, 5).scan(URL, &CancellationToken::new()).await;
    assert_eq!(scan.source, ReputationSource::Analysis);
    assert_eq!(scan.stats.suspicious, 2);
    assert_eq!(scan.stats.malicious, 0);
}

#[tokio::test]
async fn test_poll_budget_exhausted_yields_zeros() {
    let server = MockServer::start().await;
    mount_cache_miss(&server).await;
    mount_submission(&server).await;
    Mock::given(method("GET"))
        .and(path("/analyses/an-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"attributes": {"status": "queued", "stats": stats_body(7, 7)}}
        })))
        .expect(3)
        .mount(&server)
        .await;

    let scan = client(&server, 3).scan(URL, &CancellationToken::new()).await;
    assert_eq!(scan.source, ReputationSource::TimedOut);
    assert_eq!(scan.stats, ReputationStats::default());
    assert_eq!(scan.degraded_signal(), Some(SignalType::ReputationTimeout));
}

#[tokio::test]
async fn test_auth_failure_yields_zeros() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": "WrongCredentialsError"}
        })))
        .mount(&server)
        .await;

    let scan = client(&server, 3).scan(URL, &CancellationToken::new()).await;
    assert_eq!(scan.source, ReputationSource::Unavailable);
    assert_eq!(scan.stats.malicious, 0);
    assert_eq!(scan.stats.suspicious, 0);
    assert_eq!(scan.degraded_signal(), Some(SignalType::Reputation));
}

#[tokio::test]
async fn test_malformed_body_yields_zeros() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let scan = client(&server, 3).scan(URL, &CancellationToken::new()).await;
    assert_eq!(scan.source, ReputationSource::Unavailable);
    assert_eq!(scan.stats, ReputationStats::default());
}

#[tokio::test]
async fn test_unreachable_service_yields_zeros() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let scan = VirusTotalClient::new(reqwest::Client::new(), "test-key")
        .with_base_url(format!("http://{addr}"))
        .scan(URL, &CancellationToken::new())
        .await;
    assert_eq!(scan.source, ReputationSource::Unavailable);
}

#[tokio::test]
async fn test_cancellation_stops_polling() {
    let server = MockServer::start().await;
    mount_cache_miss(&server).await;
    mount_submission(&server).await;
    Mock::given(method("GET"))
        .and(path("/analyses/an-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"attributes": {"status": "queued"}}
        })))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    // A long interval and a large budget: only cancellation ends this quickly
    let client = VirusTotalClient::new(reqwest::Client::new(), "test-key")
        .with_base_url(server.uri())
        .with_polling(Duration::from_secs(30), 15);
    let started = std::time::Instant::now();
    let scan = client.scan(URL, &cancel).await;

    assert_eq!(scan.source, ReputationSource::Cancelled);
    assert_eq!(scan.stats, ReputationStats::default());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_slow_polls_are_cut_off_by_deadline() {
    let server = MockServer::start().await;
    mount_cache_miss(&server).await;
    mount_submission(&server).await;
    Mock::given(method("GET"))
        .and(path("/analyses/an-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "data": {"attributes": {"status": "queued"}}
                }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    // Four slow polls would take over two seconds
    let client = VirusTotalClient::new(reqwest::Client::new(), "test-key")
        .with_base_url(server.uri())
        .with_polling(Duration::from_millis(100), 4)
        .with_deadline(Duration::from_millis(400));
    let started = std::time::Instant::now();
    let scan = client.scan(URL, &CancellationToken::new()).await;

    assert_eq!(scan.source, ReputationSource::TimedOut);
    assert_eq!(scan.stats, ReputationStats::default());
    assert_eq!(scan.degraded_signal(), Some(SignalType::ReputationTimeout));
    assert!(started.elapsed() < Duration::from_millis(1500));
}

#[tokio::test]
async fn test_slow_stored_lookup_counts_against_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/urls/{}", url_id(URL))))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "data": {"attributes": {"last_analysis_stats": stats_body(1, 0)}}
                }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server, 3).with_deadline(Duration::from_millis(200));
    let started = std::time::Instant::now();
    let scan = client.scan(URL, &CancellationToken::new()).await;

    assert_eq!(scan.source, ReputationSource::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_stored_lookup_error_falls_through_to_submission() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/urls/{}", url_id(URL))))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    mount_submission(&server).await;
    Mock::given(method("GET"))
        .and(path("/analyses/an-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"attributes": {"status": "completed", "stats": stats_body(2, 0)}}
        })))
        .mount(&server)
        .await;

    let scan = client(&server, 3).scan(URL, &CancellationToken::new()).await;
    assert_eq!(scan.source, ReputationSource::Analysis);
    assert_eq!(scan.stats.malicious, 2);
}

#[tokio::test]
async fn test_rate_limited_stored_lookup_falls_through_to_submission() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/urls/{}", url_id(URL))))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    mount_submission(&server).await;
    Mock::given(method("GET"))
        .and(path("/analyses/an-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"attributes": {"status": "completed", "stats": stats_body(0, 0)}}
        })))
        .mount(&server)
        .await;

    let scan = client(&server, 3).scan(URL, &CancellationToken::new()).await;
    assert_eq!(scan.source, ReputationSource::Analysis);
    assert_eq!(scan.degraded_signal(), None);
}
