// RDAP lookups against a mock registry.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use safe_surf::whois::{RdapClient, RegistrationLookup};

fn rdap_body() -> serde_json::Value {
    json!({
        "objectClassName": "domain",
        "ldhName": "EXAMPLE.ORG",
        "events": [
            {"eventAction": "registration", "eventDate": "2001-03-02T10:00:00Z"},
            {"eventAction": "expiration", "eventDate": "2031-03-02T10:00:00Z"}
        ],
        "entities": [{
            "roles": ["registrar"],
            "vcardArray": ["vcard", [["fn", {}, "text", "Example Registrar LLC"]]]
        }]
    })
}

#[tokio::test]
async fn test_lookup_parses_registry_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/domain/example.org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rdap_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = RdapClient::new(reqwest::Client::new(), server.uri());
    let record = client.lookup("Example.ORG.").await.unwrap();
    assert_eq!(
        record.creation_date.unwrap().format("%Y-%m-%d").to_string(),
        "2001-03-02"
    );
    assert_eq!(record.registrar.as_deref(), Some("Example Registrar LLC"));
    assert!(record.updated_date.is_none());
    assert!(record.country.is_none());
}

#[tokio::test]
async fn test_unknown_domain_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = RdapClient::new(reqwest::Client::new(), server.uri());
    let err = client.lookup("missing.example").await.unwrap_err();
    assert!(format!("{err:#}").contains("404"));
}

#[tokio::test]
async fn test_slow_registry_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(rdap_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = RdapClient::new(reqwest::Client::new(), server.uri())
        .with_timeout(Duration::from_millis(100));
    let err = client.lookup("example.org").await.unwrap_err();
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_disk_cache_serves_repeat_lookups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/domain/example.org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rdap_body()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client =
        RdapClient::new(reqwest::Client::new(), server.uri()).with_cache_dir(dir.path());

    let first = client.lookup("example.org").await.unwrap();
    let second = client.lookup("example.org").await.unwrap();
    assert_eq!(first, second);
}
