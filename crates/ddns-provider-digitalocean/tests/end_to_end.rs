//! Full cycle: real IP-echo source and DigitalOcean provider behind mock servers

use ddns_core::config::{DdnsConfig, ProviderConfig};
use ddns_core::{CycleOutcome, CycleStage, DdnsEngine};
use ddns_ip_http::HttpIpSource;
use ddns_provider_digitalocean::DigitalOceanProvider;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "dop_v1_end_to_end";

async fn echo_server(body: &str, status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

async fn api_server(records: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/domains/example.com/records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "domain_records": records,
            "links": {},
            "meta": {"total": 1}
        })))
        .mount(&server)
        .await;
    server
}

fn engine(echo: &MockServer, api: &MockServer, domain: &str) -> DdnsEngine {
    let provider_config = ProviderConfig::DigitalOcean {
        api_token: TOKEN.to_string(),
        base_url: Some(format!("{}/v2", api.uri())),
        dry_run: false,
    };
    let mut config = DdnsConfig::new(domain, provider_config.clone());
    config.ip_source.url = format!("{}/", echo.uri());

    let ip_source = HttpIpSource::from_config(&config.ip_source).expect("source builds");
    let provider = DigitalOceanProvider::from_config(&provider_config).expect("provider builds");

    let (engine, _events) =
        DdnsEngine::new(Box::new(ip_source), Box::new(provider), config).expect("engine builds");
    engine
}

#[tokio::test]
async fn stale_record_is_updated_to_echoed_address() {
    let echo = echo_server("203.0.113.7\n", 200).await;
    let api = api_server(json!([
        {"id": 41, "type": "A", "name": "sub", "data": "203.0.113.5", "ttl": 1800}
    ]))
    .await;

    Mock::given(method("PUT"))
        .and(path("/v2/domains/example.com/records/41"))
        .and(body_json(json!({"type": "A", "data": "203.0.113.7"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "domain_record": {"id": 41, "type": "A", "name": "sub", "data": "203.0.113.7", "ttl": 1800}
        })))
        .expect(1)
        .mount(&api)
        .await;

    let outcome = assert_ok!(engine(&echo, &api, "sub.example.com").run_cycle().await);
    assert!(matches!(outcome, CycleOutcome::Updated { .. }));
}

#[tokio::test]
async fn current_apex_record_is_left_alone() {
    let echo = echo_server("203.0.113.7", 200).await;
    let api = api_server(json!([
        {"id": 7, "type": "A", "name": "example.com", "data": "203.0.113.7", "ttl": 3600}
    ]))
    .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api)
        .await;

    let outcome = assert_ok!(engine(&echo, &api, "example.com").run_cycle().await);
    assert!(matches!(outcome, CycleOutcome::UpToDate { .. }));
}

#[tokio::test]
async fn echo_failure_makes_no_api_calls() {
    let echo = echo_server("", 500).await;
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api)
        .await;

    let err = assert_err!(engine(&echo, &api, "sub.example.com").run_cycle().await);
    assert_eq!(err.stage, CycleStage::Resolve);
}
