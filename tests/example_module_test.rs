//! Integration tests for the example enrichment module

mod common;

use common::recording_tracer;
use ioc_enrichr::config::EnrichConfig;
use ioc_enrichr::fanout::Outcome;
use ioc_enrichr::modules::example::{get_example_report, ExampleModule};
use ioc_enrichr::triage::{DataType, IocType, TriageError, TriageModule, TriageRequest};
use opentelemetry::Context;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn enrich_config(endpoint: &str) -> EnrichConfig {
    EnrichConfig {
        concurrency_limit: 5,
        endpoint: endpoint.to_string(),
        username: "test-user".to_string(),
        api_key: "test-key".to_string(),
        lookup_timeout_seconds: 5,
    }
}

fn report_body(indicator: &str, classification: &str) -> serde_json::Value {
    serde_json::json!({
        "indicator": indicator,
        "risk_score": 87.5,
        "classification": classification,
    })
}

#[tokio::test]
async fn test_lookup_decodes_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("query", "bad.example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_body("bad.example", "malicious")))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let report = get_example_report(&client, &server.uri(), "user", "key", "bad.example")
        .await
        .unwrap();

    assert_eq!(report.indicator, "bad.example");
    assert_eq!(report.risk_score, Some(87.5));
    assert_eq!(report.classification.as_deref(), Some("malicious"));
}

#[tokio::test]
async fn test_lookup_rejects_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let err = get_example_report(&client, &server.uri(), "user", "key", "bad.example")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("bad status code: 500"));
}

#[tokio::test]
async fn test_enrich_isolates_failures_per_indicator() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("query", "bad.example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_body("bad.example", "malicious")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("query", "gone.example"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (tracer, backend) = recording_tracer();
    let module = ExampleModule::new(&enrich_config(&server.uri()), tracer).unwrap();

    let iocs = vec!["bad.example".to_string(), "gone.example".to_string()];
    let results = module
        .enrich(&Context::new(), &CancellationToken::new(), &iocs)
        .await;

    assert_eq!(results.len(), 2);
    assert!(results["bad.example"].is_report());
    assert!(matches!(results["gone.example"], Outcome::Failed(_)));
    assert_eq!(backend.error_count(), 1);
}

#[tokio::test]
async fn test_triage_renders_csv_and_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("query", "bad.example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_body("bad.example", "malicious")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("query", "gone.example"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (tracer, backend) = recording_tracer();
    let module = ExampleModule::new(&enrich_config(&server.uri()), tracer).unwrap();

    let request = TriageRequest {
        iocs: vec!["bad.example".to_string(), "gone.example".to_string()],
        ioc_type: IocType::Domain,
        verbose: false,
    };

    let data = module
        .triage(&Context::new(), &CancellationToken::new(), &request)
        .await
        .unwrap();

    assert_eq!(data.len(), 1);
    assert_eq!(data[0].data_type, DataType::Csv);

    let lines: Vec<&str> = data[0].data.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("bad.example,87.5,malicious"));
    assert_eq!(lines[2], "gone.example,,,,");

    assert!(data[0]
        .metadata
        .contains(&"No data found for 1 indicator(s)".to_string()));

    // One root transaction for the module, one child span per lookup
    let spans = backend.records();
    assert_eq!(spans.len(), 3);
    assert!(spans[0].is_transaction);
    assert!(spans.iter().skip(1).all(|span| !span.is_transaction));
}

#[tokio::test]
async fn test_triage_rejects_unsupported_ioc_type() {
    let server = MockServer::start().await;
    let (tracer, _backend) = recording_tracer();
    let module = ExampleModule::new(&enrich_config(&server.uri()), tracer).unwrap();

    let request = TriageRequest {
        iocs: vec!["someone@example.com".to_string()],
        ioc_type: IocType::Email,
        verbose: false,
    };

    let err = module
        .triage(&Context::new(), &CancellationToken::new(), &request)
        .await
        .unwrap_err();

    assert!(matches!(err, TriageError::Unsupported(IocType::Email)));
}

#[tokio::test]
async fn test_module_docs_and_supports() {
    let (tracer, _backend) = recording_tracer();
    let module = ExampleModule::new(&enrich_config("http://localhost:1"), tracer).unwrap();

    assert_eq!(module.docs().name, "example");
    assert!(ioc_enrichr::triage::supports(&module, IocType::Domain));
    assert!(ioc_enrichr::triage::supports(&module, IocType::Ip));
    assert!(!ioc_enrichr::triage::supports(&module, IocType::Email));
}
