//! Example enrichment module
//!
//! Template integration against a generic indicator-reputation HTTP API:
//! one basic-auth GET per indicator, fanned out under the bounded scheduler,
//! with results rendered to CSV. New integrations copy this shape and swap
//! in their own client and report type.

use crate::config::EnrichConfig;
use crate::fanout::{FanOut, LookupOperation, Outcome, ResultMap};
use crate::tracing::TracerLogger;
use crate::triage::{
    DataType, IocType, ModuleDoc, TriageData, TriageError, TriageModule, TriageRequest,
};
use anyhow::bail;
use chrono::{DateTime, Utc};
use opentelemetry::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MODULE_NAME: &str = "example";
const MODULE_DESCRIPTION: &str = "Reputation data for domains and IPs";

const SUPPORTED_IOC_TYPES: &[IocType] = &[IocType::Domain, IocType::Ip];

/// One indicator's reputation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleReport {
    pub indicator: String,

    #[serde(default)]
    pub risk_score: Option<f64>,

    /// Provider verdict: "malicious", "suspicious" or "benign"
    #[serde(default)]
    pub classification: Option<String>,

    #[serde(default)]
    pub first_seen: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

/// Fetch the reputation report for one indicator.
///
/// One network round trip; any failure (transport, bad status, undecodable
/// body) means no data for this indicator.
pub async fn get_example_report(
    client: &reqwest::Client,
    endpoint: &str,
    username: &str,
    api_key: &str,
    indicator: &str,
) -> anyhow::Result<ExampleReport> {
    let response = client
        .get(endpoint)
        .query(&[("query", indicator)])
        .basic_auth(username, Some(api_key))
        .send()
        .await?;

    if !response.status().is_success() {
        bail!("bad status code: {}", response.status());
    }

    Ok(response.json().await?)
}

/// Example triage module.
pub struct ExampleModule {
    client: reqwest::Client,
    endpoint: String,
    username: String,
    api_key: String,
    tracer: Arc<TracerLogger>,
    concurrency_limit: usize,
}

impl ExampleModule {
    /// Build the module from the enrichment config.
    pub fn new(config: &EnrichConfig, tracer: Arc<TracerLogger>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.lookup_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            username: config.username.clone(),
            api_key: config.api_key.clone(),
            tracer,
            concurrency_limit: config.concurrency_limit,
        })
    }

    /// Look up every indicator and collect the per-key outcomes.
    pub async fn enrich(
        &self,
        cx: &Context,
        cancel: &CancellationToken,
        iocs: &[String],
    ) -> ResultMap<ExampleReport> {
        let fanout = FanOut::new(
            Arc::clone(&self.tracer),
            LookupOperation::new("ExampleLookup", MODULE_NAME, "", "exampleLookup"),
        )
        .with_concurrency_limit(self.concurrency_limit);

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let username = self.username.clone();
        let api_key = self.api_key.clone();

        fanout
            .run(cx, cancel, iocs, move |_cx, indicator| {
                let client = client.clone();
                let endpoint = endpoint.clone();
                let username = username.clone();
                let api_key = api_key.clone();
                async move {
                    get_example_report(&client, &endpoint, &username, &api_key, &indicator).await
                }
            })
            .await
    }
}

#[async_trait::async_trait]
impl TriageModule for ExampleModule {
    fn docs(&self) -> ModuleDoc {
        ModuleDoc {
            name: MODULE_NAME.to_string(),
            description: MODULE_DESCRIPTION.to_string(),
        }
    }

    fn supports(&self) -> &[IocType] {
        SUPPORTED_IOC_TYPES
    }

    async fn triage(
        &self,
        cx: &Context,
        cancel: &CancellationToken,
        request: &TriageRequest,
    ) -> Result<Vec<TriageData>, TriageError> {
        if !crate::triage::supports(self, request.ioc_type) {
            return Err(TriageError::Unsupported(request.ioc_type));
        }

        let (mut span, span_cx) =
            self.tracer
                .start_span(cx, "Example", MODULE_NAME, "services", "get");

        let results = self.enrich(&span_cx, cancel, &request.iocs).await;

        let data = TriageData {
            title: "Example enrichment data".to_string(),
            metadata: metadata_extract(&results),
            data_type: DataType::Csv,
            data: dump_csv(&results).map_err(TriageError::Module)?,
        };
        span.end();

        Ok(vec![data])
    }
}

/// Summarize the aggregated outcomes as one insight line per category.
fn metadata_extract(results: &ResultMap<ExampleReport>) -> Vec<String> {
    let mut metadata = Vec::new();

    let found = results.values().filter(|outcome| outcome.is_report()).count();
    let failed = results.len() - found;
    if failed > 0 {
        metadata.push(format!("No data found for {} indicator(s)", failed));
    }

    let (mut malicious, mut suspicious, mut benign, mut unclassified) = (0, 0, 0, 0);
    for report in results.values().filter_map(Outcome::report) {
        match report.classification.as_deref() {
            Some("malicious") => malicious += 1,
            Some("suspicious") => suspicious += 1,
            Some("benign") => benign += 1,
            _ => unclassified += 1,
        }
    }
    metadata.push(format!(
        "Malicious: {}, Suspicious: {}, Benign: {}, Unclassified: {}",
        malicious, suspicious, benign, unclassified
    ));

    metadata
}

/// Render the aggregated outcomes as CSV, one row per indicator.
///
/// Failed lookups produce a row with the indicator and empty columns. Rows
/// are sorted by indicator so output is stable.
fn dump_csv(results: &ResultMap<ExampleReport>) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Indicator",
        "Risk Score",
        "Classification",
        "First Seen",
        "Last Seen",
    ])?;

    let mut keys: Vec<&String> = results.keys().collect();
    keys.sort();

    for key in keys {
        let record = match &results[key] {
            Outcome::Report(report) => vec![
                key.to_string(),
                report
                    .risk_score
                    .map(|score| score.to_string())
                    .unwrap_or_default(),
                report.classification.clone().unwrap_or_default(),
                report
                    .first_seen
                    .map(|seen| seen.to_rfc3339())
                    .unwrap_or_default(),
                report
                    .last_seen
                    .map(|seen| seen.to_rfc3339())
                    .unwrap_or_default(),
            ],
            Outcome::Failed(_) => vec![
                key.to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ],
        };
        writer.write_record(&record)?;
    }

    writer.flush()?;
    let buffer = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("csv buffer: {}", e))?;
    Ok(String::from_utf8(buffer)?)
}
