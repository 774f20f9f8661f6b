//! Triage module surface
//!
//! The uniform contract every enrichment integration implements: which
//! indicator types it supports, its documentation, and a `triage` operation
//! that returns whatever data it can find for a batch of indicators.

use opentelemetry::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The kind of indicator a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IocType {
    Unknown,
    Domain,
    Email,
    Cve,
    Url,
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Ip,
    Hostname,
}

impl IocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IocType::Unknown => "UNKNOWN",
            IocType::Domain => "DOMAIN",
            IocType::Email => "EMAIL",
            IocType::Cve => "CVE",
            IocType::Url => "URL",
            IocType::Md5 => "MD5",
            IocType::Sha1 => "SHA1",
            IocType::Sha256 => "SHA256",
            IocType::Sha512 => "SHA512",
            IocType::Ip => "IP",
            IocType::Hostname => "HOSTNAME",
        }
    }
}

impl std::fmt::Display for IocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IocType {
    type Err = std::convert::Infallible;

    /// Unrecognized strings parse to [`IocType::Unknown`] rather than
    /// failing, mirroring how requests with unclassified indicators flow
    /// through the system.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "DOMAIN" => IocType::Domain,
            "EMAIL" => IocType::Email,
            "CVE" => IocType::Cve,
            "URL" => IocType::Url,
            "MD5" => IocType::Md5,
            "SHA1" => IocType::Sha1,
            "SHA256" => IocType::Sha256,
            "SHA512" => IocType::Sha512,
            "IP" => IocType::Ip,
            "HOSTNAME" => IocType::Hostname,
            _ => IocType::Unknown,
        })
    }
}

/// How a [`TriageData`] payload is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Csv,
    Json,
    Text,
}

/// A request to triage some indicators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageRequest {
    pub iocs: Vec<String>,
    pub ioc_type: IocType,
    /// Whether to output full dumps of the fetched data
    #[serde(default)]
    pub verbose: bool,
}

/// Data a module found for a batch of indicators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageData {
    /// A brief description of this data
    pub title: String,
    /// Key insights about this set of data, one line each
    pub metadata: Vec<String>,
    pub data_type: DataType,
    /// The payload, encoded per `data_type`
    pub data: String,
}

/// The documentation of a triage module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDoc {
    pub name: String,
    /// A short (<60 characters) description of the module
    pub description: String,
}

/// Critical failures a module can raise from `triage`.
///
/// Per-indicator lookup failures are never raised here; they surface as
/// failed outcomes inside the returned data.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("unsupported ioc type: {0}")]
    Unsupported(IocType),

    #[error(transparent)]
    Module(#[from] anyhow::Error),
}

/// One enrichment integration: gathers one kind of data for the indicator
/// types it supports.
///
/// A module should return whatever data it can find (partial results
/// included) and error only on critical failure.
#[async_trait::async_trait]
pub trait TriageModule: Send + Sync {
    /// Documentation of this module
    fn docs(&self) -> ModuleDoc;

    /// The indicator types this module supports
    fn supports(&self) -> &[IocType];

    /// Enrich the requested indicators.
    async fn triage(
        &self,
        cx: &Context,
        cancel: &CancellationToken,
        request: &TriageRequest,
    ) -> Result<Vec<TriageData>, TriageError>;
}

/// Whether `module` supports the provided indicator type.
pub fn supports(module: &dyn TriageModule, ioc_type: IocType) -> bool {
    module.supports().contains(&ioc_type)
}
