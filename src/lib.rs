//! IOC Enrichr Library
//!
//! Bounded fan-out enrichment of threat indicators with distributed tracing.
//!
//! # Features
//!
//! - **Bounded Fan-Out**: at most N lookups in flight per batch, admission
//!   is cancellation-aware
//! - **Failure Isolation**: a failed lookup is recorded against its key and
//!   never aborts the batch
//! - **Traced Lookups**: every lookup runs in its own span; root transaction
//!   vs child span is decided from the caller's context
//! - **Structured Logging**: span starts, completions and errors emit JSON
//!   records with process-wide tags and labels
//!
//! # Example
//!
//! ```no_run
//! use ioc_enrichr::config::Config;
//! use ioc_enrichr::logging::AppLogger;
//! use ioc_enrichr::modules::ExampleModule;
//! use ioc_enrichr::tracing::{init_tracing, OtelBackend, TracerLogger};
//! use ioc_enrichr::triage::{IocType, TriageModule, TriageRequest};
//! use opentelemetry::Context;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let guard = init_tracing(&config.tracing_config())?;
//!
//!     let backend = Arc::new(OtelBackend::new(guard.provider().clone()));
//!     let logger = AppLogger::new(config.logging.tags.clone(), config.logging.labels.clone());
//!     let tracer = Arc::new(TracerLogger::new(backend, logger));
//!
//!     let module = ExampleModule::new(&config.enrich, Arc::clone(&tracer))?;
//!     let request = TriageRequest {
//!         iocs: vec!["example.com".to_string()],
//!         ioc_type: IocType::Domain,
//!         verbose: false,
//!     };
//!
//!     let cancel = CancellationToken::new();
//!     let data = module.triage(&Context::new(), &cancel, &request).await?;
//!     println!("{}", data[0].data);
//!
//!     tracer.close(&cancel).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod fanout;
pub mod logging;
pub mod modules;
pub mod tracing;
pub mod triage;

// Re-export commonly used types
pub use config::Config;
pub use fanout::{FanOut, LookupOperation, Outcome, ResultMap};
pub use logging::AppLogger;
pub use triage::{TriageModule, TriageRequest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
