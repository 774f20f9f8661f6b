//! Tracing and trace-coupled logging
//!
//! Provides a backend-agnostic span model with automatic structured log
//! emission, plus OpenTelemetry wiring with OTLP export.
//!
//! A span started from a context without an active trace becomes a root
//! *transaction*; started from a context that carries one, it becomes a
//! *child span*. Both expose the same handle.
//!
//! # Example
//!
//! ```no_run
//! use ioc_enrichr::config::TracingConfig;
//! use ioc_enrichr::logging::AppLogger;
//! use ioc_enrichr::tracing::{init_tracing, OtelBackend, TracerLogger};
//! use opentelemetry::Context;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TracingConfig {
//!     enabled: true,
//!     service_name: "ioc-enrichr".to_string(),
//!     otlp: Default::default(),
//! };
//!
//! let guard = init_tracing(&config)?;
//! let backend = Arc::new(OtelBackend::new(guard.provider().clone()));
//! let tracer = TracerLogger::new(backend, AppLogger::default());
//!
//! let (mut span, _cx) = tracer.start_span(&Context::new(), "PerformWork", "general", "", "work");
//! span.log_kv("items", 3);
//! span.end();
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod facade;
pub mod init;
pub mod otel;
pub mod subscriber;

pub use backend::{TraceBackend, TraceShutdownError, TraceSpan};
pub use facade::{Span, TracerLogger};
pub use init::{init_tracing, TracingError, TracingGuard};
pub use otel::OtelBackend;
pub use subscriber::init_subscriber;
