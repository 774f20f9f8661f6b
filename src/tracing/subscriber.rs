//! Tracing subscriber setup with layered architecture
//!
//! This module provides a layered subscriber that combines multiple tracing
//! layers:
//! - **OpenTelemetry layer**: bridges `tracing` spans to the OTLP exporter
//!   (when enabled)
//! - **Fmt layer**: JSON structured log records on stdout
//! - **EnvFilter**: log level control via the RUST_LOG environment variable
//!
//! # Layer Architecture
//!
//! When tracing is enabled:
//! ```text
//! Registry
//!   ├── OpenTelemetry Layer (exports to OTLP)
//!   ├── EnvFilter (RUST_LOG)
//!   └── Fmt Layer (JSON stdout)
//! ```
//!
//! When tracing is disabled the OpenTelemetry layer is omitted.

use crate::config::TracingConfig;
use crate::tracing::init::{init_tracing, TracingError, TracingGuard};
use opentelemetry::trace::TracerProvider as _;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with layered architecture
///
/// Sets up the OpenTelemetry tracer provider and installs the global
/// subscriber. Returns the [`TracingGuard`] that manages the provider
/// lifecycle.
pub fn init_subscriber(config: &TracingConfig) -> Result<TracingGuard, TracingError> {
    // Initialize OpenTelemetry tracer provider
    let guard = init_tracing(config)?;

    // Create EnvFilter from RUST_LOG or default to INFO
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if config.enabled {
        // JSON output: one structured record per event
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).json();

        let tracer = guard.provider().tracer(env!("CARGO_PKG_NAME"));
        let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        let subscriber = tracing_subscriber::registry()
            .with(telemetry_layer)
            .with(env_filter)
            .with(fmt_layer);

        tracing::subscriber::set_global_default(subscriber).map_err(|e| {
            TracingError::ProviderError(format!(
                "Failed to set global subscriber (may already be initialized): {}",
                e
            ))
        })?;
    } else {
        // JSON output: one structured record per event
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).json();

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer);

        tracing::subscriber::set_global_default(subscriber).map_err(|e| {
            TracingError::ProviderError(format!(
                "Failed to set global subscriber (may already be initialized): {}",
                e
            ))
        })?;
    }

    Ok(guard)
}
