//! OpenTelemetry tracer initialization and lifecycle management
//!
//! This module handles the initialization of the OpenTelemetry tracer
//! provider, OTLP exporter configuration, and graceful shutdown with span
//! flushing.

use crate::config::TracingConfig;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during tracing initialization
#[derive(Error, Debug)]
pub enum TracingError {
    #[error("Invalid OTLP endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to initialize OTLP exporter: {0}")]
    ExporterError(String),

    #[error("Failed to initialize tracer provider: {0}")]
    ProviderError(String),
}

/// RAII guard for tracing lifecycle management
///
/// Flushes and shuts down the tracer provider when dropped, as a backstop
/// for paths that never reach `TracerLogger::close`.
#[derive(Debug)]
pub struct TracingGuard {
    provider: TracerProvider,
}

impl TracingGuard {
    fn new(provider: TracerProvider) -> Self {
        Self { provider }
    }

    /// The SDK tracer provider backing this process.
    pub fn provider(&self) -> &TracerProvider {
        &self.provider
    }
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        let _ = self.provider.force_flush();
        global::shutdown_tracer_provider();
    }
}

/// Initialize OpenTelemetry tracing with the given configuration
///
/// Always builds a tracer provider so spans can be created; the OTLP batch
/// exporter is attached only when `config.enabled` is set. With export
/// disabled, spans are recorded and dropped locally.
///
/// Returns a [`TracingGuard`] that flushes and shuts tracing down when
/// dropped.
pub fn init_tracing(config: &TracingConfig) -> Result<TracingGuard, TracingError> {
    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        config.service_name.clone(),
    )]);
    let trace_config = opentelemetry_sdk::trace::config().with_resource(resource);

    let provider = if config.enabled {
        let endpoint = &config.otlp.endpoint;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(TracingError::InvalidEndpoint(format!(
                "Endpoint must start with http:// or https://, got: {}",
                endpoint
            )));
        }

        let exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint.clone())
            .with_timeout(Duration::from_secs(config.otlp.timeout_seconds))
            .build_span_exporter()
            .map_err(|e| TracingError::ExporterError(e.to_string()))?;

        TracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .with_config(trace_config)
            .build()
    } else {
        TracerProvider::builder().with_config(trace_config).build()
    };

    // Set as global provider
    global::set_tracer_provider(provider.clone());

    Ok(TracingGuard::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_disabled_still_provides_tracer() {
        let config = TracingConfig {
            enabled: false,
            service_name: "test-service".to_string(),
            otlp: Default::default(),
        };

        let guard = init_tracing(&config).unwrap();
        let _ = guard.provider();
    }

    #[test]
    fn test_init_rejects_bad_endpoint() {
        let config = TracingConfig {
            enabled: true,
            service_name: "test-service".to_string(),
            otlp: crate::config::OtlpConfig {
                endpoint: "localhost:4317".to_string(),
                timeout_seconds: 10,
            },
        };

        let result = init_tracing(&config);
        assert!(matches!(result, Err(TracingError::InvalidEndpoint(_))));
    }
}
