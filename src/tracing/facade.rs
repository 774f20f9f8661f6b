//! Trace/log facade
//!
//! [`TracerLogger`] couples a tracing backend with the structured application
//! logger so that every span start, every error attached to a span, and every
//! span completion produces one structured log record alongside the trace
//! data. Integrations work only with this facade and the [`Span`] handle it
//! returns.

use crate::logging::{AppLogger, Fields};
use crate::tracing::backend::{TraceBackend, TraceShutdownError, TraceSpan};
use opentelemetry::Context;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;

/// A tracer that also performs application/security logging.
///
/// By default it logs span starts, completions and all span errors. Set
/// `no_default_logging` to suppress these automatic records; any logging you
/// want is then manual through [`TracerLogger::logger`].
///
/// Construct once at process start and share via `Arc`; `close` must be
/// called before exit so the backend can flush.
pub struct TracerLogger {
    /// Suppress the automatic log records for span start/end/error.
    pub no_default_logging: bool,
    logger: AppLogger,
    backend: Arc<dyn TraceBackend>,
    closed: AtomicBool,
}

impl TracerLogger {
    /// Create a new facade over the provided backend and logger.
    pub fn new(backend: Arc<dyn TraceBackend>, logger: AppLogger) -> Self {
        Self {
            no_default_logging: false,
            logger,
            backend,
            closed: AtomicBool::new(false),
        }
    }

    /// The structured logger used for automatic records.
    pub fn logger(&self) -> &AppLogger {
        &self.logger
    }

    /// Start a new span.
    ///
    /// The operation type is assembled as `type.subtype.action`, for example
    /// `services.example.get`. The span is parented to whatever trace `cx`
    /// carries; without one, a new root transaction is started. The returned
    /// context carries the new span for nesting.
    pub fn start_span(
        &self,
        cx: &Context,
        operation_name: &str,
        operation_type: &str,
        operation_sub_type: &str,
        operation_action: &str,
    ) -> (Span, Context) {
        let operation_type =
            format!("{}.{}.{}", operation_type, operation_sub_type, operation_action);
        let (inner, span_cx) = self.backend.start_span(cx, operation_name, &operation_type);

        if !self.no_default_logging {
            let fields = operation_fields(&operation_type, "started");
            self.logger.info(operation_name, fields);
        }

        (
            Span {
                operation_name: operation_name.to_string(),
                operation_type,
                kv: Vec::new(),
                inner,
                logger: self.logger.clone(),
                default_logging: !self.no_default_logging,
                ended: false,
            },
            span_cx,
        )
    }

    /// Flush the backend and shut it down, racing the caller's cancellation.
    ///
    /// The flush runs on the blocking pool; if `cancel` fires before it
    /// completes the call returns [`TraceShutdownError::Cancelled`] and the
    /// flush continues best-effort in the background. A second call is a
    /// no-op.
    pub async fn close(&self, cancel: &CancellationToken) -> Result<(), TraceShutdownError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let backend = Arc::clone(&self.backend);
        let flush = tokio::task::spawn_blocking(move || backend.shutdown());

        let flushed = tokio::select! {
            res = flush => res.map_err(|e| TraceShutdownError::Flush(e.to_string()))?,
            _ = cancel.cancelled() => return Err(TraceShutdownError::Cancelled),
        };
        flushed?;

        if cancel.is_cancelled() {
            return Err(TraceShutdownError::Cancelled);
        }
        Ok(())
    }
}

/// A span handle combining backend tracing with automatic logging.
///
/// Ends itself on drop; an explicit [`Span::end`] first is fine, the repeat
/// is a no-op.
pub struct Span {
    operation_name: String,
    operation_type: String,
    /// Key/values recorded during this span, replayed into the completion log
    kv: Vec<(String, String)>,
    inner: Box<dyn TraceSpan>,
    logger: AppLogger,
    default_logging: bool,
    ended: bool,
}

impl Span {
    /// Record a key/value pair on the span.
    pub fn log_kv(&mut self, key: &str, value: impl std::fmt::Display) {
        let value = value.to_string();
        self.inner.log_kv(key, &value);
        self.kv.push((key.to_string(), value));
    }

    /// Attach an error to the span, also logging it as a structured error
    /// record unless default logging is disabled.
    pub fn add_error(&mut self, err: &(dyn std::error::Error + 'static)) {
        self.inner.add_error(err);

        if self.default_logging {
            let mut fields = Fields::new();
            fields.insert(
                "errorDetails".to_string(),
                HashMap::from([("error".to_string(), err.to_string())]),
            );
            self.logger.error(&err.to_string(), fields);
        }
    }

    /// End the span, emitting the completion log record with any collected
    /// key/values. Idempotent.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        if self.default_logging {
            let mut fields = operation_fields(&self.operation_type, "completed");
            if !self.kv.is_empty() {
                fields.insert(
                    "keyValuePairs".to_string(),
                    self.kv.iter().cloned().collect(),
                );
            }
            self.logger.info(&self.operation_name, fields);
        }

        self.inner.end();
    }

    /// When this span started.
    pub fn start_time(&self) -> SystemTime {
        self.inner.start_time()
    }

    /// Whether this span is the root transaction of its trace.
    pub fn is_transaction(&self) -> bool {
        self.inner.is_transaction()
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        self.end();
    }
}

fn operation_fields(operation_type: &str, state: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        "operationDetails".to_string(),
        HashMap::from([
            ("operationType".to_string(), operation_type.to_string()),
            ("state".to_string(), state.to_string()),
        ]),
    );
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracing::otel::OtelBackend;

    fn test_tracer() -> TracerLogger {
        let backend = Arc::new(OtelBackend::new(
            opentelemetry_sdk::trace::TracerProvider::builder().build(),
        ));
        TracerLogger::new(backend, AppLogger::default())
    }

    #[test]
    fn test_operation_type_is_combined() {
        let tracer = test_tracer();
        let (span, _cx) = tracer.start_span(&Context::new(), "Lookup", "example", "services", "get");
        assert_eq!(span.operation_type, "example.services.get");
    }

    #[test]
    fn test_nested_span_is_not_transaction() {
        let tracer = test_tracer();
        let (root, cx) = tracer.start_span(&Context::new(), "Triage", "example", "services", "get");
        let (child, _cx) = tracer.start_span(&cx, "Lookup", "example", "", "lookup");
        assert!(root.is_transaction());
        assert!(!child.is_transaction());
    }

    #[test]
    fn test_end_twice_is_noop() {
        let tracer = test_tracer();
        let (mut span, _cx) =
            tracer.start_span(&Context::new(), "Lookup", "example", "services", "get");
        span.log_kv("attempt", 1);
        span.end();
        span.end();
    }

    #[tokio::test]
    async fn test_close_twice_is_noop() {
        let tracer = test_tracer();
        let cancel = CancellationToken::new();
        tracer.close(&cancel).await.unwrap();
        tracer.close(&cancel).await.unwrap();
    }

    #[tokio::test]
    async fn test_close_with_cancelled_token_errors() {
        let tracer = test_tracer();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = tracer.close(&cancel).await.unwrap_err();
        assert!(matches!(err, TraceShutdownError::Cancelled));
    }
}
