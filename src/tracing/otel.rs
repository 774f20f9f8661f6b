//! OpenTelemetry tracing backend
//!
//! Implements [`TraceBackend`] over the OpenTelemetry SDK. The backend
//! abstracts everything as a "span" from higher up, but distinguishes two
//! units of work underneath: a root *transaction* started when the supplied
//! context carries no active trace, and a *child span* parented to whatever
//! the context already carries.

use crate::tracing::backend::{TraceBackend, TraceShutdownError, TraceSpan};
use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer, TracerProvider};
use opentelemetry::{global, Context, KeyValue};
use std::time::SystemTime;

/// The traced primitive an [`OtelSpan`] currently holds.
///
/// The context inside owns the underlying SDK span.
enum TraceUnit {
    /// Root of a new trace
    Transaction(Context),
    /// Child of an existing trace
    Child(Context),
}

impl TraceUnit {
    fn context(&self) -> &Context {
        match self {
            TraceUnit::Transaction(cx) | TraceUnit::Child(cx) => cx,
        }
    }
}

/// A span or transaction recorded through the OpenTelemetry SDK.
pub struct OtelSpan {
    started_at: SystemTime,
    /// Cleared on `end`, making a repeat call a no-op.
    unit: Option<TraceUnit>,
}

impl TraceSpan for OtelSpan {
    fn end(&mut self) {
        if let Some(unit) = self.unit.take() {
            unit.context().span().end();
        }
    }

    fn add_error(&mut self, err: &(dyn std::error::Error + 'static)) {
        if let Some(unit) = &self.unit {
            let span = unit.context().span();
            span.record_error(err);
            span.set_status(Status::error(err.to_string()));
        }
    }

    fn log_kv(&mut self, key: &str, value: &str) {
        if let Some(unit) = &self.unit {
            unit.context()
                .span()
                .set_attribute(KeyValue::new(key.to_string(), value.to_string()));
        }
    }

    fn start_time(&self) -> SystemTime {
        self.started_at
    }

    fn is_transaction(&self) -> bool {
        matches!(self.unit, Some(TraceUnit::Transaction(_)))
    }
}

/// OpenTelemetry-backed tracer.
pub struct OtelBackend {
    provider: opentelemetry_sdk::trace::TracerProvider,
    tracer: opentelemetry_sdk::trace::Tracer,
}

impl OtelBackend {
    /// Create a backend over an already-configured SDK tracer provider.
    pub fn new(provider: opentelemetry_sdk::trace::TracerProvider) -> Self {
        let tracer = provider.tracer(env!("CARGO_PKG_NAME"));
        Self { provider, tracer }
    }
}

impl TraceBackend for OtelBackend {
    fn start_span(
        &self,
        cx: &Context,
        operation_name: &str,
        operation_type: &str,
    ) -> (Box<dyn TraceSpan>, Context) {
        let started_at = SystemTime::now();

        // Capability lookup: an active, valid span in the context means we
        // parent to it; anything else starts a fresh trace.
        let parented = cx.has_active_span() && cx.span().span_context().is_valid();

        let builder = self
            .tracer
            .span_builder(operation_name.to_string())
            .with_kind(SpanKind::Internal)
            .with_start_time(started_at)
            .with_attributes(vec![KeyValue::new(
                "operation.type",
                operation_type.to_string(),
            )]);

        let (unit, span_cx) = if parented {
            let span = builder.start_with_context(&self.tracer, cx);
            let span_cx = cx.with_span(span);
            (TraceUnit::Child(span_cx.clone()), span_cx)
        } else {
            let span = builder.start_with_context(&self.tracer, &Context::new());
            let span_cx = cx.with_span(span);
            (TraceUnit::Transaction(span_cx.clone()), span_cx)
        };

        (
            Box::new(OtelSpan {
                started_at,
                unit: Some(unit),
            }),
            span_cx,
        )
    }

    fn shutdown(&self) -> Result<(), TraceShutdownError> {
        for result in self.provider.force_flush() {
            result.map_err(|e| TraceShutdownError::Flush(e.to_string()))?;
        }
        global::shutdown_tracer_provider();
        Ok(())
    }
}
