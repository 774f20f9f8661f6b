//! Tracing backend abstraction
//!
//! Defines the capability a tracing backend must provide: turning an
//! operation name/type into either a new root transaction (when the supplied
//! context carries no active trace) or a child span (when it does), plus a
//! blocking flush for shutdown.
//!
//! The facade in [`crate::tracing::facade`] works exclusively against these
//! traits, so any backend satisfying them can be plugged in — the OpenTelemetry
//! backend in [`crate::tracing::otel`] is the production implementation, and
//! tests use an in-memory recording backend.

use opentelemetry::Context;
use std::time::SystemTime;
use thiserror::Error;

/// Errors surfaced when shutting a backend down.
#[derive(Error, Debug)]
pub enum TraceShutdownError {
    #[error("tracer shutdown cancelled")]
    Cancelled,

    #[error("failed to flush spans: {0}")]
    Flush(String),
}

/// One traced unit of work produced by a backend.
///
/// A backend span is either a root transaction or a child span; both expose
/// the same capability set. `end` must be idempotent: the first call closes
/// the underlying primitive and clears the handle, and any repeat call is a
/// no-op.
pub trait TraceSpan: Send {
    /// End the span. Idempotent.
    fn end(&mut self);

    /// Attach an error to the span.
    fn add_error(&mut self, err: &(dyn std::error::Error + 'static));

    /// Record a key/value pair on the span.
    fn log_kv(&mut self, key: &str, value: &str);

    /// When this span started.
    fn start_time(&self) -> SystemTime;

    /// Whether this span is a root transaction (as opposed to a child span).
    fn is_transaction(&self) -> bool;
}

/// A tracer that can create spans and flush them on shutdown.
pub trait TraceBackend: Send + Sync {
    /// Start a new span.
    ///
    /// The decision between root transaction and child span is made by
    /// capability lookup on `cx`: if it carries an active trace the new span
    /// is parented to it, otherwise a root transaction is created. The
    /// returned context carries the new span so that further `start_span`
    /// calls nest under it.
    fn start_span(
        &self,
        cx: &Context,
        operation_name: &str,
        operation_type: &str,
    ) -> (Box<dyn TraceSpan>, Context);

    /// Flush buffered spans and shut the backend down. Blocking.
    fn shutdown(&self) -> Result<(), TraceShutdownError>;
}
