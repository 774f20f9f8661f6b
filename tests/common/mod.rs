//! Shared test utilities
//!
//! Provides an in-memory tracing backend that records every span, error and
//! key/value so tests can assert on what the facade and the scheduler
//! actually traced.

// Not every test binary exercises every helper
#![allow(dead_code)]

use ioc_enrichr::logging::AppLogger;
use ioc_enrichr::tracing::{TraceBackend, TraceShutdownError, TraceSpan, TracerLogger};
use opentelemetry::Context;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::SystemTime;

/// Context marker standing in for an active trace.
#[derive(Clone)]
struct ActiveTrace;

/// Everything recorded about one span.
#[derive(Debug, Clone, Default)]
pub struct RecordedSpan {
    pub operation_name: String,
    pub operation_type: String,
    pub is_transaction: bool,
    pub errors: Vec<String>,
    pub kv: Vec<(String, String)>,
    /// Raw end calls reaching the backend; the facade must keep this at one
    pub end_calls: usize,
}

/// In-memory [`TraceBackend`] for tests.
#[derive(Default)]
pub struct RecordingBackend {
    records: Arc<Mutex<Vec<RecordedSpan>>>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of all spans recorded so far.
    pub fn records(&self) -> Vec<RecordedSpan> {
        self.records.lock().clone()
    }

    /// Total errors attached across all spans.
    pub fn error_count(&self) -> usize {
        self.records
            .lock()
            .iter()
            .map(|span| span.errors.len())
            .sum()
    }
}

struct RecordingSpan {
    index: usize,
    records: Arc<Mutex<Vec<RecordedSpan>>>,
    started_at: SystemTime,
    is_transaction: bool,
}

impl TraceSpan for RecordingSpan {
    fn end(&mut self) {
        self.records.lock()[self.index].end_calls += 1;
    }

    fn add_error(&mut self, err: &(dyn std::error::Error + 'static)) {
        self.records.lock()[self.index].errors.push(err.to_string());
    }

    fn log_kv(&mut self, key: &str, value: &str) {
        self.records.lock()[self.index]
            .kv
            .push((key.to_string(), value.to_string()));
    }

    fn start_time(&self) -> SystemTime {
        self.started_at
    }

    fn is_transaction(&self) -> bool {
        self.is_transaction
    }
}

impl TraceBackend for RecordingBackend {
    fn start_span(
        &self,
        cx: &Context,
        operation_name: &str,
        operation_type: &str,
    ) -> (Box<dyn TraceSpan>, Context) {
        let parented = cx.get::<ActiveTrace>().is_some();

        let mut records = self.records.lock();
        let index = records.len();
        records.push(RecordedSpan {
            operation_name: operation_name.to_string(),
            operation_type: operation_type.to_string(),
            is_transaction: !parented,
            ..Default::default()
        });
        drop(records);

        (
            Box::new(RecordingSpan {
                index,
                records: Arc::clone(&self.records),
                started_at: SystemTime::now(),
                is_transaction: !parented,
            }),
            cx.with_value(ActiveTrace),
        )
    }

    fn shutdown(&self) -> Result<(), TraceShutdownError> {
        Ok(())
    }
}

/// A facade over a fresh recording backend.
pub fn recording_tracer() -> (Arc<TracerLogger>, Arc<RecordingBackend>) {
    let backend = RecordingBackend::new();
    let trace_backend: Arc<dyn TraceBackend> = backend.clone();
    let tracer = Arc::new(TracerLogger::new(trace_backend, AppLogger::default()));
    (tracer, backend)
}
