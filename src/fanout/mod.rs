//! Bounded fan-out scheduling
//!
//! Dispatches one lookup per indicator key with a hard bound on how many run
//! at once, wraps every lookup in its own trace span, and aggregates
//! per-key outcomes into a map. Per-item failures are isolated: a failed
//! lookup is recorded against its key and never aborts the batch.
//!
//! Admission acquires a semaphore permit with a cancellation-aware wait
//! *before* the worker is spawned, so the concurrency limit is a true bound
//! and cancellation stops new admissions without aborting in-flight lookups.
//!
//! # Example
//!
//! ```no_run
//! use ioc_enrichr::fanout::{FanOut, LookupOperation};
//! use ioc_enrichr::logging::AppLogger;
//! use ioc_enrichr::tracing::{OtelBackend, TracerLogger};
//! use opentelemetry::Context;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let backend = Arc::new(OtelBackend::new(
//!     opentelemetry_sdk::trace::TracerProvider::builder().build(),
//! ));
//! let tracer = Arc::new(TracerLogger::new(backend, AppLogger::default()));
//!
//! let fanout = FanOut::new(tracer, LookupOperation::new("WhoisLookup", "whois", "", "domainLookup"));
//! let keys = vec!["example.com".to_string(), "example.org".to_string()];
//!
//! let results = fanout
//!     .run(&Context::new(), &CancellationToken::new(), &keys, |_cx, key| async move {
//!         Ok(format!("registrar for {}", key))
//!     })
//!     .await;
//!
//! assert_eq!(results.len(), 2);
//! # }
//! ```

pub mod aggregator;

pub use aggregator::ResultAggregator;

use crate::tracing::TracerLogger;
use opentelemetry::Context;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Maximum lookups in flight per fan-out call unless configured otherwise.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;

/// The outcome of one admitted lookup.
///
/// Explicit on purpose: an absent key means "not processed" (for example the
/// admission loop was cancelled first), while `Failed` means the lookup ran
/// and errored, carrying the failure reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<R> {
    /// The lookup returned a report
    Report(R),
    /// The lookup failed; no data for this key
    Failed(String),
}

impl<R> Outcome<R> {
    pub fn is_report(&self) -> bool {
        matches!(self, Outcome::Report(_))
    }

    /// The report, if the lookup succeeded.
    pub fn report(&self) -> Option<&R> {
        match self {
            Outcome::Report(report) => Some(report),
            Outcome::Failed(_) => None,
        }
    }

    /// The failure reason, if the lookup failed.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Outcome::Report(_) => None,
            Outcome::Failed(reason) => Some(reason),
        }
    }
}

/// Aggregated outcomes keyed by indicator.
pub type ResultMap<R> = HashMap<String, Outcome<R>>;

/// Span naming for one integration's lookups, in the
/// `name` / `type.subtype.action` scheme the tracer expects.
#[derive(Debug, Clone)]
pub struct LookupOperation {
    pub name: String,
    pub operation_type: String,
    pub operation_sub_type: String,
    pub operation_action: String,
}

impl LookupOperation {
    pub fn new(name: &str, operation_type: &str, sub_type: &str, action: &str) -> Self {
        Self {
            name: name.to_string(),
            operation_type: operation_type.to_string(),
            operation_sub_type: sub_type.to_string(),
            operation_action: action.to_string(),
        }
    }
}

/// Bounded fan-out scheduler.
///
/// One instance per integration, carrying the tracer, the span naming and
/// the concurrency limit. Each [`FanOut::run`] call owns its result map and
/// its permit pool; the tracer is shared process-wide state.
pub struct FanOut {
    tracer: Arc<TracerLogger>,
    operation: LookupOperation,
    concurrency_limit: usize,
}

impl FanOut {
    pub fn new(tracer: Arc<TracerLogger>, operation: LookupOperation) -> Self {
        Self {
            tracer,
            operation,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
        }
    }

    /// Override the concurrency limit. A zero limit would admit nothing, so
    /// it is clamped to one.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }

    /// Run `lookup` once per key, at most `concurrency_limit` at a time, and
    /// collect the outcomes.
    ///
    /// Keys are admitted in input order; admission waits for a free slot or
    /// for `cancel` to fire, whichever comes first. Cancellation stops new
    /// admissions but lets in-flight lookups run to completion. The call
    /// returns only after every admitted worker has finished.
    ///
    /// Per-key failures are not escalated: they appear as
    /// [`Outcome::Failed`] entries, with the error attached to that key's
    /// span.
    pub async fn run<R, F, Fut>(
        &self,
        cx: &Context,
        cancel: &CancellationToken,
        keys: &[String],
        lookup: F,
    ) -> ResultMap<R>
    where
        R: Send + 'static,
        F: Fn(Context, String) -> Fut,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        let slots = Arc::new(Semaphore::new(self.concurrency_limit));
        let aggregator = Arc::new(ResultAggregator::new());
        let mut workers = JoinSet::new();

        for key in keys {
            // biased: a cancelled token must win over a free slot so that a
            // pre-cancelled call admits nothing.
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&slots).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let (mut span, span_cx) = self.tracer.start_span(
                cx,
                &self.operation.name,
                &self.operation.operation_type,
                &self.operation.operation_sub_type,
                &self.operation.operation_action,
            );

            let fut = lookup(span_cx, key.clone());
            let aggregator = Arc::clone(&aggregator);
            let key = key.clone();

            workers.spawn(async move {
                // Held until this worker is done
                let _permit = permit;

                match fut.await {
                    Ok(report) => {
                        aggregator.set(key, Outcome::Report(report));
                    }
                    Err(err) => {
                        span.add_error(err.as_ref());
                        aggregator.set(key, Outcome::Failed(format!("{:#}", err)));
                    }
                }

                span.end();
            });
        }

        // Completion barrier: every admitted worker signals through the set.
        while workers.join_next().await.is_some() {}

        aggregator.take()
    }
}
