//! Enrichment integration modules
//!
//! Each submodule implements [`crate::triage::TriageModule`] for one
//! external data source, driving the bounded fan-out scheduler with its own
//! lookup function and rendering the aggregated results.

pub mod example;

pub use example::ExampleModule;
