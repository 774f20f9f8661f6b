//! Structured application logging
//!
//! Provides an application/security logger that emits one JSON record per
//! call through the `tracing` pipeline. Tags and labels configured at
//! construction time are appended to every record, so a process-wide logger
//! can be built once and shared.
//!
//! # Example
//!
//! ```
//! use ioc_enrichr::logging::{AppLogger, Fields};
//! use std::collections::HashMap;
//!
//! let logger = AppLogger::new(
//!     vec!["enrichment".to_string()],
//!     HashMap::from([("environment".to_string(), "prod".to_string())]),
//! );
//!
//! let mut fields = Fields::new();
//! fields.insert(
//!     "operationDetails".to_string(),
//!     HashMap::from([("operationType".to_string(), "services.get".to_string())]),
//! );
//! logger.info("lookup completed", fields);
//! ```

use std::collections::HashMap;

/// Log record fields: a collection of named sections, each a map of
/// key/value pairs.
pub type Fields = HashMap<String, HashMap<String, String>>;

/// Severity of a single log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Application logger with fixed tags and labels.
///
/// Cloning is cheap enough to hand a copy to every span; all clones emit to
/// the same process-wide `tracing` subscriber.
#[derive(Debug, Clone, Default)]
pub struct AppLogger {
    /// Tags applied to every log record
    tags: Vec<String>,
    /// Labels applied to every log record
    labels: HashMap<String, String>,
}

impl AppLogger {
    /// Create a new logger with the provided tags and labels that will be
    /// applied to each record.
    pub fn new(tags: Vec<String>, labels: HashMap<String, String>) -> Self {
        Self { tags, labels }
    }

    /// Log at debug level.
    pub fn debug(&self, msg: &str, fields: Fields) {
        self.emit(LogLevel::Debug, msg, &fields, &[]);
    }

    /// Log at info level.
    pub fn info(&self, msg: &str, fields: Fields) {
        self.emit(LogLevel::Info, msg, &fields, &[]);
    }

    /// Log at info level, tagged as a security event.
    pub fn security_info(&self, msg: &str, fields: Fields) {
        self.emit(LogLevel::Info, msg, &fields, &["security".to_string()]);
    }

    /// Log at warn level.
    pub fn warn(&self, msg: &str, fields: Fields) {
        self.emit(LogLevel::Warn, msg, &fields, &[]);
    }

    /// Log at error level.
    pub fn error(&self, msg: &str, fields: Fields) {
        self.emit(LogLevel::Error, msg, &fields, &[]);
    }

    /// Log at error level, then terminate the process.
    pub fn fatal(&self, msg: &str, fields: Fields) -> ! {
        self.emit(LogLevel::Error, msg, &fields, &["fatal".to_string()]);
        std::process::exit(1);
    }

    /// Build the serialized tag list and label map for one record,
    /// combining the logger defaults with any per-record additions.
    fn build_record(
        &self,
        fields: &Fields,
        extra_tags: &[String],
    ) -> (serde_json::Value, serde_json::Value, serde_json::Value) {
        let mut tags = self.tags.clone();
        tags.extend_from_slice(extra_tags);

        let tags = serde_json::json!(tags);
        let labels = serde_json::json!(self.labels);
        let fields = serde_json::json!(fields);

        (tags, labels, fields)
    }

    fn emit(&self, level: LogLevel, msg: &str, fields: &Fields, extra_tags: &[String]) {
        let (tags, labels, fields) = self.build_record(fields, extra_tags);

        match level {
            LogLevel::Debug => {
                tracing::debug!(tags = %tags, labels = %labels, fields = %fields, "{}", msg)
            }
            LogLevel::Info => {
                tracing::info!(tags = %tags, labels = %labels, fields = %fields, "{}", msg)
            }
            LogLevel::Warn => {
                tracing::warn!(tags = %tags, labels = %labels, fields = %fields, "{}", msg)
            }
            LogLevel::Error => {
                tracing::error!(tags = %tags, labels = %labels, fields = %fields, "{}", msg)
            }
        }
    }
}
