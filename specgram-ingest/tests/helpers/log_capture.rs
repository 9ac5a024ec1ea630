//! Log Capture Utilities for Testing
//!
//! Records tracing events emitted on the current thread

use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

/// Captured log record
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    /// Value of the `key` field, if the event had one
    pub key: Option<String>,
}

/// Log capture layer for testing
#[derive(Clone, Default)]
pub struct LogCapture {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogCapture {
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Count records whose message contains `pattern`
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.records()
            .iter()
            .filter(|r| r.message.contains(pattern))
            .count()
    }

    /// Keys of records whose message contains `pattern`
    pub fn keys_matching(&self, pattern: &str) -> Vec<String> {
        self.records()
            .iter()
            .filter(|r| r.message.contains(pattern))
            .filter_map(|r| r.key.clone())
            .collect()
    }

    /// Assert at least one record at `level` contains `pattern`
    pub fn assert_contains(&self, level: Level, pattern: &str) {
        assert!(
            self.records()
                .iter()
                .any(|r| r.level == level && r.message.contains(pattern)),
            "Expected {} log matching '{}', but none found. All logs:\n{}",
            level,
            pattern,
            self.records()
                .iter()
                .map(|r| format!("{} {}", r.level, r.message))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

struct RecordVisitor {
    message: String,
    key: Option<String>,
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "key" => self.key = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let text = format!("{:?}", value);
        let text = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .map(str::to_string)
            .unwrap_or(text.clone());
        match field.name() {
            "message" => self.message = text,
            "key" => self.key = Some(text),
            _ => {}
        }
    }
}

impl<S> tracing_subscriber::Layer<S> for LogCapture
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = RecordVisitor {
            message: String::new(),
            key: None,
        };
        event.record(&mut visitor);

        self.records.lock().unwrap().push(LogRecord {
            level: *event.metadata().level(),
            message: visitor.message,
            key: visitor.key,
        });
    }
}

/// Run `f` with a capturing subscriber installed for the current thread
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, LogCapture) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, capture)
}
