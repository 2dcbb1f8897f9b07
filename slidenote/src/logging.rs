use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::log_buffer::{LogBuffer, LogEntry};

/// Directory holding the session log files
pub fn logs_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(anyhow::anyhow!("Could not find config directory"))?
        .join("slidenote");
    Ok(config_dir.join("logs"))
}

/// Initialize tracing with file-based logging and an in-memory buffer
/// Logs are written to ~/.config/slidenote/logs/slidenote-YYYY-MM-DD-HH-MM-SS.log
pub fn init_logging(buffer: LogBuffer) -> Result<PathBuf> {
    // RUST_LOG may come from .env
    dotenvy::dotenv().ok();

    let logs_dir = logs_dir()?;
    std::fs::create_dir_all(&logs_dir)?;

    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let log_filename = format!("slidenote-{}.log", timestamp);
    let log_path = logs_dir.join(&log_filename);

    // Non-blocking file writer
    let file_appender = tracing_appender::rolling::never(&logs_dir, &log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let filter = env_filter(EnvFilter::DEFAULT_ENV);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(LogBufferLayer::new(buffer))
        .init();

    // The writer must outlive every log call
    std::mem::forget(guard);

    Ok(log_path)
}

/// Default to INFO, can be overridden with `var`
fn env_filter(var: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// A tracing layer that captures log entries to an in-memory buffer
pub struct LogBufferLayer {
    buffer: LogBuffer,
}

impl LogBufferLayer {
    pub fn new(buffer: LogBuffer) -> Self {
        Self { buffer }
    }
}

impl<S> Layer<S> for LogBufferLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.buffer.push(LogEntry {
            timestamp: chrono::Local::now(),
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
        });
    }
}

/// Visitor to extract the message field from a tracing event
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_layer_captures_events() {
        let buffer = LogBuffer::new(10);
        let subscriber = tracing_subscriber::registry().with(LogBufferLayer::new(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("Upload rejected: {}", "too large");
        });

        let entries = buffer.get_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, tracing::Level::WARN);
        assert_eq!(entries[0].message, "Upload rejected: too large");
    }

    #[test]
    fn env_file_directives_reach_the_filter() {
        let dir = std::env::temp_dir().join(format!("slidenote-env-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        std::fs::write(&path, "SLIDENOTE_TEST_FILTER=slidenote=debug\n").unwrap();

        dotenvy::from_path(&path).unwrap();

        let filter = env_filter("SLIDENOTE_TEST_FILTER");
        assert!(filter.to_string().contains("slidenote=debug"), "{}", filter);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_filter_defaults_to_info() {
        let filter = env_filter("SLIDENOTE_UNSET_FILTER");
        assert_eq!(filter.to_string(), "info");
    }
}
