use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::Level;

/// A single log entry captured from tracing
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Local>,
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>5} {}: {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.level,
            self.target,
            self.message
        )
    }
}

/// Thread-safe circular buffer for log entries
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: Arc<RwLock<VecDeque<LogEntry>>>,
    max_entries: usize,
}

impl LogBuffer {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(max_entries))),
            max_entries,
        }
    }

    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn get_entries(&self) -> Vec<LogEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Entries at or above `level` in severity
    pub fn entries_at(&self, level: Level) -> Vec<LogEntry> {
        self.get_entries()
            .into_iter()
            .filter(|entry| entry.level <= level)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: Level, message: &str) -> LogEntry {
        LogEntry {
            timestamp: chrono::Local::now(),
            level,
            target: "slidenote".into(),
            message: message.into(),
        }
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let buffer = LogBuffer::new(2);
        buffer.push(entry(Level::INFO, "one"));
        buffer.push(entry(Level::INFO, "two"));
        buffer.push(entry(Level::INFO, "three"));

        let messages: Vec<_> = buffer.get_entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn filter_by_severity() {
        let buffer = LogBuffer::new(10);
        buffer.push(entry(Level::DEBUG, "noise"));
        buffer.push(entry(Level::WARN, "careful"));
        buffer.push(entry(Level::ERROR, "broken"));

        assert_eq!(buffer.entries_at(Level::WARN).len(), 2);
        assert_eq!(buffer.entries_at(Level::TRACE).len(), 3);
    }
}
