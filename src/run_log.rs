//! Log lines captured for a single run

use chrono::{DateTime, Local};
use log::Level;

/// One captured log line
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: DateTime<Local>,
    pub level: Level,
    pub message: String,
}

impl LogEntry {
    /// `[HH:MM:SS LVL] message`
    pub fn format_line(&self) -> String {
        let level = match self.level {
            Level::Error => "ERR",
            Level::Warn => "WRN",
            Level::Info => "INF",
            Level::Debug => "DBG",
            Level::Trace => "TRC",
        };
        format!("[{} {}] {}", self.time.format("%H:%M:%S"), level, self.message)
    }
}

/// Run-scoped log buffer.
///
/// Every line is forwarded to the `log` facade as well as kept here, so the
/// log-digest renderer can mail the run's own narrative. Debug lines are
/// forwarded but only kept when `keep_debug` is set.
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
    keep_debug: bool,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(keep_debug: bool) -> Self {
        Self {
            entries: Vec::new(),
            keep_debug,
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(Level::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(Level::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(Level::Error, message.into());
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.record(Level::Debug, message.into());
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(LogEntry::format_line).collect()
    }

    fn record(&mut self, level: Level, message: String) {
        log::log!(level, "{}", message);
        if level <= Level::Info || self.keep_debug {
            self.entries.push(LogEntry {
                time: Local::now(),
                level,
                message,
            });
        }
    }
}
