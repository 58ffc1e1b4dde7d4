use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Severity levels recognized by the relay logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the canonical uppercase representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON-line logger writing to an injectable sink.
pub struct RelayLogger {
    level: LogLevel,
    sink: Box<dyn Write + Send>,
}

impl RelayLogger {
    /// Logger writing to stderr at `Info`, the binary default.
    pub fn to_stderr() -> Self {
        Self::with_sink(LogLevel::Info, Box::new(io::stderr()))
    }

    pub fn with_sink(level: LogLevel, sink: Box<dyn Write + Send>) -> Self {
        Self { level, sink }
    }

    /// Returns the current level filter.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Applies a dynamic log-level override.
    pub fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    /// Emits a JSON-line log entry. Entries below the current level are
    /// dropped.
    pub fn log(
        &mut self,
        level: LogLevel,
        module: &str,
        message: &str,
    ) -> Result<(), LoggingError> {
        if level < self.level {
            return Ok(());
        }
        let record = LogRecord {
            ts_ms: epoch_millis(),
            level: level.as_str(),
            module,
            message,
        };
        let line = serde_json::to_string(&record)?;
        writeln!(self.sink, "{line}")?;
        Ok(())
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis().min(u128::from(u64::MAX)) as u64)
        .unwrap_or(0)
}

/// Errors surfaced while emitting log lines.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write log record: {0}")]
    Sink(#[from] io::Error),
}

#[derive(Debug, Serialize)]
struct LogRecord<'a> {
    ts_ms: u64,
    level: &'a str,
    module: &'a str,
    message: &'a str,
}
