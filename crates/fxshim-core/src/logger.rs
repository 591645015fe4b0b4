//! Bridge for components that report messages as `(level, source, text)` triples.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        })
    }
}

/// Forwards a message to `tracing`. Never fails and never blocks on the subscriber.
pub fn log_message(level: LogLevel, source: &str, message: &str) {
    match level {
        LogLevel::Debug => tracing::debug!(source, "{message}"),
        LogLevel::Info => tracing::info!(source, "{message}"),
        LogLevel::Warning => tracing::warn!(source, "{message}"),
        LogLevel::Error => tracing::error!(source, "{message}"),
        LogLevel::Fatal => tracing::error!(source, fatal = true, "{message}"),
    }
}
