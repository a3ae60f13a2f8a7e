use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Ordered importance of a log record.
///
/// The discriminants follow the conventional numeric logging levels so that
/// `Debug < Info < Warning < Error < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Debug = 10,
    Info = 20,
    Warning = 30,
    Error = 40,
    Critical = 50,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// The upper-case name written into every record.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    const fn from_u8(value: u8) -> Option<Self> {
        match value {
            10 => Some(Severity::Debug),
            20 => Some(Severity::Info),
            30 => Some(Severity::Warning),
            40 => Some(Severity::Error),
            50 => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity '{0}', expected one of debug, info, warning, error, critical")]
pub struct ParseSeverityError(String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" | "fatal" => Ok(Severity::Critical),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(Severity::from_u8)
                .ok_or_else(|| ParseSeverityError(s.to_string())),
        }
    }
}

/// A severity that can be swapped while other threads read it.
#[derive(Debug)]
pub(crate) struct AtomicSeverity(AtomicU8);

impl AtomicSeverity {
    pub(crate) fn new(severity: Severity) -> Self {
        Self(AtomicU8::new(severity as u8))
    }

    pub(crate) fn load(&self) -> Severity {
        // Only valid discriminants are ever stored.
        Severity::from_u8(self.0.load(Ordering::Relaxed)).unwrap_or(Severity::Info)
    }

    pub(crate) fn store(&self, severity: Severity) {
        self.0.store(severity as u8, Ordering::Relaxed);
    }
}
