use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use crate::{
    config::LoggerConfig,
    errors::LogError,
    format::FormatStyle,
    record::{Location, Record},
    severity::{AtomicSeverity, Severity},
    sink::{ConsoleSink, FileSink, Sink, SinkKind},
};

/// A named, configured logger.
///
/// Handles are created by a [`LoggerRegistry`](crate::LoggerRegistry) and
/// shared behind an `Arc`. Only the level can change after creation.
pub struct LoggerHandle {
    name: String,
    level: AtomicSeverity,
    config: LoggerConfig,
    format_style: FormatStyle,
    file: Option<FileSink>,
    console: Option<ConsoleSink>,
}

impl LoggerHandle {
    pub(crate) fn new(
        name: String,
        config: LoggerConfig,
        format_style: FormatStyle,
        file: Option<FileSink>,
        console: Option<ConsoleSink>,
    ) -> Self {
        Self {
            level: AtomicSeverity::new(config.level),
            name,
            config,
            format_style,
            file,
            console,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Severity {
        self.level.load()
    }

    /// Change the minimum severity. Applies to every emit that starts afterwards.
    pub fn set_level(&self, level: Severity) {
        self.level.store(level);
    }

    /// Whether a record of `severity` would currently be written.
    #[inline]
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.level.load()
    }

    /// The configuration the handle was created with. Its `level` is the
    /// creation level; see [`LoggerHandle::level`] for the current one.
    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Format used by the file sink, and by the console when it is not colored.
    pub fn format_style(&self) -> FormatStyle {
        self.format_style
    }

    pub fn console_style(&self) -> Option<FormatStyle> {
        self.console.as_ref().map(ConsoleSink::style)
    }

    pub fn log_file_path(&self) -> Option<&Path> {
        self.file.as_ref().map(FileSink::path)
    }

    pub fn sink_kinds(&self) -> Vec<SinkKind> {
        self.sinks().map(|sink| sink.kind()).collect()
    }

    /// Write a record to every sink when `severity` passes the level check.
    ///
    /// `args` is only rendered after the check passes. Every sink receives the
    /// record even if an earlier one fails; the first failure is returned.
    pub fn emit(
        &self,
        severity: Severity,
        location: Location,
        args: fmt::Arguments<'_>,
    ) -> Result<(), LogError> {
        if !self.enabled(severity) {
            return Ok(());
        }

        let message = match args.as_str() {
            Some(literal) => Cow::Borrowed(literal),
            None => Cow::Owned(args.to_string()),
        };
        let record = Record::new(&self.name, severity, &message, location);

        let mut first_error = None;
        for sink in self.sinks() {
            if let Err(e) = sink.write(&record) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn flush(&self) -> Result<(), LogError> {
        for sink in self.sinks() {
            sink.flush()?;
        }
        Ok(())
    }

    fn sinks(&self) -> impl Iterator<Item = &dyn Sink> {
        let file = self.file.iter().map(|sink| sink as &dyn Sink);
        let console = self.console.iter().map(|sink| sink as &dyn Sink);
        file.chain(console)
    }
}

impl fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("format_style", &self.format_style)
            .field("sinks", &self.sink_kinds())
            .finish()
    }
}

/// Emit a record through a [`LoggerHandle`] at the given severity.
///
/// The format arguments are not evaluated into a message unless the handle's
/// level lets the record through. Evaluates to `Result<(), LogError>`.
///
/// ```ignore
/// darca_log_facility::log!(handle, Severity::Info, "processed {} items", count)?;
/// ```
#[macro_export]
macro_rules! log {
    ($handle:expr, $severity:expr, $($arg:tt)+) => {{
        let handle = &$handle;
        let severity: $crate::Severity = $severity;
        if handle.enabled(severity) {
            handle.emit(severity, $crate::location!(), ::std::format_args!($($arg)+))
        } else {
            ::std::result::Result::<(), $crate::LogError>::Ok(())
        }
    }};
}

#[macro_export]
macro_rules! debug {
    ($handle:expr, $($arg:tt)+) => {
        $crate::log!($handle, $crate::Severity::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($handle:expr, $($arg:tt)+) => {
        $crate::log!($handle, $crate::Severity::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warning {
    ($handle:expr, $($arg:tt)+) => {
        $crate::log!($handle, $crate::Severity::Warning, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($handle:expr, $($arg:tt)+) => {
        $crate::log!($handle, $crate::Severity::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! critical {
    ($handle:expr, $($arg:tt)+) => {
        $crate::log!($handle, $crate::Severity::Critical, $($arg)+)
    };
}
