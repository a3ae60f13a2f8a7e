//! Output destinations for log records
//!
//! A logger owns at most one sink of each [`SinkKind`]. Sinks render a record
//! with their [`FormatStyle`](crate::FormatStyle) and write the line in one
//! locked operation, so records from concurrent callers never interleave.

mod console;
mod file;

pub use console::{Console, ConsoleSink};
pub use file::FileSink;

use crate::{errors::LogError, record::Record};

/// The kind of destination a sink writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Console,
    File,
}

/// A destination for emitted records
pub trait Sink: Send + Sync {
    fn kind(&self) -> SinkKind;

    /// Render and write one record.
    fn write(&self, record: &Record<'_>) -> Result<(), LogError>;

    fn flush(&self) -> Result<(), LogError>;
}
