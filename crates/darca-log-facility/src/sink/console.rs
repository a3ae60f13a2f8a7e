use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use super::{Sink, SinkKind};
use crate::{errors::LogError, format::FormatStyle, record::Record};

/// A console stream shared by every console sink of a registry.
///
/// Writes through one console are serialized, so lines from different
/// loggers never interleave.
pub struct Console {
    writer: BoxMakeWriter,
    lock: Mutex<()>,
}

impl Console {
    pub fn stdout() -> Self {
        Self::new(BoxMakeWriter::new(std::io::stdout))
    }

    pub fn new(writer: BoxMakeWriter) -> Self {
        Self {
            writer,
            lock: Mutex::new(()),
        }
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock();
        self.writer.make_writer().write_all(line.as_bytes())
    }

    fn flush(&self) -> std::io::Result<()> {
        let _guard = self.lock.lock();
        self.writer.make_writer().flush()
    }
}

/// Writes records to a [`Console`] shared with the other loggers of a registry.
pub struct ConsoleSink {
    console: Arc<Console>,
    style: FormatStyle,
}

impl ConsoleSink {
    pub fn new(console: Arc<Console>, style: FormatStyle) -> Self {
        Self { console, style }
    }

    pub fn style(&self) -> FormatStyle {
        self.style
    }
}

impl Sink for ConsoleSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Console
    }

    fn write(&self, record: &Record<'_>) -> Result<(), LogError> {
        let mut line = self.style.render(record)?;
        line.push('\n');

        self.console
            .write_line(&line)
            .map_err(|source| LogError::Write {
                target: "console".to_string(),
                source,
            })
    }

    fn flush(&self) -> Result<(), LogError> {
        self.console.flush().map_err(|source| LogError::Write {
            target: "console".to_string(),
            source,
        })
    }
}
