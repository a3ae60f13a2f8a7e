use chrono::{Local, SecondsFormat};
use nu_ansi_term::{Color, Style};
use serde::Serialize;

use crate::{errors::LogError, record::Record, severity::Severity};

/// How a sink renders records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatStyle {
    /// `<timestamp> - <name> - <LEVEL> - <message>`
    #[default]
    Plain,
    /// One self-contained JSON object per line.
    Json,
    /// The plain layout painted with a per-severity ANSI color.
    Colored,
}

/// Field layout of a JSON record.
#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: String,
    level: &'static str,
    message: &'a str,
    module: &'static str,
    function: &'static str,
    line: u32,
    process: u32,
    thread: u64,
}

impl FormatStyle {
    /// Render a record as a single line, without the trailing newline.
    pub fn render(&self, record: &Record<'_>) -> Result<String, LogError> {
        match self {
            FormatStyle::Plain => Ok(plain_line(record)),
            FormatStyle::Json => json_line(record),
            FormatStyle::Colored => Ok(severity_style(record.severity)
                .paint(plain_line(record))
                .to_string()),
        }
    }
}

fn plain_line(record: &Record<'_>) -> String {
    format!(
        "{} - {} - {} - {}",
        record
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S,%3f"),
        record.logger,
        record.severity,
        record.message
    )
}

fn json_line(record: &Record<'_>) -> Result<String, LogError> {
    let json = JsonRecord {
        timestamp: record
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Micros, true),
        level: record.severity.as_str(),
        message: record.message,
        module: record.location.module,
        function: record.location.function,
        line: record.location.line,
        process: record.process,
        thread: record.thread,
    };
    Ok(serde_json::to_string(&json)?)
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Debug => Color::Cyan.normal(),
        Severity::Info => Color::Green.normal(),
        Severity::Warning => Color::Yellow.normal(),
        Severity::Error => Color::Red.normal(),
        Severity::Critical => Color::Red.bold(),
    }
}
