use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use darca_log_facility::{
    LoggerHandle, LoggerRegistry, Severity, location, read_settings, read_settings_from_env,
};
use tracing_subscriber::EnvFilter;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = STYLES,
    about = "Darca Log - write records through a configured named logger",
)]
struct Args {
    /// Path to a YAML settings file. Without it, settings come from DARCA_LOG_* variables.
    #[arg(long, short = 'c', env = "DARCA_LOG_CONFIG")]
    config: Option<PathBuf>,

    /// Logger to write through. Defaults to the settings' default logger.
    #[arg(long, short = 'n')]
    name: Option<String>,

    /// Override the logger's minimum severity
    #[arg(long, short = 'l')]
    level: Option<Severity>,

    /// Severity of the emitted records
    #[arg(long, short = 's', default_value_t = Severity::Info)]
    severity: Severity,

    /// Message to log. When omitted, every line read from stdin is logged.
    message: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let count = run(args, io::stdin().lock())?;
    tracing::debug!(count, "Finished writing records");
    Ok(())
}

/// Load settings, resolve the logger and write the message, or every line of
/// `input` when no message was given. Returns the number of records written.
fn run(args: Args, input: impl BufRead) -> anyhow::Result<usize> {
    let settings = match &args.config {
        Some(path) => read_settings(path)
            .with_context(|| format!("Could not load settings from {}", path.display()))?,
        None => read_settings_from_env().context("Could not load settings from environment")?,
    };

    let name = args.name.unwrap_or_else(|| settings.default_logger.clone());
    let registry = LoggerRegistry::new();
    let logger = registry.get_or_create(&name, settings.logger(&name))?;
    if let Some(level) = args.level {
        logger.set_level(level);
    }

    let count = match args.message {
        Some(message) => {
            emit_line(&logger, args.severity, &message)?;
            1
        }
        None => emit_lines(&logger, args.severity, input)?,
    };

    registry.flush_all()?;
    Ok(count)
}

fn emit_line(logger: &LoggerHandle, severity: Severity, message: &str) -> anyhow::Result<()> {
    logger
        .emit(severity, location!(), format_args!("{message}"))
        .with_context(|| format!("Could not write to logger '{}'", logger.name()))
}

/// Emit each line of `input` as its own record. Blank lines are skipped.
fn emit_lines(
    logger: &LoggerHandle,
    severity: Severity,
    input: impl BufRead,
) -> anyhow::Result<usize> {
    let mut count = 0;
    for line in input.lines() {
        let line = line.context("Could not read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        emit_line(logger, severity, &line)?;
        count += 1;
    }
    Ok(count)
}
