//! Bridge from `tracing` events to a [`LoggerHandle`].

use std::fmt::{self, Write as _};
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::{handle::LoggerHandle, record::Location, severity::Severity};

/// A `tracing_subscriber` layer that writes every event it sees through a
/// logger, subject to the logger's level.
///
/// Fields other than `message` are appended to the message as `key=value`.
pub struct HandleLayer {
    handle: Arc<LoggerHandle>,
}

impl HandleLayer {
    pub fn new(handle: Arc<LoggerHandle>) -> Self {
        Self { handle }
    }
}

/// Collects the message and the remaining fields of an event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn into_message(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
            return;
        }
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={:?}", field.name(), value);
    }
}

impl<S> Layer<S> for HandleLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let severity = Severity::from(*metadata.level());
        if !self.handle.enabled(severity) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = visitor.into_message();

        let location = Location::new(
            metadata.module_path().unwrap_or_else(|| metadata.target()),
            metadata.name(),
            metadata.file().unwrap_or("<unknown>"),
            metadata.line().unwrap_or(0),
        );

        if let Err(e) = self
            .handle
            .emit(severity, location, format_args!("{message}"))
        {
            // A layer has no caller to return the failure to.
            eprintln!(
                "Failed to write tracing event to logger '{}': {e}",
                self.handle.name()
            );
        }
    }
}
