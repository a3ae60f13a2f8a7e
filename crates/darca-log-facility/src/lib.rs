#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Named loggers with console and size-rotated file output.
//!
//! A [`LoggerRegistry`] holds one [`LoggerHandle`] per name. The first request
//! for a name decides its configuration; later requests share the same
//! handle. Records go to `{log_directory}/{name}.log` (rotated by size) and/or
//! standard output, as plain text, JSON lines, or colorized text.
//!
//! ```ignore
//! use darca_log_facility::{LoggerConfig, LoggerRegistry, Severity};
//!
//! let registry = LoggerRegistry::new();
//! let logger = registry.get_or_create(
//!     "svc",
//!     LoggerConfig::builder().level(Severity::Debug).json_format(true).build(),
//! )?;
//!
//! darca_log_facility::info!(logger, "started with {} workers", 4)?;
//! registry.set_level("svc", Severity::Warning)?;
//! ```

pub mod capability;
pub mod config;
pub mod env_expansion;
pub mod errors;
pub mod format;
mod handle;
pub mod layer;
#[doc(hidden)]
pub mod record;
mod registry;
mod severity;
pub mod sink;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{LoggerConfig, Settings, read_settings, read_settings_from_env};
pub use errors::{ConfigurationIgnored, LogError};
pub use format::FormatStyle;
pub use handle::LoggerHandle;
pub use layer::HandleLayer;
pub use record::{Location, Record};
pub use registry::{LoggerRegistry, LoggerRegistryBuilder, Registration, global_registry};
pub use severity::{ParseSeverityError, Severity};
