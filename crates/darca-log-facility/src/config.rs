//! Logger configuration
//!
//! Provides the per-logger option record, the settings file structure and the
//! helpers that read settings from YAML and the environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::{env_expansion, severity::Severity};

/// Prefix for environment variables that override settings
const ENV_PREFIX: &str = "DARCA_LOG_";

/// Separator to use when drilling down into nested options in the env figment
const ENV_NESTED_SEPARATOR: &str = "__";

/// Construction options for one named logger.
///
/// Every option is fixed when the logger is first created, except the level,
/// which can be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema, bon::Builder)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum severity a record needs to be written
    #[serde(deserialize_with = "parsers::from_str")]
    #[schemars(schema_with = "severity")]
    #[builder(default = defaults::level())]
    pub level: Severity,

    /// Write records to `{log_directory}/{name}.log`
    #[builder(default = true)]
    pub log_to_file: bool,

    /// Write records to standard output
    #[builder(default = true)]
    pub log_to_console: bool,

    /// Directory holding the log file and its rotated copies
    #[builder(into, default = defaults::log_directory())]
    pub log_directory: PathBuf,

    /// Size in bytes a log file may reach before it is rotated
    #[builder(default = defaults::max_file_size())]
    pub max_file_size: u64,

    /// Number of rotated files to keep
    #[builder(default = defaults::backup_count())]
    pub backup_count: usize,

    /// Emit one JSON object per record instead of plain text
    #[builder(default = false)]
    pub json_format: bool,

    /// Colorize console output when the terminal supports it
    #[builder(default = true)]
    pub colored_console: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LoggerConfig {
    /// Names of the options whose values differ between the two configs.
    pub fn differing_fields(&self, other: &LoggerConfig) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.level != other.level {
            fields.push("level");
        }
        if self.log_to_file != other.log_to_file {
            fields.push("log_to_file");
        }
        if self.log_to_console != other.log_to_console {
            fields.push("log_to_console");
        }
        if self.log_directory != other.log_directory {
            fields.push("log_directory");
        }
        if self.max_file_size != other.max_file_size {
            fields.push("max_file_size");
        }
        if self.backup_count != other.backup_count {
            fields.push("backup_count");
        }
        if self.json_format != other.json_format {
            fields.push("json_format");
        }
        if self.colored_console != other.colored_console {
            fields.push("colored_console");
        }
        fields
    }
}

/// A complete logging setup: the loggers to create and which one is the default
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct Settings {
    /// Name of the logger used when none is requested explicitly
    #[serde(default = "defaults::default_logger")]
    pub default_logger: String,

    /// Loggers to create, keyed by name
    #[serde(default)]
    pub loggers: BTreeMap<String, LoggerConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_logger: defaults::default_logger(),
            loggers: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// The configuration declared for `name`, or the defaults when it is not declared.
    pub fn logger(&self, name: &str) -> LoggerConfig {
        self.loggers.get(name).cloned().unwrap_or_default()
    }
}

/// Read settings from environment variables only (when no settings file is provided)
#[allow(clippy::result_large_err)]
pub fn read_settings_from_env() -> Result<Settings, figment::Error> {
    Figment::new()
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .extract()
}

/// Read settings from a YAML file, letting the environment override file values.
///
/// Environment variable references using `${env.VAR_NAME}` syntax are expanded
/// before the YAML is parsed.
#[allow(clippy::result_large_err)]
pub fn read_settings(yaml_path: impl AsRef<Path>) -> Result<Settings, figment::Error> {
    let content = std::fs::read_to_string(yaml_path.as_ref()).map_err(|e| {
        figment::Error::from(format!(
            "failed to read settings file '{}': {}",
            yaml_path.as_ref().display(),
            e
        ))
    })?;

    let expanded = env_expansion::expand_yaml(&content)
        .map_err(|e| figment::Error::from(e.to_string()))?;

    Figment::new()
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .join(Yaml::string(&expanded))
        .extract()
}

pub(crate) mod defaults {
    use std::path::PathBuf;

    use crate::severity::Severity;

    pub(crate) const fn level() -> Severity {
        Severity::Info
    }

    pub(crate) fn log_directory() -> PathBuf {
        PathBuf::from("logs")
    }

    pub(crate) const fn max_file_size() -> u64 {
        5 * 1024 * 1024
    }

    pub(crate) const fn backup_count() -> usize {
        5
    }

    pub(crate) fn default_logger() -> String {
        "app".to_string()
    }
}

mod parsers {
    use std::{fmt::Display, marker::PhantomData, str::FromStr};

    use serde::Deserializer;

    pub(super) fn from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        <T as FromStr>::Err: Display,
    {
        struct FromStrVisitor<Inner> {
            _phantom: PhantomData<Inner>,
        }
        impl<Inner> serde::de::Visitor<'_> for FromStrVisitor<Inner>
        where
            Inner: FromStr,
            <Inner as FromStr>::Err: Display,
        {
            type Value = Inner;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Inner::from_str(v).map_err(|e| serde::de::Error::custom(e.to_string()))
            }

            // Numeric levels arrive as integers from the environment
            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(&v.to_string())
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(&v.to_string())
            }
        }

        deserializer.deserialize_str(FromStrVisitor {
            _phantom: PhantomData,
        })
    }
}

fn severity(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
    /// Log severity
    #[derive(JsonSchema)]
    #[schemars(rename_all = "lowercase")]
    // This is just an intermediate type to auto create schema information for,
    // so it is OK if it is never used
    #[allow(dead_code)]
    enum Severity {
        Debug,
        Info,
        Warning,
        Error,
        Critical,
    }

    Severity::json_schema(generator)
}
