//! Named logger registry

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::{
    capability::detect_color_support,
    config::{LoggerConfig, Settings},
    errors::{ConfigurationIgnored, LogError},
    format::FormatStyle,
    handle::LoggerHandle,
    record::Location,
    severity::Severity,
    sink::{Console, ConsoleSink, FileSink},
};

/// Owns exactly one [`LoggerHandle`] per name.
///
/// The first request for a name decides the logger's configuration. Later
/// requests get the same handle back and their configuration is ignored,
/// with a [`ConfigurationIgnored`] warning when it differs.
pub struct LoggerRegistry {
    loggers: RwLock<HashMap<String, Arc<LoggerHandle>>>,
    console: Arc<Console>,
    color_capability: bool,
}

/// The outcome of [`LoggerRegistry::register`].
#[derive(Debug)]
pub struct Registration {
    pub handle: Arc<LoggerHandle>,
    /// Set when the logger already existed and the requested configuration differed.
    pub ignored: Option<ConfigurationIgnored>,
}

pub struct LoggerRegistryBuilder {
    console: Option<BoxMakeWriter>,
    color_capability: Option<bool>,
}

impl LoggerRegistryBuilder {
    pub fn new() -> Self {
        Self {
            console: None,
            color_capability: None,
        }
    }

    /// Send console output somewhere other than standard output.
    pub fn with_console_writer<W>(mut self, mw: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.console = Some(BoxMakeWriter::new(mw));
        self
    }

    /// Skip terminal detection and use the given color capability.
    pub fn with_color_capability(mut self, enabled: bool) -> Self {
        self.color_capability = Some(enabled);
        self
    }

    pub fn build(self) -> LoggerRegistry {
        let console = match self.console {
            Some(writer) => Console::new(writer),
            None => Console::stdout(),
        };
        LoggerRegistry {
            loggers: RwLock::new(HashMap::new()),
            console: Arc::new(console),
            color_capability: self.color_capability.unwrap_or_else(detect_color_support),
        }
    }
}

impl Default for LoggerRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerRegistry {
    /// A registry writing console output to standard output, with color
    /// capability detected from the terminal.
    pub fn new() -> Self {
        LoggerRegistryBuilder::new().build()
    }

    pub fn builder() -> LoggerRegistryBuilder {
        LoggerRegistryBuilder::new()
    }

    pub fn color_capability(&self) -> bool {
        self.color_capability
    }

    /// Return the logger named `name`, creating it from `config` if it does not exist yet.
    pub fn get_or_create(
        &self,
        name: &str,
        config: LoggerConfig,
    ) -> Result<Arc<LoggerHandle>, LogError> {
        self.register(name, config)
            .map(|registration| registration.handle)
    }

    /// Like [`get_or_create`](Self::get_or_create), also reporting whether the
    /// requested configuration was ignored.
    pub fn register(&self, name: &str, config: LoggerConfig) -> Result<Registration, LogError> {
        if let Some(handle) = self.get(name) {
            return Ok(Self::existing(handle, &config));
        }

        let mut loggers = self.loggers.write();
        // Another caller may have created it between the two locks.
        if let Some(handle) = loggers.get(name).cloned() {
            drop(loggers);
            return Ok(Self::existing(handle, &config));
        }

        let handle = Arc::new(self.build_handle(name, config)?);
        loggers.insert(name.to_string(), handle.clone());
        drop(loggers);

        if let Some(path) = handle.log_file_path() {
            tracing::info!(
                logger = name,
                path = %path.display(),
                "Logger initialized. Writing logs to {}",
                path.display()
            );
        }
        Ok(Registration {
            handle,
            ignored: None,
        })
    }

    /// Create every logger declared in `settings`.
    pub fn configure(&self, settings: &Settings) -> Result<Vec<Registration>, LogError> {
        settings
            .loggers
            .iter()
            .map(|(name, config)| self.register(name, config.clone()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<LoggerHandle>> {
        self.loggers.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loggers.read().contains_key(name)
    }

    /// Names of all created loggers, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Change the level of an existing logger.
    pub fn set_level(&self, name: &str, level: Severity) -> Result<(), LogError> {
        self.require(name)?.set_level(level);
        Ok(())
    }

    /// Emit a record through the logger named `name`.
    pub fn emit(
        &self,
        name: &str,
        severity: Severity,
        location: Location,
        args: fmt::Arguments<'_>,
    ) -> Result<(), LogError> {
        self.require(name)?.emit(severity, location, args)
    }

    pub fn flush_all(&self) -> Result<(), LogError> {
        let handles: Vec<_> = self.loggers.read().values().cloned().collect();
        for handle in handles {
            handle.flush()?;
        }
        Ok(())
    }

    fn require(&self, name: &str) -> Result<Arc<LoggerHandle>, LogError> {
        self.get(name).ok_or_else(|| LogError::NotFound {
            name: name.to_string(),
        })
    }

    fn existing(handle: Arc<LoggerHandle>, requested: &LoggerConfig) -> Registration {
        let fields = handle.config().differing_fields(requested);
        let ignored = (!fields.is_empty()).then(|| ConfigurationIgnored {
            name: handle.name().to_string(),
            fields,
        });
        if let Some(ignored) = &ignored {
            tracing::warn!(logger = handle.name(), "{ignored}");
        }
        Registration { handle, ignored }
    }

    // Either every requested sink is attached or the error is returned and
    // nothing is registered. Runs under the write lock, so it emits no events.
    fn build_handle(&self, name: &str, config: LoggerConfig) -> Result<LoggerHandle, LogError> {
        validate_name(name)?;

        let style = if config.json_format {
            FormatStyle::Json
        } else {
            FormatStyle::Plain
        };

        let file = if config.log_to_file {
            let sink = FileSink::open(
                &config.log_directory,
                name,
                config.max_file_size,
                config.backup_count,
                style,
            )?;
            Some(sink)
        } else {
            None
        };

        let console = config.log_to_console.then(|| {
            let console_style = if config.colored_console && self.color_capability {
                FormatStyle::Colored
            } else {
                style
            };
            ConsoleSink::new(self.console.clone(), console_style)
        });

        Ok(LoggerHandle::new(
            name.to_string(),
            config,
            style,
            file,
            console,
        ))
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("loggers", &self.names())
            .field("color_capability", &self.color_capability)
            .finish()
    }
}

fn validate_name(name: &str) -> Result<(), LogError> {
    let reason = if name.is_empty() {
        "name must not be empty"
    } else if name.contains(['/', '\\']) {
        "name must not contain a path separator"
    } else {
        return Ok(());
    };
    Err(LogError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// A process-wide registry for callers that do not pass one around.
pub fn global_registry() -> &'static LoggerRegistry {
    static GLOBAL: OnceLock<LoggerRegistry> = OnceLock::new();
    GLOBAL.get_or_init(LoggerRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkKind;
    use crate::test_support::TestBuffer;
    use assert_fs::TempDir;
    use rstest::rstest;
    use std::path::Path;
    use tracing_test::traced_test;

    fn registry(buffer: &TestBuffer, color: bool) -> LoggerRegistry {
        LoggerRegistry::builder()
            .with_console_writer(buffer.clone())
            .with_color_capability(color)
            .build()
    }

    fn file_config(dir: &Path) -> LoggerConfig {
        LoggerConfig::builder()
            .log_directory(dir)
            .log_to_console(false)
            .build()
    }

    #[test]
    fn same_name_returns_same_handle_with_first_config() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&TestBuffer::default(), false);

        let first = registry
            .get_or_create("svc", file_config(temp.path()))
            .unwrap();
        let second = registry
            .get_or_create(
                "svc",
                LoggerConfig::builder()
                    .level(Severity::Error)
                    .json_format(true)
                    .log_to_file(false)
                    .build(),
            )
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.config(), &file_config(temp.path()));
        assert_eq!(second.level(), Severity::Info);
        assert_eq!(second.format_style(), FormatStyle::Plain);
        assert_eq!(second.sink_kinds(), vec![SinkKind::File]);
    }

    #[test]
    #[traced_test]
    fn differing_config_is_reported_and_ignored() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&TestBuffer::default(), false);
        registry
            .register("svc", file_config(temp.path()))
            .unwrap();

        let mut requested = file_config(temp.path());
        requested.level = Severity::Debug;
        let registration = registry.register("svc", requested).unwrap();

        let ignored = registration.ignored.unwrap();
        assert_eq!(ignored.name, "svc");
        assert_eq!(ignored.fields, vec!["level"]);
        assert!(logs_contain("already exists, ignoring configuration for: level"));
    }

    #[test]
    fn identical_config_is_not_reported() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&TestBuffer::default(), false);
        registry
            .register("svc", file_config(temp.path()))
            .unwrap();

        let registration = registry
            .register("svc", file_config(temp.path()))
            .unwrap();

        assert!(registration.ignored.is_none());
    }

    #[test]
    fn set_level_on_unknown_name_is_not_found() {
        let registry = registry(&TestBuffer::default(), false);

        let err = registry.set_level("ghost", Severity::Error).unwrap_err();

        assert!(matches!(err, LogError::NotFound { ref name } if name == "ghost"));
    }

    #[test]
    fn emit_on_unknown_name_is_not_found() {
        let registry = registry(&TestBuffer::default(), false);

        let err = registry
            .emit(
                "ghost",
                Severity::Info,
                crate::location!(),
                format_args!("lost"),
            )
            .unwrap_err();

        assert!(matches!(err, LogError::NotFound { .. }));
    }

    #[test]
    fn set_level_is_visible_through_every_reference() {
        let buffer = TestBuffer::default();
        let registry = registry(&buffer, false);
        let config = LoggerConfig::builder().log_to_file(false).build();
        let handle = registry.get_or_create("svc", config).unwrap();

        registry.set_level("svc", Severity::Error).unwrap();
        crate::warning!(handle, "suppressed").unwrap();
        registry
            .emit("svc", Severity::Error, crate::location!(), format_args!("kept"))
            .unwrap();

        assert_eq!(handle.level(), Severity::Error);
        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("svc - ERROR - kept"));
    }

    #[test]
    fn colored_console_is_used_when_capable() {
        let buffer = TestBuffer::default();
        let registry = registry(&buffer, true);
        let config = LoggerConfig::builder().log_to_file(false).build();
        let handle = registry.get_or_create("painted", config).unwrap();

        crate::info!(handle, "green").unwrap();

        assert_eq!(handle.console_style(), Some(FormatStyle::Colored));
        assert!(buffer.contents().contains("\u{1b}["));
    }

    #[rstest]
    #[case(false, FormatStyle::Plain)]
    #[case(true, FormatStyle::Json)]
    fn console_falls_back_to_file_format_without_color(
        #[case] json_format: bool,
        #[case] expected: FormatStyle,
    ) {
        let buffer = TestBuffer::default();
        let registry = registry(&buffer, false);
        let config = LoggerConfig::builder()
            .log_to_file(false)
            .colored_console(true)
            .json_format(json_format)
            .build();
        let handle = registry.get_or_create("plain", config).unwrap();

        crate::error!(handle, "no colors here").unwrap();

        assert_eq!(handle.console_style(), Some(expected));
        let output = buffer.contents();
        assert!(!output.contains('\u{1b}'));
        assert!(output.contains("no colors here"));
        assert!(output.contains("ERROR"));
    }

    #[test]
    #[traced_test]
    fn file_logger_announces_its_path() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&TestBuffer::default(), false);

        let handle = registry
            .get_or_create("announced", file_config(temp.path()))
            .unwrap();

        assert_eq!(
            handle.log_file_path(),
            Some(temp.path().join("announced.log").as_path())
        );
        assert!(logs_contain("Logger initialized. Writing logs to"));
        // The announcement is not written into the logger's own file.
        let content = std::fs::read_to_string(temp.path().join("announced.log")).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn diagnostics_are_emitted_after_the_lock_is_released() {
        use parking_lot::Mutex;
        use tracing::{Event, Subscriber};
        use tracing_subscriber::Layer;
        use tracing_subscriber::layer::{Context, SubscriberExt};

        struct Inspect {
            registry: Arc<LoggerRegistry>,
            seen: Arc<Mutex<Vec<Vec<String>>>>,
        }

        impl<S: Subscriber> Layer<S> for Inspect {
            fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
                if event.metadata().target().starts_with("darca_log_facility") {
                    self.seen.lock().push(self.registry.names());
                }
            }
        }

        let temp = TempDir::new().unwrap();
        let registry = Arc::new(registry(&TestBuffer::default(), false));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::Registry::default().with(Inspect {
            registry: registry.clone(),
            seen: seen.clone(),
        });

        tracing::subscriber::with_default(subscriber, || {
            registry
                .register("svc", file_config(temp.path()))
                .unwrap();
            let mut changed = file_config(temp.path());
            changed.json_format = true;
            registry.register("svc", changed).unwrap();
        });

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|names| names == &vec!["svc".to_string()]));
    }

    #[test]
    fn failed_creation_registers_nothing() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let registry = registry(&TestBuffer::default(), false);

        let err = registry
            .get_or_create("svc", file_config(&blocker.join("logs")))
            .unwrap_err();

        assert!(err.is_io());
        assert!(!registry.contains("svc"));
    }

    #[rstest]
    #[case("")]
    #[case("../escape")]
    #[case("nested\\name")]
    fn invalid_names_are_rejected(#[case] name: &str) {
        let registry = registry(&TestBuffer::default(), false);
        let config = LoggerConfig::builder().log_to_file(false).build();

        let err = registry.get_or_create(name, config).unwrap_err();

        assert!(matches!(err, LogError::InvalidName { .. }));
    }

    #[test]
    fn concurrent_first_creation_installs_one_handle() {
        let temp = TempDir::new().unwrap();
        let registry = Arc::new(registry(&TestBuffer::default(), false));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                let mut config = file_config(temp.path());
                config.backup_count = i;
                std::thread::spawn(move || registry.get_or_create("race", config).unwrap())
            })
            .collect();
        let results: Vec<Arc<LoggerHandle>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        for handle in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], handle));
        }
        assert_eq!(registry.names(), vec!["race".to_string()]);
    }

    #[test]
    fn configure_creates_declared_loggers() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&TestBuffer::default(), false);
        let mut settings = Settings::default();
        settings
            .loggers
            .insert("api".to_string(), file_config(temp.path()));
        settings
            .loggers
            .insert("db".to_string(), file_config(temp.path()));

        let registrations = registry.configure(&settings).unwrap();

        assert_eq!(registrations.len(), 2);
        assert_eq!(registry.names(), vec!["api".to_string(), "db".to_string()]);
        assert!(temp.path().join("api.log").exists());
        assert!(temp.path().join("db.log").exists());
    }

    #[test]
    fn global_registry_is_shared() {
        assert!(std::ptr::eq(global_registry(), global_registry()));
    }
}
