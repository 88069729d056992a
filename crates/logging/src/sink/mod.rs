//! crates/logging/src/sink/mod.rs
//! The default backend: console and file appenders attached to loggers.
//!
//! Appenders are attached per logger name. A record is written by every
//! appender attached to its logger and to each ancestor, stopping after the
//! first logger whose additivity is off. Logger names are normalized the same
//! way the registry normalizes them.
//!
//! [`SinkBackend::apply`] parses the configuration and opens every appender
//! before replacing the live state, so a configuration rejected there leaves
//! the current appenders untouched. Configuring through a
//! [`Hierarchy`](crate::Hierarchy) resets the backend first, so after a
//! rejected configuration the backend has no appenders at all.

mod appender;
mod layout;
mod model;
mod properties;
mod xml;

pub use appender::{Appender, AppenderSpec, SharedBuffer, Target};
pub use layout::Layout;
pub use model::{AppenderDef, Configuration, LoggerDef, parse_level};
pub use properties::{Properties, Property};
pub use xml::parse as parse_xml;

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use crate::backend::{Backend, Record};
use crate::error::{ConfigError, ConfigResult};
use crate::name::LoggerName;
use crate::registry::LoggerRegistry;

struct Attachment {
    appenders: Vec<Arc<Appender>>,
    additive: bool,
}

impl Attachment {
    fn new() -> Self {
        Self {
            appenders: Vec::new(),
            additive: true,
        }
    }
}

/// Backend writing to console and file appenders.
pub struct SinkBackend {
    attachments: RwLock<HashMap<String, Attachment>>,
    started: Instant,
}

impl SinkBackend {
    /// Creates a backend with no appenders.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attachments: RwLock::new(HashMap::new()),
            started: Instant::now(),
        }
    }

    /// Attaches an appender to the logger called `logger` (empty for root).
    pub fn attach_appender(&self, logger: &str, appender: Appender) {
        self.write()
            .entry(attachment_key(logger))
            .or_insert_with(Attachment::new)
            .appenders
            .push(Arc::new(appender));
    }

    /// Sets whether records sent to `logger` also reach its ancestors'
    /// appenders.
    pub fn set_additivity(&self, logger: &str, additive: bool) {
        self.write()
            .entry(attachment_key(logger))
            .or_insert_with(Attachment::new)
            .additive = additive;
    }

    /// Names of the appenders attached to `logger`.
    #[must_use]
    pub fn appender_names(&self, logger: &str) -> Vec<String> {
        self.read().get(&attachment_key(logger)).map_or_else(Vec::new, |attachment| {
            attachment
                .appenders
                .iter()
                .map(|appender| appender.name().to_owned())
                .collect()
        })
    }

    /// Names of the appenders attached to root.
    #[must_use]
    pub fn root_appender_names(&self) -> Vec<String> {
        self.appender_names("")
    }

    /// Applies a parsed configuration: levels go to `registry`, appenders
    /// replace the current ones.
    pub fn apply(&self, config: &Configuration, registry: &LoggerRegistry) -> ConfigResult<()> {
        let mut opened: HashMap<String, Arc<Appender>> = HashMap::new();
        for spec in config.resolve_appenders()? {
            let name = spec.name.clone();
            opened.insert(name, Arc::new(Appender::open(spec)?));
        }

        // Names that differ only in empty segments merge into one entry.
        let mut attachments: HashMap<String, Attachment> = HashMap::new();
        for (name, def) in &config.loggers {
            let attachment = attachments
                .entry(attachment_key(name))
                .or_insert_with(Attachment::new);
            attachment.appenders.extend(
                def.appenders
                    .iter()
                    .filter_map(|appender| opened.get(appender).cloned()),
            );
            if let Some(additive) = def.additivity {
                attachment.additive = additive;
            }
        }

        for (name, def) in &config.loggers {
            if def.level.is_some() {
                registry.get_logger(name).set_level(def.level);
            }
        }
        *self.write() = attachments;
        tracing::debug!(
            target: "logging::sink",
            loggers = config.loggers.len(),
            appenders = opened.len(),
            "applied configuration"
        );
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Attachment>> {
        self.attachments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Attachment>> {
        self.attachments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SinkBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SinkBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let attachments = self.read();
        let mut loggers: Vec<&str> = attachments.keys().map(String::as_str).collect();
        loggers.sort_unstable();
        f.debug_struct("SinkBackend")
            .field("loggers", &loggers)
            .finish_non_exhaustive()
    }
}

fn attachment_key(logger: &str) -> String {
    LoggerName::normalized(logger).as_str().to_owned()
}

fn read_file(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|source| ConfigError::io(path, source))
}

impl Backend for SinkBackend {
    fn reset_configuration(&self) {
        self.write().clear();
    }

    fn configure_from_xml_file(&self, path: &Path, registry: &LoggerRegistry) -> ConfigResult<()> {
        let text = read_file(path)?;
        let config = xml::parse(&text, &path.display().to_string())?;
        self.apply(&config, registry)
    }

    fn configure_from_properties_file(
        &self,
        path: &Path,
        registry: &LoggerRegistry,
    ) -> ConfigResult<()> {
        let text = read_file(path)?;
        let properties = Properties::parse(&text, &path.display().to_string())?;
        self.apply(&Configuration::from_properties(&properties)?, registry)
    }

    fn configure_from_properties_text(
        &self,
        text: &str,
        registry: &LoggerRegistry,
    ) -> ConfigResult<()> {
        let properties = Properties::parse(text, "<properties>")?;
        self.apply(&Configuration::from_properties(&properties)?, registry)
    }

    fn apply_basic_configuration(&self) {
        match Appender::open(AppenderSpec::stdout("console", Layout::Basic)) {
            Ok(appender) => self.attach_appender("", appender),
            Err(error) => {
                tracing::warn!(target: "logging::sink", %error, "basic configuration failed");
            }
        }
    }

    fn has_root_appenders(&self) -> bool {
        self.read()
            .get("")
            .is_some_and(|attachment| !attachment.appenders.is_empty())
    }

    fn emit(&self, record: &Record<'_>) {
        let elapsed = self.started.elapsed().as_millis();
        let attachments = self.read();
        let mut name = record.logger.name_str();
        loop {
            if let Some(attachment) = attachments.get(name) {
                for appender in &attachment.appenders {
                    appender.append(record, elapsed);
                }
                if !attachment.additive {
                    break;
                }
            }
            if name.is_empty() {
                break;
            }
            name = name.rfind('.').map_or("", |index| &name[..index]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Location;
    use crate::levels::Level;
    use crate::logger::Logger;

    fn emit(backend: &SinkBackend, logger: &Logger, level: Level, message: &str) {
        backend.emit(&Record {
            logger,
            level,
            message,
            location: Location::UNKNOWN,
        });
    }

    fn buffer_appender(name: &str, buffer: &SharedBuffer) -> Appender {
        Appender::open(AppenderSpec::buffer(name, buffer.clone(), Layout::Simple)).unwrap()
    }

    #[test]
    fn records_reach_ancestor_appenders() {
        let registry = LoggerRegistry::new();
        let backend = SinkBackend::new();
        let (root_out, a_out) = (SharedBuffer::new(), SharedBuffer::new());
        backend.attach_appender("", buffer_appender("R", &root_out));
        backend.attach_appender("a", buffer_appender("A", &a_out));

        emit(&backend, &registry.get_logger("a.b"), Level::Info, "deep");
        emit(&backend, &registry.get_logger("z"), Level::Info, "other");

        assert_eq!(a_out.lines(), ["INFO - deep"]);
        assert_eq!(root_out.lines(), ["INFO - deep", "INFO - other"]);
    }

    #[test]
    fn additivity_stops_propagation() {
        let registry = LoggerRegistry::new();
        let backend = SinkBackend::new();
        let (root_out, a_out) = (SharedBuffer::new(), SharedBuffer::new());
        backend.attach_appender("", buffer_appender("R", &root_out));
        backend.attach_appender("a", buffer_appender("A", &a_out));
        backend.set_additivity("a", false);

        emit(&backend, &registry.get_logger("a.b"), Level::Info, "private");
        assert_eq!(a_out.lines(), ["INFO - private"]);
        assert!(root_out.lines().is_empty());
    }

    #[test]
    fn basic_configuration_adds_root_console() {
        let backend = SinkBackend::new();
        assert!(!backend.has_root_appenders());
        backend.apply_basic_configuration();
        assert!(backend.has_root_appenders());
        assert_eq!(backend.root_appender_names(), ["console"]);
        backend.reset_configuration();
        assert!(!backend.has_root_appenders());
    }

    #[test]
    fn properties_text_sets_levels_and_appenders() {
        let registry = LoggerRegistry::new();
        let backend = SinkBackend::new();
        backend
            .configure_from_properties_text(
                "log4j.rootLogger=WARN, C\n\
                 log4j.logger.noisy=ERROR\n\
                 log4j.appender.C=org.apache.log4j.ConsoleAppender\n\
                 log4j.appender.C.layout=org.apache.log4j.SimpleLayout\n",
                &registry,
            )
            .unwrap();
        assert_eq!(registry.root().level(), Some(Level::Warn));
        assert_eq!(registry.get_logger("noisy").level(), Some(Level::Error));
        assert_eq!(backend.root_appender_names(), ["C"]);
    }

    #[test]
    fn rejected_configuration_keeps_previous_appenders() {
        let registry = LoggerRegistry::new();
        let backend = SinkBackend::new();
        backend.apply_basic_configuration();
        let err = backend
            .configure_from_properties_text("log4j.rootLogger=INFO, missing", &registry)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UndefinedAppender { .. }));
        assert_eq!(backend.root_appender_names(), ["console"]);
    }

    #[test]
    fn irregular_logger_names_share_attachments() {
        let registry = LoggerRegistry::new();
        let backend = SinkBackend::new();
        let out = SharedBuffer::new();
        backend
            .configure_from_properties_text(
                "log4j.rootLogger=INFO\n\
                 log4j.logger.a..b=WARN, M\n\
                 log4j.appender.M=org.apache.log4j.ConsoleAppender\n",
                &registry,
            )
            .unwrap();
        assert_eq!(registry.get_logger("a.b").level(), Some(Level::Warn));
        assert_eq!(backend.appender_names("a.b"), ["M"]);
        assert_eq!(backend.appender_names("a..b"), ["M"]);

        backend.attach_appender(".a.b.", buffer_appender("B", &out));
        emit(&backend, &registry.get_logger("a.b"), Level::Warn, "found");
        assert_eq!(out.lines(), ["WARN - found"]);
    }

    #[test]
    fn file_configuration_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("app.log");
        let config = dir.path().join("log.properties");
        fs::write(
            &config,
            format!(
                "log4j.rootLogger=INFO, F\n\
                 log4j.appender.F=org.apache.log4j.FileAppender\n\
                 log4j.appender.F.File={}\n\
                 log4j.appender.F.layout=org.apache.log4j.SimpleLayout\n",
                log.display()
            ),
        )
        .unwrap();

        let registry = LoggerRegistry::new();
        let backend = SinkBackend::new();
        backend.configure_from_properties_file(&config, &registry).unwrap();
        emit(&backend, &registry.get_logger("x"), Level::Info, "to file");
        assert_eq!(fs::read_to_string(&log).unwrap(), "INFO - to file\n");
    }

    #[test]
    fn xml_file_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("log.xml");
        fs::write(
            &config,
            r#"<configuration>
                 <appender name="C" class="ConsoleAppender"/>
                 <root><level value="ERROR"/><appender-ref ref="C"/></root>
               </configuration>"#,
        )
        .unwrap();
        let registry = LoggerRegistry::new();
        let backend = SinkBackend::new();
        backend.configure_from_xml_file(&config, &registry).unwrap();
        assert_eq!(registry.root().level(), Some(Level::Error));
        assert_eq!(backend.root_appender_names(), ["C"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let registry = LoggerRegistry::new();
        let err = SinkBackend::new()
            .configure_from_properties_file(Path::new("/nonexistent/log.properties"), &registry)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
