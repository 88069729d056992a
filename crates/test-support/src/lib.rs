#![deny(unsafe_code)]
#![deny(missing_docs)]

//! crates/test-support/src/lib.rs
//! Shared helpers for tests across the workspace.
//!
//! [`CaptureBackend`] records every configuration request and every emitted
//! record so tests can assert on what the hierarchy delivered without
//! touching the console. Configuration files are still parsed, and the levels
//! they name are applied to the registry, so configure semantics can be
//! observed end to end.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use logging::sink::{Configuration, Properties, parse_xml};
use logging::{Backend, ConfigError, ConfigResult, Level, LoggerRegistry, Record, mdc};

/// One record delivered to a [`CaptureBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedRecord {
    /// Full logger name, empty for root.
    pub logger: String,
    /// Severity.
    pub level: Level,
    /// Message as delivered.
    pub message: String,
    /// Source file of the call site.
    pub file: String,
    /// Function of the call site.
    pub function: String,
    /// Line of the call site.
    pub line: u32,
    /// Diagnostic context of the emitting thread.
    pub mdc: BTreeMap<String, String>,
}

/// A configuration request received by a [`CaptureBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigCall {
    /// `reset_configuration`.
    Reset,
    /// `configure_from_xml_file`.
    XmlFile(PathBuf),
    /// `configure_from_properties_file`.
    PropertiesFile(PathBuf),
    /// `configure_from_properties_text`.
    PropertiesText(String),
    /// `apply_basic_configuration`.
    Basic,
}

/// Backend that remembers everything it is asked to do.
#[derive(Debug, Default)]
pub struct CaptureBackend {
    records: Mutex<Vec<CapturedRecord>>,
    calls: Mutex<Vec<ConfigCall>>,
    root_appenders: AtomicBool,
    failure: Mutex<Option<String>>,
}

impl CaptureBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend behind an [`Arc`].
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Records emitted so far.
    #[must_use]
    pub fn records(&self) -> Vec<CapturedRecord> {
        lock(&self.records).clone()
    }

    /// Messages emitted so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        lock(&self.records)
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }

    /// Removes and returns the records emitted so far.
    pub fn take_records(&self) -> Vec<CapturedRecord> {
        std::mem::take(&mut *lock(&self.records))
    }

    /// Configuration requests received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ConfigCall> {
        lock(&self.calls).clone()
    }

    /// Forgets recorded configuration requests.
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Overrides what [`Backend::has_root_appenders`] reports.
    pub fn set_root_appenders(&self, present: bool) {
        self.root_appenders.store(present, Ordering::SeqCst);
    }

    /// Makes the next configuration request fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        *lock(&self.failure) = Some(message.into());
    }

    fn call(&self, call: ConfigCall) -> ConfigResult<()> {
        lock(&self.calls).push(call);
        match lock(&self.failure).take() {
            Some(message) => Err(ConfigError::Unsupported(message)),
            None => Ok(()),
        }
    }

    fn apply(&self, config: &Configuration, registry: &LoggerRegistry) {
        for (name, def) in &config.loggers {
            if def.level.is_some() {
                registry.get_logger(name).set_level(def.level);
            }
        }
        let root_has_appenders = config
            .loggers
            .get("")
            .is_some_and(|root| !root.appenders.is_empty());
        self.set_root_appenders(root_has_appenders);
    }
}

impl Backend for CaptureBackend {
    fn reset_configuration(&self) {
        lock(&self.calls).push(ConfigCall::Reset);
        self.set_root_appenders(false);
    }

    fn configure_from_xml_file(&self, path: &Path, registry: &LoggerRegistry) -> ConfigResult<()> {
        self.call(ConfigCall::XmlFile(path.to_path_buf()))?;
        let text = fs::read_to_string(path)
            .map_err(|error| ConfigError::Unsupported(format!("{}: {error}", path.display())))?;
        self.apply(&parse_xml(&text, &path.display().to_string())?, registry);
        Ok(())
    }

    fn configure_from_properties_file(
        &self,
        path: &Path,
        registry: &LoggerRegistry,
    ) -> ConfigResult<()> {
        self.call(ConfigCall::PropertiesFile(path.to_path_buf()))?;
        let text = fs::read_to_string(path)
            .map_err(|error| ConfigError::Unsupported(format!("{}: {error}", path.display())))?;
        let properties = Properties::parse(&text, &path.display().to_string())?;
        self.apply(&Configuration::from_properties(&properties)?, registry);
        Ok(())
    }

    fn configure_from_properties_text(
        &self,
        text: &str,
        registry: &LoggerRegistry,
    ) -> ConfigResult<()> {
        self.call(ConfigCall::PropertiesText(text.to_owned()))?;
        let properties = Properties::parse(text, "<properties>")?;
        self.apply(&Configuration::from_properties(&properties)?, registry);
        Ok(())
    }

    fn apply_basic_configuration(&self) {
        lock(&self.calls).push(ConfigCall::Basic);
        self.set_root_appenders(true);
    }

    fn has_root_appenders(&self) -> bool {
        self.root_appenders.load(Ordering::SeqCst)
    }

    fn emit(&self, record: &Record<'_>) {
        let captured = CapturedRecord {
            logger: record.logger.name_str().to_owned(),
            level: record.level,
            message: record.message.to_owned(),
            file: record.location.file.to_owned(),
            function: record.location.function.to_owned(),
            line: record.location.line,
            mdc: mdc::snapshot(),
        };
        lock(&self.records).push(captured);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writes `contents` to `dir/name` and returns the path.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_config(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write configuration file");
    path
}

/// A temporary directory holding one configuration file.
#[derive(Debug)]
pub struct ConfigFile {
    _dir: tempfile::TempDir,
    path: PathBuf,
}

impl ConfigFile {
    /// Creates `name` with `contents` in a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory or file cannot be created.
    #[must_use]
    pub fn new(name: &str, contents: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temporary directory");
        let path = write_config(dir.path(), name, contents);
        Self { _dir: dir, path }
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Properties text attaching a console appender to root at `level`.
#[must_use]
pub fn console_properties(level: &str) -> String {
    format!(
        "log4j.rootLogger={level}, console\n\
         log4j.appender.console=org.apache.log4j.ConsoleAppender\n\
         log4j.appender.console.layout=org.apache.log4j.SimpleLayout\n"
    )
}
