//! crates/logging/src/configurator.rs
//! Selecting and applying a configuration.
//!
//! Configuration comes from one of four places, in fixed precedence: a file
//! named by [`CONFIG_ENV`], an explicit file path, in-memory properties text,
//! or the backend's basic console configuration. Every explicit `configure*`
//! call discards the previous configuration and ends with the default logger
//! back at root.
//!
//! At process start [`Hierarchy::initialize`] only *stages* an environment
//! file. The staged file is applied on first use (first log call, level
//! query or context change) unless the application configures explicitly
//! before that.

use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::{PoisonError, TryLockError};

use crate::error::LogResult;
use crate::hierarchy::Hierarchy;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "HIERLOG_CONFIG";

/// Where the active configuration came from.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfigSource {
    /// File named by [`CONFIG_ENV`].
    EnvironmentFile(PathBuf),
    /// File passed to [`Hierarchy::configure_file`].
    File(PathBuf),
    /// Text passed to [`Hierarchy::configure_properties`].
    Text,
    /// The backend's basic console configuration.
    Basic,
}

/// Parser chosen for a configuration file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFileKind {
    /// XML document.
    Xml,
    /// Flat key/value properties.
    Properties,
}

/// Picks the parser for `path`: XML when the text after the last `.` of the
/// whole path is exactly `xml`, properties otherwise.
#[must_use]
pub fn config_file_kind(path: &Path) -> ConfigFileKind {
    let text = path.as_os_str().to_string_lossy();
    match text.rfind('.') {
        Some(index) if &text[index..] == ".xml" => ConfigFileKind::Xml,
        _ => ConfigFileKind::Properties,
    }
}

/// Decides what a parameterless configure would use given the value of
/// [`CONFIG_ENV`]: the named file when it is set, non-empty and readable,
/// basic configuration otherwise.
#[must_use]
pub fn select_source(env_value: Option<&OsStr>) -> ConfigSource {
    readable_env_file(env_value).map_or(ConfigSource::Basic, ConfigSource::EnvironmentFile)
}

fn readable_env_file(env_value: Option<&OsStr>) -> Option<PathBuf> {
    let value = env_value.filter(|value| !value.is_empty())?;
    let path = PathBuf::from(value);
    match File::open(&path) {
        Ok(_) => Some(path),
        Err(error) => {
            tracing::debug!(
                target: "logging::configurator",
                path = %path.display(),
                %error,
                "configuration file from {CONFIG_ENV} is not readable"
            );
            None
        }
    }
}

impl Hierarchy {
    /// Startup initialization. Stages a readable environment file for lazy
    /// application, otherwise applies basic configuration. The default
    /// logger is root afterwards.
    pub fn initialize(&self, env_value: Option<&OsStr>) {
        match readable_env_file(env_value) {
            Some(path) => {
                *self.staged.lock().unwrap_or_else(PoisonError::into_inner) = Some(path);
                self.staged_pending.store(true, Ordering::Release);
            }
            None => {
                self.backend.apply_basic_configuration();
                self.record_source(ConfigSource::Basic);
            }
        }
        self.reset_default_logger();
    }

    /// Configures from [`CONFIG_ENV`] as read from the process environment.
    pub fn configure(&self) -> LogResult<ConfigSource> {
        self.configure_with_env(std::env::var_os(CONFIG_ENV).as_deref())
    }

    /// Configures from an explicitly supplied environment value.
    ///
    /// Uses the named file when it is readable. Otherwise the previous
    /// configuration is discarded and basic configuration is applied if the
    /// root logger has no appender.
    pub fn configure_with_env(&self, env_value: Option<&OsStr>) -> LogResult<ConfigSource> {
        self.clear_staged();
        if let Some(path) = readable_env_file(env_value) {
            self.apply_file(&path)?;
            let source = ConfigSource::EnvironmentFile(path);
            self.record_source(source.clone());
            return Ok(source);
        }
        self.reset_configuration();
        if !self.backend.has_root_appenders() {
            self.backend.apply_basic_configuration();
        }
        self.reset_default_logger();
        self.record_source(ConfigSource::Basic);
        Ok(ConfigSource::Basic)
    }

    /// Discards the current configuration and applies `path`, choosing the
    /// parser with [`config_file_kind`].
    pub fn configure_file(&self, path: impl AsRef<Path>) -> LogResult<()> {
        let path = path.as_ref();
        self.clear_staged();
        self.apply_file(path)?;
        self.record_source(ConfigSource::File(path.to_path_buf()));
        Ok(())
    }

    /// Discards the current configuration and applies properties `text`.
    /// No filesystem access is involved.
    pub fn configure_properties(&self, text: &str) -> LogResult<()> {
        self.clear_staged();
        self.reset_configuration();
        self.backend
            .configure_from_properties_text(text, &self.registry)?;
        self.reset_default_logger();
        self.record_source(ConfigSource::Text);
        Ok(())
    }

    /// The configuration most recently applied, `None` before any.
    ///
    /// A staged environment file is reported only once it has been applied.
    pub fn configuration_source(&self) -> Option<ConfigSource> {
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether an environment file is waiting to be applied.
    pub fn has_staged_configuration(&self) -> bool {
        self.staged_pending.load(Ordering::Acquire)
    }

    /// Applies the staged environment file if there is one.
    pub(crate) fn ensure_initialized(&self) {
        if !self.staged_pending.load(Ordering::Acquire) {
            return;
        }
        // A caller that finds the lock held is either re-entering from inside
        // the configuration or racing it; both proceed without waiting.
        let mut staged = match self.staged.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        if let Some(path) = staged.take() {
            match self.apply_file(&path) {
                Ok(()) => self.record_source(ConfigSource::EnvironmentFile(path)),
                Err(error) => {
                    tracing::warn!(
                        target: "logging::configurator",
                        path = %path.display(),
                        %error,
                        "staged configuration failed, falling back to basic configuration"
                    );
                    self.backend.apply_basic_configuration();
                    self.reset_default_logger();
                    self.record_source(ConfigSource::Basic);
                }
            }
        }
        self.staged_pending.store(false, Ordering::Release);
    }

    fn apply_file(&self, path: &Path) -> LogResult<()> {
        self.reset_configuration();
        let kind = config_file_kind(path);
        tracing::debug!(
            target: "logging::configurator",
            path = %path.display(),
            ?kind,
            "applying configuration file"
        );
        let applied = match kind {
            ConfigFileKind::Xml => self.backend.configure_from_xml_file(path, &self.registry),
            ConfigFileKind::Properties => self
                .backend
                .configure_from_properties_file(path, &self.registry),
        };
        applied?;
        self.reset_default_logger();
        Ok(())
    }

    fn reset_configuration(&self) {
        self.registry.reset_levels();
        self.backend.reset_configuration();
    }

    fn record_source(&self, source: ConfigSource) {
        *self.source.lock().unwrap_or_else(PoisonError::into_inner) = Some(source);
    }
}
