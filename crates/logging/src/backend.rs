//! crates/logging/src/backend.rs
//! The capability boundary between the logger hierarchy and whatever renders
//! and delivers records.
//!
//! The hierarchy decides which logger a message belongs to and whether it
//! passes the threshold. A [`Backend`] only ever sees enabled records that are
//! already formatted.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::levels::Level;
use crate::logger::Logger;
use crate::registry::LoggerRegistry;

/// Source position of a log call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Location<'a> {
    /// Source file, as reported by `file!()`.
    pub file: &'a str,
    /// Enclosing function path.
    pub function: &'a str,
    /// One-based line number; zero when unknown.
    pub line: u32,
}

impl<'a> Location<'a> {
    /// Builds a location.
    #[must_use]
    pub const fn new(file: &'a str, function: &'a str, line: u32) -> Self {
        Self {
            file,
            function,
            line,
        }
    }
}

impl Location<'static> {
    /// Location used when the caller supplies none.
    pub const UNKNOWN: Self = Self::new("", "", 0);
}

/// A formatted, enabled log record.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    /// Logger the record was emitted through.
    pub logger: &'a Logger,
    /// Severity.
    pub level: Level,
    /// Formatted message, already bounded.
    pub message: &'a str,
    /// Where the call was made.
    pub location: Location<'a>,
}

/// Rendering and delivery capability.
///
/// Configuration methods receive the registry so that level assignments found
/// in a configuration land on the core loggers.
pub trait Backend: Send + Sync {
    /// Discards every appender and backend-side setting.
    fn reset_configuration(&self);

    /// Applies an XML configuration file.
    fn configure_from_xml_file(&self, path: &Path, registry: &LoggerRegistry) -> ConfigResult<()>;

    /// Applies a properties configuration file.
    fn configure_from_properties_file(
        &self,
        path: &Path,
        registry: &LoggerRegistry,
    ) -> ConfigResult<()>;

    /// Applies in-memory properties text.
    fn configure_from_properties_text(
        &self,
        text: &str,
        registry: &LoggerRegistry,
    ) -> ConfigResult<()>;

    /// Installs the fallback console configuration.
    fn apply_basic_configuration(&self);

    /// Whether the root logger has at least one appender.
    fn has_root_appenders(&self) -> bool;

    /// Delivers one record. Failures stay inside the backend.
    fn emit(&self, record: &Record<'_>);
}

/// Backend that accepts every configuration and drops every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBackend;

impl Backend for NullBackend {
    fn reset_configuration(&self) {}

    fn configure_from_xml_file(&self, path: &Path, _: &LoggerRegistry) -> ConfigResult<()> {
        readable(path)
    }

    fn configure_from_properties_file(&self, path: &Path, _: &LoggerRegistry) -> ConfigResult<()> {
        readable(path)
    }

    fn configure_from_properties_text(&self, _: &str, _: &LoggerRegistry) -> ConfigResult<()> {
        Ok(())
    }

    fn apply_basic_configuration(&self) {}

    fn has_root_appenders(&self) -> bool {
        false
    }

    fn emit(&self, _: &Record<'_>) {}
}

fn readable(path: &Path) -> ConfigResult<()> {
    std::fs::metadata(path)
        .map(drop)
        .map_err(|source| ConfigError::io(path, source))
}
