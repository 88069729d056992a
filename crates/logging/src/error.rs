//! crates/logging/src/error.rs
//!
//! Error types surfaced by the logging facade.
//!
//! Only two situations reach application code: an invalid context segment
//! passed to [`push_context`](crate::Hierarchy::push_context) and a malformed
//! configuration handed to one of the explicit `configure*` entry points. Log
//! calls themselves never fail.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for facade operations.
pub type LogResult<T> = Result<T, LogError>;

/// Result type for backend configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors reported by the facade.
#[derive(Debug, Error)]
pub enum LogError {
    /// A caller-supplied argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Configuration could not be applied.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl LogError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns `true` for [`LogError::InvalidArgument`].
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// Errors raised while parsing or applying a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        /// File that failed to open or read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A line of properties text could not be parsed.
    #[error("{origin}:{line}: {message}")]
    Syntax {
        /// Where the text came from (file path or `<properties>`).
        origin: String,
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },
    /// XML configuration was malformed.
    #[error("{origin}: malformed XML: {message}")]
    Xml {
        /// Where the document came from.
        origin: String,
        /// Parser diagnostic.
        message: String,
    },
    /// A level name was not recognised.
    #[error("unknown level '{0}'")]
    InvalidLevel(String),
    /// An appender class is not supported by the backend.
    #[error("appender '{name}': unsupported class '{class}'")]
    UnknownAppenderClass {
        /// Appender name.
        name: String,
        /// Class as written in the configuration.
        class: String,
    },
    /// A layout class is not supported by the backend.
    #[error("appender '{name}': unsupported layout '{layout}'")]
    UnknownLayout {
        /// Appender name.
        name: String,
        /// Layout as written in the configuration.
        layout: String,
    },
    /// A logger referenced an appender that was never defined.
    #[error("logger '{logger}' references undefined appender '{appender}'")]
    UndefinedAppender {
        /// Logger holding the reference.
        logger: String,
        /// Missing appender name.
        appender: String,
    },
    /// An appender definition lacks a required option.
    #[error("appender '{name}': missing required option '{option}'")]
    MissingOption {
        /// Appender name.
        name: String,
        /// Option that must be present.
        option: &'static str,
    },
    /// An appender option has a value the backend cannot use.
    #[error("appender '{name}': invalid value '{value}' for option '{option}'")]
    InvalidOption {
        /// Appender name.
        name: String,
        /// Option name.
        option: &'static str,
        /// Value as written.
        value: String,
    },
    /// The backend does not support this configuration route.
    #[error("unsupported configuration: {0}")]
    Unsupported(String),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn syntax(origin: &str, line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            origin: origin.to_owned(),
            line,
            message: message.into(),
        }
    }
}
