//! crates/logging/src/levels.rs
//! Severity levels and their integer encoding.
//!
//! Levels compare by severity (`Trace < Debug < ... < Fatal`). The integer
//! encoding is kept stable so that levels can cross language or process
//! boundaries: `TRACE=5000`, `DEBUG=10000`, `INFO=20000`, `WARN=30000`,
//! `ERROR=40000`, `FATAL=50000`, with `-1` standing for "unset, inherit".

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Integer value reported for a logger without an explicit level.
pub const UNSET_LEVEL: i32 = -1;

/// Message severity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "UPPERCASE")
)]
pub enum Level {
    /// Finest-grained tracing output.
    Trace,
    /// Debugging output. Also the fallback for unrecognised integers.
    Debug,
    /// Informational messages.
    Info,
    /// Potential problems.
    Warn,
    /// Errors the process can recover from.
    Error,
    /// Errors the process cannot recover from.
    Fatal,
}

impl Level {
    /// Every level in ascending severity.
    pub const ALL: [Self; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
    ];

    /// Stable integer value of this level.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Trace => 5000,
            Self::Debug => 10000,
            Self::Info => 20000,
            Self::Warn => 30000,
            Self::Error => 40000,
            Self::Fatal => 50000,
        }
    }

    /// Maps an integer to a level, returning `None` for anything that is not
    /// an exact level value.
    #[must_use]
    pub const fn try_from_i32(value: i32) -> Option<Self> {
        match value {
            5000 => Some(Self::Trace),
            10000 => Some(Self::Debug),
            20000 => Some(Self::Info),
            30000 => Some(Self::Warn),
            40000 => Some(Self::Error),
            50000 => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Maps an integer to a level. Values that are not an exact level map to
    /// [`Level::Debug`].
    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        match Self::try_from_i32(value) {
            Some(level) => level,
            None => Self::Debug,
        }
    }

    /// Upper-case name of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

/// Encodes an optional explicit level, using [`UNSET_LEVEL`] for `None`.
#[must_use]
pub const fn level_to_i32(level: Option<Level>) -> i32 {
    match level {
        Some(level) => level.as_i32(),
        None => UNSET_LEVEL,
    }
}

/// Decodes an explicit-level integer. [`UNSET_LEVEL`] yields `None`; anything
/// else goes through the permissive [`Level::from_i32`] mapping.
#[must_use]
pub const fn level_from_i32_opt(value: i32) -> Option<Level> {
    if value == UNSET_LEVEL {
        None
    } else {
        Some(Level::from_i32(value))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error returned when a level name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown level '{0}'")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(level) = Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
        {
            return Ok(level);
        }
        if trimmed.eq_ignore_ascii_case("WARNING") {
            return Ok(Self::Warn);
        }
        trimmed
            .parse::<i32>()
            .map(Self::from_i32)
            .map_err(|_| ParseLevelError(trimmed.to_owned()))
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Self::Trace,
            tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warn,
            // ERROR; the match cannot see that the constants are exhaustive.
            _ => Self::Error,
        }
    }
}

impl From<Level> for tracing::Level {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => Self::TRACE,
            Level::Debug => Self::DEBUG,
            Level::Info => Self::INFO,
            Level::Warn => Self::WARN,
            Level::Error | Level::Fatal => Self::ERROR,
        }
    }
}
