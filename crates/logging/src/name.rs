//! crates/logging/src/name.rs
//! Dotted logger names.
//!
//! A logger name is a sequence of non-empty segments joined by `.`. The empty
//! name denotes the root logger. The parent of a name is the name with its
//! last segment removed, so the hierarchy is implied entirely by the text.

use std::borrow::Borrow;
use std::fmt;

use crate::error::{LogError, LogResult};

/// Separator between name segments.
pub const SEPARATOR: char = '.';

/// A validated dotted logger name.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoggerName(Box<str>);

impl LoggerName {
    /// The root logger's name (the empty string).
    #[must_use]
    pub fn root() -> Self {
        Self(Box::from(""))
    }

    /// Validates `name`. Empty segments (`"a..b"`, `".a"`, `"a."`) are
    /// rejected; the empty string is accepted as root.
    pub fn new(name: &str) -> LogResult<Self> {
        if !name.is_empty() && name.split(SEPARATOR).any(str::is_empty) {
            return Err(LogError::invalid_argument(format!(
                "logger name '{name}' contains an empty segment"
            )));
        }
        Ok(Self(Box::from(name)))
    }

    /// Builds a name from arbitrary text by dropping empty segments.
    ///
    /// Lookups by name are lenient, so `"a..b."` resolves to `"a.b"`.
    #[must_use]
    pub fn normalized(name: &str) -> Self {
        if Self::is_well_formed(name) {
            return Self(Box::from(name));
        }
        let joined = name
            .split(SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(".");
        Self(joined.into_boxed_str())
    }

    pub(crate) fn is_well_formed(name: &str) -> bool {
        name.is_empty() || !name.split(SEPARATOR).any(str::is_empty)
    }

    /// Text of the name; empty for root.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the root name.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments; zero for root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Iterates over the segments from outermost to innermost.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|segment| !segment.is_empty())
    }

    /// The parent name, or `None` for root. A single-segment name has root as
    /// its parent.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(match self.0.rfind(SEPARATOR) {
            Some(index) => Self(Box::from(&self.0[..index])),
            None => Self::root(),
        })
    }

    /// Appends `segment`, which must satisfy [`validate_segment`].
    pub fn child(&self, segment: &str) -> LogResult<Self> {
        validate_segment(segment)?;
        Ok(self.child_unchecked(segment))
    }

    pub(crate) fn child_unchecked(&self, segment: &str) -> Self {
        if self.is_root() {
            Self(Box::from(segment))
        } else {
            Self(format!("{}{SEPARATOR}{segment}", self.0).into_boxed_str())
        }
    }
}

/// Checks that `segment` can be appended to a logger name: it must be non-empty
/// and must not contain the separator.
pub fn validate_segment(segment: &str) -> LogResult<()> {
    if segment.is_empty() {
        return Err(LogError::invalid_argument(
            "context name must not be empty",
        ));
    }
    if segment.contains(SEPARATOR) {
        return Err(LogError::invalid_argument(format!(
            "context name '{segment}' must not contain '{SEPARATOR}'"
        )));
    }
    Ok(())
}

impl fmt::Display for LoggerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LoggerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LoggerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for LoggerName {
    type Error = LogError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
