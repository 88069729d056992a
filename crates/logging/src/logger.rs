//! crates/logging/src/logger.rs
//! Logger handles.
//!
//! A [`Logger`] is a cheap shared reference to a node owned by a
//! [`LoggerRegistry`](crate::LoggerRegistry). All handles for one name point at
//! the same node, so a level set through one handle is observed by every other.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::levels::{Level, UNSET_LEVEL, level_from_i32_opt, level_to_i32};
use crate::name::LoggerName;

pub(crate) struct LoggerNode {
    name: LoggerName,
    level: AtomicI32,
    parent: Option<Arc<LoggerNode>>,
}

impl LoggerNode {
    pub(crate) fn root(level: Level) -> Self {
        Self {
            name: LoggerName::root(),
            level: AtomicI32::new(level.as_i32()),
            parent: None,
        }
    }

    pub(crate) fn child(name: LoggerName, parent: Arc<Self>) -> Self {
        Self {
            name,
            level: AtomicI32::new(UNSET_LEVEL),
            parent: Some(parent),
        }
    }

    pub(crate) fn store_level(&self, level: Option<Level>) {
        self.level.store(level_to_i32(level), Ordering::Release);
    }
}

/// Handle to a named logger.
///
/// Equality is identity: two handles are equal when they refer to the same
/// registry entry.
#[derive(Clone)]
pub struct Logger {
    node: Arc<LoggerNode>,
}

impl Logger {
    pub(crate) const fn from_node(node: Arc<LoggerNode>) -> Self {
        Self { node }
    }

    /// Dotted name; empty for root.
    #[must_use]
    pub fn name(&self) -> &LoggerName {
        &self.node.name
    }

    /// Dotted name as a string slice.
    #[must_use]
    pub fn name_str(&self) -> &str {
        self.node.name.as_str()
    }

    /// Returns `true` for the root logger.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.node.parent.is_none()
    }

    /// Explicit level, or `None` when the level is inherited.
    #[must_use]
    pub fn level(&self) -> Option<Level> {
        level_from_i32_opt(self.node.level.load(Ordering::Acquire))
    }

    /// Explicit level as an integer, [`UNSET_LEVEL`] when inherited.
    #[must_use]
    pub fn level_i32(&self) -> i32 {
        self.node.level.load(Ordering::Acquire)
    }

    /// Sets or clears the explicit level.
    ///
    /// The root logger always carries a level; clearing it is ignored.
    pub fn set_level(&self, level: Option<Level>) {
        if level.is_none() && self.is_root() {
            tracing::warn!(target: "logging::logger", "ignoring attempt to unset the root logger level");
            return;
        }
        self.node.store_level(level);
    }

    /// Threshold in force for this logger: its explicit level, or the nearest
    /// ancestor's.
    #[must_use]
    pub fn effective_level(&self) -> Level {
        let mut node: &LoggerNode = &self.node;
        loop {
            let raw = node.level.load(Ordering::Acquire);
            if raw != UNSET_LEVEL {
                return Level::from_i32(raw);
            }
            match &node.parent {
                Some(parent) => node = parent,
                None => return Level::Debug,
            }
        }
    }

    /// Whether a message at `level` passes this logger's threshold.
    #[must_use]
    pub fn is_enabled_for(&self, level: Level) -> bool {
        self.effective_level() <= level
    }

    /// Parent logger, `None` for root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.node.parent.clone().map(Self::from_node)
    }

    /// Iterates from this logger up to and including root.
    pub fn ancestry(&self) -> impl Iterator<Item = Self> {
        std::iter::successors(Some(self.clone()), Self::parent)
    }

    /// Returns `true` when both handles refer to the same logger.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl PartialEq for Logger {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Logger {}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name_str())
            .field("level", &self.level())
            .finish()
    }
}

impl fmt::Display for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name_str())
    }
}
