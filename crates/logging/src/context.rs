//! crates/logging/src/context.rs
//! The default logger and the naming context stack.
//!
//! The default logger is the one used when a call names no logger. Pushing a
//! context segment makes the default logger a child of itself; popping makes
//! it its own parent.
//!
//! # Pop ascends from the current default
//!
//! [`Hierarchy::pop_context`] does not remember what was pushed. It moves to
//! the parent of whatever the default logger is *now*, so code that calls
//! [`Hierarchy::set_default_logger`] (or a configure call, which resets to
//! root) between a push and its pop will not return to where it started.
//! Pushes and pops from different threads also interleave freely. Use
//! [`Hierarchy::scoped_context`] when a strict stack is needed: its guard
//! restores the exact logger that was the default when it was created.

use crate::error::LogResult;
use crate::hierarchy::Hierarchy;
use crate::levels::Level;
use crate::logger::Logger;
use crate::name::validate_segment;

impl Hierarchy {
    /// Current default logger.
    pub fn default_logger(&self) -> Logger {
        self.ensure_initialized();
        self.read_default().clone()
    }

    /// Name of the current default logger; empty for root.
    pub fn default_logger_name(&self) -> String {
        self.default_logger().name_str().to_owned()
    }

    /// Replaces the default logger.
    pub fn set_default_logger(&self, logger: Logger) {
        *self.write_default() = logger;
    }

    /// Makes root the default logger again.
    pub fn reset_default_logger(&self) {
        *self.write_default() = self.registry.root();
    }

    /// Appends `segment` to the default logger's name and makes the result
    /// the default logger.
    ///
    /// Fails without changing anything when `segment` is empty or contains a
    /// `.`.
    pub fn push_context(&self, segment: &str) -> LogResult<Logger> {
        validate_segment(segment)?;
        self.ensure_initialized();
        let mut current = self.write_default();
        let name = current.name().child_unchecked(segment);
        let next = self.registry.get_logger(name.as_str());
        *current = next.clone();
        drop(current);
        tracing::trace!(target: "logging::context", logger = %name, "pushed context");
        Ok(next)
    }

    /// Makes the parent of the current default logger the default logger.
    /// Does nothing at root.
    pub fn pop_context(&self) -> Logger {
        self.ensure_initialized();
        let mut current = self.write_default();
        if let Some(parent) = current.parent() {
            *current = parent;
        }
        current.clone()
    }

    /// Pushes `segment` and returns a guard that restores the current default
    /// logger when dropped.
    pub fn scoped_context(&self, segment: &str) -> LogResult<ContextGuard<'_>> {
        validate_segment(segment)?;
        self.ensure_initialized();
        let mut current = self.write_default();
        let previous = current.clone();
        let logger = self
            .registry
            .get_logger(previous.name().child_unchecked(segment).as_str());
        *current = logger.clone();
        drop(current);
        Ok(ContextGuard {
            hierarchy: self,
            logger,
            previous,
        })
    }

    /// Like [`scoped_context`](Self::scoped_context), and also sets the
    /// explicit level of the new default logger. The level is kept after the
    /// guard is dropped.
    pub fn scoped_context_with_level(
        &self,
        segment: &str,
        level: Option<Level>,
    ) -> LogResult<ContextGuard<'_>> {
        let guard = self.scoped_context(segment)?;
        if level.is_some() {
            guard.set_level(level);
        }
        Ok(guard)
    }
}

/// Restores the previous default logger on drop.
///
/// Guards nest like a stack as long as they are dropped in reverse order of
/// creation.
#[must_use = "the context is popped as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ContextGuard<'h> {
    hierarchy: &'h Hierarchy,
    logger: Logger,
    previous: Logger,
}

impl ContextGuard<'_> {
    /// Logger this guard made the default.
    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Logger that will be restored on drop.
    #[must_use]
    pub fn previous(&self) -> &Logger {
        &self.previous
    }

    /// Name of the guarded logger.
    #[must_use]
    pub fn name(&self) -> &str {
        self.logger.name_str()
    }

    /// Sets the guarded logger's explicit level.
    pub fn set_level(&self, level: Option<Level>) {
        self.logger.set_level(level);
    }

    /// Explicit level of the guarded logger.
    #[must_use]
    pub fn level(&self) -> Option<Level> {
        self.logger.level()
    }

    /// Whether `level` passes the guarded logger's threshold.
    #[must_use]
    pub fn is_enabled_for(&self, level: Level) -> bool {
        self.logger.is_enabled_for(level)
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.hierarchy.set_default_logger(self.previous.clone());
    }
}
