//! crates/logging/src/hierarchy.rs
//! The logger hierarchy: registry, default logger and backend bound together.
//!
//! A [`Hierarchy`] is an ordinary value so it can be built around any
//! [`Backend`] in tests. [`Hierarchy::global`] provides the process-wide
//! instance that the free functions and macros use.

use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{
    Arc, LazyLock, Mutex, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::backend::Backend;
use crate::configurator::{CONFIG_ENV, ConfigSource};
use crate::levels::{Level, level_from_i32_opt, level_to_i32};
use crate::logger::Logger;
use crate::registry::LoggerRegistry;
use crate::sink::SinkBackend;

static GLOBAL_BACKEND: OnceLock<Arc<dyn Backend>> = OnceLock::new();

static GLOBAL: LazyLock<Hierarchy> = LazyLock::new(|| {
    let backend = GLOBAL_BACKEND.get_or_init(|| Arc::new(SinkBackend::new()) as Arc<dyn Backend>);
    let hierarchy = Hierarchy::new(Arc::clone(backend));
    hierarchy.initialize(env::var_os(CONFIG_ENV).as_deref());
    hierarchy
});

/// Chooses the backend used by [`Hierarchy::global`].
///
/// Must be called before the global hierarchy is first touched. Returns the
/// backend back if one was already chosen.
pub fn set_global_backend(backend: Arc<dyn Backend>) -> Result<(), Arc<dyn Backend>> {
    GLOBAL_BACKEND.set(backend)
}

/// Registry, default logger and backend.
pub struct Hierarchy {
    pub(crate) registry: LoggerRegistry,
    pub(crate) default_logger: RwLock<Logger>,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) staged: Mutex<Option<PathBuf>>,
    pub(crate) staged_pending: AtomicBool,
    pub(crate) source: Mutex<Option<ConfigSource>>,
}

impl Hierarchy {
    /// Creates a hierarchy whose default logger is root. The backend is left
    /// unconfigured; call [`initialize`](Self::initialize) or one of the
    /// `configure*` methods.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let registry = LoggerRegistry::new();
        let root = registry.root();
        Self {
            registry,
            default_logger: RwLock::new(root),
            backend,
            staged: Mutex::new(None),
            staged_pending: AtomicBool::new(false),
            source: Mutex::new(None),
        }
    }

    /// The process-wide hierarchy, initialized from
    /// [`CONFIG_ENV`](crate::CONFIG_ENV) on first use.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Registry backing this hierarchy.
    #[must_use]
    pub fn registry(&self) -> &LoggerRegistry {
        &self.registry
    }

    /// Backend records are delivered to.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Resolves a logger by name. The empty name means the current default
    /// logger, not root.
    pub fn logger(&self, name: &str) -> Logger {
        if name.is_empty() {
            self.default_logger()
        } else {
            self.ensure_initialized();
            self.registry.get_logger(name)
        }
    }

    /// Sets or clears the explicit level of the logger called `name`.
    pub fn set_level(&self, name: &str, level: Option<Level>) {
        self.logger(name).set_level(level);
    }

    /// Integer form of [`set_level`](Self::set_level); `-1` clears and any
    /// unrecognised value means DEBUG.
    pub fn set_level_i32(&self, name: &str, level: i32) {
        self.set_level(name, level_from_i32_opt(level));
    }

    /// Explicit level of the logger called `name`.
    pub fn level(&self, name: &str) -> Option<Level> {
        self.logger(name).level()
    }

    /// Explicit level of the logger called `name`, `-1` when unset.
    pub fn level_i32(&self, name: &str) -> i32 {
        level_to_i32(self.level(name))
    }

    /// Effective level of the logger called `name`.
    pub fn effective_level(&self, name: &str) -> Level {
        self.logger(name).effective_level()
    }

    /// Whether `level` passes the threshold of the logger called `name`.
    pub fn is_enabled_for(&self, name: &str, level: Level) -> bool {
        self.logger(name).is_enabled_for(level)
    }

    /// Whether `level` passes `logger`'s threshold, applying any staged
    /// configuration first.
    pub fn enabled(&self, logger: &Logger, level: Level) -> bool {
        self.ensure_initialized();
        logger.is_enabled_for(level)
    }

    pub(crate) fn read_default(&self) -> RwLockReadGuard<'_, Logger> {
        self.default_logger
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write_default(&self) -> RwLockWriteGuard<'_, Logger> {
        self.default_logger
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn clear_staged(&self) {
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.staged_pending.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hierarchy")
            .field("registry", &self.registry)
            .field("default_logger", &*self.read_default())
            .field("staged", &self.staged_pending.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullBackend;

    fn hierarchy() -> Hierarchy {
        Hierarchy::new(Arc::new(NullBackend))
    }

    #[test]
    fn starts_at_root() {
        let h = hierarchy();
        assert!(h.default_logger().is_root());
        assert_eq!(h.default_logger_name(), "");
    }

    #[test]
    fn empty_name_resolves_to_default_logger() {
        let h = hierarchy();
        h.push_context("component").unwrap();
        let logger = h.logger("");
        assert_eq!(logger.name_str(), "component");
        assert!(h.registry().get_logger("").is_root());
    }

    #[test]
    fn name_based_level_access() {
        let h = hierarchy();
        assert_eq!(h.level_i32("a.b"), -1);
        h.set_level("a", Some(Level::Error));
        assert_eq!(h.level("a"), Some(Level::Error));
        assert_eq!(h.effective_level("a.b.c"), Level::Error);
        assert!(!h.is_enabled_for("a.b.c", Level::Warn));
        assert!(h.is_enabled_for("a.b.c", Level::Fatal));
    }

    #[test]
    fn integer_levels_are_permissive() {
        let h = hierarchy();
        h.set_level_i32("x", 30000);
        assert_eq!(h.level("x"), Some(Level::Warn));
        h.set_level_i32("x", 123);
        assert_eq!(h.level("x"), Some(Level::Debug));
        h.set_level_i32("x", -1);
        assert_eq!(h.level("x"), None);
    }

    #[test]
    fn empty_name_level_targets_default_logger() {
        let h = hierarchy();
        h.push_context("svc").unwrap();
        h.set_level("", Some(Level::Info));
        assert_eq!(h.registry().get_logger("svc").level(), Some(Level::Info));
        assert_eq!(h.registry().root().level(), Some(Level::Debug));
    }
}
