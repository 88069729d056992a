//! crates/logging/src/registry.rs
//! Process-wide map from dotted names to loggers.
//!
//! Entries are created lazily and never removed. When a logger is created its
//! ancestors are materialized too, so every node holds a direct link to its
//! parent and inheritance walks never touch the map.

use std::sync::Arc;

use dashmap::DashMap;

use crate::levels::Level;
use crate::logger::{Logger, LoggerNode};
use crate::name::LoggerName;

/// Registry of named loggers.
pub struct LoggerRegistry {
    root: Arc<LoggerNode>,
    nodes: DashMap<Box<str>, Arc<LoggerNode>>,
}

impl LoggerRegistry {
    /// Level the root logger starts with and returns to on reset.
    pub const ROOT_LEVEL: Level = Level::Debug;

    /// Creates a registry holding only the root logger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Arc::new(LoggerNode::root(Self::ROOT_LEVEL)),
            nodes: DashMap::new(),
        }
    }

    /// The root logger.
    #[must_use]
    pub fn root(&self) -> Logger {
        Logger::from_node(Arc::clone(&self.root))
    }

    /// Resolves `name`, creating it and any missing ancestors. The empty name
    /// resolves to root. Empty segments are ignored.
    pub fn get_logger(&self, name: &str) -> Logger {
        if name.is_empty() {
            return self.root();
        }
        if let Some(node) = self.nodes.get(name) {
            return Logger::from_node(Arc::clone(node.value()));
        }
        Logger::from_node(self.materialize(&LoggerName::normalized(name)))
    }

    /// Returns the logger for `name` only if it already exists.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Logger> {
        let name = LoggerName::normalized(name);
        if name.is_root() {
            return Some(self.root());
        }
        self.nodes
            .get(name.as_str())
            .map(|node| Logger::from_node(Arc::clone(node.value())))
    }

    /// Returns `true` if a logger named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of loggers, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() + 1
    }

    /// Always `false`: root is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Snapshot of every logger, sorted by name with root first.
    #[must_use]
    pub fn loggers(&self) -> Vec<Logger> {
        let mut loggers: Vec<Logger> = self
            .nodes
            .iter()
            .map(|entry| Logger::from_node(Arc::clone(entry.value())))
            .collect();
        loggers.sort_by(|a, b| a.name().cmp(b.name()));
        loggers.insert(0, self.root());
        loggers
    }

    /// Sets root back to [`Self::ROOT_LEVEL`] and clears every other explicit
    /// level.
    pub fn reset_levels(&self) {
        self.root.store_level(Some(Self::ROOT_LEVEL));
        for entry in &self.nodes {
            entry.value().store_level(None);
        }
    }

    fn materialize(&self, name: &LoggerName) -> Arc<LoggerNode> {
        if name.is_root() {
            return Arc::clone(&self.root);
        }
        if let Some(node) = self.nodes.get(name.as_str()) {
            return Arc::clone(node.value());
        }
        // Resolve the parent before taking the entry lock on this shard.
        let parent = self.materialize(&name.parent().unwrap_or_else(LoggerName::root));
        let entry = self
            .nodes
            .entry(Box::from(name.as_str()))
            .or_insert_with(|| Arc::new(LoggerNode::child(name.clone(), parent)));
        Arc::clone(entry.value())
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("loggers", &self.len())
            .finish_non_exhaustive()
    }
}
