#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` is a hierarchical logging facade. Loggers are named with
//! dot-separated paths (`"app.db.pool"`) and form a tree under an unnamed
//! root. A logger without an explicit level inherits the nearest ancestor's,
//! so turning one subsystem up or down is a single assignment.
//!
//! The process keeps a *default logger* that the level macros use when no
//! logger is named. [`push_context`] and [`pop_context`] move it down and up
//! the tree, and [`scoped_context`] returns a guard that restores the
//! previous default logger when dropped. Nested components can therefore log
//! under their caller's namespace without threading a logger through every
//! call.
//!
//! # Design
//!
//! - [`LoggerRegistry`] interns loggers in a [`dashmap::DashMap`]. Each
//!   logger holds an atomic level and a pointer to its parent, so
//!   [`Logger::effective_level`] walks the chain without locking.
//! - [`Hierarchy`] binds the registry, the default logger and a [`Backend`].
//!   [`Hierarchy::global`] is the instance used by the free functions and
//!   macros; independent hierarchies can be built for tests.
//! - The [`Backend`] trait receives configuration requests and enabled
//!   records. [`SinkBackend`] is the default: console and file appenders
//!   configured from `log4j`-style properties or XML documents.
//! - Configuration is chosen from the [`CONFIG_ENV`] variable. A readable
//!   file named there is loaded lazily on first use; otherwise a basic
//!   console configuration is applied.
//! - With the `subscriber` feature, `FacadeLayer` forwards `tracing`
//!   events into the hierarchy.
//!
//! # Invariants
//!
//! - Root always exists and always has a level. Clearing it is ignored.
//! - A logger's parent is the logger named by its name minus the last
//!   segment, or root.
//! - Messages are formatted only after the level check passes and are
//!   truncated to [`MAX_MESSAGE_LEN`] bytes on a character boundary.
//! - Every `configure*` call clears all explicit levels before applying the
//!   new configuration.
//!
//! # Errors
//!
//! Fallible operations return [`LogError`]: either an invalid argument, such
//! as a context segment containing a dot, or a [`ConfigError`] describing why
//! a configuration was rejected.
//!
//! # Examples
//!
//! Route records into memory and log under a scoped context:
//!
//! ```
//! use std::sync::Arc;
//! use logging::sink::{Appender, AppenderSpec, Layout, SharedBuffer};
//! use logging::{Hierarchy, Level, Location, SinkBackend};
//!
//! let buffer = SharedBuffer::new();
//! let backend = SinkBackend::new();
//! backend.attach_appender(
//!     "",
//!     Appender::open(AppenderSpec::buffer("memory", buffer.clone(), Layout::Simple))?,
//! );
//! let hierarchy = Hierarchy::new(Arc::new(backend));
//! hierarchy.set_level("app.db", Some(Level::Warn));
//!
//! {
//!     let guard = hierarchy.scoped_context("app")?;
//!     assert_eq!(guard.name(), "app");
//!     let db = hierarchy.logger("app.db");
//!     hierarchy.log_message(&db, Level::Info, Location::UNKNOWN, "suppressed");
//!     hierarchy.log_message(&db, Level::Warn, Location::UNKNOWN, "pool exhausted");
//! }
//! assert!(hierarchy.default_logger().is_root());
//! assert_eq!(buffer.lines(), ["WARN - pool exhausted"]);
//! # Ok::<(), logging::LogError>(())
//! ```
//!
//! # See also
//!
//! - [`sink`] for appenders, layouts and configuration file formats.
//! - [`mdc`] for per-thread diagnostic context shown by detailed layouts.

mod backend;
#[cfg(feature = "subscriber")]
mod bridge;
mod configurator;
mod context;
mod error;
mod facade;
mod hierarchy;
mod levels;
mod logger;
mod macros;
pub mod mdc;
mod name;
mod registry;
pub mod sink;

pub use backend::{Backend, Location, NullBackend, Record};
#[cfg(feature = "subscriber")]
pub use bridge::{FacadeLayer, INTERNAL_TARGETS, LOGGER_FIELD, install_facade_layer};
pub use configurator::{CONFIG_ENV, ConfigFileKind, ConfigSource, config_file_kind, select_source};
pub use context::ContextGuard;
pub use error::{ConfigError, ConfigResult, LogError, LogResult};
pub use facade::{
    AsLogger, MAX_MESSAGE_LEN, configure, configure_file, configure_properties, default_logger,
    default_logger_name, get_logger, is_enabled_for, level, mdc_put, mdc_remove, pop_context,
    push_context, scoped_context, set_level, truncate_message,
};
pub use hierarchy::{Hierarchy, set_global_backend};
pub use levels::{Level, ParseLevelError, UNSET_LEVEL, level_from_i32_opt, level_to_i32};
pub use logger::Logger;
pub use name::{LoggerName, SEPARATOR, validate_segment};
pub use registry::LoggerRegistry;
pub use sink::SinkBackend;
