//! crates/logging/src/bridge.rs
//! Forwarding `tracing` events into the logger hierarchy.
//!
//! [`FacadeLayer`] is a `tracing-subscriber` layer. Each event is logged
//! through the hierarchy's default logger, or through the logger named by the
//! event's `logger` field, at the event's level. Enablement is decided by the
//! hierarchy, so logger levels apply to `tracing` output as well.
//!
//! The crate's own diagnostics (the targets in [`INTERNAL_TARGETS`]) are
//! skipped, and an event raised while another is being forwarded on the same thread is
//! dropped.
//!
//! # Usage
//!
//! ```rust,ignore
//! logging::install_facade_layer()?;
//! tracing::info!(logger = "net.http", "listening on {}", addr);
//! ```

use std::cell::Cell;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;

use crate::backend::Location;
use crate::hierarchy::Hierarchy;
use crate::levels::Level;

thread_local! {
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

/// Field naming the destination logger.
pub const LOGGER_FIELD: &str = "logger";

/// Targets of the diagnostics this crate emits about itself.
pub const INTERNAL_TARGETS: [&str; 4] = [
    "logging::configurator",
    "logging::context",
    "logging::logger",
    "logging::sink",
];

enum Target {
    Global,
    Shared(Arc<Hierarchy>),
}

/// A tracing layer that logs events through a [`Hierarchy`].
pub struct FacadeLayer {
    target: Target,
}

impl FacadeLayer {
    /// Layer forwarding into [`Hierarchy::global`].
    #[must_use]
    pub const fn global() -> Self {
        Self {
            target: Target::Global,
        }
    }

    /// Layer forwarding into `hierarchy`.
    #[must_use]
    pub const fn new(hierarchy: Arc<Hierarchy>) -> Self {
        Self {
            target: Target::Shared(hierarchy),
        }
    }

    fn hierarchy(&self) -> &Hierarchy {
        match &self.target {
            Target::Global => Hierarchy::global(),
            Target::Shared(hierarchy) => hierarchy,
        }
    }

    fn is_own_target(target: &str) -> bool {
        INTERNAL_TARGETS.contains(&target)
    }
}

impl fmt::Debug for FacadeLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match self.target {
            Target::Global => "global",
            Target::Shared(_) => "shared",
        };
        f.debug_struct("FacadeLayer").field("target", &target).finish()
    }
}

impl<S> Layer<S> for FacadeLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if Self::is_own_target(metadata.target()) || FORWARDING.with(Cell::get) {
            return;
        }
        FORWARDING.with(|flag| flag.set(true));

        let hierarchy = self.hierarchy();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let logger = hierarchy.logger(visitor.logger.take().as_deref().unwrap_or(""));
        let level = Level::from(*metadata.level());
        if hierarchy.enabled(&logger, level) {
            let location = Location::new(
                metadata.file().unwrap_or(""),
                metadata.module_path().unwrap_or(""),
                metadata.line().unwrap_or(0),
            );
            hierarchy.log_message(&logger, level, location, &visitor.into_message());
        }

        FORWARDING.with(|flag| flag.set(false));
    }
}

/// Collects the message, the destination logger and any other fields
/// rendered as ` name=value`.
#[derive(Default)]
struct EventVisitor {
    message: String,
    extra: String,
    logger: Option<String>,
}

impl EventVisitor {
    fn into_message(mut self) -> String {
        self.message.push_str(&self.extra);
        self.message
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => value.clone_into(&mut self.message),
            LOGGER_FIELD => self.logger = Some(value.to_owned()),
            name => {
                let _ = write!(self.extra, " {name}={value}");
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => {
                self.message.clear();
                let _ = write!(self.message, "{value:?}");
            }
            LOGGER_FIELD => self.logger = Some(format!("{value:?}")),
            name => {
                let _ = write!(self.extra, " {name}={value:?}");
            }
        }
    }
}

/// Installs a global `tracing` subscriber whose only layer is
/// [`FacadeLayer::global`].
pub fn install_facade_layer() -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(FacadeLayer::global())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, Record};
    use crate::error::ConfigResult;
    use crate::registry::LoggerRegistry;
    use std::path::Path;
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct Captured(Mutex<Vec<(String, Level, String)>>);

    impl Backend for Captured {
        fn reset_configuration(&self) {}
        fn configure_from_xml_file(&self, _: &Path, _: &LoggerRegistry) -> ConfigResult<()> {
            Ok(())
        }
        fn configure_from_properties_file(&self, _: &Path, _: &LoggerRegistry) -> ConfigResult<()> {
            Ok(())
        }
        fn configure_from_properties_text(&self, _: &str, _: &LoggerRegistry) -> ConfigResult<()> {
            Ok(())
        }
        fn apply_basic_configuration(&self) {}
        fn has_root_appenders(&self) -> bool {
            true
        }
        fn emit(&self, record: &Record<'_>) {
            self.0.lock().unwrap().push((
                record.logger.name_str().to_owned(),
                record.level,
                record.message.to_owned(),
            ));
        }
    }

    fn capture(f: impl FnOnce(&Hierarchy)) -> Vec<(String, Level, String)> {
        let backend = Arc::new(Captured::default());
        let hierarchy = Arc::new(Hierarchy::new(Arc::clone(&backend) as Arc<dyn Backend>));
        let subscriber =
            tracing_subscriber::registry().with(FacadeLayer::new(Arc::clone(&hierarchy)));
        tracing::subscriber::with_default(subscriber, || f(&hierarchy));
        let records = backend.0.lock().unwrap().clone();
        records
    }

    #[test]
    fn events_go_to_default_logger() {
        let records = capture(|h| {
            h.push_context("worker").unwrap();
            tracing::info!("started {} jobs", 4);
        });
        assert_eq!(
            records,
            [("worker".to_owned(), Level::Info, "started 4 jobs".to_owned())]
        );
    }

    #[test]
    fn logger_field_selects_logger() {
        let records = capture(|_| {
            tracing::warn!(logger = "net.http", status = 503, "upstream failed");
        });
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "net.http");
        assert_eq!(records[0].1, Level::Warn);
        assert_eq!(records[0].2, "upstream failed status=503");
    }

    #[test]
    fn logger_levels_filter_events() {
        let records = capture(|h| {
            h.set_level("quiet", Some(Level::Error));
            tracing::info!(logger = "quiet", "dropped");
            tracing::error!(logger = "quiet", "kept");
        });
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].2, "kept");
    }

    #[test]
    fn own_diagnostics_are_not_forwarded() {
        let records = capture(|_| {
            tracing::warn!(target: "logging::configurator", "internal");
            tracing::warn!(target: "logging::context", "internal");
            tracing::warn!(target: "logging::logger", "internal");
            tracing::warn!(target: "logging::sink", "internal");
        });
        assert!(records.is_empty());
    }

    #[test]
    fn crate_module_targets_are_forwarded() {
        assert!(!FacadeLayer::is_own_target(module_path!()));
        assert!(!FacadeLayer::is_own_target("logging"));
        let records = capture(|_| {
            tracing::info!("default target");
            tracing::info!(target: "app", "explicit target");
        });
        let messages: Vec<&str> = records.iter().map(|r| r.2.as_str()).collect();
        assert_eq!(messages, ["default target", "explicit target"]);
    }
}
