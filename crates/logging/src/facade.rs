//! crates/logging/src/facade.rs
//! Emitting records and the process-wide convenience functions.
//!
//! Messages are rendered into a per-thread scratch buffer that is reused
//! between calls. Rendering stops at [`MAX_MESSAGE_LEN`] bytes; longer
//! messages are delivered truncated at a character boundary. Nothing is
//! formatted for a record that fails the enablement check.

use std::cell::RefCell;
use std::fmt::{self, Write as _};

use crate::backend::{Location, Record};
use crate::configurator::ConfigSource;
use crate::context::ContextGuard;
use crate::error::LogResult;
use crate::hierarchy::Hierarchy;
use crate::levels::Level;
use crate::logger::Logger;
use crate::mdc;
use crate::name::LoggerName;

/// Largest message, in bytes, handed to a backend.
pub const MAX_MESSAGE_LEN: usize = 1024;

thread_local! {
    static SCRATCH: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Writer that accepts at most [`MAX_MESSAGE_LEN`] bytes and then refuses
/// further output.
struct Bounded<'a> {
    buffer: &'a mut String,
}

impl fmt::Write for Bounded<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = MAX_MESSAGE_LEN.saturating_sub(self.buffer.len());
        if s.len() <= room {
            self.buffer.push_str(s);
            Ok(())
        } else {
            self.buffer.push_str(&s[..floor_char_boundary(s, room)]);
            Err(fmt::Error)
        }
    }
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Cuts `message` to at most [`MAX_MESSAGE_LEN`] bytes without splitting a
/// character.
#[must_use]
pub fn truncate_message(message: &str) -> &str {
    &message[..floor_char_boundary(message, MAX_MESSAGE_LEN)]
}

fn render_into(buffer: &mut String, args: fmt::Arguments<'_>) {
    buffer.clear();
    if let Some(literal) = args.as_str() {
        buffer.push_str(truncate_message(literal));
        return;
    }
    // An error here only means the bound was reached.
    let _ = Bounded { buffer }.write_fmt(args);
}

/// Resolves something that names a logger.
pub trait AsLogger {
    /// Resolves against `hierarchy`. Names go through
    /// [`Hierarchy::logger`], so the empty name is the default logger.
    fn resolve(&self, hierarchy: &Hierarchy) -> Logger;
}

impl AsLogger for str {
    fn resolve(&self, hierarchy: &Hierarchy) -> Logger {
        hierarchy.logger(self)
    }
}

impl AsLogger for String {
    fn resolve(&self, hierarchy: &Hierarchy) -> Logger {
        hierarchy.logger(self)
    }
}

impl AsLogger for LoggerName {
    fn resolve(&self, hierarchy: &Hierarchy) -> Logger {
        hierarchy.logger(self.as_str())
    }
}

impl AsLogger for Logger {
    fn resolve(&self, _: &Hierarchy) -> Logger {
        self.clone()
    }
}

impl<T: AsLogger + ?Sized> AsLogger for &T {
    fn resolve(&self, hierarchy: &Hierarchy) -> Logger {
        (**self).resolve(hierarchy)
    }
}

impl Hierarchy {
    /// Formats `args` and delivers the record if `level` is enabled for
    /// `logger`.
    pub fn log_fmt(
        &self,
        logger: &Logger,
        level: Level,
        location: Location<'_>,
        args: fmt::Arguments<'_>,
    ) {
        if !self.enabled(logger, level) {
            return;
        }
        let delivered = SCRATCH.try_with(|scratch| match scratch.try_borrow_mut() {
            Ok(mut buffer) => {
                render_into(&mut buffer, args);
                self.deliver(logger, level, location, &buffer);
                true
            }
            // Re-entered from inside a backend on this thread.
            Err(_) => false,
        });
        // Also reached from thread-local destructors once the scratch buffer
        // is gone.
        if !matches!(delivered, Ok(true)) {
            let mut buffer = String::new();
            render_into(&mut buffer, args);
            self.deliver(logger, level, location, &buffer);
        }
    }

    /// Delivers an already built message if `level` is enabled for `logger`.
    pub fn log_message(&self, logger: &Logger, level: Level, location: Location<'_>, message: &str) {
        if self.enabled(logger, level) {
            self.deliver(logger, level, location, truncate_message(message));
        }
    }

    /// Resolves `target` and logs through [`log_fmt`](Self::log_fmt).
    pub fn log<T: AsLogger + ?Sized>(
        &self,
        target: &T,
        level: Level,
        location: Location<'_>,
        args: fmt::Arguments<'_>,
    ) {
        let logger = target.resolve(self);
        self.log_fmt(&logger, level, location, args);
    }

    fn deliver(&self, logger: &Logger, level: Level, location: Location<'_>, message: &str) {
        self.backend.emit(&Record {
            logger,
            level,
            message,
            location,
        });
    }
}

/// Configures the global hierarchy from [`CONFIG_ENV`](crate::CONFIG_ENV).
pub fn configure() -> LogResult<ConfigSource> {
    Hierarchy::global().configure()
}

/// Configures the global hierarchy from a file.
pub fn configure_file(path: impl AsRef<std::path::Path>) -> LogResult<()> {
    Hierarchy::global().configure_file(path)
}

/// Configures the global hierarchy from properties text.
pub fn configure_properties(text: &str) -> LogResult<()> {
    Hierarchy::global().configure_properties(text)
}

/// Default logger of the global hierarchy.
pub fn default_logger() -> Logger {
    Hierarchy::global().default_logger()
}

/// Name of the global default logger; empty for root.
pub fn default_logger_name() -> String {
    Hierarchy::global().default_logger_name()
}

/// Resolves `name` in the global hierarchy; empty means the default logger.
pub fn get_logger(name: &str) -> Logger {
    Hierarchy::global().logger(name)
}

/// Pushes a context segment onto the global default logger.
pub fn push_context(segment: &str) -> LogResult<Logger> {
    Hierarchy::global().push_context(segment)
}

/// Pops the global default logger to its parent.
pub fn pop_context() -> Logger {
    Hierarchy::global().pop_context()
}

/// Pushes a context segment for the lifetime of the returned guard.
pub fn scoped_context(segment: &str) -> LogResult<ContextGuard<'static>> {
    Hierarchy::global().scoped_context(segment)
}

/// Sets the explicit level of a named logger in the global hierarchy.
pub fn set_level(name: &str, level: Option<Level>) {
    Hierarchy::global().set_level(name, level);
}

/// Explicit level of a named logger in the global hierarchy.
pub fn level(name: &str) -> Option<Level> {
    Hierarchy::global().level(name)
}

/// Whether `level` is enabled for a named logger in the global hierarchy.
pub fn is_enabled_for(name: &str, level: Level) -> bool {
    Hierarchy::global().is_enabled_for(name, level)
}

/// Sets a diagnostic context entry for the calling thread.
pub fn mdc_put(key: impl Into<String>, value: impl Into<String>) {
    mdc::put(key, value);
}

/// Removes a diagnostic context entry for the calling thread.
pub fn mdc_remove(key: &str) -> Option<String> {
    mdc::remove(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::error::ConfigResult;
    use crate::registry::LoggerRegistry;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Captured(Mutex<Vec<(String, Level, String, u32)>>);

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
            false
        }
        fn emit(&self, record: &Record<'_>) {
            self.0.lock().unwrap().push((
                record.logger.name_str().to_owned(),
                record.level,
                record.message.to_owned(),
                record.location.line,
            ));
        }
    }

    fn setup() -> (Arc<Captured>, Hierarchy) {
        let backend = Arc::new(Captured::default());
        let h = Hierarchy::new(Arc::clone(&backend) as Arc<dyn Backend>);
        (backend, h)
    }

    #[test]
    fn logging_from_thread_local_destructor_is_delivered() {
        struct LogOnDrop(Arc<Hierarchy>);

        impl Drop for LogOnDrop {
            fn drop(&mut self) {
                let logger = self.0.logger("teardown");
                self.0
                    .log_fmt(&logger, Level::Info, Location::UNKNOWN, format_args!("bye"));
                mdc::put("late", "1");
                let _ = mdc::snapshot();
            }
        }

        thread_local! {
            static LATE: RefCell<Option<LogOnDrop>> = const { RefCell::new(None) };
        }

        let (backend, h) = setup();
        let h = Arc::new(h);
        let worker = Arc::clone(&h);
        std::thread::spawn(move || {
            // Registered before the scratch buffer, so destroyed after it.
            LATE.with(|slot| *slot.borrow_mut() = Some(LogOnDrop(Arc::clone(&worker))));
            let logger = worker.logger("teardown");
            worker.log_fmt(&logger, Level::Info, Location::UNKNOWN, format_args!("hi"));
        })
        .join()
        .unwrap();

        let messages: Vec<String> = backend
            .0
            .lock()
            .unwrap()
            .iter()
            .map(|record| record.2.clone())
            .collect();
        assert_eq!(messages, ["hi", "bye"]);
    }

    #[test]
    fn enabled_records_reach_backend() {
        let (backend, h) = setup();
        let logger = h.logger("app.db");
        h.log_fmt(
            &logger,
            Level::Info,
            Location::new("db.rs", "connect", 12),
            format_args!("opened {} connections", 3),
        );
        let records = backend.0.lock().unwrap();
        assert_eq!(
            records.as_slice(),
            [("app.db".to_owned(), Level::Info, "opened 3 connections".to_owned(), 12)]
        );
    }

    #[test]
    fn disabled_records_are_not_formatted() {
        struct Loud<'a>(&'a Mutex<bool>);
        impl fmt::Display for Loud<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                *self.0.lock().unwrap() = true;
                f.write_str("loud")
            }
        }

        let (backend, h) = setup();
        h.set_level("quiet", Some(Level::Error));
        let touched = Mutex::new(false);
        h.log(
            "quiet",
            Level::Info,
            Location::UNKNOWN,
            format_args!("{}", Loud(&touched)),
        );
        assert!(!*touched.lock().unwrap());
        assert!(backend.0.lock().unwrap().is_empty());
    }

    #[test]
    fn long_messages_are_truncated() {
        let (backend, h) = setup();
        let long = "x".repeat(MAX_MESSAGE_LEN * 3);
        h.log("", Level::Warn, Location::UNKNOWN, format_args!("{long}"));
        h.log_message(&h.registry().root(), Level::Warn, Location::UNKNOWN, &long);
        let records = backend.0.lock().unwrap();
        assert_eq!(records.len(), 2);
        for record in records.iter() {
            assert_eq!(record.2.len(), MAX_MESSAGE_LEN);
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(MAX_MESSAGE_LEN);
        let cut = truncate_message(&text);
        assert!(cut.len() <= MAX_MESSAGE_LEN);
        assert_eq!(cut.len() % 2, 0);

        let mut buffer = String::new();
        render_into(&mut buffer, format_args!("a{text}"));
        assert_eq!(buffer.len(), MAX_MESSAGE_LEN - 1);
        assert!(buffer.starts_with('a'));
    }

    #[test]
    fn scratch_is_reused_across_calls() {
        let (backend, h) = setup();
        h.log("a", Level::Info, Location::UNKNOWN, format_args!("{}", "first message"));
        h.log("a", Level::Info, Location::UNKNOWN, format_args!("{}", 2));
        let records = backend.0.lock().unwrap();
        assert_eq!(records[1].2, "2");
    }

    #[test]
    fn empty_name_logs_through_default_logger() {
        let (backend, h) = setup();
        h.push_context("ctx").unwrap();
        h.log("", Level::Error, Location::UNKNOWN, format_args!("boom"));
        assert_eq!(backend.0.lock().unwrap()[0].0, "ctx");
    }

    #[test]
    fn as_logger_accepts_handles_and_names() {
        let (_, h) = setup();
        let handle = h.logger("x.y");
        assert_eq!("x.y".resolve(&h), handle);
        assert_eq!(String::from("x.y").resolve(&h), handle);
        assert_eq!((&handle).resolve(&h), handle);
        assert_eq!(LoggerName::new("x.y").unwrap().resolve(&h), handle);
    }
}
