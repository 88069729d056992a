//! crates/logging/src/sink/layout.rs
//! Fixed record layouts.

use std::fmt::Write as _;
use std::thread;

use crate::backend::Record;
use crate::mdc;

/// How a record is turned into a line of text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// `LEVEL - message`
    #[default]
    Simple,
    /// `<ms> [thread] LEVEL logger - message`, where `<ms>` is milliseconds
    /// since the backend was created. Used by the basic configuration.
    Basic,
    /// `LEVEL logger function (file:line) - message - {{key,value}...}`
    Detailed,
}

impl Layout {
    /// Maps a layout class to a layout. Only the last dotted segment of
    /// `class` is significant. `PatternLayout` maps to [`Layout::Detailed`].
    #[must_use]
    pub fn from_class(class: &str) -> Option<Self> {
        match class.rsplit('.').next().unwrap_or(class) {
            "SimpleLayout" | "Simple" => Some(Self::Simple),
            "TTCCLayout" | "BasicLayout" | "Basic" => Some(Self::Basic),
            "DetailedLayout" | "Detailed" | "PatternLayout" => Some(Self::Detailed),
            _ => None,
        }
    }

    /// Appends the rendered line, newline included, to `out`.
    pub fn render(self, record: &Record<'_>, elapsed_ms: u128, out: &mut String) {
        let logger = logger_label(record);
        // Writing into a String cannot fail.
        let _ = match self {
            Self::Simple => writeln!(out, "{} - {}", record.level, record.message),
            Self::Basic => {
                let current = thread::current();
                match current.name() {
                    Some(name) => writeln!(
                        out,
                        "{elapsed_ms:<4} [{name}] {:<5} {logger} - {}",
                        record.level, record.message
                    ),
                    None => writeln!(
                        out,
                        "{elapsed_ms:<4} [{:?}] {:<5} {logger} - {}",
                        current.id(),
                        record.level,
                        record.message
                    ),
                }
            }
            Self::Detailed => {
                let location = record.location;
                let _ = write!(
                    out,
                    "{:<5} {logger} {} ({}:{}) - {} - ",
                    record.level, location.function, location.file, location.line, record.message
                );
                render_mdc(out);
                writeln!(out)
            }
        };
    }
}

fn logger_label<'a>(record: &Record<'a>) -> &'a str {
    if record.logger.is_root() {
        "root"
    } else {
        record.logger.name_str()
    }
}

/// Renders the calling thread's diagnostic context as `{{k,v}{k2,v2}}`, or
/// `{}` when it is empty.
pub(crate) fn render_mdc(out: &mut String) {
    mdc::with(|entries| {
        out.push('{');
        for (key, value) in entries {
            let _ = write!(out, "{{{key},{value}}}");
        }
        out.push('}');
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Location;
    use crate::levels::Level;
    use crate::registry::LoggerRegistry;

    fn render(layout: Layout, logger: &str, message: &str) -> String {
        let registry = LoggerRegistry::new();
        let logger = registry.get_logger(logger);
        let record = Record {
            logger: &logger,
            level: Level::Warn,
            message,
            location: Location::new("src/db.rs", "app::db::connect", 42),
        };
        let mut out = String::new();
        layout.render(&record, 17, &mut out);
        out
    }

    #[test]
    fn simple_layout() {
        assert_eq!(render(Layout::Simple, "a.b", "disk low"), "WARN - disk low\n");
    }

    #[test]
    fn basic_layout_names_root_and_thread() {
        let line = thread::Builder::new()
            .name("worker-1".to_owned())
            .spawn(|| render(Layout::Basic, "", "hello"))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(line, "17   [worker-1] WARN  root - hello\n");
    }

    #[test]
    fn detailed_layout_includes_location_and_mdc() {
        mdc::clear();
        assert_eq!(
            render(Layout::Detailed, "app.db", "slow"),
            "WARN  app.db app::db::connect (src/db.rs:42) - slow - {}\n"
        );
        mdc::put("y", "foo");
        mdc::put("x", "3");
        assert_eq!(
            render(Layout::Detailed, "app.db", "slow"),
            "WARN  app.db app::db::connect (src/db.rs:42) - slow - {{x,3}{y,foo}}\n"
        );
        mdc::clear();
    }

    #[test]
    fn class_names_resolve_by_last_segment() {
        assert_eq!(Layout::from_class("org.apache.log4j.SimpleLayout"), Some(Layout::Simple));
        assert_eq!(Layout::from_class("org.apache.log4j.TTCCLayout"), Some(Layout::Basic));
        assert_eq!(Layout::from_class("PatternLayout"), Some(Layout::Detailed));
        assert_eq!(Layout::from_class("org.apache.log4j.HTMLLayout"), None);
    }
}
