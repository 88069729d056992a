//! crates/logging/src/sink/appender.rs
//! Output destinations.
//!
//! An [`Appender`] owns its writer together with a reusable scratch buffer,
//! so rendering a record does not allocate once the buffer has grown. Write
//! failures are reported through `tracing` and otherwise swallowed.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::backend::Record;
use crate::error::{ConfigError, ConfigResult};
use crate::levels::Level;

use super::layout::Layout;

/// In-memory byte buffer shared between an appender and its owner.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents decoded as UTF-8, lossily.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// Contents split into lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    /// Empties the buffer.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Where an appender writes.
#[derive(Clone, Debug)]
pub enum Target {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
    /// A file, appended to or truncated when opened.
    File {
        /// File path.
        path: PathBuf,
        /// Append instead of truncating.
        append: bool,
    },
    /// An in-memory buffer.
    Buffer(SharedBuffer),
}

/// Everything needed to open an appender.
#[derive(Clone, Debug)]
pub struct AppenderSpec {
    /// Name the configuration refers to the appender by.
    pub name: String,
    /// Destination.
    pub target: Target,
    /// Line layout.
    pub layout: Layout,
    /// Records below this level are skipped.
    pub threshold: Option<Level>,
}

impl AppenderSpec {
    /// Spec for a console appender on standard output.
    #[must_use]
    pub fn stdout(name: impl Into<String>, layout: Layout) -> Self {
        Self {
            name: name.into(),
            target: Target::Stdout,
            layout,
            threshold: None,
        }
    }

    /// Spec for an appender writing into `buffer`.
    #[must_use]
    pub fn buffer(name: impl Into<String>, buffer: SharedBuffer, layout: Layout) -> Self {
        Self {
            name: name.into(),
            target: Target::Buffer(buffer),
            layout,
            threshold: None,
        }
    }

    /// Sets the threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: Level) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

enum Writer {
    Stdout,
    Stderr,
    File(File),
    Buffer(SharedBuffer),
}

impl Writer {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self {
            Self::Stdout => io::stdout().lock().write_all(line.as_bytes()),
            Self::Stderr => io::stderr().lock().write_all(line.as_bytes()),
            Self::File(file) => file.write_all(line.as_bytes()),
            Self::Buffer(buffer) => buffer.write_all(line.as_bytes()),
        }
    }
}

struct State {
    writer: Writer,
    scratch: String,
}

/// An opened output destination.
pub struct Appender {
    name: String,
    layout: Layout,
    threshold: Option<Level>,
    state: Mutex<State>,
}

impl Appender {
    /// Opens the destination described by `spec`. Files are created if
    /// missing.
    pub fn open(spec: AppenderSpec) -> ConfigResult<Self> {
        let writer = match spec.target {
            Target::Stdout => Writer::Stdout,
            Target::Stderr => Writer::Stderr,
            Target::Buffer(buffer) => Writer::Buffer(buffer),
            Target::File { path, append } => {
                let file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .append(append)
                    .truncate(!append)
                    .open(&path)
                    .map_err(|source| ConfigError::io(&path, source))?;
                Writer::File(file)
            }
        };
        Ok(Self {
            name: spec.name,
            layout: spec.layout,
            threshold: spec.threshold,
            state: Mutex::new(State {
                writer,
                scratch: String::new(),
            }),
        })
    }

    /// Name from the configuration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Line layout.
    #[must_use]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// Threshold, if any.
    #[must_use]
    pub const fn threshold(&self) -> Option<Level> {
        self.threshold
    }

    /// Whether a record at `level` passes the threshold.
    #[must_use]
    pub fn accepts(&self, level: Level) -> bool {
        self.threshold.is_none_or(|threshold| level >= threshold)
    }

    /// Renders and writes `record` if it passes the threshold.
    pub fn append(&self, record: &Record<'_>, elapsed_ms: u128) {
        if !self.accepts(record.level) {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let State { writer, scratch } = &mut *state;
        scratch.clear();
        self.layout.render(record, elapsed_ms, scratch);
        if let Err(error) = writer.write_line(scratch) {
            tracing::warn!(
                target: "logging::sink",
                appender = %self.name,
                %error,
                "failed to write log record"
            );
        }
    }
}

impl fmt::Debug for Appender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Appender")
            .field("name", &self.name)
            .field("layout", &self.layout)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Location;
    use crate::registry::LoggerRegistry;

    fn emit(appender: &Appender, level: Level, message: &str) {
        let registry = LoggerRegistry::new();
        let logger = registry.get_logger("t");
        appender.append(
            &Record {
                logger: &logger,
                level,
                message,
                location: Location::UNKNOWN,
            },
            0,
        );
    }

    #[test]
    fn buffer_appender_collects_lines() {
        let buffer = SharedBuffer::new();
        let appender = Appender::open(AppenderSpec::buffer("B", buffer.clone(), Layout::Simple)).unwrap();
        emit(&appender, Level::Info, "one");
        emit(&appender, Level::Error, "two");
        assert_eq!(buffer.lines(), ["INFO - one", "ERROR - two"]);
        buffer.clear();
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn threshold_filters_records() {
        let buffer = SharedBuffer::new();
        let spec = AppenderSpec::buffer("B", buffer.clone(), Layout::Simple).with_threshold(Level::Warn);
        let appender = Appender::open(spec).unwrap();
        emit(&appender, Level::Info, "dropped");
        emit(&appender, Level::Warn, "kept");
        assert_eq!(buffer.lines(), ["WARN - kept"]);
        assert!(!appender.accepts(Level::Debug));
    }

    #[test]
    fn file_appender_appends_or_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        std::fs::write(&path, "old\n").unwrap();

        let spec = |append| AppenderSpec {
            name: "F".to_owned(),
            target: Target::File {
                path: path.clone(),
                append,
            },
            layout: Layout::Simple,
            threshold: None,
        };

        let appender = Appender::open(spec(true)).unwrap();
        emit(&appender, Level::Info, "new");
        drop(appender);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\nINFO - new\n");

        let appender = Appender::open(spec(false)).unwrap();
        emit(&appender, Level::Info, "fresh");
        drop(appender);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "INFO - fresh\n");
    }

    #[test]
    fn unopenable_file_is_config_error() {
        let spec = AppenderSpec {
            name: "F".to_owned(),
            target: Target::File {
                path: PathBuf::from("/nonexistent/dir/out.log"),
                append: true,
            },
            layout: Layout::Simple,
            threshold: None,
        };
        assert!(matches!(Appender::open(spec), Err(ConfigError::Io { .. })));
    }
}
