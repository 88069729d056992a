#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the `hierlog` command: configure a logger hierarchy,
//! move the default logger down a chain of contexts, attach diagnostic
//! context entries and emit a single record. It is a small exerciser for the
//! [`logging`] crate and a convenient way to check what a configuration file
//! does to a given logger.
//!
//! # Design
//!
//! [`run`] parses the arguments with a [`clap`] builder, creates a fresh
//! [`Hierarchy`] over the default [`SinkBackend`] and hands both to
//! [`run_with`]. Keeping the hierarchy a parameter lets tests observe the
//! emitted record through any [`Backend`](logging::Backend).
//!
//! Configuration follows the library's rules: `--config` and `--properties`
//! are explicit, otherwise the `HIERLOG_CONFIG` environment variable is
//! consulted and basic console output is the fallback.
//!
//! # Errors
//!
//! Exit codes:
//!
//! | Code | Meaning |
//! |---|---|
//! | 0 | success |
//! | 1 | usage error (unknown option, bad level, malformed `--mdc`) |
//! | 2 | configuration rejected |
//! | 3 | invalid context segment |
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let code = cli::run(
//!     ["hierlog", "--properties", "log4j.logger.db=ERROR", "--logger", "db.pool", "--describe"],
//!     &mut stdout,
//!     &mut stderr,
//! );
//! assert_eq!(code, 0);
//! assert_eq!(
//!     String::from_utf8(stdout).unwrap(),
//!     "logger=db.pool effective=ERROR level=INFO enabled=false\n"
//! );
//! ```
//!
//! # See also
//!
//! - `src/bin/hierlog.rs` for the binary that wires [`run`] into `main`.

mod command;

use std::ffi::OsString;
use std::io::Write;
use std::sync::Arc;

use command::{ConfigChoice, ParseError, ParsedArgs, parse_args};
use logging::{Hierarchy, LogError, Logger, SinkBackend, mdc};

/// Exit code for success.
pub const EXIT_OK: i32 = 0;
/// Exit code for argument errors.
pub const EXIT_USAGE: i32 = 1;
/// Exit code when a configuration is rejected.
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when a context segment is invalid.
pub const EXIT_CONTEXT: i32 = 3;

/// Runs the command against a fresh hierarchy writing through
/// [`SinkBackend`].
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    let hierarchy = Hierarchy::new(Arc::new(SinkBackend::new()));
    run_with(&hierarchy, arguments, stdout, stderr)
}

/// Runs the command against `hierarchy`.
///
/// `stdout` receives help, version and `--describe` output. Records go
/// wherever the hierarchy's backend sends them.
pub fn run_with<I, S, Out, Err>(
    hierarchy: &Hierarchy,
    arguments: I,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    match parse_args(arguments) {
        Ok(parsed) => execute(hierarchy, &parsed, stdout, stderr),
        Err(ParseError::Clap(error)) => {
            let code = if error.use_stderr() { EXIT_USAGE } else { EXIT_OK };
            let rendered = error.render().to_string();
            let sink: &mut dyn Write = if error.use_stderr() { stderr } else { stdout };
            let _ = sink.write_all(rendered.as_bytes());
            code
        }
        Err(ParseError::Usage(message)) => {
            let _ = writeln!(stderr, "hierlog: {message}");
            EXIT_USAGE
        }
    }
}

fn execute<Out: Write, Err: Write>(
    hierarchy: &Hierarchy,
    parsed: &ParsedArgs,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32 {
    if parsed.verbose {
        install_diagnostics();
    }

    if let Err(error) = configure(hierarchy, &parsed.config) {
        let _ = writeln!(stderr, "hierlog: {error}");
        return EXIT_CONFIG;
    }

    for segment in &parsed.contexts {
        if let Err(error) = hierarchy.push_context(segment) {
            let _ = writeln!(stderr, "hierlog: context '{segment}': {error}");
            return EXIT_CONTEXT;
        }
    }

    let target = target_logger(hierarchy, parsed.logger.as_deref());

    if parsed.describe {
        let _ = writeln!(
            stdout,
            "logger={} effective={} level={} enabled={}",
            display_name(&target),
            target.effective_level(),
            parsed.level,
            target.is_enabled_for(parsed.level),
        );
    }

    if !parsed.message.is_empty() {
        for (key, value) in &parsed.mdc {
            mdc::put(key.as_str(), value.as_str());
        }
        hierarchy.log_fmt(
            &target,
            parsed.level,
            logging::Location::new(file!(), "hierlog", line!()),
            format_args!("{}", parsed.message),
        );
        mdc::clear();
    }

    tracing::debug!(
        target: "cli",
        logger = %display_name(&target),
        level = %parsed.level,
        "done"
    );
    EXIT_OK
}

fn configure(hierarchy: &Hierarchy, choice: &ConfigChoice) -> Result<(), LogError> {
    match choice {
        ConfigChoice::Environment => hierarchy.configure().map(drop),
        ConfigChoice::File(path) => hierarchy.configure_file(path),
        ConfigChoice::Properties(text) => hierarchy.configure_properties(text),
    }
}

fn target_logger(hierarchy: &Hierarchy, name: Option<&str>) -> Logger {
    match name {
        Some(name) => hierarchy.logger(name),
        None => hierarchy.default_logger(),
    }
}

fn display_name(logger: &Logger) -> &str {
    if logger.is_root() { "root" } else { logger.name_str() }
}

#[cfg(feature = "subscriber")]
fn install_diagnostics() {
    use tracing_subscriber::EnvFilter;

    // A second install in the same process is not an error for the caller.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new("logging=debug,cli=debug"))
        .with_target(true)
        .try_init();
}

#[cfg(not(feature = "subscriber"))]
fn install_diagnostics() {}
