//! crates/cli/src/command.rs
//! Argument definitions and parsing.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgGroup, Command, builder::PathBufValueParser};
use logging::Level;

/// How the hierarchy should be configured before logging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ConfigChoice {
    /// `configure()` from the environment variable.
    Environment,
    /// `--config FILE`.
    File(PathBuf),
    /// `--properties TEXT`.
    Properties(String),
}

/// Fully parsed invocation.
#[derive(Clone, Debug)]
pub(crate) struct ParsedArgs {
    pub(crate) config: ConfigChoice,
    pub(crate) logger: Option<String>,
    pub(crate) level: Level,
    pub(crate) contexts: Vec<String>,
    pub(crate) mdc: Vec<(String, String)>,
    pub(crate) describe: bool,
    pub(crate) verbose: bool,
    pub(crate) message: String,
}

/// Errors found after clap accepted the arguments.
#[derive(Debug)]
pub(crate) enum ParseError {
    Clap(clap::Error),
    Usage(String),
}

impl From<clap::Error> for ParseError {
    fn from(error: clap::Error) -> Self {
        Self::Clap(error)
    }
}

pub(crate) fn clap_command() -> Command {
    Command::new("hierlog")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Emit one record through the hierarchical logger")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configure from FILE (XML when it ends in .xml, properties otherwise).")
                .value_parser(PathBufValueParser::new())
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("properties")
                .long("properties")
                .short('p')
                .value_name("TEXT")
                .help("Configure from properties TEXT.")
                .action(ArgAction::Set),
        )
        .group(ArgGroup::new("configuration").args(["config", "properties"]))
        .arg(
            Arg::new("logger")
                .long("logger")
                .short('l')
                .value_name("NAME")
                .help("Log through NAME instead of the default logger.")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("level")
                .long("level")
                .short('L')
                .value_name("LEVEL")
                .help("Level of the record: TRACE, DEBUG, INFO, WARN, ERROR or FATAL.")
                .default_value("INFO")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("context")
                .long("context")
                .short('C')
                .value_name("SEGMENT")
                .help("Push SEGMENT onto the default logger; repeatable.")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("mdc")
                .long("mdc")
                .value_name("KEY=VALUE")
                .help("Add a diagnostic context entry; repeatable.")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("describe")
                .long("describe")
                .short('d')
                .help("Print the target logger, its effective level and whether LEVEL is enabled.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show the logging library's own diagnostics on stderr.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("message")
                .value_name("MESSAGE")
                .help("Text of the record. Use `--` before text starting with '-'.")
                .num_args(1..)
                .trailing_var_arg(true)
                .required_unless_present("describe")
                .action(ArgAction::Append),
        )
}

pub(crate) fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, ParseError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from("hierlog"));
    }
    let mut matches = clap_command().try_get_matches_from(args)?;

    let config = if let Some(path) = matches.remove_one::<PathBuf>("config") {
        ConfigChoice::File(path)
    } else if let Some(text) = matches.remove_one::<String>("properties") {
        ConfigChoice::Properties(text)
    } else {
        ConfigChoice::Environment
    };

    let level_text = matches
        .remove_one::<String>("level")
        .unwrap_or_else(|| "INFO".to_owned());
    let level = level_text
        .parse::<Level>()
        .map_err(|error| ParseError::Usage(error.to_string()))?;

    let mdc = matches
        .remove_many::<String>("mdc")
        .map(|values| values.collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
            _ => Err(ParseError::Usage(format!(
                "invalid --mdc entry '{entry}': expected KEY=VALUE"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedArgs {
        config,
        logger: matches.remove_one::<String>("logger"),
        level,
        contexts: matches
            .remove_many::<String>("context")
            .map(|values| values.collect())
            .unwrap_or_default(),
        mdc,
        describe: matches.get_flag("describe"),
        verbose: matches.get_flag("verbose"),
        message: matches
            .remove_many::<String>("message")
            .map(|values| values.collect::<Vec<_>>().join(" "))
            .unwrap_or_default(),
    })
}
