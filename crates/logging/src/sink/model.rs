//! crates/logging/src/sink/model.rs
//! Configuration model shared by the properties and XML parsers.
//!
//! Both parsers produce a [`Configuration`]. Resolving it into appender specs
//! validates classes, layouts, options and references before any appender is
//! opened or any level is set.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};
use crate::levels::Level;

use super::appender::{AppenderSpec, Target};
use super::layout::Layout;
use super::properties::Properties;

const PREFIX: &str = "log4j.";

/// An appender as written in a configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppenderDef {
    /// Appender name.
    pub name: String,
    /// Appender class, e.g. `org.apache.log4j.ConsoleAppender`.
    pub class: String,
    /// Layout class, if one was given.
    pub layout: Option<String>,
    /// Options keyed by lower-cased name.
    pub params: BTreeMap<String, String>,
}

/// Level, appenders and additivity for one logger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoggerDef {
    /// Explicit level; `None` leaves the logger inheriting.
    pub level: Option<Level>,
    /// Appender names.
    pub appenders: Vec<String>,
    /// Whether ancestors' appenders also receive records. Defaults to `true`.
    pub additivity: Option<bool>,
}

/// A parsed configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Configuration {
    /// Appenders by name.
    pub appenders: BTreeMap<String, AppenderDef>,
    /// Loggers by name; the empty name is root.
    pub loggers: BTreeMap<String, LoggerDef>,
}

impl Configuration {
    /// Builds a configuration from `log4j.*` properties.
    pub fn from_properties(properties: &Properties) -> ConfigResult<Self> {
        let mut config = Self::default();
        let mut pattern_warned = false;
        for (key, property) in properties.iter() {
            let value = property.value.trim();
            let Some(rest) = key.strip_prefix(PREFIX) else {
                tracing::debug!(target: "logging::sink", key, "ignoring property outside log4j namespace");
                continue;
            };
            if rest == "rootLogger" || rest == "rootCategory" {
                config.set_logger_spec("", value)?;
            } else if let Some(name) = rest
                .strip_prefix("logger.")
                .or_else(|| rest.strip_prefix("category."))
            {
                config.set_logger_spec(name, value)?;
            } else if let Some(name) = rest.strip_prefix("additivity.") {
                config.logger_mut(name).additivity = Some(parse_bool(value).ok_or_else(|| {
                    ConfigError::InvalidOption {
                        name: name.to_owned(),
                        option: "additivity",
                        value: value.to_owned(),
                    }
                })?);
            } else if let Some(rest) = rest.strip_prefix("appender.") {
                let (name, option) = match rest.split_once('.') {
                    Some((name, option)) => (name, Some(option)),
                    None => (rest, None),
                };
                let appender = config.appender_mut(name);
                match option {
                    None => appender.class = value.to_owned(),
                    Some("layout") => appender.layout = Some(value.to_owned()),
                    Some(option) if option.starts_with("layout.") => {
                        if !pattern_warned {
                            tracing::warn!(
                                target: "logging::sink",
                                key,
                                "layout options are not supported and are ignored"
                            );
                            pattern_warned = true;
                        }
                    }
                    Some(option) => {
                        appender
                            .params
                            .insert(option.to_ascii_lowercase(), value.to_owned());
                    }
                }
            } else {
                tracing::debug!(target: "logging::sink", key, "ignoring unsupported property");
            }
        }
        Ok(config)
    }

    /// Entry for `name`, created if missing.
    pub fn logger_mut(&mut self, name: &str) -> &mut LoggerDef {
        self.loggers.entry(name.to_owned()).or_default()
    }

    /// Entry for appender `name`, created if missing.
    pub fn appender_mut(&mut self, name: &str) -> &mut AppenderDef {
        self.appenders
            .entry(name.to_owned())
            .or_insert_with(|| AppenderDef {
                name: name.to_owned(),
                ..AppenderDef::default()
            })
    }

    /// Applies a `LEVEL, appender, ...` value to logger `name`. An empty level
    /// token leaves the level alone.
    pub fn set_logger_spec(&mut self, name: &str, spec: &str) -> ConfigResult<()> {
        let mut tokens = spec.split(',').map(str::trim);
        let level = tokens.next().unwrap_or_default();
        let logger = self.logger_mut(name);
        if !level.is_empty() {
            logger.level = parse_level(level)?;
        }
        logger
            .appenders
            .extend(tokens.filter(|token| !token.is_empty()).map(str::to_owned));
        Ok(())
    }

    /// Appender names referenced by at least one logger, each once.
    #[must_use]
    pub fn referenced_appenders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .loggers
            .values()
            .flat_map(|logger| logger.appenders.iter().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Resolves every referenced appender into a spec, checking that each
    /// reference is defined.
    pub fn resolve_appenders(&self) -> ConfigResult<Vec<AppenderSpec>> {
        for (logger, def) in &self.loggers {
            if let Some(missing) = def
                .appenders
                .iter()
                .find(|name| !self.appenders.contains_key(name.as_str()))
            {
                return Err(ConfigError::UndefinedAppender {
                    logger: if logger.is_empty() { "root".to_owned() } else { logger.clone() },
                    appender: missing.clone(),
                });
            }
        }
        self.referenced_appenders()
            .into_iter()
            .filter_map(|name| self.appenders.get(name))
            .map(AppenderDef::resolve)
            .collect()
    }
}

impl AppenderDef {
    /// Resolves class, layout and options into a spec.
    pub fn resolve(&self) -> ConfigResult<AppenderSpec> {
        let class = self.class.rsplit('.').next().unwrap_or(&self.class);
        let target = match class {
            "ConsoleAppender" => match self.params.get("target").map(|v| v.trim()) {
                None => Target::Stdout,
                Some(value) if value.eq_ignore_ascii_case("System.out") => Target::Stdout,
                Some(value) if value.eq_ignore_ascii_case("System.err") => Target::Stderr,
                Some(value) => return Err(self.invalid("Target", value)),
            },
            "FileAppender" => {
                let path = self
                    .params
                    .get("file")
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| ConfigError::MissingOption {
                        name: self.name.clone(),
                        option: "File",
                    })?;
                let append = match self.params.get("append") {
                    None => true,
                    Some(value) => parse_bool(value).ok_or_else(|| self.invalid("Append", value))?,
                };
                Target::File {
                    path: PathBuf::from(path),
                    append,
                }
            }
            _ => {
                return Err(ConfigError::UnknownAppenderClass {
                    name: self.name.clone(),
                    class: self.class.clone(),
                });
            }
        };
        let layout = match &self.layout {
            None => Layout::Simple,
            Some(class) => {
                let layout = Layout::from_class(class.trim()).ok_or_else(|| ConfigError::UnknownLayout {
                    name: self.name.clone(),
                    layout: class.clone(),
                })?;
                if class.ends_with("PatternLayout") {
                    tracing::warn!(
                        target: "logging::sink",
                        appender = %self.name,
                        "pattern layouts are not supported, using the detailed layout"
                    );
                }
                layout
            }
        };
        let threshold = match self.params.get("threshold") {
            None => None,
            Some(value) => parse_level(value)?,
        };
        Ok(AppenderSpec {
            name: self.name.clone(),
            target,
            layout,
            threshold,
        })
    }

    fn invalid(&self, option: &'static str, value: &str) -> ConfigError {
        ConfigError::InvalidOption {
            name: self.name.clone(),
            option,
            value: value.to_owned(),
        }
    }
}

/// Parses a configured level. `INHERITED` and `NULL` mean "no explicit
/// level".
pub fn parse_level(value: &str) -> ConfigResult<Option<Level>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("INHERITED") || value.eq_ignore_ascii_case("NULL") {
        return Ok(None);
    }
    value
        .parse::<Level>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidLevel(value.to_owned()))
}

fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
