//! crates/logging/src/sink/xml.rs
//! XML configuration documents.
//!
//! Recognised elements, namespace prefixes ignored:
//! `<configuration>`, `<appender name class>`, `<param name value>`,
//! `<layout class>`, `<logger name additivity>`, `<category name additivity>`,
//! `<root>`, `<level value>`, `<priority value>` and `<appender-ref ref>`.

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::error::{ConfigError, ConfigResult};

use super::model::{Configuration, parse_level};

enum Scope {
    Top,
    Appender(String),
    Layout(String),
    Logger(String),
}

/// Parses an XML document into a [`Configuration`].
pub fn parse(text: &str, origin: &str) -> ConfigResult<Configuration> {
    let mut reader = Reader::from_str(text);
    let mut buf = Vec::new();
    let mut config = Configuration::default();
    let mut scope = Scope::Top;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf).map_err(|error| ConfigError::Xml {
            origin: origin.to_owned(),
            message: error.to_string(),
        })?;
        match event {
            Event::Start(ref element) => {
                if let Some(next) = start(element, &scope, &mut config, origin)? {
                    scope = next;
                }
            }
            Event::Empty(ref element) => {
                if let Some(next) = start(element, &scope, &mut config, origin)? {
                    scope = next;
                }
                end(element.local_name().as_ref(), &mut scope);
            }
            Event::End(ref element) => end(element.local_name().as_ref(), &mut scope),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(config)
}

/// Records what `element` contributes and returns the scope it opens, if any.
fn start(
    element: &BytesStart<'_>,
    scope: &Scope,
    config: &mut Configuration,
    origin: &str,
) -> ConfigResult<Option<Scope>> {
    let tag = element.local_name();
    let next = match (tag.as_ref(), scope) {
        (b"appender", Scope::Top) => {
            let name = required(element, b"name", "appender", origin)?;
            let class = required(element, b"class", "appender", origin)?;
            config.appender_mut(&name).class = class;
            Some(Scope::Appender(name))
        }
        (b"param", Scope::Appender(name)) => {
            let key = required(element, b"name", "param", origin)?;
            let value = attribute(element, b"value").unwrap_or_default();
            config
                .appender_mut(name)
                .params
                .insert(key.to_ascii_lowercase(), value);
            None
        }
        (b"layout", Scope::Appender(name)) => {
            let class = required(element, b"class", "layout", origin)?;
            config.appender_mut(name).layout = Some(class);
            Some(Scope::Layout(name.clone()))
        }
        (b"logger" | b"category", Scope::Top) => {
            let name = required(element, b"name", "logger", origin)?;
            let logger = config.logger_mut(&name);
            if let Some(additivity) = attribute(element, b"additivity") {
                logger.additivity = Some(!additivity.trim().eq_ignore_ascii_case("false"));
            }
            Some(Scope::Logger(name))
        }
        (b"root", Scope::Top) => {
            config.logger_mut("");
            Some(Scope::Logger(String::new()))
        }
        (b"level" | b"priority", Scope::Logger(name)) => {
            let value = required(element, b"value", "level", origin)?;
            config.logger_mut(name).level = parse_level(&value)?;
            None
        }
        (b"appender-ref", Scope::Logger(name)) => {
            let reference = required(element, b"ref", "appender-ref", origin)?;
            config.logger_mut(name).appenders.push(reference);
            None
        }
        (b"configuration", _) | (b"param", Scope::Layout(_)) => None,
        (other, _) => {
            tracing::debug!(
                target: "logging::sink",
                element = %String::from_utf8_lossy(other),
                "ignoring unsupported configuration element"
            );
            None
        }
    };
    Ok(next)
}

fn end(tag: &[u8], scope: &mut Scope) {
    let next = match (tag, &*scope) {
        (b"appender", Scope::Appender(_))
        | (b"logger" | b"category" | b"root", Scope::Logger(_)) => Scope::Top,
        (b"layout", Scope::Layout(name)) => Scope::Appender(name.clone()),
        _ => return,
    };
    *scope = next;
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .map(|attr| {
            let raw = String::from_utf8_lossy(attr.value.as_ref());
            unescape(&raw).map_or_else(|_| raw.to_string(), |value| value.into_owned())
        })
}

fn required(
    element: &BytesStart<'_>,
    key: &[u8],
    tag: &str,
    origin: &str,
) -> ConfigResult<String> {
    attribute(element, key).ok_or_else(|| ConfigError::Xml {
        origin: origin.to_owned(),
        message: format!(
            "<{tag}> is missing the '{}' attribute",
            String::from_utf8_lossy(key)
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::Level;
    use crate::sink::appender::Target;
    use crate::sink::layout::Layout;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<log4j:configuration xmlns:log4j="http://jakarta.apache.org/log4j/">
  <appender name="CON" class="org.apache.log4j.ConsoleAppender">
    <param name="Target" value="System.err"/>
    <layout class="org.apache.log4j.SimpleLayout">
      <param name="ConversionPattern" value="%m%n"/>
    </layout>
  </appender>
  <logger name="a.b" additivity="false">
    <level value="warn"/>
    <appender-ref ref="CON"/>
  </logger>
  <category name="c">
    <priority value="ERROR"/>
  </category>
  <root>
    <priority value="info"/>
    <appender-ref ref="CON"/>
  </root>
</log4j:configuration>
"#;

    #[test]
    fn parses_loggers_and_appenders() {
        let config = parse(DOCUMENT, "test.xml").unwrap();
        assert_eq!(config.loggers[""].level, Some(Level::Info));
        assert_eq!(config.loggers[""].appenders, ["CON"]);
        assert_eq!(config.loggers["a.b"].level, Some(Level::Warn));
        assert_eq!(config.loggers["a.b"].additivity, Some(false));
        assert_eq!(config.loggers["c"].level, Some(Level::Error));

        let appender = &config.appenders["CON"];
        assert_eq!(appender.params.get("target").map(String::as_str), Some("System.err"));
        assert_eq!(appender.params.len(), 1);

        let specs = config.resolve_appenders().unwrap();
        assert!(matches!(specs[0].target, Target::Stderr));
        assert_eq!(specs[0].layout, Layout::Simple);
    }

    #[test]
    fn entities_in_attributes_are_unescaped() {
        let config = parse(
            r#"<configuration><logger name="x&amp;y"><level value="DEBUG"/></logger></configuration>"#,
            "t.xml",
        )
        .unwrap();
        assert!(config.loggers.contains_key("x&y"));
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let err = parse("<configuration><appender class=\"X\"/></configuration>", "t.xml").unwrap_err();
        assert!(matches!(err, ConfigError::Xml { .. }));
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = parse("<configuration><root></configuration>", "bad.xml").unwrap_err();
        assert!(matches!(err, ConfigError::Xml { ref origin, .. } if origin == "bad.xml"));
    }

    #[test]
    fn unknown_level_is_an_error() {
        let err = parse(
            "<configuration><root><level value=\"chatty\"/></root></configuration>",
            "t.xml",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLevel(_)));
    }
}
