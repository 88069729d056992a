//! crates/logging/src/sink/properties.rs
//! Java-style properties text.
//!
//! Supported syntax: `#` and `!` comment lines, keys separated from values by
//! `=`, `:` or whitespace, backslash line continuation, and the escapes `\t`,
//! `\n`, `\r`, `\f`, `\uXXXX` and `\<char>`. A later key replaces an earlier
//! one.

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};

const BLANK: [char; 3] = [' ', '\t', '\x0c'];

/// A parsed property value and the line it started on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    /// Unescaped value.
    pub value: String,
    /// One-based line number of the key.
    pub line: usize,
}

/// Parsed properties, sorted by key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, Property>,
}

impl Properties {
    /// Parses `text`; `origin` names the source in error messages.
    pub fn parse(text: &str, origin: &str) -> ConfigResult<Self> {
        let mut properties = Self::default();
        let mut lines = text.lines().enumerate();
        while let Some((index, line)) = lines.next() {
            let trimmed = line.trim_start_matches(BLANK);
            if trimmed.is_empty() || trimmed.starts_with(['#', '!']) {
                continue;
            }
            let mut logical = trimmed.to_owned();
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some((_, next)) => logical.push_str(next.trim_start_matches(BLANK)),
                    None => break,
                }
            }
            let number = index + 1;
            let (key, value) = split_key_value(&logical);
            let key = unescape(key, origin, number)?;
            let value = unescape(value, origin, number)?;
            properties.entries.insert(
                key,
                Property {
                    value,
                    line: number,
                },
            );
        }
        Ok(properties)
    }

    /// Value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|property| property.value.as_str())
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries.iter().map(|(key, property)| (key.as_str(), property))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entries were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                key_end = index;
                break;
            }
            _ => {}
        }
    }
    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches(BLANK);
    let value = rest
        .strip_prefix(['=', ':'])
        .map_or(rest, |value| value.trim_start_matches(BLANK));
    (key, value)
}

fn unescape(raw: &str, origin: &str, line: usize) -> ConfigResult<String> {
    if !raw.contains('\\') {
        return Ok(raw.to_owned());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        ConfigError::syntax(origin, line, format!("malformed \\u escape '\\u{hex}'"))
                    })?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}
