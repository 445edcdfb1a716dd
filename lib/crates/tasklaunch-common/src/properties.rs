//! Parsers for the raw configuration strings carried by a
//! [`TransformConfig`](crate::TransformConfig).
//!
//! Two grammars live here and they are deliberately different:
//!
//! - [`parse_properties`] understands `key=value` pairs separated by
//!   top-level commas, where a value that starts with `"` may contain `,`
//!   and `=` up to its closing quote.
//! - [`split_command_line`] is a naive split on spaces with no quoting.

use std::collections::BTreeMap;

use crate::error::PropertyParseError;

/// Scanner position within the current `key=value` segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Before the first `=`.
    Key,
    /// Immediately after the first `=`; a `"` here opens a quoted value.
    ValueStart,
    /// Inside an unquoted value (or after a closed quote).
    Value,
    /// Inside a quoted value; commas are literal.
    Quoted,
    /// Inside a quoted value, right after a `\`.
    QuotedEscape,
}

/// Parse a comma-separated `key=value` property string.
///
/// Each segment is split on its first `=`; any later `=` belongs to the
/// value. A value starting with `"` runs to the next unescaped `"` and may
/// contain commas. Quotes and whitespace are kept verbatim. Duplicate keys
/// resolve to the last occurrence.
///
/// # Examples
///
/// ```
/// use tasklaunch_common::parse_properties;
///
/// let props = parse_properties(r#"app.test=a=b,c=d,e="x=y,z""#).unwrap();
/// assert_eq!(props["app.test"], "a=b");
/// assert_eq!(props["c"], "d");
/// assert_eq!(props["e"], r#""x=y,z""#);
/// ```
pub fn parse_properties(raw: &str) -> Result<BTreeMap<String, String>, PropertyParseError> {
    let mut properties = BTreeMap::new();
    if raw.is_empty() {
        return Ok(properties);
    }

    for segment in split_segments(raw)? {
        let Some((key, value)) = segment.split_once('=') else {
            return Err(PropertyParseError::MissingSeparator {
                segment: segment.to_string(),
            });
        };
        if key.is_empty() {
            return Err(PropertyParseError::EmptyKey {
                segment: segment.to_string(),
            });
        }
        properties.insert(key.to_string(), value.to_string());
    }

    Ok(properties)
}

/// Split `raw` on commas that are not inside a quoted value.
fn split_segments(raw: &str) -> Result<Vec<&str>, PropertyParseError> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut scan = Scan::Key;

    for (idx, ch) in raw.char_indices() {
        scan = match (scan, ch) {
            (Scan::Quoted, '\\') => Scan::QuotedEscape,
            (Scan::Quoted, '"') => Scan::Value,
            (Scan::Quoted | Scan::QuotedEscape, _) => Scan::Quoted,
            (_, ',') => {
                segments.push(&raw[start..idx]);
                start = idx + 1;
                Scan::Key
            }
            (Scan::Key, '=') => Scan::ValueStart,
            (Scan::Key, _) => Scan::Key,
            (Scan::ValueStart, '"') => Scan::Quoted,
            (Scan::ValueStart | Scan::Value, _) => Scan::Value,
        };
    }

    if matches!(scan, Scan::Quoted | Scan::QuotedEscape) {
        let tail = &raw[start..];
        let key = tail.split_once('=').map_or(tail, |(key, _)| key);
        return Err(PropertyParseError::UnterminatedQuote {
            key: key.to_string(),
        });
    }

    segments.push(&raw[start..]);
    Ok(segments)
}

/// Split a command-line string on single spaces.
///
/// Empty tokens produced by runs of spaces are dropped. Quotes get no
/// special treatment: `--a="x y"` yields two tokens.
#[must_use]
pub fn split_command_line(raw: &str) -> Vec<String> {
    raw.split(' ')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
