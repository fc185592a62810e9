// `config.txt` codec
//
// The controller persists its settings as a flat `KEY=VALUE` file with
// `#` comments. Reading goes through `DeviceConfig::parse`; writing never
// re-serializes the map but patches a single line of the original text, so
// settings this crate knows nothing about survive untouched.

use indexmap::IndexMap;
use serde::Serialize;

/// Parsed `config.txt`: parameter name -> raw string value, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DeviceConfig(IndexMap<String, String>);

impl DeviceConfig {
    /// Parse the device's config text.
    ///
    /// - blank lines and lines starting with `#` (after trimming) are skipped
    /// - other lines are split on the first `=`, key and value trimmed
    /// - a `#` inside the value starts a trailing comment and is cut off
    /// - lines without `=` or with an empty key are ignored
    /// - a repeated key keeps the last value
    pub fn parse(text: &str) -> Self {
        let mut entries = IndexMap::new();

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let mut value = value.trim();
            if let Some(idx) = value.find('#') {
                value = value[..idx].trim();
            }
            entries.insert(key.to_owned(), value.to_owned());
        }

        Self(entries)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical `KEY=VALUE` text. Comments and original spacing are lost;
    /// values survive a parse of the result.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.0 {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }
}

impl FromIterator<(String, String)> for DeviceConfig {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Key of a non-comment `key=value` line, if the line is one.
fn assignment_key(line: &str) -> Option<&str> {
    let stripped = line.trim();
    if stripped.starts_with('#') {
        return None;
    }
    stripped.split_once('=').map(|(key, _)| key.trim())
}

/// Split a line segment into its body and its line terminator.
fn split_terminator(segment: &str) -> (&str, &str) {
    if let Some(body) = segment.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = segment.strip_suffix('\n') {
        (body, "\n")
    } else {
        (segment, "")
    }
}

/// Rewrite the value of `param` in raw config text.
///
/// Only the assignment line is touched; it is re-emitted as `PARAM = VALUE`
/// when the original line used `" = "` and as `PARAM=VALUE` otherwise.
/// Every other byte of the input is kept, line terminators included. When
/// the key appears more than once the last assignment is rewritten, since
/// that is the one [`DeviceConfig::parse`] reports.
///
/// Returns `None` if no assignment line for `param` exists.
pub fn replace_param(text: &str, param: &str, new_value: &str) -> Option<String> {
    let segments: Vec<&str> = text.split_inclusive('\n').collect();
    let target = segments
        .iter()
        .rposition(|segment| assignment_key(segment) == Some(param))?;

    let mut out = String::with_capacity(text.len() + new_value.len() + 2);
    for (idx, segment) in segments.iter().enumerate() {
        if idx != target {
            out.push_str(segment);
            continue;
        }
        let (body, terminator) = split_terminator(segment);
        if body.contains(" = ") {
            out.push_str(&format!("{param} = {new_value}"));
        } else {
            out.push_str(&format!("{param}={new_value}"));
        }
        out.push_str(terminator);
    }

    Some(out)
}
