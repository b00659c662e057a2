//! Inline loader configuration: `require.config({ baseUrl, paths })`.
//!
//! Pages often configure the module loader in a `<script>` block instead of
//! a separate file. The object literal passed to `require.config` is turned
//! into JSON (bare keys quoted, single-quoted strings converted, comments and
//! trailing commas dropped) and deserialized. Objects holding anything other
//! than plain data, e.g. `shim` init functions, are skipped.

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::core::is_external_reference;

/// `require.config(` or `requirejs.config(` followed by an object.
static CONFIG_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:require|requirejs)\.config\s*\(\s*\{").unwrap());

/// Resolution settings of one `require.config` call. Other loader options
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequireConfig {
    pub base_url: Option<String>,
    pub paths: BTreeMap<String, PathTarget>,
}

/// A `paths` value: one location or a fallback list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PathTarget {
    One(String),
    Fallbacks(Vec<String>),
}

impl PathTarget {
    /// Location to resolve against: the first local entry of a fallback
    /// list, else its first entry.
    pub fn local(&self) -> Option<&str> {
        match self {
            Self::One(target) => Some(target),
            Self::Fallbacks(targets) => targets
                .iter()
                .find(|target| !is_external_reference(target))
                .or_else(|| targets.first())
                .map(String::as_str),
        }
    }
}

/// Every `require.config({...})` in `content`, in source order.
pub fn read_require_config(content: &str) -> Vec<RequireConfig> {
    CONFIG_CALL
        .find_iter(content)
        .filter_map(|call| {
            let start = call.end() - 1;
            let Some(json) = object_to_json(&content[start..]) else {
                crate::debug!("module"; "unterminated require.config at byte {}", call.start());
                return None;
            };
            match serde_json::from_str(&json) {
                Ok(config) => Some(config),
                Err(err) => {
                    crate::debug!("module"; "skipping require.config at byte {}: {}", call.start(), err);
                    None
                }
            }
        })
        .collect()
}

/// Convert the object literal at the start of `text` into JSON, stopping at
/// its closing brace. `None` when the object never closes.
fn object_to_json(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    let mut depth = 0usize;

    while let Some((pos, c)) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push('"');
                let mut escaped = false;
                loop {
                    let (_, next) = chars.next()?;
                    if escaped {
                        // `\'` has no JSON escape.
                        if next != '\'' {
                            out.push('\\');
                        }
                        out.push(next);
                        escaped = false;
                    } else if next == '\\' {
                        escaped = true;
                    } else if next == c {
                        break;
                    } else if next == '"' {
                        out.push_str("\\\"");
                    } else {
                        out.push(next);
                    }
                }
                out.push('"');
            }
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                for (_, next) in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut previous = ' ';
                for (_, next) in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            '{' | '[' => {
                depth += 1;
                out.push(c);
            }
            '}' | ']' => {
                let end = out.trim_end().len();
                out.truncate(end);
                if out.ends_with(',') {
                    out.pop();
                }
                out.push(c);
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(out);
                }
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut end = pos + c.len_utf8();
                while let Some(&(next_pos, next)) = chars.peek() {
                    if !(next.is_alphanumeric() || next == '_' || next == '$') {
                        break;
                    }
                    end = next_pos + next.len_utf8();
                    chars.next();
                }
                let word = &text[pos..end];
                if text[end..].trim_start().starts_with(':') {
                    out.push('"');
                    out.push_str(word);
                    out.push('"');
                } else {
                    out.push_str(word);
                }
            }
            _ => out.push(c),
        }
    }
    None
}
