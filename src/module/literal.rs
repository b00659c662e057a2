//! Module literals written in markup: `'id'`, `"id"` or `['a', "b"]`.

use parking_lot::Mutex;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::sync::LazyLock;

/// Literals already reported as malformed.
static REPORTED: LazyLock<Mutex<FxHashSet<String>>> =
    LazyLock::new(|| Mutex::new(FxHashSet::default()));

/// Parse a module literal into module ids.
///
/// A literal that is not valid data syntax (e.g. a variable name) is taken
/// verbatim as a single id and reported once. Empty values yield no ids.
pub fn parse_module_literal(matched: &str, literal: &str) -> Vec<String> {
    let literal = literal.trim();
    if literal.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(&to_json(literal)) {
        Ok(Value::String(id)) => non_empty(id).into_iter().collect(),
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(id) => non_empty(id),
                _ => None,
            })
            .collect(),
        Ok(Value::Null | Value::Bool(false)) => Vec::new(),
        _ => {
            if REPORTED.lock().insert(matched.to_owned()) {
                crate::log!("module"; "cannot parse module literal, using it as an id: {}", matched);
            }
            vec![literal.to_owned()]
        }
    }
}

fn non_empty(id: String) -> Option<String> {
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_owned())
}

/// Rewrite script string syntax into JSON: single-quoted strings become
/// double-quoted, trailing commas in arrays are dropped.
fn to_json(literal: &str) -> String {
    static SINGLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"'([^'"\\]*)'"#).unwrap());
    static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*\]").unwrap());

    let quoted = SINGLE_QUOTED.replace_all(literal, "\"$1\"");
    TRAILING_COMMA.replace_all(&quoted, "]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_id() {
        assert_eq!(parse_module_literal("m", "'app/main'"), vec!["app/main"]);
        assert_eq!(parse_module_literal("m", r#""app/main""#), vec!["app/main"]);
    }

    #[test]
    fn test_array() {
        assert_eq!(
            parse_module_literal("m", r#"[ 'a', "b/c", ]"#),
            vec!["a", "b/c"]
        );
        assert_eq!(parse_module_literal("m", "[]"), Vec::<String>::new());
    }

    #[test]
    fn test_empty_values() {
        assert!(parse_module_literal("m", "''").is_empty());
        assert!(parse_module_literal("m", "null").is_empty());
        assert!(parse_module_literal("m", "   ").is_empty());
    }

    #[test]
    fn test_malformed_falls_back_to_raw_literal() {
        assert_eq!(parse_module_literal("require(entry)", " entry "), vec!["entry"]);
        assert_eq!(
            parse_module_literal("require(['a' + x])", "['a' + x]"),
            vec!["['a' + x]"]
        );
    }
}
