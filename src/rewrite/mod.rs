//! Reference rewriting.
//!
//! References are grouped by their matched substring. Each distinct match is
//! searched once in the text, and every occurrence is rewritten as one
//! region: all `raw` strings of the group are replaced in a single pass over
//! that region. Two references anchored in the same substring never go
//! through two independent full-text passes.

use regex::{Captures, Regex};
use rustc_hash::FxHashMap;
use std::borrow::Cow;

use crate::core::Reference;
use crate::error::{Error, Result};

/// Build a regex that matches `literal` verbatim.
pub fn literal_pattern(literal: &str) -> Result<Regex> {
    Regex::new(&regex::escape(literal)).map_err(|source| Error::Pattern {
        pattern: literal.to_owned(),
        source,
    })
}

/// Rewrite `text`, replacing each reference's `raw` inside its matched
/// substring with `rename(reference)`.
///
/// References for which `rename` yields `None` are left as written. Returns
/// `Cow::Borrowed` when nothing changed.
pub fn rewrite_references<'t, F>(
    text: &'t str,
    references: &[Reference],
    mut rename: F,
) -> Result<Cow<'t, str>>
where
    F: FnMut(&Reference) -> Option<String>,
{
    let mut output: Cow<'t, str> = Cow::Borrowed(text);

    for (matched, group) in group_by_match(references) {
        let mut replacements: FxHashMap<&str, String> = FxHashMap::default();
        for reference in group {
            if replacements.contains_key(reference.raw.as_str()) {
                continue;
            }
            if let Some(replacement) = rename(reference) {
                replacements.insert(&reference.raw, replacement);
            }
        }
        let Some(inner) = region_pattern(&replacements)? else {
            continue;
        };

        let anchor = literal_pattern(matched)?;
        let rewritten = anchor.replace_all(&output, |caps: &Captures<'_>| {
            inner
                .replace_all(&caps[0], |raw: &Captures<'_>| {
                    replacements
                        .get(&raw[0])
                        .cloned()
                        .unwrap_or_else(|| raw[0].to_owned())
                })
                .into_owned()
        });

        if let Cow::Owned(changed) = rewritten
            && changed != *output
        {
            output = Cow::Owned(changed);
        }
    }

    Ok(output)
}

/// One alternation over every raw string of a group, longest first, so a
/// raw that is a substring of another never claims part of it.
fn region_pattern(replacements: &FxHashMap<&str, String>) -> Result<Option<Regex>> {
    if replacements.is_empty() {
        return Ok(None);
    }
    let mut raws: Vec<&str> = replacements.keys().copied().collect();
    raws.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternation = raws
        .iter()
        .map(|raw| regex::escape(raw))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation)
        .map(Some)
        .map_err(|source| Error::Pattern {
            pattern: alternation,
            source,
        })
}

/// Group references by matched substring, in order of first appearance.
fn group_by_match(references: &[Reference]) -> Vec<(&str, Vec<&Reference>)> {
    let mut groups: Vec<(&str, Vec<&Reference>)> = Vec::new();
    for reference in references {
        match groups.iter_mut().find(|(matched, _)| *matched == reference.matched) {
            Some((_, group)) => group.push(reference),
            None => groups.push((&reference.matched, vec![reference])),
        }
    }
    groups
}
