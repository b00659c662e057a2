//! Pattern-driven reference extraction for HTML and CSS text.
//!
//! This is not a parser: each [`Rule`] is a regex scanned over the raw text
//! and a [`Matcher`] that turns one matched substring into candidate
//! references. Records come out in rule order, then match order.

pub mod normalize;
mod rules;

pub use normalize::{correct_references, filter_references, strip_suffix};
pub use rules::{Matcher, Rule, RuleMerge, RuleSet};

use rustc_hash::FxHashSet;

use crate::core::{Candidate, Reference, VirtualFile};
use normalize::build_reference;

/// Extract reference records from a file with the given rules.
///
/// `module_literal` resolves [`Matcher::ModuleLiteral`] captures; it receives
/// the matched text and the captured literal.
///
/// Identical (match, raw) pairs are recorded once. The same `raw` found in
/// distinct matched substrings yields one record per substring.
pub fn walk_references<F>(file: &VirtualFile, rules: &[Rule], module_literal: F) -> Vec<Reference>
where
    F: Fn(&str, &str) -> Vec<Candidate>,
{
    let text = file.text();
    let mut references = Vec::new();
    let mut seen = FxHashSet::default();

    for rule in rules {
        for caps in rule.pattern.captures_iter(&text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let matched = whole.as_str();

            let candidates: Vec<Candidate> = match rule.matcher {
                Matcher::Quoted => rules::quoted(matched).map(Candidate::from).into_iter().collect(),
                Matcher::CssUrl => rules::css_url(matched).map(Candidate::from).into_iter().collect(),
                Matcher::Capture(group) => caps
                    .get(group)
                    .map(|m| Candidate::from(m.as_str()))
                    .into_iter()
                    .collect(),
                Matcher::ModuleLiteral(group) => caps
                    .get(group)
                    .map(|m| module_literal(matched, m.as_str()))
                    .unwrap_or_default(),
                Matcher::Custom(extract) => extract(matched, file),
            };

            for candidate in candidates {
                let Some(reference) = build_reference(candidate, matched, file) else {
                    continue;
                };
                if seen.insert((reference.matched.clone(), reference.raw.clone())) {
                    references.push(reference);
                }
            }
        }
    }

    references
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_modules(_: &str, _: &str) -> Vec<Candidate> {
        Vec::new()
    }

    fn raws(references: &[Reference]) -> Vec<(&str, &str)> {
        references
            .iter()
            .map(|r| (r.raw.as_str(), r.absolute.as_str()))
            .collect()
    }

    #[test]
    fn test_html_scan() {
        let file = VirtualFile::new(
            "/page.html",
            r#"<link href="style.css"><script src="js/app.js?v=3"></script>"#,
        );
        let references = walk_references(&file, &RuleSet::default().html, no_modules);

        assert_eq!(
            raws(&references),
            vec![("style.css", "/style.css"), ("js/app.js", "/js/app.js")]
        );
        assert_eq!(references[0].matched, r#"href="style.css""#);
    }

    #[test]
    fn test_rule_order_then_match_order() {
        let file = VirtualFile::new(
            "/css/a.css",
            r#".x { background: url(x.png) }
@import "b.css";
.y { background: url(y.png) }"#,
        );
        let references = walk_references(&file, &RuleSet::default().css, no_modules);

        assert_eq!(
            raws(&references),
            vec![
                ("b.css", "/css/b.css"),
                ("x.png", "/css/x.png"),
                ("y.png", "/css/y.png"),
            ]
        );
    }

    #[test]
    fn test_duplicates_across_distinct_matches_kept() {
        let file = VirtualFile::new(
            "/css/a.css",
            r#".a { background: url(a.png) } .b { background: url("a.png") } .c { background: url(a.png) }"#,
        );
        let references = walk_references(&file, &RuleSet::default().css, no_modules);

        let matched: Vec<_> = references.iter().map(|r| r.matched.as_str()).collect();
        assert_eq!(matched, vec!["url(a.png)", r#"url("a.png")"#]);
    }

    #[test]
    fn test_matcher_without_candidate_is_skipped() {
        // Two quoted parts: the quoted matcher yields nothing.
        let rule = Rule::parse(r#"data-pair="[^"]*" "[^"]*""#, Matcher::Quoted).unwrap();
        let file = VirtualFile::new("/page.html", r#"<i data-pair="a.png" "b.png">"#);
        assert!(walk_references(&file, &[rule], no_modules).is_empty());
    }

    #[test]
    fn test_capture_and_custom_matchers() {
        fn split_srcset(matched: &str, _file: &VirtualFile) -> Vec<Candidate> {
            let inner = matched.trim_start_matches("srcset=\"").trim_end_matches('"');
            inner
                .split(',')
                .filter_map(|part| part.split_whitespace().next())
                .map(Candidate::from)
                .collect()
        }

        let rules = vec![
            Rule::parse(r#"data-bg=(\S+\.png)"#, Matcher::Capture(1)).unwrap(),
            Rule::parse(r#"srcset="[^"]+""#, Matcher::Custom(split_srcset)).unwrap(),
        ];
        let file = VirtualFile::new(
            "/index.html",
            r#"<div data-bg=img/bg.png></div><img srcset="a.png 1x, b.png 2x">"#,
        );

        let references = walk_references(&file, &rules, no_modules);
        assert_eq!(
            raws(&references),
            vec![
                ("img/bg.png", "/img/bg.png"),
                ("a.png", "/a.png"),
                ("b.png", "/b.png"),
            ]
        );
        // Both srcset entries share one anchor.
        assert_eq!(references[1].matched, references[2].matched);
    }

    #[test]
    fn test_module_literal_matcher() {
        let rule = Rule::parse(r#"require\((\[[^\]]*\])"#, Matcher::ModuleLiteral(1)).unwrap();
        let file = VirtualFile::new("/index.html", r#"<script>require(['app/main'])</script>"#);

        let references = walk_references(&file, &[rule], |matched, literal| {
            assert_eq!(matched, "require(['app/main']");
            assert_eq!(literal, "['app/main']");
            vec![Candidate::module("app/main", "/src/app/main.js")]
        });

        assert_eq!(raws(&references), vec![("app/main", "/src/app/main.js")]);
        assert!(references[0].module);
    }
}
