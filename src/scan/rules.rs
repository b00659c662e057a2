//! Extraction rules and the built-in HTML/CSS rule sets.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

use crate::core::{Candidate, VirtualFile};

/// Maps one matched substring to candidate references.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Text between the only pair of quotes in the match.
    /// Matches with zero or several quoted parts yield nothing.
    Quoted,
    /// Contents of `url(...)`, quoted or bare.
    CssUrl,
    /// The given capture group of the rule's pattern.
    Capture(usize),
    /// The given capture group, parsed as a module literal (`'id'` or
    /// `['a', 'b']`) and resolved through the module collaborator.
    ModuleLiteral(usize),
    /// Caller function over (matched text, containing file).
    Custom(fn(&str, &VirtualFile) -> Vec<Candidate>),
}

/// A search pattern paired with a matcher.
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: Regex,
    pub matcher: Matcher,
}

impl Rule {
    pub fn new(pattern: Regex, matcher: Matcher) -> Self {
        Self { pattern, matcher }
    }

    /// Compile a case-insensitive rule from pattern text.
    pub fn parse(pattern: &str, matcher: Matcher) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { pattern, matcher })
    }
}

/// Where caller rules go relative to the built-in ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleMerge {
    /// Caller rules run first.
    #[default]
    Prepend,
    /// Built-in rules run first.
    Append,
}

/// Ordered rule lists for markup and stylesheets.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub html: Vec<Rule>,
    pub css: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            html: HTML_RULES.clone(),
            css: CSS_RULES.clone(),
        }
    }
}

impl RuleSet {
    /// Merge caller rules with the built-ins. Order within each list is kept.
    pub fn with_custom(html: Vec<Rule>, css: Vec<Rule>, merge: RuleMerge) -> Self {
        let combine = |custom: Vec<Rule>, builtin: &[Rule]| match merge {
            RuleMerge::Prepend => custom.into_iter().chain(builtin.iter().cloned()).collect(),
            RuleMerge::Append => builtin.iter().cloned().chain(custom).collect(),
        };
        Self {
            html: combine(html, &HTML_RULES),
            css: combine(css, &CSS_RULES),
        }
    }
}

fn builtin(pattern: &str, matcher: Matcher) -> Rule {
    Rule::parse(pattern, matcher).unwrap()
}

/// `href` to stylesheets, `src` to scripts and images.
static HTML_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        builtin(
            r#"href=['"][^'"]+\.(?:css|less|styl)(?:\?[^'"]*)?['"]"#,
            Matcher::Quoted,
        ),
        builtin(
            r#"src=['"][^'"]+\.(?:js|jpg|jpeg|png|gif|ico|cur|svg|webp)(?:\?[^'"]*)?['"]"#,
            Matcher::Quoted,
        ),
    ]
});

/// `@import "..."` and `url(...)`.
static CSS_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        builtin(r#"@import\s+['"][^'")]+['"]"#, Matcher::Quoted),
        builtin(r#"url\(\s*['"]?[^'")]+['"]?\s*\)"#, Matcher::CssUrl),
    ]
});

/// Text between the only pair of quotes.
pub(crate) fn quoted(matched: &str) -> Option<&str> {
    let mut parts = matched.split(['\'', '"']);
    let (_, inner, _) = (parts.next()?, parts.next()?, parts.next()?);
    parts.next().is_none().then_some(inner)
}

/// Contents of `url(...)`, with quotes and surrounding blanks removed.
pub(crate) fn css_url(matched: &str) -> Option<&str> {
    if let Some(inner) = quoted(matched) {
        return Some(inner);
    }
    let start = matched.find('(')? + 1;
    let end = matched.rfind(')')?;
    let inner = matched.get(start..end)?.trim();
    (!inner.is_empty()).then_some(inner)
}
