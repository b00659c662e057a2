//! `cachet.toml` sections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ConfigError;
use crate::hash;
use crate::scan::{Matcher, Rule, RuleMerge};

fn unhashed_extensions() -> Vec<String> {
    vec!["html".into(), "htm".into()]
}

// ============================================================================
// [hash]
// ============================================================================

/// Content hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashConfig {
    /// Digest length in hex characters.
    pub length: usize,
    /// Extensions never hashed. Missing hashes for them are expected.
    pub skip: Vec<String>,
    /// Fail when a reachable dependency has no hash.
    pub strict: bool,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            length: hash::DEFAULT_LENGTH,
            skip: unhashed_extensions(),
            strict: false,
        }
    }
}

impl HashConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(hash::MIN_LENGTH..=hash::MAX_LENGTH).contains(&self.length) {
            return Err(ConfigError::Validation(format!(
                "hash.length must be between {} and {}, got {}",
                hash::MIN_LENGTH,
                hash::MAX_LENGTH,
                self.length
            )));
        }
        Ok(())
    }
}

// ============================================================================
// [rename]
// ============================================================================

/// File renaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Extensions whose file name never changes.
    pub skip: Vec<String>,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            skip: unhashed_extensions(),
        }
    }
}

// ============================================================================
// [rules]
// ============================================================================

/// Caller extraction rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub merge: RuleMerge,
    pub html: Vec<RuleEntry>,
    pub css: Vec<RuleEntry>,
}

impl RulesConfig {
    /// Compile `html` and `css` entries.
    pub fn compile(&self) -> Result<(Vec<Rule>, Vec<Rule>), ConfigError> {
        let compile_all = |section: &str, entries: &[RuleEntry]| {
            entries
                .iter()
                .enumerate()
                .map(|(i, entry)| entry.compile(&format!("rules.{section}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok((compile_all("html", &self.html)?, compile_all("css", &self.css)?))
    }
}

/// One rule: a case-insensitive pattern and how to extract from its match.
///
/// `extract` is one of `quoted`, `url`, `capture N` or `module N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub pattern: String,
    #[serde(default = "default_extract")]
    pub extract: String,
}

fn default_extract() -> String {
    "quoted".into()
}

impl RuleEntry {
    fn compile(&self, field: &str) -> Result<Rule, ConfigError> {
        if self.pattern.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{field}.pattern is empty")));
        }
        let matcher = self.matcher(field)?;
        Rule::parse(&self.pattern, matcher).map_err(|e| {
            ConfigError::Validation(format!("{field}.pattern `{}` is invalid: {e}", self.pattern))
        })
    }

    fn matcher(&self, field: &str) -> Result<Matcher, ConfigError> {
        let mut parts = self.extract.split_whitespace();
        let kind = parts.next().unwrap_or_default();
        let group = match parts.next() {
            Some(n) => n.parse::<usize>().map_err(|_| {
                ConfigError::Validation(format!("{field}.extract: `{n}` is not a group number"))
            })?,
            None => 1,
        };
        if parts.next().is_some() {
            return Err(ConfigError::Validation(format!(
                "{field}.extract: unexpected `{}`",
                self.extract
            )));
        }

        match kind {
            "quoted" => Ok(Matcher::Quoted),
            "url" => Ok(Matcher::CssUrl),
            "capture" => Ok(Matcher::Capture(group)),
            "module" => Ok(Matcher::ModuleLiteral(group)),
            other => Err(ConfigError::Validation(format!(
                "{field}.extract: unknown extractor `{other}` (expected quoted, url, capture N or module N)"
            ))),
        }
    }
}

// ============================================================================
// [references]
// ============================================================================

/// Reference correction and filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencesConfig {
    /// Template tokens; a reference whose identity still contains one after
    /// correction is dropped.
    pub placeholders: Vec<String>,
    /// Leading text rewritten before a reference is resolved.
    pub prefixes: BTreeMap<String, String>,
}

// ============================================================================
// [modules]
// ============================================================================

/// AMD module analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    pub enable: bool,
    /// Extensions analyzed as modules.
    pub extensions: Vec<String>,
    /// Module root, relative to the input directory.
    pub base_url: String,
    /// Id prefix to path prefix, relative to `base_url`.
    pub paths: BTreeMap<String, String>,
    /// Input page whose inline `require.config` supplies `baseUrl` and
    /// `paths`. Values set in this section take precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_page: Option<String>,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            enable: false,
            extensions: vec!["js".into()],
            base_url: String::new(),
            paths: BTreeMap::new(),
            config_page: None,
        }
    }
}

impl ModulesConfig {
    /// `base_url` as an identity: `src/` → `/src`, empty → root.
    pub fn base_identity(&self) -> String {
        let trimmed = self.base_url.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}
