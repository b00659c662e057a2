//! Pattern-based AMD module analysis.
//!
//! Recognizes `define([id,] [deps,] factory)` headers and `require(...)` calls
//! inside factory bodies. Every dependency id literal is recorded with its
//! byte span, so regeneration splices replacements into the original text
//! and leaves everything else untouched.

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use path_clean::PathClean;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use super::{ModuleAnalyzer, ModuleInfo, RequireConfig, Substitution};
use crate::core::is_external_reference;
use crate::error::{Error, Result};
use crate::scan::normalize::resolve_absolute;
use crate::scan::strip_suffix;

/// `define(` header with optional id and dependency array.
static DEFINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bdefine\s*\(\s*(?:['"]([^'"]+)['"]\s*,\s*)?(?:\[([^\]]*)\]\s*,\s*)?"#).unwrap()
});

/// `require('id')` or `require(['a', 'b'], ...)`.
static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\s*\(\s*(?:\[([^\]]*)\]|['"]([^'"]+)['"])"#).unwrap()
});

/// Quoted literal inside a dependency array.
static LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"['"]([^'"]*)['"]"#).unwrap());

// ============================================================================
// Configuration
// ============================================================================

/// Module resolution configuration: `baseUrl` plus `paths` prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmdConfig {
    /// Identity of the module root directory (`/src`).
    pub base_url: String,
    /// Id prefix to identity prefix (without extension).
    pub paths: BTreeMap<String, String>,
}

impl AmdConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            paths: BTreeMap::new(),
        }
    }

    pub fn with_path(mut self, prefix: impl Into<String>, target: impl Into<String>) -> Self {
        self.paths.insert(prefix.into(), target.into());
        self
    }

    /// Layer a `require.config` read from the page at `page_directory`.
    ///
    /// `baseUrl` resolves against the page's directory; `paths` entries
    /// replace existing ones with the same prefix.
    pub fn with_require_config(mut self, config: &RequireConfig, page_directory: &str) -> Self {
        if let Some(base_url) = config.base_url.as_deref() {
            if is_external_reference(base_url) {
                crate::debug!("module"; "ignoring remote baseUrl {}", base_url);
            } else {
                let base = resolve_absolute(page_directory, base_url.trim_end_matches('/'));
                self.base_url = base.trim_end_matches('/').to_owned();
            }
        }
        for (prefix, target) in &config.paths {
            if let Some(target) = target.local() {
                self.paths.insert(prefix.clone(), target.to_owned());
            }
        }
        self
    }

    /// Longest `paths` entry that is `id` or a `/`-bounded prefix of it.
    fn matching_path<'a>(&'a self, id: &'a str) -> Option<(&'a str, &'a str)> {
        self.paths
            .iter()
            .filter(|(prefix, _)| {
                id == prefix.as_str()
                    || id
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(prefix, target)| (prefix.as_str(), target.as_str()))
    }

    fn join_base(&self, id: &str) -> String {
        if id.starts_with('/') {
            id.to_owned()
        } else {
            let joined = format!("{}/{id}", self.base_url);
            Path::new(&joined).clean().to_string_lossy().into_owned()
        }
    }
}

// ============================================================================
// Parsed representation
// ============================================================================

/// A dependency id literal in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Literal {
    /// Byte range of the id between its quotes.
    start: usize,
    end: usize,
    /// Id of the module whose header or factory contains the literal.
    module: String,
}

/// One parsed AMD file.
#[derive(Debug, Clone)]
pub struct AmdFile {
    source: String,
    modules: Vec<ModuleInfo>,
    literals: Vec<Literal>,
}

impl AmdFile {
    pub fn source(&self) -> &str {
        &self.source
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// AMD collaborator driven by regular expressions.
pub struct PatternAnalyzer {
    config: AmdConfig,
    substitution: Mutex<Option<Substitution>>,
    session: ReentrantMutex<()>,
}

impl PatternAnalyzer {
    pub fn new(config: AmdConfig) -> Self {
        Self {
            config,
            substitution: Mutex::new(None),
            session: ReentrantMutex::new(()),
        }
    }

    pub fn amd_config(&self) -> &AmdConfig {
        &self.config
    }

    /// Map a resolved id to an identity, ignoring plugin prefixes.
    fn resource_path(&self, id: &str, config: &AmdConfig) -> Option<String> {
        if id.is_empty() || id.contains("://") || id.starts_with("//") {
            return None;
        }

        // Plugin resources name a file with its own extension.
        if let Some((_, resource)) = id.split_once('!') {
            return (!resource.is_empty()).then(|| config.join_base(resource));
        }

        let path = match config.matching_path(id) {
            Some((prefix, target)) => format!("{target}{}", &id[prefix.len()..]),
            None => id.to_owned(),
        };
        // Ids mapped to a remote location have no local file.
        if is_external_reference(&path) {
            return None;
        }
        let mut path = config.join_base(&path);
        if !path.ends_with(".js") {
            path.push_str(".js");
        }
        Some(path)
    }

    /// Collect quoted literals of an array body at `offset` in the source.
    fn array_literals(body: &str, offset: usize, module: &str, out: &mut Vec<Literal>) -> Vec<String> {
        LITERAL
            .captures_iter(body)
            .filter_map(|caps| caps.get(1))
            .map(|id| {
                out.push(Literal {
                    start: offset + id.start(),
                    end: offset + id.end(),
                    module: module.to_owned(),
                });
                id.as_str().to_owned()
            })
            .collect()
    }
}

impl ModuleAnalyzer for PatternAnalyzer {
    type Config = AmdConfig;
    type Parsed = AmdFile;

    fn config(&self, _path: &str) -> AmdConfig {
        self.config.clone()
    }

    fn parse(&self, path: &str, source: &str, config: &AmdConfig) -> Result<AmdFile> {
        let headers: Vec<_> = DEFINE.captures_iter(source).collect();
        let mut modules = Vec::with_capacity(headers.len());
        let mut literals = Vec::new();

        for (index, caps) in headers.iter().enumerate() {
            let header = caps.get(0).map_or(0..0, |m| m.range());
            let factory_end = headers
                .get(index + 1)
                .and_then(|next| next.get(0))
                .map_or(source.len(), |m| m.start());
            let factory = &source[header.end..factory_end];

            // A dependency array or id that failed to close leaves its opener here.
            if factory.is_empty() || factory.starts_with(['[', '\'', '"', ')']) {
                return Err(Error::Module(format!(
                    "malformed define() at byte {} in `{path}`",
                    header.start
                )));
            }

            // The module's own id literal is never substituted.
            let id = match caps.get(1) {
                Some(id) => id.as_str().to_owned(),
                None => self
                    .path_to_id(path, config)
                    .unwrap_or_else(|| path.trim_start_matches('/').trim_end_matches(".js").to_owned()),
            };

            let dependencies = caps
                .get(2)
                .map(|deps| Self::array_literals(deps.as_str(), deps.start(), &id, &mut literals))
                .unwrap_or_default();

            for call in REQUIRE.captures_iter(factory) {
                let offset = header.end;
                if let Some(array) = call.get(1) {
                    Self::array_literals(array.as_str(), offset + array.start(), &id, &mut literals);
                } else if let Some(single) = call.get(2) {
                    literals.push(Literal {
                        start: offset + single.start(),
                        end: offset + single.end(),
                        module: id.clone(),
                    });
                }
            }

            modules.push(ModuleInfo {
                id,
                dependencies,
                factory: factory.to_owned(),
            });
        }

        Ok(AmdFile {
            source: source.to_owned(),
            modules,
            literals,
        })
    }

    fn modules<'p>(&self, parsed: &'p AmdFile) -> &'p [ModuleInfo] {
        &parsed.modules
    }

    fn async_references(&self, factory: &str) -> Vec<String> {
        let mut ids = Vec::new();
        for call in REQUIRE.captures_iter(factory) {
            if let Some(array) = call.get(1) {
                ids.extend(
                    LITERAL
                        .captures_iter(array.as_str())
                        .filter_map(|caps| caps.get(1))
                        .map(|id| id.as_str().to_owned()),
                );
            } else if let Some(single) = call.get(2) {
                ids.push(single.as_str().to_owned());
            }
        }
        ids
    }

    fn id_to_path(&self, id: &str, config: &AmdConfig) -> Option<String> {
        self.resource_path(id, config)
    }

    fn path_to_id(&self, path: &str, config: &AmdConfig) -> Option<String> {
        let stem = path.strip_suffix(".js")?;

        // Prefer the most specific `paths` mapping.
        let mapped = config
            .paths
            .iter()
            .filter_map(|(prefix, target)| {
                let target = config.join_base(target);
                let rest = stem.strip_prefix(target.as_str())?;
                (rest.is_empty() || rest.starts_with('/')).then(|| (target.len(), format!("{prefix}{rest}")))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, id)| id);
        if mapped.is_some() {
            return mapped;
        }

        let rest = stem.strip_prefix(config.base_url.as_str())?;
        let id = rest.strip_prefix('/')?;
        (!id.is_empty()).then(|| id.to_owned())
    }

    fn substitution_session(&self) -> ReentrantMutexGuard<'_, ()> {
        self.session.lock()
    }

    fn replace_substitution(&self, substitution: Option<Substitution>) -> Option<Substitution> {
        std::mem::replace(&mut *self.substitution.lock(), substitution)
    }

    fn regenerate(&self, parsed: &mut AmdFile, config: &AmdConfig) -> Result<String> {
        let Some(substitution) = self.substitution.lock().clone() else {
            return Ok(parsed.source.clone());
        };

        let mut literals = parsed.literals.clone();
        literals.sort_by_key(|literal| literal.start);

        let source = &parsed.source;
        let mut output = String::with_capacity(source.len());
        let mut last = 0;
        for literal in &literals {
            let raw = &source[literal.start..literal.end];
            if self.is_builtin(raw) {
                continue;
            }
            let resolved = self.resolve_id(raw, &literal.module);
            let Some(path) = self.id_to_path(&resolved, config) else {
                continue;
            };
            if let Some(replacement) = substitution(raw, strip_suffix(&path)) {
                output.push_str(&source[last..literal.start]);
                output.push_str(&replacement);
                last = literal.end;
            }
        }
        output.push_str(&source[last..]);

        parsed.source.clone_from(&output);
        Ok(output)
    }
}
