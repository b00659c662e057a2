//! Per-file stages.
//!
//! An [`Engine`] bundles the extraction rules, the caller policy and the
//! optional module collaborator, and exposes the three stages every file
//! goes through:
//!
//! ```text
//! analyze_hash ──► analyze_dependencies ──► [freeze] ──► replace_dependencies
//!   (phase 1)          (phase 1)                           (phase 2)
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use std::borrow::Cow;
use std::sync::Arc;

use crate::core::{AssetKind, Candidate, Reference, VirtualFile};
use crate::error::Result;
use crate::graph::{DependencyGraph, Fingerprinter, GraphBuilder};
use crate::hash;
use crate::module::{self, ModuleAnalyzer, Substitution, amd::PatternAnalyzer};
use crate::policy::Policy;
use crate::rename::rename_file;
use crate::rewrite::rewrite_references;
use crate::scan::{RuleSet, correct_references, filter_references, walk_references};

/// Stage runner shared by every worker of a pipeline.
pub struct Engine<P: Policy, A: ModuleAnalyzer = PatternAnalyzer> {
    rules: RuleSet,
    policy: P,
    analyzer: Option<A>,
    module_extensions: Vec<String>,
    hash_length: usize,
    /// Extensions never hashed.
    skip_hash: Vec<String>,
    strict: bool,
}

impl<P: Policy> Engine<P, PatternAnalyzer> {
    /// Engine with built-in rules and no module support.
    pub fn new(policy: P) -> Self {
        Self {
            rules: RuleSet::default(),
            policy,
            analyzer: None,
            module_extensions: vec!["js".into()],
            hash_length: hash::DEFAULT_LENGTH,
            skip_hash: vec!["html".into(), "htm".into()],
            strict: false,
        }
    }
}

impl<P: Policy, A: ModuleAnalyzer> Engine<P, A> {
    /// Enable module analysis with `analyzer`.
    pub fn with_analyzer<B: ModuleAnalyzer>(self, analyzer: B) -> Engine<P, B> {
        Engine {
            rules: self.rules,
            policy: self.policy,
            analyzer: Some(analyzer),
            module_extensions: self.module_extensions,
            hash_length: self.hash_length,
            skip_hash: self.skip_hash,
            strict: self.strict,
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_module_extensions(mut self, extensions: Vec<String>) -> Self {
        self.module_extensions = extensions;
        self
    }

    pub fn with_hash_length(mut self, length: usize) -> Self {
        self.hash_length = length;
        self
    }

    pub fn with_skip_hash(mut self, extensions: Vec<String>) -> Self {
        self.skip_hash = extensions;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[inline]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    #[inline]
    pub fn analyzer(&self) -> Option<&A> {
        self.analyzer.as_ref()
    }

    /// How `file`'s references are discovered. Module files are plain
    /// assets when no collaborator is configured.
    pub fn kind(&self, file: &VirtualFile) -> AssetKind {
        match AssetKind::from_extension(file.extension(), &self.module_extensions) {
            AssetKind::Module if self.analyzer.is_none() => AssetKind::Other,
            kind => kind,
        }
    }

    /// A fingerprint resolver over `graph` configured like this engine.
    pub fn fingerprinter<'g>(&self, graph: &'g DependencyGraph) -> Fingerprinter<'g> {
        Fingerprinter::new(graph)
            .with_length(self.hash_length)
            .strict(self.strict)
            .with_unhashed(self.skip_hash.clone())
    }

    // ========================================================================
    // Phase 1
    // ========================================================================

    /// Record `file`'s content hash unless one is already recorded.
    ///
    /// Returns whether a hash was inserted.
    pub fn analyze_hash(&self, file: &VirtualFile, builder: &GraphBuilder) -> bool {
        if self.skips_hash(&file.path) || builder.has_hash(&file.path) {
            return false;
        }
        builder.insert_hash(file.path.as_str(), hash::digest(&file.contents, self.hash_length))
    }

    /// Extract `file`'s references and record their identities.
    ///
    /// Returns the corrected and filtered records.
    pub fn analyze_dependencies(&self, file: &VirtualFile, builder: &GraphBuilder) -> Result<Vec<Reference>> {
        if !self.kind(file).is_scannable() {
            return Ok(Vec::new());
        }

        let references = self.extract(file)?;
        let mut seen = FxHashSet::default();
        let dependencies = references
            .iter()
            .filter(|r| seen.insert(r.absolute.as_str()))
            .map(|r| r.absolute.clone())
            .collect();
        builder.insert_dependencies(file.path.as_str(), dependencies);
        Ok(references)
    }

    /// Extract, correct and filter `file`'s references.
    pub fn extract(&self, file: &VirtualFile) -> Result<Vec<Reference>> {
        let mut references = match self.kind(file) {
            AssetKind::Html => self.scan(file, &self.rules.html),
            AssetKind::Css => self.scan(file, &self.rules.css),
            AssetKind::Module => match &self.analyzer {
                Some(analyzer) => {
                    let config = analyzer.config(&file.path);
                    let parsed = analyzer.parse(&file.path, &file.text(), &config)?;
                    module::module_references(analyzer, &parsed, &config)
                }
                None => Vec::new(),
            },
            AssetKind::Other => Vec::new(),
        };

        correct_references(file, &mut references, &self.policy);
        filter_references(file, &mut references, &self.policy);
        Ok(references)
    }

    fn scan(&self, file: &VirtualFile, rules: &[crate::scan::Rule]) -> Vec<Reference> {
        walk_references(file, rules, |matched, literal| {
            self.parse_module_literal(&file.path, matched, literal)
        })
    }

    // ========================================================================
    // Phase 2
    // ========================================================================

    /// Rename `file` and rewrite its references to fingerprinted names.
    ///
    /// References are extracted from the text as scanned in phase 1; the
    /// policy's `custom_replace` then runs, and the rewrite applies to its
    /// output. Returns the new identity when the file was renamed.
    pub fn replace_dependencies(
        &self,
        file: &mut VirtualFile,
        fingerprinter: &Fingerprinter<'_>,
    ) -> Result<Option<String>> {
        let kind = self.kind(file);
        // References resolve against the identity the file was scanned under.
        let references = if kind.is_scannable() {
            self.extract(file)?
        } else {
            Vec::new()
        };

        let replaced = self.policy.custom_replace(file, &file.text());
        if let Some(text) = replaced {
            file.set_text(&text);
        }

        let fingerprints = self.fingerprints(&references, fingerprinter)?;
        let rename = |reference: &Reference| {
            let fingerprint = fingerprints.get(&reference.absolute).map_or("", String::as_str);
            self.policy.rename_dependency(reference, fingerprint)
        };

        let original = file.path.clone();
        let renamed = rename_file(file, fingerprinter, &self.policy)?;

        if references.is_empty() {
            return Ok(renamed);
        }

        match (kind, &self.analyzer) {
            (AssetKind::Module, Some(analyzer)) => {
                // The same raw id can name different files from different
                // modules of one bundle.
                let mut replacements: FxHashMap<String, FxHashMap<String, String>> = FxHashMap::default();
                for reference in &references {
                    if let Some(replacement) = rename(reference) {
                        replacements
                            .entry(reference.raw.clone())
                            .or_default()
                            .insert(reference.absolute.clone(), replacement);
                    }
                }
                if replacements.is_empty() {
                    return Ok(renamed);
                }

                let config = analyzer.config(&original);
                let mut parsed = analyzer.parse(&original, &file.text(), &config)?;
                let hook: Substitution = Arc::new(move |raw: &str, absolute: &str| {
                    replacements.get(raw)?.get(absolute).cloned()
                });
                let text = module::substitute_modules(analyzer, &mut parsed, &config, hook)?;
                file.set_text(&text);
            }
            _ => {
                let rewritten = match rewrite_references(&file.text(), &references, rename)? {
                    Cow::Borrowed(_) => None,
                    Cow::Owned(text) => Some(text),
                };
                if let Some(text) = rewritten {
                    file.set_text(&text);
                }
            }
        }

        Ok(renamed)
    }

    /// Naming fingerprint of every referenced identity.
    fn fingerprints(
        &self,
        references: &[Reference],
        fingerprinter: &Fingerprinter<'_>,
    ) -> Result<FxHashMap<String, String>> {
        let mut fingerprints = FxHashMap::default();
        for reference in references {
            if !fingerprints.contains_key(&reference.absolute) {
                let fingerprint = fingerprinter.naming_fingerprint(&reference.absolute)?;
                fingerprints.insert(reference.absolute.clone(), fingerprint);
            }
        }
        Ok(fingerprints)
    }

    // ========================================================================
    // Module helpers
    // ========================================================================

    /// Resolve a module literal written in markup into module candidates.
    ///
    /// Ids that map to no file are dropped.
    pub fn parse_module_literal(&self, path: &str, matched: &str, literal: &str) -> Vec<Candidate> {
        let Some(analyzer) = &self.analyzer else {
            return Vec::new();
        };
        let config = analyzer.config(path);
        module::parse_module_literal(matched, literal)
            .into_iter()
            .filter_map(|id| {
                let path = analyzer.id_to_path(&id, &config)?;
                Some(Candidate::module(id, path))
            })
            .collect()
    }

    /// Module id of the file at `path`.
    pub fn path_to_module_id(&self, path: &str) -> Option<String> {
        let analyzer = self.analyzer.as_ref()?;
        analyzer.path_to_id(path, &analyzer.config(path))
    }

    fn skips_hash(&self, path: &str) -> bool {
        crate::core::extension_of(path)
            .is_some_and(|ext| self.skip_hash.iter().any(|skip| skip.eq_ignore_ascii_case(ext)))
    }
}
