//! Module dependency extraction.
//!
//! Parsing module syntax is delegated to a [`ModuleAnalyzer`]. This module
//! flattens each module's declared and lazily required ids into reference
//! records, and drives id substitution through the analyzer when a file is
//! rewritten.

pub mod amd;
mod id;
mod literal;
pub mod require;

pub use id::{is_builtin, resolve_relative_id};
pub use literal::parse_module_literal;
pub use require::{RequireConfig, read_require_config};

use parking_lot::ReentrantMutexGuard;
use rustc_hash::FxHashSet;
use std::sync::Arc;

use crate::core::Reference;
use crate::error::Result;
use crate::scan::strip_suffix;

/// Substitution callback: `(raw id, absolute path) -> replacement id`.
pub type Substitution = Arc<dyn Fn(&str, &str) -> Option<String> + Send + Sync>;

/// One module defined in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Module id (`common/main`).
    pub id: String,
    /// Declared synchronous dependency ids, as written.
    pub dependencies: Vec<String>,
    /// Factory body text.
    pub factory: String,
}

/// External module-analysis collaborator.
pub trait ModuleAnalyzer: Send + Sync {
    /// Resolution configuration for one file path.
    type Config: Send + Sync;
    /// Parsed file, owned by the analyzer's representation.
    type Parsed;

    /// Build the resolution configuration for `path`.
    fn config(&self, path: &str) -> Self::Config;

    /// Parse a file's source into module descriptors.
    fn parse(&self, path: &str, source: &str, config: &Self::Config) -> Result<Self::Parsed>;

    /// Modules of a parsed file.
    fn modules<'p>(&self, parsed: &'p Self::Parsed) -> &'p [ModuleInfo];

    /// Ids referenced by string literal inside a factory body.
    fn async_references(&self, factory: &str) -> Vec<String>;

    /// Resolve `raw` relative to the module `from`.
    fn resolve_id(&self, raw: &str, from: &str) -> String {
        resolve_relative_id(raw, from)
    }

    /// Map a resolved id to a file identity; `None` when it maps to no file.
    fn id_to_path(&self, id: &str, config: &Self::Config) -> Option<String>;

    /// Map a file identity back to a module id.
    fn path_to_id(&self, path: &str, config: &Self::Config) -> Option<String>;

    /// Loader keywords with no file identity.
    fn is_builtin(&self, id: &str) -> bool {
        is_builtin(id)
    }

    /// Hold the substitution slot for one install, regenerate and restore
    /// sequence. Other threads wait; the owning thread may re-enter.
    fn substitution_session(&self) -> ReentrantMutexGuard<'_, ()>;

    /// Install a substitution callback, returning the one it replaces.
    fn replace_substitution(&self, substitution: Option<Substitution>) -> Option<Substitution>;

    /// Regenerate source text, passing every dependency id through the
    /// installed substitution callback.
    fn regenerate(&self, parsed: &mut Self::Parsed, config: &Self::Config) -> Result<String>;
}

/// Collect reference records for every module of a parsed file.
///
/// Declared dependencies come first, then lazy references, per module.
/// Built-in ids and ids that map to no file are dropped.
pub fn module_references<A>(analyzer: &A, parsed: &A::Parsed, config: &A::Config) -> Vec<Reference>
where
    A: ModuleAnalyzer + ?Sized,
{
    let mut references = Vec::new();
    let mut seen = FxHashSet::default();

    for module in analyzer.modules(parsed) {
        let lazy = analyzer.async_references(&module.factory);
        for raw in module.dependencies.iter().chain(lazy.iter()) {
            if analyzer.is_builtin(raw) {
                continue;
            }
            let resolved = analyzer.resolve_id(raw, &module.id);
            let Some(path) = analyzer.id_to_path(&resolved, config) else {
                continue;
            };
            let absolute = strip_suffix(&path);
            if absolute.is_empty() || !seen.insert((raw.clone(), absolute.to_owned())) {
                continue;
            }

            let mut reference = Reference::new(raw.as_str(), absolute, raw.as_str());
            reference.module = true;
            references.push(reference);
        }
    }

    references
}

/// Installs a substitution callback for its lifetime and restores the
/// previously installed one on drop.
///
/// The analyzer's substitution session is held until after the restore, so
/// a callback installed by one thread is never seen by another.
pub struct SubstitutionGuard<'a, A: ModuleAnalyzer + ?Sized> {
    analyzer: &'a A,
    previous: Option<Substitution>,
    _session: ReentrantMutexGuard<'a, ()>,
}

impl<'a, A: ModuleAnalyzer + ?Sized> SubstitutionGuard<'a, A> {
    pub fn install(analyzer: &'a A, substitution: Substitution) -> Self {
        let session = analyzer.substitution_session();
        let previous = analyzer.replace_substitution(Some(substitution));
        Self {
            analyzer,
            previous,
            _session: session,
        }
    }
}

impl<A: ModuleAnalyzer + ?Sized> Drop for SubstitutionGuard<'_, A> {
    // Fields drop after this body, so the session outlives the restore.
    fn drop(&mut self) {
        self.analyzer.replace_substitution(self.previous.take());
    }
}

/// Regenerate a parsed file with `substitution` installed.
pub fn substitute_modules<A>(
    analyzer: &A,
    parsed: &mut A::Parsed,
    config: &A::Config,
    substitution: Substitution,
) -> Result<String>
where
    A: ModuleAnalyzer + ?Sized,
{
    let _guard = SubstitutionGuard::install(analyzer, substitution);
    analyzer.regenerate(parsed, config)
}
