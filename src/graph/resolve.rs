//! Recursive fingerprint resolution over a frozen graph.
//!
//! A fingerprint folds the content hashes of every identity reachable from a
//! root, in lexicographic identity order:
//!
//! | contributing hashes | fingerprint                         |
//! |---------------------|-------------------------------------|
//! | 0                   | empty                               |
//! | 1                   | that hash, verbatim                 |
//! | 2+                  | digest of the concatenated hashes   |
//!
//! [`Fingerprinter::resolve`] folds dependencies only. Naming a file (or a
//! reference to it) uses [`Fingerprinter::naming_fingerprint`], which folds
//! the root's own hash in as well.

use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::DependencyGraph;
use crate::core::extension_of;
use crate::error::{Error, Result};
use crate::hash;

/// Resolves recursive fingerprints against a frozen [`DependencyGraph`].
///
/// Holds a memo of naming fingerprints. The memo is only valid because the
/// graph it borrows can no longer change.
#[derive(Debug)]
pub struct Fingerprinter<'g> {
    graph: &'g DependencyGraph,
    length: usize,
    strict: bool,
    /// Extensions that are never hashed, so a missing hash is expected.
    unhashed: Vec<String>,
    cache: DashMap<String, String>,
    warned: Mutex<FxHashSet<String>>,
}

impl<'g> Fingerprinter<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            length: hash::DEFAULT_LENGTH,
            strict: false,
            unhashed: vec!["html".into(), "htm".into()],
            cache: DashMap::new(),
            warned: Mutex::new(FxHashSet::default()),
        }
    }

    /// Digest length used when several hashes are folded.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Fail on a missing dependency hash instead of skipping it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Extensions exempt from missing-hash reporting.
    pub fn with_unhashed(mut self, unhashed: Vec<String>) -> Self {
        self.unhashed = unhashed;
        self
    }

    #[inline]
    pub fn graph(&self) -> &'g DependencyGraph {
        self.graph
    }

    /// Fold the hashes of everything reachable from `id`, excluding `id`.
    pub fn resolve(&self, id: &str) -> Result<String> {
        let reachable = self.reachable(id, false);
        self.fold(id, &reachable)
    }

    /// Fold `id`'s own hash together with everything reachable from it.
    ///
    /// This is the fingerprint a file is named after. Memoized.
    pub fn naming_fingerprint(&self, id: &str) -> Result<String> {
        if let Some(cached) = self.cache.get(id) {
            return Ok(cached.clone());
        }
        let reachable = self.reachable(id, true);
        let fingerprint = self.fold(id, &reachable)?;
        self.cache.insert(id.to_owned(), fingerprint.clone());
        Ok(fingerprint)
    }

    /// Identities reachable from `root`, each once, sorted.
    ///
    /// The visited set doubles as the cycle guard: an identity is expanded
    /// at most once, so cyclic graphs terminate.
    pub fn reachable(&self, root: &str, include_root: bool) -> Vec<&'g str> {
        let graph = self.graph;
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut found: Vec<&'g str> = Vec::new();
        let mut stack: Vec<&'g str> = Vec::new();

        visited.insert(root);
        if let Some(children) = graph.dependencies(root) {
            stack.extend(children.iter().rev().map(String::as_str));
        }

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            found.push(id);
            if let Some(children) = graph.dependencies(id) {
                stack.extend(children.iter().rev().map(String::as_str));
            }
        }

        if include_root {
            // Root is the map key; borrow the graph's copy when it has one.
            let own = graph
                .hashes
                .get_key_value(root)
                .map(|(key, _)| key.as_str())
                .or_else(|| graph.dependencies.get_key_value(root).map(|(key, _)| key.as_str()));
            if let Some(own) = own {
                found.push(own);
            }
        }

        found.sort_unstable();
        found
    }

    fn fold(&self, root: &str, ids: &[&str]) -> Result<String> {
        let mut hashes = Vec::with_capacity(ids.len());
        for id in ids {
            match self.graph.hash(id) {
                Some(hash) => hashes.push(hash),
                None => self.missing(root, id)?,
            }
        }

        Ok(match hashes.as_slice() {
            [] => String::new(),
            [single] => (*single).to_owned(),
            many => hash::digest(&many.concat(), self.length),
        })
    }

    fn missing(&self, root: &str, id: &str) -> Result<()> {
        let exempt = extension_of(id).is_some_and(|ext| {
            self.unhashed.iter().any(|skip| skip.eq_ignore_ascii_case(ext))
        });
        if exempt {
            return Ok(());
        }
        if self.strict {
            return Err(Error::MissingHash {
                root: root.to_owned(),
                dependency: id.to_owned(),
            });
        }
        if self.warned.lock().insert(id.to_owned()) {
            crate::debug!("hash"; "no content hash for {} (reached from {})", id, root);
        }
        Ok(())
    }
}
