//! Dependency graph store for one build run.
//!
//! Two-phase protocol:
//! - `GraphBuilder`: populate phase. Concurrent, append-only inserts of
//!   content hashes and dependency lists; first write per key wins.
//! - `DependencyGraph`: read-only phase. Produced by [`GraphBuilder::freeze`],
//!   which consumes the builder, so no insert can race a fingerprint read.
//!
//! Fingerprints are only computed against a frozen graph (see [`resolve`]).

pub mod resolve;

pub use resolve::Fingerprinter;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// Populate Phase
// =============================================================================

/// Concurrent, append-only graph store used while files are scanned and hashed.
///
/// Keys are file identities. Workers insert under distinct keys, so the
/// sharded maps never see cross-file contention on one entry.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    hashes: DashMap<String, String>,
    dependencies: DashMap<String, Vec<String>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file's content hash. Returns `false` if one was already recorded.
    pub fn insert_hash(&self, id: impl Into<String>, hash: impl Into<String>) -> bool {
        match self.hashes.entry(id.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(hash.into());
                true
            }
        }
    }

    /// Record a file's direct dependencies. Returns `false` if a list was
    /// already recorded.
    pub fn insert_dependencies(&self, id: impl Into<String>, dependencies: Vec<String>) -> bool {
        match self.dependencies.entry(id.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(dependencies);
                true
            }
        }
    }

    /// Whether a content hash is recorded for `id`.
    #[inline]
    pub fn has_hash(&self, id: &str) -> bool {
        self.hashes.contains_key(id)
    }

    /// End the populate phase.
    pub fn freeze(self) -> DependencyGraph {
        let graph = DependencyGraph {
            hashes: self.hashes.into_iter().collect(),
            dependencies: self.dependencies.into_iter().collect(),
        };
        crate::debug!("graph"; "frozen with {} hashes, {} dependency lists",
            graph.hashes.len(), graph.dependencies.len());
        graph
    }
}

// =============================================================================
// Read-Only Phase
// =============================================================================

/// Frozen mapping from file identity to content hash and direct dependencies.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    hashes: FxHashMap<String, String>,
    dependencies: FxHashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Content hash of `id`, if it was hashed.
    #[inline]
    pub fn hash(&self, id: &str) -> Option<&str> {
        self.hashes.get(id).map(String::as_str)
    }

    #[inline]
    pub fn has_hash(&self, id: &str) -> bool {
        self.hashes.contains_key(id)
    }

    /// Direct dependencies of `id`, if it was scanned.
    #[inline]
    pub fn dependencies(&self, id: &str) -> Option<&[String]> {
        self.dependencies.get(id).map(Vec::as_slice)
    }

    /// Every identity known to the graph (hashed, scanned or referenced), sorted.
    pub fn identities(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .hashes
            .keys()
            .chain(self.dependencies.keys())
            .chain(self.dependencies.values().flatten())
            .map(String::as_str)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Stable, serializable view of the graph.
    pub fn snapshot(&self) -> GraphSnapshot<'_> {
        let files = self
            .identities()
            .into_iter()
            .map(|id| {
                let node = NodeSnapshot {
                    hash: self.hash(id),
                    dependencies: self.dependencies(id),
                    fingerprint: None,
                };
                (id, node)
            })
            .collect();
        GraphSnapshot { files }
    }
}

/// Serializable graph view, ordered by identity.
#[derive(Debug, Serialize)]
pub struct GraphSnapshot<'a> {
    pub files: BTreeMap<&'a str, NodeSnapshot<'a>>,
}

#[derive(Debug, Serialize)]
pub struct NodeSnapshot<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<&'a [String]>,
    /// Naming fingerprint, filled in by callers holding a resolver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}
