//! Content-fingerprint cache busting for HTML, CSS and AMD module assets.
//!
//! Every file gets a short content hash. References between files are
//! discovered by pattern scanning (markup and stylesheets) or module
//! analysis (scripts), forming a dependency graph. A file is then renamed
//! after a fingerprint that folds its own hash with the hash of everything
//! it transitively references, and every reference to it is rewritten to
//! the new name.
//!
//! ```ignore
//! use cachet::{Engine, FingerprintPolicy, Pipeline, VirtualFile};
//!
//! let engine = Engine::new(FingerprintPolicy::default());
//! let output = Pipeline::new(&engine).run(files)?;
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod graph;
pub mod hash;
pub mod logger;
pub mod module;
pub mod pipeline;
pub mod policy;
pub mod rename;
pub mod rewrite;
pub mod scan;

pub use config::{CachetConfig, ConfigError, ConfigPolicy};
pub use crate::core::{AssetKind, Candidate, Reference, VirtualFile};
pub use engine::Engine;
pub use error::{Error, Result};
pub use graph::{DependencyGraph, Fingerprinter, GraphBuilder};
pub use module::{ModuleAnalyzer, ModuleInfo, Substitution};
pub use pipeline::{BuildOutput, Pipeline};
pub use policy::{FingerprintPolicy, Policy};
pub use scan::{Matcher, Rule, RuleMerge, RuleSet};
