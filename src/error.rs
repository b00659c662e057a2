//! Library error types.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while extracting, fingerprinting or rewriting assets.
#[derive(Debug, Error)]
pub enum Error {
    /// The module collaborator could not parse or regenerate a file.
    #[error("module analysis failed: {0}")]
    Module(String),

    /// A reachable dependency has no recorded content hash (strict mode only).
    #[error("no content hash recorded for `{dependency}` (reached from `{root}`)")]
    MissingHash { root: String, dependency: String },

    /// A literal reference could not be turned into a search pattern.
    #[error("invalid pattern `{pattern}`")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A failure attributed to one file of the pipeline.
    #[error("failed to process `{path}`")]
    File {
        path: String,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl Error {
    /// Attribute this error to a pipeline file.
    pub fn in_file(self, path: impl Into<String>) -> Self {
        match self {
            // Already attributed; keep the innermost path.
            Self::File { .. } => self,
            other => Self::File {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}
