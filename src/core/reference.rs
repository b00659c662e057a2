//! Reference records: one discovered mention of another asset.

use serde::Serialize;

/// A dependency reference found in a file's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Reference exactly as written, query suffix stripped (`../img/a.png`).
    pub raw: String,
    /// Normalized absolute file identity (`/img/a.png`).
    pub absolute: String,
    /// Full matched substring the reference was found in (`href="..."`).
    /// Anchor for search and replace.
    #[serde(rename = "match")]
    pub matched: String,
    /// Extension substituted onto `absolute` from the containing file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_override: Option<String>,
    /// Whether `raw` is a module id rather than a path.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub module: bool,
}

impl Reference {
    /// Build a record whose `absolute` was resolved elsewhere.
    pub fn new(
        raw: impl Into<String>,
        absolute: impl Into<String>,
        matched: impl Into<String>,
    ) -> Self {
        Self {
            raw: raw.into(),
            absolute: absolute.into(),
            matched: matched.into(),
            extension_override: None,
            module: false,
        }
    }
}

/// What an extraction rule yields for one matched substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// A bare reference string; becomes the record's `raw`.
    Raw(String),
    /// A reference fragment with optional pre-resolved identity.
    Record {
        raw: String,
        /// Identity supplied by the rule (e.g. module id resolution).
        absolute: Option<String>,
        /// `raw` has no extension and borrows the container's.
        inherit_extension: bool,
        /// `raw` is a module id.
        module: bool,
    },
}

impl Candidate {
    /// A module id candidate with a resolved file identity.
    pub fn module(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Record {
            raw: id.into(),
            absolute: Some(path.into()),
            inherit_extension: false,
            module: true,
        }
    }

    /// A reference that inherits the containing file's extension.
    pub fn inheriting(raw: impl Into<String>) -> Self {
        Self::Record {
            raw: raw.into(),
            absolute: None,
            inherit_extension: true,
            module: false,
        }
    }

    /// The raw reference text.
    pub fn raw(&self) -> &str {
        match self {
            Self::Raw(raw) | Self::Record { raw, .. } => raw,
        }
    }
}

impl From<String> for Candidate {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<&str> for Candidate {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_serializes_match_key() {
        let reference = Reference::new("style.css", "/style.css", r#"href="style.css""#);
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["match"], r#"href="style.css""#);
        assert!(json.get("module").is_none());
        assert!(json.get("extension_override").is_none());
    }

    #[test]
    fn test_candidate_raw() {
        assert_eq!(Candidate::from("a.png").raw(), "a.png");
        assert_eq!(Candidate::module("common/util", "/src/common/util.js").raw(), "common/util");
    }
}
