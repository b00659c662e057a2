//! In-memory file handed through the pipeline.

use std::borrow::Cow;

/// A virtual file: identity plus content buffer.
///
/// The engine only relabels and rewrites these in memory; reading and writing
/// actual storage is the pipeline driver's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    /// Absolute file identity (`/css/site.css`), also the graph key.
    pub path: String,
    /// Raw content bytes.
    pub contents: Vec<u8>,
}

impl VirtualFile {
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Content decoded as text (lossy for invalid UTF-8).
    #[inline]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }

    /// Replace the content with `text` if it differs from the current bytes.
    ///
    /// Returns `true` when the buffer was replaced. Unchanged content keeps
    /// the original allocation.
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.contents == text.as_bytes() {
            return false;
        }
        self.contents = text.as_bytes().to_vec();
        true
    }

    /// Directory part of the identity (`/css` for `/css/site.css`).
    pub fn directory(&self) -> &str {
        directory_of(&self.path)
    }

    /// Extension of the final path segment, without the dot.
    pub fn extension(&self) -> Option<&str> {
        extension_of(&self.path)
    }
}

/// Directory part of an identity string. Root-level files yield `/`,
/// bare names yield an empty string.
pub(crate) fn directory_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Extension of the final path segment of an identity string.
pub(crate) fn extension_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(pos) => Some(&name[pos + 1..]),
    }
}
