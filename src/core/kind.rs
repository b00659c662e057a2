//! Asset kind definitions.

/// How a file's references are discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Markup scanned with the HTML rule set.
    Html,
    /// Stylesheet scanned with the CSS rule set.
    Css,
    /// Script analyzed by the module collaborator.
    Module,
    /// Hashed and renamed, never scanned.
    Other,
}

impl AssetKind {
    /// Classify by extension using the built-in table. Module files are only
    /// recognized when `module_extensions` lists their extension.
    pub fn from_extension<S: AsRef<str>>(ext: Option<&str>, module_extensions: &[S]) -> Self {
        let Some(ext) = ext else {
            return Self::Other;
        };
        let ext = ext.to_ascii_lowercase();
        if module_extensions.iter().any(|m| m.as_ref().eq_ignore_ascii_case(&ext)) {
            return Self::Module;
        }
        match ext.as_str() {
            "html" | "htm" | "tpl" | "xhtml" => Self::Html,
            "css" | "less" | "styl" => Self::Css,
            _ => Self::Other,
        }
    }

    /// Whether this kind has references to extract.
    #[inline]
    pub const fn is_scannable(self) -> bool {
        !matches!(self, Self::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_MODULES: &[&str] = &[];

    #[test]
    fn test_from_extension() {
        assert_eq!(AssetKind::from_extension(Some("HTML"), NO_MODULES), AssetKind::Html);
        assert_eq!(AssetKind::from_extension(Some("less"), NO_MODULES), AssetKind::Css);
        assert_eq!(AssetKind::from_extension(Some("js"), NO_MODULES), AssetKind::Other);
        assert_eq!(AssetKind::from_extension(Some("js"), &["js"]), AssetKind::Module);
        assert_eq!(AssetKind::from_extension(None, &["js"]), AssetKind::Other);
    }
}
