//! Caller-supplied policy hooks.
//!
//! All hooks live on one trait so the engine is generic over a single
//! policy type and every call is statically dispatched.

use crate::core::{Reference, VirtualFile};
use crate::rename::{append_fingerprint, fingerprint_module_id, insert_fingerprint};

/// Hooks that customize how references are cleaned and how names change.
pub trait Policy: Send + Sync {
    /// Rewrite `raw`/`absolute` in place before filtering.
    fn correct(&self, _file: &VirtualFile, _reference: &mut Reference) {}

    /// Return `true` to drop a reference.
    fn filter(&self, _file: &VirtualFile, _reference: &Reference) -> bool {
        false
    }

    /// New identity for `file` given its naming fingerprint.
    fn rename_file(&self, file: &VirtualFile, fingerprint: &str) -> String;

    /// Replacement for `reference.raw` given the target's naming fingerprint.
    /// `None` leaves the occurrence unchanged.
    fn rename_dependency(&self, reference: &Reference, fingerprint: &str) -> Option<String>;

    /// Free-form rewrite of a file's text before references are replaced.
    fn custom_replace(&self, _file: &VirtualFile, _text: &str) -> Option<String> {
        None
    }
}

/// Default naming: `name.{fingerprint}.ext`.
///
/// Files whose extension is listed in `skip_rename` keep their identity, and
/// references to them are left alone.
#[derive(Debug, Clone, Default)]
pub struct FingerprintPolicy {
    pub skip_rename: Vec<String>,
}

impl FingerprintPolicy {
    pub fn new(skip_rename: Vec<String>) -> Self {
        Self { skip_rename }
    }

    fn keeps_name(&self, path: &str) -> bool {
        crate::core::extension_of(path).is_some_and(|ext| {
            self.skip_rename
                .iter()
                .any(|skip| skip.eq_ignore_ascii_case(ext))
        })
    }
}

impl Policy for FingerprintPolicy {
    fn rename_file(&self, file: &VirtualFile, fingerprint: &str) -> String {
        if self.keeps_name(&file.path) {
            return file.path.clone();
        }
        insert_fingerprint(&file.path, fingerprint)
    }

    fn rename_dependency(&self, reference: &Reference, fingerprint: &str) -> Option<String> {
        if fingerprint.is_empty() || self.keeps_name(&reference.absolute) {
            return None;
        }
        if reference.module {
            return Some(fingerprint_module_id(&reference.raw, &reference.absolute, fingerprint));
        }
        // Extension-less stems still resolve to `stem.{fingerprint}.ext`.
        if reference.extension_override.is_some() {
            Some(append_fingerprint(&reference.raw, fingerprint))
        } else {
            Some(insert_fingerprint(&reference.raw, fingerprint))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_file() {
        let policy = FingerprintPolicy::new(vec!["html".into()]);
        assert_eq!(
            policy.rename_file(&VirtualFile::new("/css/site.css", ""), "aaa111"),
            "/css/site.aaa111.css"
        );
        assert_eq!(
            policy.rename_file(&VirtualFile::new("/page.HTML", ""), "aaa111"),
            "/page.HTML"
        );
    }

    #[test]
    fn test_rename_dependency() {
        let policy = FingerprintPolicy::default();

        let path = Reference::new("../img/a.png", "/img/a.png", "url(../img/a.png)");
        assert_eq!(
            policy.rename_dependency(&path, "ff00").as_deref(),
            Some("../img/a.ff00.png")
        );

        let mut module = Reference::new("lib/jquery.min", "/src/lib/jquery.min.js", "'lib/jquery.min'");
        module.module = true;
        assert_eq!(
            policy.rename_dependency(&module, "ff00").as_deref(),
            Some("lib/jquery.min.ff00")
        );

        let mut plugin = Reference::new("css!./main.css", "/src/app/main.css", "'css!./main.css'");
        plugin.module = true;
        assert_eq!(
            policy.rename_dependency(&plugin, "ff00").as_deref(),
            Some("css!./main.ff00.css")
        );

        assert_eq!(policy.rename_dependency(&path, ""), None);
    }

    #[test]
    fn test_skipped_target_left_alone() {
        let policy = FingerprintPolicy::new(vec!["html".into()]);
        let reference = Reference::new("tpl/a.html", "/tpl/a.html", "'tpl/a.html'");
        assert_eq!(policy.rename_dependency(&reference, "ff00"), None);
    }
}
