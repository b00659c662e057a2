//! Policy assembled from `[references]` and `[rename]`.

use crate::core::{Reference, VirtualFile};
use crate::policy::{FingerprintPolicy, Policy};
use crate::scan::normalize::{resolve_absolute, strip_suffix};

/// Prefix correction, placeholder filtering and default naming.
#[derive(Debug, Clone, Default)]
pub struct ConfigPolicy {
    /// (prefix, replacement), longest prefix first.
    prefixes: Vec<(String, String)>,
    placeholders: Vec<String>,
    naming: FingerprintPolicy,
}

impl ConfigPolicy {
    pub fn new(
        prefixes: impl IntoIterator<Item = (String, String)>,
        placeholders: Vec<String>,
        skip_rename: Vec<String>,
    ) -> Self {
        let mut prefixes: Vec<_> = prefixes.into_iter().collect();
        prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self {
            prefixes,
            placeholders,
            naming: FingerprintPolicy::new(skip_rename),
        }
    }
}

impl Policy for ConfigPolicy {
    fn correct(&self, file: &VirtualFile, reference: &mut Reference) {
        if reference.module {
            return;
        }
        let Some((prefix, replacement)) = self
            .prefixes
            .iter()
            .find(|(prefix, _)| reference.raw.starts_with(prefix.as_str()))
        else {
            return;
        };

        let corrected = format!("{replacement}{}", &reference.raw[prefix.len()..]);
        reference.absolute = resolve_absolute(file.directory(), strip_suffix(&corrected));
    }

    fn filter(&self, _file: &VirtualFile, reference: &Reference) -> bool {
        self.placeholders
            .iter()
            .any(|token| reference.absolute.contains(token.as_str()))
    }

    fn rename_file(&self, file: &VirtualFile, fingerprint: &str) -> String {
        self.naming.rename_file(file, fingerprint)
    }

    fn rename_dependency(&self, reference: &Reference, fingerprint: &str) -> Option<String> {
        self.naming.rename_dependency(reference, fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{RuleSet, correct_references, filter_references, walk_references};

    fn policy() -> ConfigPolicy {
        ConfigPolicy::new(
            [("{{ $static }}".to_string(), "..".to_string())],
            vec!["{{".into(), "${".into()],
            vec!["html".into()],
        )
    }

    #[test]
    fn test_prefix_correction_then_filter() {
        let file = VirtualFile::new(
            "/tpl/page.html",
            r#"<img src="{{ $static }}/img/a.png"><img src="{{ $cdn }}/b.png"><img src="${x}.png">"#,
        );
        let policy = policy();
        let mut references = walk_references(&file, &RuleSet::default().html, |_, _| Vec::new());
        correct_references(&file, &mut references, &policy);
        filter_references(&file, &mut references, &policy);

        assert_eq!(references.len(), 1);
        assert_eq!(references[0].raw, "{{ $static }}/img/a.png");
        assert_eq!(references[0].absolute, "/img/a.png");
    }

    #[test]
    fn test_naming_delegates() {
        let policy = policy();
        let page = VirtualFile::new("/index.html", "");
        let style = VirtualFile::new("/style.css", "");
        assert_eq!(policy.rename_file(&page, "f1"), "/index.html");
        assert_eq!(policy.rename_file(&style, "f1"), "/style.f1.css");

        let reference = Reference::new("{{ $static }}/img/a.png", "/img/a.png", "src=\"..\"");
        assert_eq!(
            policy.rename_dependency(&reference, "f2").as_deref(),
            Some("{{ $static }}/img/a.f2.png")
        );
    }
}
