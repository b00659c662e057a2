//! Reference normalization, correction and filtering.
//!
//! Applied in this order for every file:
//!
//! 1. [`build_reference`] - strip the query suffix, resolve `absolute`,
//!    substitute an inherited extension
//! 2. [`correct_references`] - caller correction hook
//! 3. [`filter_references`] - drop external references and caller rejects

use path_clean::PathClean;
use std::path::Path;

use crate::core::{Candidate, LinkKind, Reference, VirtualFile, is_external_reference};
use crate::policy::Policy;

/// Turn one candidate into a reference record anchored at `matched`.
///
/// Returns `None` when nothing remains of the reference after its query or
/// fragment suffix is stripped.
pub fn build_reference(candidate: Candidate, matched: &str, file: &VirtualFile) -> Option<Reference> {
    let (raw, absolute, inherit_extension, module) = match candidate {
        Candidate::Raw(raw) => (raw, None, false, false),
        Candidate::Record {
            raw,
            absolute,
            inherit_extension,
            module,
        } => (raw, absolute, inherit_extension, module),
    };

    let raw = strip_suffix(raw.trim());
    if raw.is_empty() {
        return None;
    }

    // Query stripping happens before any extension substitution.
    let absolute = match absolute {
        Some(absolute) => strip_suffix(&absolute).to_owned(),
        None => resolve_absolute(file.directory(), raw),
    };

    let mut reference = Reference::new(raw, absolute, matched);
    reference.module = module;

    if inherit_extension && let Some(ext) = file.extension() {
        reference.absolute = with_extension(&reference.absolute, ext);
        reference.extension_override = Some(ext.to_owned());
    }

    Some(reference)
}

/// Remove a `?query` or `#fragment` suffix.
pub fn strip_suffix(raw: &str) -> &str {
    match raw.find(['?', '#']) {
        Some(pos) => &raw[..pos],
        None => raw,
    }
}

/// Resolve `raw` against the containing directory.
///
/// Directory-relative references are joined and cleaned; site-root paths
/// and placeholder tokens are identities already.
pub fn resolve_absolute(directory: &str, raw: &str) -> String {
    match LinkKind::parse(raw) {
        LinkKind::Relative(raw) if directory.is_empty() => clean(Path::new(raw)),
        LinkKind::Relative(raw) => clean(&Path::new(directory).join(raw)),
        LinkKind::Identity(raw) | LinkKind::External(raw) => raw.to_owned(),
    }
}

fn clean(path: &Path) -> String {
    path.clean().to_string_lossy().into_owned()
}

/// Replace (or append) the extension of the final path segment.
pub fn with_extension(path: &str, ext: &str) -> String {
    let name_start = path.rfind('/').map_or(0, |pos| pos + 1);
    let stem_end = match path[name_start..].rfind('.') {
        Some(0) | None => path.len(),
        Some(pos) => name_start + pos,
    };
    format!("{}.{ext}", &path[..stem_end])
}

/// Run the caller correction hook over every record, last to first.
pub fn correct_references<P: Policy + ?Sized>(
    file: &VirtualFile,
    references: &mut [Reference],
    policy: &P,
) {
    for reference in references.iter_mut().rev() {
        policy.correct(file, reference);
    }
}

/// Drop external references and records the caller rejects, last to first.
pub fn filter_references<P: Policy + ?Sized>(
    file: &VirtualFile,
    references: &mut Vec<Reference>,
    policy: &P,
) {
    for i in (0..references.len()).rev() {
        let reference = &references[i];
        if is_external_reference(&reference.raw) || policy.filter(file, reference) {
            references.remove(i);
        }
    }
}
