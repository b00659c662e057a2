//! File rename driver and naming helpers.

use crate::core::{VirtualFile, extension_of};
use crate::error::Result;
use crate::graph::Fingerprinter;
use crate::policy::Policy;

/// Rename `file` after its naming fingerprint.
///
/// Files without a recorded content hash are skipped, as are files whose
/// fingerprint is empty. Returns the new identity when it changed.
pub fn rename_file<P: Policy + ?Sized>(
    file: &mut VirtualFile,
    fingerprinter: &Fingerprinter<'_>,
    policy: &P,
) -> Result<Option<String>> {
    if !fingerprinter.graph().has_hash(&file.path) {
        crate::debug!("rename"; "skip {} (not hashed)", file.path);
        return Ok(None);
    }

    let fingerprint = fingerprinter.naming_fingerprint(&file.path)?;
    if fingerprint.is_empty() {
        return Ok(None);
    }

    let renamed = policy.rename_file(file, &fingerprint);
    if renamed == file.path {
        return Ok(None);
    }

    crate::debug!("rename"; "{} -> {}", file.path, renamed);
    file.path = renamed.clone();
    Ok(Some(renamed))
}

/// Insert `.{fingerprint}` before the extension of the final path segment.
///
/// `/css/site.css` → `/css/site.{fingerprint}.css`; names without an
/// extension get the fingerprint appended.
pub fn insert_fingerprint(path: &str, fingerprint: &str) -> String {
    let name_start = path.rfind('/').map_or(0, |pos| pos + 1);
    match path[name_start..].rfind('.') {
        Some(pos) if pos > 0 => {
            let dot = name_start + pos;
            format!("{}.{fingerprint}{}", &path[..dot], &path[dot..])
        }
        _ => append_fingerprint(path, fingerprint),
    }
}

/// Append `.{fingerprint}` to a name.
#[inline]
pub fn append_fingerprint(path: &str, fingerprint: &str) -> String {
    format!("{path}.{fingerprint}")
}

/// Fingerprint a module id so the loader resolves it to the renamed target
/// at `absolute`.
///
/// Plugin resources (`text!./row.tpl`) and ids carrying the target's own
/// extension name the file directly: the fingerprint goes before the
/// extension of the resource part. Bare ids get it appended, since the
/// loader adds the extension.
pub fn fingerprint_module_id(raw: &str, absolute: &str, fingerprint: &str) -> String {
    if let Some((plugin, resource)) = raw.split_once('!') {
        return format!("{plugin}!{}", insert_fingerprint(resource, fingerprint));
    }

    let names_file = extension_of(absolute).is_some_and(|ext| extension_of(raw) == Some(ext));
    if names_file {
        insert_fingerprint(raw, fingerprint)
    } else {
        append_fingerprint(raw, fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::policy::FingerprintPolicy;

    #[test]
    fn test_insert_fingerprint() {
        assert_eq!(insert_fingerprint("style.css", "aaa111"), "style.aaa111.css");
        assert_eq!(insert_fingerprint("/a.b/c", "f"), "/a.b/c.f");
        assert_eq!(insert_fingerprint("/js/app.min.js", "f"), "/js/app.min.f.js");
        assert_eq!(insert_fingerprint("/.htaccess", "f"), "/.htaccess.f");
    }

    #[test]
    fn test_fingerprint_module_id() {
        assert_eq!(fingerprint_module_id("./util", "/src/util.js", "f0"), "./util.f0");
        assert_eq!(
            fingerprint_module_id("lib/jquery.min", "/src/lib/jquery.min.js", "f0"),
            "lib/jquery.min.f0"
        );
        assert_eq!(fingerprint_module_id("lib/a.js", "/src/lib/a.js", "f0"), "lib/a.f0.js");
        assert_eq!(
            fingerprint_module_id("css!./main.css", "/src/app/main.css", "f0"),
            "css!./main.f0.css"
        );
        assert_eq!(
            fingerprint_module_id("text!tpl/row.tpl", "/src/tpl/row.tpl", "f0"),
            "text!tpl/row.f0.tpl"
        );
    }

    fn graph() -> crate::graph::DependencyGraph {
        let builder = GraphBuilder::new();
        builder.insert_hash("/style.css", "aaa111");
        builder.insert_hash("/img/a.png", "bbb222");
        builder.insert_dependencies("/style.css", vec!["/img/a.png".into()]);
        builder.freeze()
    }

    #[test]
    fn test_rename_file_uses_own_and_dependency_hashes() {
        let graph = graph();
        let fingerprinter = Fingerprinter::new(&graph);
        let policy = FingerprintPolicy::default();

        let mut file = VirtualFile::new("/style.css", "");
        let renamed = rename_file(&mut file, &fingerprinter, &policy).unwrap();

        let expected = fingerprinter.naming_fingerprint("/style.css").unwrap();
        assert_eq!(expected.len(), crate::hash::DEFAULT_LENGTH);
        assert_eq!(renamed.as_deref(), Some(file.path.as_str()));
        assert_eq!(file.path, format!("/style.{expected}.css"));
    }

    #[test]
    fn test_rename_leaf_uses_own_hash() {
        let graph = graph();
        let fingerprinter = Fingerprinter::new(&graph);

        let mut file = VirtualFile::new("/img/a.png", "");
        rename_file(&mut file, &fingerprinter, &FingerprintPolicy::default()).unwrap();
        assert_eq!(file.path, "/img/a.bbb222.png");
    }

    #[test]
    fn test_unhashed_file_is_skipped() {
        let graph = graph();
        let fingerprinter = Fingerprinter::new(&graph);

        let mut file = VirtualFile::new("/page.html", "");
        let renamed = rename_file(&mut file, &fingerprinter, &FingerprintPolicy::default()).unwrap();
        assert_eq!(renamed, None);
        assert_eq!(file.path, "/page.html");
    }

    #[test]
    fn test_rename_is_idempotent() {
        let graph = graph();
        let policy = FingerprintPolicy::default();

        let mut first = VirtualFile::new("/style.css", "");
        rename_file(&mut first, &Fingerprinter::new(&graph), &policy).unwrap();
        let mut second = VirtualFile::new("/style.css", "");
        rename_file(&mut second, &Fingerprinter::new(&graph), &policy).unwrap();

        assert_eq!(first.path, second.path);
    }
}
