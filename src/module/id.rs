//! Module id helpers.

/// Loader keywords that name no file.
const BUILTINS: &[&str] = &["require", "exports", "module"];

/// Whether `id` is a loader keyword.
#[inline]
pub fn is_builtin(id: &str) -> bool {
    BUILTINS.contains(&id)
}

/// Resolve a relative module id (`./a`, `../b`) against the id of the module
/// that references it. Top-level ids are returned unchanged.
///
/// Plugin ids (`text!./row.html`) resolve their resource part.
pub fn resolve_relative_id(raw: &str, from: &str) -> String {
    if let Some((plugin, resource)) = raw.split_once('!') {
        return format!("{plugin}!{}", resolve_relative_id(resource, from));
    }
    if !raw.starts_with("./") && !raw.starts_with("../") {
        return raw.to_owned();
    }

    let mut segments: Vec<&str> = from.split('/').collect();
    // Drop the referencing module's own name.
    segments.pop();

    for part in raw.split('/') {
        match part {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            part => segments.push(part),
        }
    }
    segments.join("/")
}
