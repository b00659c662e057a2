//! Command-line surface.

mod args;
pub mod build;
pub mod inspect;

pub use args::{Cli, Commands};

use anyhow::{Context, Result};
use cachet::{CachetConfig, VirtualFile, config::CONFIG_FILE};
use jwalk::WalkDir;
use std::path::Path;

/// Load `-C <path>`, else `<input>/cachet.toml` when present, else defaults.
pub fn load_config(explicit: Option<&Path>, input: &Path) -> Result<CachetConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = input.join(CONFIG_FILE);
            if !default.is_file() {
                return Ok(CachetConfig::default());
            }
            default
        }
    };
    CachetConfig::from_path(&path).with_context(|| format!("failed to load {}", path.display()))
}

/// Read every file under `input` with identities rooted at `/`.
///
/// The default config file at the input root is not an asset.
pub fn collect_files(input: &Path) -> Result<Vec<VirtualFile>> {
    let mut paths: Vec<_> = WalkDir::new(input)
        .sort(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .collect();
    paths.sort();

    let config_path = input.join(CONFIG_FILE);
    paths
        .into_iter()
        .filter(|path| *path != config_path)
        .map(|path| {
            let identity = identity_of(input, &path)?;
            let contents =
                std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            Ok(VirtualFile::new(identity, contents))
        })
        .collect()
}

/// `/`-rooted identity of `path` inside `root`.
fn identity_of(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Ok(format!("/{}", segments.join("/")))
}
