//! `cachet build`.

use anyhow::{Context, Result};
use cachet::{Pipeline, log};
use std::fs;
use std::path::Path;
use std::time::Instant;

use super::{collect_files, load_config};

/// Fingerprint `input` into `output`.
pub fn build(input: &Path, output: &Path, config: Option<&Path>, progress: bool) -> Result<()> {
    let started = Instant::now();
    let config = load_config(config, input)?;
    let files = collect_files(input)?;
    let engine = config.engine_for(&files)?;

    log!("build"; "fingerprinting {} files from {}", files.len(), input.display());

    let result = Pipeline::new(&engine).with_progress(progress).run(files)?;

    for file in &result.files {
        let target = output.join(file.path.trim_start_matches('/'));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&target, &file.contents)
            .with_context(|| format!("failed to write {}", target.display()))?;
    }

    log!(
        "build";
        "{} files written to {} ({} renamed) in {:.2?}",
        result.files.len(),
        output.display(),
        result.renamed,
        started.elapsed()
    );
    Ok(())
}
