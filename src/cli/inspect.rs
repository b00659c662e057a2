//! `cachet inspect`.

use anyhow::Result;
use cachet::Pipeline;
use std::path::Path;

use super::{collect_files, load_config};

/// Graph of `input` as pretty JSON, with naming fingerprints.
pub fn inspect(input: &Path, config: Option<&Path>) -> Result<String> {
    let config = load_config(config, input)?;
    let files = collect_files(input)?;
    let engine = config.engine_for(&files)?;

    let graph = Pipeline::new(&engine).analyze(&files)?;
    let fingerprinter = engine.fingerprinter(&graph);

    let mut snapshot = graph.snapshot();
    for (id, node) in &mut snapshot.files {
        let fingerprint = fingerprinter.naming_fingerprint(id)?;
        node.fingerprint = (!fingerprint.is_empty()).then_some(fingerprint);
    }

    Ok(serde_json::to_string_pretty(&snapshot)?)
}
