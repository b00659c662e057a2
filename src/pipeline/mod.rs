//! Two-phase driver.
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │  Phase 1 (rayon)  hash + scan every file   │
//! │                   into a GraphBuilder      │
//! └────────────────────────────────────────────┘
//!                      │ freeze (barrier)
//! ┌────────────────────────────────────────────┐
//! │  Phase 2 (rayon)  rename + rewrite every   │
//! │                   file against the graph   │
//! └────────────────────────────────────────────┘
//! ```
//!
//! No file enters phase 2 before every file has left phase 1: the frozen
//! [`DependencyGraph`] only exists once the builder is consumed.

use rayon::prelude::*;

use crate::core::VirtualFile;
use crate::engine::Engine;
use crate::error::Result;
use crate::graph::{DependencyGraph, GraphBuilder};
use crate::logger::ProgressLine;
use crate::module::ModuleAnalyzer;
use crate::policy::Policy;

/// Result of a full run.
#[derive(Debug)]
pub struct BuildOutput {
    /// Processed files, in input order, under their final identities.
    pub files: Vec<VirtualFile>,
    /// Number of files whose identity changed.
    pub renamed: usize,
}

/// Drives an [`Engine`] over a file set.
pub struct Pipeline<'e, P: Policy, A: ModuleAnalyzer> {
    engine: &'e Engine<P, A>,
    progress: bool,
}

impl<'e, P: Policy, A: ModuleAnalyzer> Pipeline<'e, P, A> {
    pub fn new(engine: &'e Engine<P, A>) -> Self {
        Self {
            engine,
            progress: false,
        }
    }

    /// Show a progress line while running.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Phase 1 only: build the dependency graph of `files`.
    pub fn analyze(&self, files: &[VirtualFile]) -> Result<DependencyGraph> {
        self.analyze_into(GraphBuilder::new(), files)
    }

    /// Phase 1 over a builder that may already hold recorded hashes.
    pub fn analyze_into(&self, builder: GraphBuilder, files: &[VirtualFile]) -> Result<DependencyGraph> {
        let progress = self
            .progress
            .then(|| ProgressLine::new(&[("hash", files.len()), ("scan", files.len())]));

        let result = files.par_iter().try_for_each(|file| {
            self.engine.analyze_hash(file, &builder);
            if let Some(p) = &progress {
                p.inc("hash");
            }
            self.engine
                .analyze_dependencies(file, &builder)
                .map_err(|e| e.in_file(file.path.as_str()))?;
            if let Some(p) = &progress {
                p.inc("scan");
            }
            Ok(())
        });

        if let Some(p) = progress {
            p.finish();
        }
        result?;

        Ok(builder.freeze())
    }

    /// Run both phases and return the rewritten files.
    pub fn run(&self, files: Vec<VirtualFile>) -> Result<BuildOutput> {
        let graph = self.analyze(&files)?;
        self.replace(files, &graph)
    }

    /// Phase 2 only: rename and rewrite `files` against a frozen graph.
    pub fn replace(&self, files: Vec<VirtualFile>, graph: &DependencyGraph) -> Result<BuildOutput> {
        let fingerprinter = self.engine.fingerprinter(graph);
        let progress = self
            .progress
            .then(|| ProgressLine::new(&[("rewrite", files.len())]));

        let result = files
            .into_par_iter()
            .map(|mut file| {
                let original = file.path.clone();
                let renamed = self
                    .engine
                    .replace_dependencies(&mut file, &fingerprinter)
                    .map_err(|e| e.in_file(original))?;
                if let Some(p) = &progress {
                    p.inc("rewrite");
                }
                Ok((file, renamed.is_some()))
            })
            .collect::<Result<Vec<_>>>();

        if let Some(p) = progress {
            p.finish();
        }

        let processed = result?;
        let renamed = processed.iter().filter(|(_, renamed)| *renamed).count();
        crate::debug!("build"; "{} files processed, {} renamed", processed.len(), renamed);

        Ok(BuildOutput {
            files: processed.into_iter().map(|(file, _)| file).collect(),
            renamed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::hash;
    use crate::module::amd::{AmdConfig, PatternAnalyzer};
    use crate::policy::FingerprintPolicy;

    fn engine() -> Engine<FingerprintPolicy, PatternAnalyzer> {
        Engine::new(FingerprintPolicy::new(vec!["html".into()]))
            .with_analyzer(PatternAnalyzer::new(AmdConfig::new("/src")))
    }

    fn site() -> Vec<VirtualFile> {
        vec![
            VirtualFile::new(
                "/index.html",
                r#"<link href="css/site.css"><script src="src/main.js"></script>"#,
            ),
            VirtualFile::new("/css/site.css", "body { background: url(../img/bg.png) }"),
            VirtualFile::new("/img/bg.png", vec![0x89, b'P', b'N', b'G']),
            VirtualFile::new("/src/main.js", "define(['./util'], function (util) {});"),
            VirtualFile::new("/src/util.js", "define(function () { return 1; });"),
        ]
    }

    fn find<'a>(files: &'a [VirtualFile], prefix: &str) -> &'a VirtualFile {
        files
            .iter()
            .find(|f| f.path.starts_with(prefix))
            .unwrap()
    }

    #[test]
    fn test_analyze_builds_graph() {
        let engine = engine();
        let graph = Pipeline::new(&engine).analyze(&site()).unwrap();

        assert!(!graph.has_hash("/index.html"));
        assert!(graph.has_hash("/css/site.css"));
        assert_eq!(
            graph.dependencies("/index.html").unwrap(),
            &["/css/site.css", "/src/main.js"]
        );
        assert_eq!(graph.dependencies("/src/main.js").unwrap(), &["/src/util.js"]);
        assert_eq!(graph.dependencies("/img/bg.png"), None);
    }

    #[test]
    fn test_run_renames_and_rewrites() {
        let engine = engine();
        let output = Pipeline::new(&engine).run(site()).unwrap();
        assert_eq!(output.files.len(), 5);
        assert_eq!(output.renamed, 4);

        let html = find(&output.files, "/index.html");
        let css = find(&output.files, "/css/site.");
        let main = find(&output.files, "/src/main.");
        let util = find(&output.files, "/src/util.");

        let css_name = css.path.trim_start_matches('/');
        let main_name = main.path.trim_start_matches('/');
        assert!(html.text().contains(&format!(r#"href="{css_name}""#)));
        assert!(html.text().contains(&format!(r#"src="{main_name}""#)));

        // `./util` resolves to `util.{fp}.js` after renaming.
        let util_fp = util.path.trim_start_matches("/src/util.").trim_end_matches(".js");
        assert_eq!(
            main.text(),
            format!("define(['./util.{util_fp}'], function (util) {{}});")
        );
    }

    #[test]
    fn test_dependency_change_propagates() {
        let engine = engine();
        let before = Pipeline::new(&engine).run(site()).unwrap();

        let mut changed = site();
        changed[2] = VirtualFile::new("/img/bg.png", vec![0x89, b'P', b'N', b'G', 0]);
        let after = Pipeline::new(&engine).run(changed).unwrap();

        let css_before = &find(&before.files, "/css/site.").path;
        let css_after = &find(&after.files, "/css/site.").path;
        assert_ne!(css_before, css_after);

        // Unrelated files keep their names.
        assert_eq!(
            find(&before.files, "/src/util.").path,
            find(&after.files, "/src/util.").path
        );
    }

    #[test]
    fn test_preseeded_hash_wins() {
        let engine = engine();
        let builder = GraphBuilder::new();
        builder.insert_hash("/img/bg.png", "fixed1");

        let pipeline = Pipeline::new(&engine);
        let files = site();
        let graph = pipeline.analyze_into(builder, &files).unwrap();
        assert_eq!(graph.hash("/img/bg.png"), Some("fixed1"));

        let output = pipeline.replace(files, &graph).unwrap();
        assert!(output.files.iter().any(|f| f.path == "/img/bg.fixed1.png"));
        assert!(find(&output.files, "/css/site.").text().contains("bg.fixed1.png"));
    }

    #[test]
    fn test_failure_names_file() {
        let engine = engine();
        let files = vec![VirtualFile::new("/src/bad.js", "define(['a', function () {});")];
        let err = Pipeline::new(&engine).run(files).unwrap_err();

        match err {
            Error::File { path, source } => {
                assert_eq!(path, "/src/bad.js");
                assert!(matches!(*source, Error::Module(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parallel_module_rewrites_stay_per_file() {
        let engine = engine();
        let mut files = Vec::new();
        for i in 0..32 {
            files.push(VirtualFile::new(
                format!("/src/m{i}/main.js"),
                "define(['./dep'], function () {});",
            ));
            files.push(VirtualFile::new(
                format!("/src/m{i}/dep.js"),
                format!("define(function () {{ return {i}; }});"),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        let output = pool.install(|| Pipeline::new(&engine).run(files)).unwrap();

        for i in 0..32 {
            let dep_prefix = format!("/src/m{i}/dep.");
            let dep = find(&output.files, &dep_prefix);
            let fingerprint = dep.path[dep_prefix.len()..].trim_end_matches(".js");
            let main = find(&output.files, &format!("/src/m{i}/main."));
            assert_eq!(
                main.text(),
                format!("define(['./dep.{fingerprint}'], function () {{}});")
            );
        }

        let analyzer = engine.analyzer().unwrap();
        assert!(analyzer.replace_substitution(None).is_none());
    }

    #[test]
    fn test_plugin_resources_written_under_referenced_names() {
        let engine = engine();
        let files = vec![
            VirtualFile::new(
                "/src/app/main.js",
                "define(['css!./main.css', 'text!./row.tpl'], function () {});",
            ),
            VirtualFile::new("/src/app/main.css", ".row { color: red }"),
            VirtualFile::new("/src/app/row.tpl", "<li>${name}</li>"),
        ];
        let output = Pipeline::new(&engine).run(files).unwrap();

        let path_of = |suffix: &str| {
            output
                .files
                .iter()
                .find(|f| f.path.starts_with("/src/app/") && f.path.ends_with(suffix))
                .map(|f| f.path.trim_start_matches("/src/app/").to_owned())
                .unwrap()
        };
        let css = path_of(".css");
        let tpl = path_of(".tpl");
        let main = output
            .files
            .iter()
            .find(|f| f.path.ends_with(".js"))
            .unwrap();

        assert_eq!(
            main.text(),
            format!("define(['css!./{css}', 'text!./{tpl}'], function () {{}});")
        );
        assert_ne!(css, "main.css");
    }

    #[test]
    fn test_folded_fingerprint_length() {
        let engine = engine().with_hash_length(12);
        let output = Pipeline::new(&engine).run(site()).unwrap();
        let css = find(&output.files, "/css/site.");
        let fingerprint = css.path.trim_start_matches("/css/site.").trim_end_matches(".css");
        assert_eq!(fingerprint.len(), 12);
        assert!(fingerprint.len() <= hash::MAX_LENGTH);
    }
}
