//! `cachet.toml` configuration.
//!
//! ```text
//! config/
//! ├── error     # ConfigError
//! ├── section   # [hash] [rename] [rules] [references] [modules]
//! └── policy    # ConfigPolicy built from [references] + [rename]
//! ```
//!
//! Every section is optional; an absent file means defaults everywhere.

mod error;
mod policy;
mod section;

pub use error::ConfigError;
pub use policy::ConfigPolicy;
pub use section::{HashConfig, ModulesConfig, ReferencesConfig, RenameConfig, RuleEntry, RulesConfig};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::VirtualFile;
use crate::engine::Engine;
use crate::module::amd::{AmdConfig, PatternAnalyzer};
use crate::module::read_require_config;
use crate::scan::RuleSet;

/// Default config file name looked up in the input directory.
pub const CONFIG_FILE: &str = "cachet.toml";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachetConfig {
    pub hash: HashConfig,
    pub rename: RenameConfig,
    pub rules: RulesConfig,
    pub references: ReferencesConfig,
    pub modules: ModulesConfig,
}

impl CachetConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        crate::log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hash.validate()?;
        self.rules.compile()?;
        Ok(())
    }

    /// Built-in rules merged with `[rules]`.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        let (html, css) = self.rules.compile()?;
        Ok(RuleSet::with_custom(html, css, self.rules.merge))
    }

    pub fn policy(&self) -> ConfigPolicy {
        ConfigPolicy::new(
            self.references.prefixes.clone(),
            self.references.placeholders.clone(),
            self.rename.skip.clone(),
        )
    }

    /// Module resolution settings from `[modules]`.
    pub fn amd_config(&self) -> AmdConfig {
        self.layer_modules(AmdConfig::default())
    }

    /// Module resolution settings from `modules.config_page` among `files`,
    /// overridden by `[modules]`.
    pub fn amd_config_for(&self, files: &[VirtualFile]) -> Result<AmdConfig, ConfigError> {
        let Some(page) = &self.modules.config_page else {
            return Ok(self.amd_config());
        };

        let identity = format!("/{}", page.trim_start_matches('/'));
        let file = files.iter().find(|file| file.path == identity).ok_or_else(|| {
            ConfigError::Validation(format!("modules.config_page `{page}` is not an input file"))
        })?;

        let configs = read_require_config(&file.text());
        if configs.is_empty() {
            crate::log!("warning"; "no require.config found in {}", identity);
        }
        let amd = configs
            .iter()
            .fold(AmdConfig::default(), |amd, config| {
                amd.with_require_config(config, file.directory())
            });
        Ok(self.layer_modules(amd))
    }

    fn layer_modules(&self, mut amd: AmdConfig) -> AmdConfig {
        let base = self.modules.base_identity();
        if !base.is_empty() {
            amd.base_url = base;
        }
        self.modules
            .paths
            .iter()
            .fold(amd, |amd, (prefix, target)| amd.with_path(prefix.as_str(), target.as_str()))
    }

    /// Engine configured from every section.
    pub fn engine(&self) -> Result<Engine<ConfigPolicy, PatternAnalyzer>, ConfigError> {
        self.assemble(self.amd_config())
    }

    /// Engine for a concrete input set, reading `modules.config_page` from it.
    pub fn engine_for(
        &self,
        files: &[VirtualFile],
    ) -> Result<Engine<ConfigPolicy, PatternAnalyzer>, ConfigError> {
        self.assemble(self.amd_config_for(files)?)
    }

    fn assemble(&self, amd: AmdConfig) -> Result<Engine<ConfigPolicy, PatternAnalyzer>, ConfigError> {
        let engine = Engine::new(self.policy())
            .with_rules(self.rule_set()?)
            .with_module_extensions(self.modules.extensions.clone())
            .with_hash_length(self.hash.length)
            .with_skip_hash(self.hash.skip.clone())
            .strict(self.hash.strict);

        Ok(if self.modules.enable {
            engine.with_analyzer(PatternAnalyzer::new(amd))
        } else {
            engine
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AssetKind, VirtualFile};
    use crate::scan::RuleMerge;

    const FULL: &str = r#"
[hash]
length = 8
strict = true

[rename]
skip = ["html"]

[rules]
merge = "append"
html = [{ pattern = 'data-src="[^"]+"', extract = "quoted" }]

[references]
placeholders = ["${"]
[references.prefixes]
"{{ $static }}" = ".."

[modules]
enable = true
base_url = "src"
[modules.paths]
jquery = "dep/jquery"
"#;

    #[test]
    fn test_defaults() {
        let config = CachetConfig::from_str("").unwrap();
        assert_eq!(config, CachetConfig::default());
        assert_eq!(config.hash.length, crate::hash::DEFAULT_LENGTH);
        assert_eq!(config.rename.skip, vec!["html", "htm"]);
        assert!(!config.modules.enable);
    }

    #[test]
    fn test_full_config() {
        let config = CachetConfig::from_str(FULL).unwrap();
        assert_eq!(config.hash.length, 8);
        assert!(config.hash.strict);
        assert_eq!(config.rules.merge, RuleMerge::Append);
        assert_eq!(config.references.prefixes["{{ $static }}"], "..");

        let rules = config.rule_set().unwrap();
        assert_eq!(rules.html.len(), 3);
        assert_eq!(rules.html[2].pattern.as_str(), r#"data-src="[^"]+""#);

        let amd = config.amd_config();
        assert_eq!(amd.base_url, "/src");
        assert_eq!(amd.paths["jquery"], "dep/jquery");
    }

    #[test]
    fn test_engine_from_config() {
        let engine = CachetConfig::from_str(FULL).unwrap().engine().unwrap();
        assert_eq!(engine.kind(&VirtualFile::new("/src/a.js", "")), AssetKind::Module);
        assert_eq!(engine.path_to_module_id("/src/dep/jquery.js").as_deref(), Some("jquery"));

        let plain = CachetConfig::default().engine().unwrap();
        assert_eq!(plain.kind(&VirtualFile::new("/src/a.js", "")), AssetKind::Other);
    }

    #[test]
    fn test_validation_errors() {
        let err = CachetConfig::from_str("[hash]\nlength = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = CachetConfig::from_str("[rules]\ncss = [{ pattern = '(', extract = 'url' }]").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = CachetConfig::from_str("[hash\nlength = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_from_path_ignores_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[hash]\nlength = 12\ncolour = true\n").unwrap();

        let config = CachetConfig::from_path(&path).unwrap();
        assert_eq!(config.hash.length, 12);

        let (_, ignored) = CachetConfig::parse_with_ignored("[hash]\ncolour = true\n").unwrap();
        assert_eq!(ignored, vec!["hash.colour"]);
    }

    #[test]
    fn test_modules_from_config_page() {
        let config = CachetConfig::from_str(
            "[modules]\nenable = true\nconfig_page = \"index.html\"\n[modules.paths]\nui = \"vendor/ui\"\n",
        )
        .unwrap();
        let files = vec![VirtualFile::new(
            "/index.html",
            "<script>require.config({ baseUrl: 'src', paths: { ui: 'lib/ui', jquery: 'dep/jquery' } });</script>",
        )];

        let amd = config.amd_config_for(&files).unwrap();
        assert_eq!(amd.base_url, "/src");
        assert_eq!(amd.paths["jquery"], "dep/jquery");
        assert_eq!(amd.paths["ui"], "vendor/ui");

        let engine = config.engine_for(&files).unwrap();
        assert_eq!(engine.path_to_module_id("/src/dep/jquery.js").as_deref(), Some("jquery"));

        let err = config.amd_config_for(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = CachetConfig::from_path(Path::new("/nonexistent/cachet.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }
}
