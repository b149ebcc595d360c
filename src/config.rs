//! On-disk configuration for the indexing pipeline (§6.4 Options), loaded
//! from YAML with programmatic defaults for anything left unset.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Language;

/// Tunables the driver accepts per §6.4: "ignore globs, batch size, worker
/// count, extractor allow-list, per-language enable flags".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexOptions {
    #[serde(default = "default_version")]
    pub version: String,

    /// Glob patterns (relative to the repository root) excluded from the walk.
    #[serde(default = "default_ignore_globs")]
    pub ignore_globs: Vec<String>,

    /// Number of files handed to the store gateway per batch (§4.7: "default
    /// 50-200").
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Size of the bounded worker pool (§5).
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Per-file extractor timeout in seconds (§5: "default 30s").
    #[serde(default = "default_timeout_secs")]
    pub file_timeout_secs: u64,

    /// Extractor allow-list by name (`"php"`, `"javascript"`, `"route"`,
    /// `"metadata"`). Empty means "all registered extractors".
    #[serde(default)]
    pub extractor_allow_list: Vec<String>,

    /// Per-language enable flags, defaulting to enabled when absent.
    #[serde(default)]
    pub language_overrides: HashMap<String, bool>,

    /// Directories scanned for metadata JSON (§6.2, §C.1). Relative to the
    /// repository root.
    #[serde(default = "default_metadata_roots")]
    pub metadata_roots: Vec<String>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            version: default_version(),
            ignore_globs: default_ignore_globs(),
            batch_size: default_batch_size(),
            worker_count: default_worker_count(),
            file_timeout_secs: default_timeout_secs(),
            extractor_allow_list: Vec::new(),
            language_overrides: HashMap::new(),
            metadata_roots: default_metadata_roots(),
        }
    }
}

impl IndexOptions {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn is_language_enabled(&self, language: Language) -> bool {
        self.language_overrides
            .get(language.as_str())
            .copied()
            .unwrap_or(true)
    }

    pub fn is_extractor_enabled(&self, name: &str) -> bool {
        self.extractor_allow_list.is_empty() || self.extractor_allow_list.iter().any(|n| n == name)
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_ignore_globs() -> Vec<String> {
    vec![
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/vendor/**".to_string(),
    ]
}

fn default_batch_size() -> usize {
    100
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_metadata_roots() -> Vec<String> {
    vec!["**/Resources/metadata".to_string(), "**/Custom/Resources".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq as pa_eq;

    #[test]
    fn default_options_match_spec_defaults() {
        let opts = IndexOptions::default();
        assert_eq!(opts.file_timeout_secs, 30);
        assert!(opts.batch_size >= 50 && opts.batch_size <= 200);
        assert!(opts.worker_count >= 1);
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let opts = IndexOptions::from_yaml("{}").unwrap();
        assert_eq!(opts.version, "1.0");
        assert_eq!(opts.batch_size, default_batch_size());
    }

    #[test]
    fn partial_yaml_overrides_batch_size_only() {
        let opts = IndexOptions::from_yaml("batch_size: 250\n").unwrap();
        assert_eq!(opts.batch_size, 250);
        assert_eq!(opts.worker_count, default_worker_count());
    }

    #[test]
    fn is_language_enabled_defaults_true() {
        let opts = IndexOptions::default();
        assert!(opts.is_language_enabled(Language::Php));
        assert!(opts.is_language_enabled(Language::JavaScript));
    }

    #[test]
    fn is_language_enabled_honors_override() {
        let mut opts = IndexOptions::default();
        opts.language_overrides.insert("javascript".to_string(), false);
        assert!(!opts.is_language_enabled(Language::JavaScript));
        assert!(opts.is_language_enabled(Language::Php));
    }

    #[test]
    fn extractor_allow_list_empty_means_all_enabled() {
        let opts = IndexOptions::default();
        assert!(opts.is_extractor_enabled("php"));
        assert!(opts.is_extractor_enabled("anything"));
    }

    #[test]
    fn extractor_allow_list_restricts_to_named_extractors() {
        let mut opts = IndexOptions::default();
        opts.extractor_allow_list = vec!["php".to_string()];
        assert!(opts.is_extractor_enabled("php"));
        assert!(!opts.is_extractor_enabled("javascript"));
    }

    #[test]
    fn yaml_round_trip_preserves_ignore_globs() {
        let opts = IndexOptions::default();
        let yaml = opts.to_yaml().unwrap();
        let back = IndexOptions::from_yaml(&yaml).unwrap();
        pa_eq!(opts.ignore_globs, back.ignore_globs);
    }

    #[test]
    fn invalid_yaml_returns_error() {
        let result = IndexOptions::from_yaml("{{not valid");
        assert!(result.is_err());
    }
}
