//! YAML configuration file support for menumatch.
//!
//! One file describes every stage: the embedding provider, segmentation,
//! index build, resolver gates, order assembly and where the catalog index is
//! stored. Every section is optional and falls back to its defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "burger bar"
//!
//! semantic:
//!   mode: "api"
//!   model_name: "bge-small-en-v1.5"
//!   api_url: "https://api-inference.huggingface.co/models/BAAI/bge-small-en-v1.5"
//!   api_provider: "hf"
//!   api_timeout_secs: 10
//!
//! segment:
//!   delimiter: "also"
//!   quantity_text: "keep_leading_number"
//!
//! build:
//!   concurrency: 8
//!   max_modifiers_per_item: 12
//!
//! resolver:
//!   top_categories: 3
//!   category_gate: { type: "softmax", threshold: 0.05 }
//!   item_gate: { type: "raw", threshold: 0.05 }
//!   modifier_gate: { type: "open" }
//!   item_collision: "later_rank_wins"
//!
//! assembler:
//!   max_concurrency: 4
//!   clause_timeout_ms: 10000
//!
//! store:
//!   backend: "redb"
//!   path: "/var/lib/menumatch/catalog.redb"
//!   compression: { codec: "zstd", level: 3 }
//! ```

use std::fs;
use std::path::Path;

use canonical::SegmentConfig;
use index::{BackendConfig, BuildOptions, CompressionConfig};
use matcher::ResolverConfig;
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AssemblerConfig;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for the whole menumatch pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct MenumatchConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub semantic: SemanticConfig,

    #[serde(default)]
    pub segment: SegmentConfig,

    #[serde(default)]
    pub build: BuildOptions,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub assembler: AssemblerConfig,

    #[serde(default)]
    pub store: StoreYamlConfig,
}

impl MenumatchConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: MenumatchConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.semantic
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("semantic: {e}")))?;
        self.segment
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("segment: {e}")))?;
        self.build
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("build: {e}")))?;
        self.resolver
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("resolver: {e}")))?;
        self.assembler
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("assembler: {e}")))?;
        self.store.validate()?;

        Ok(())
    }

    /// Semantic section with `MENUMATCH_API_URL` / `MENUMATCH_API_TOKEN` applied.
    pub fn semantic_with_env(&self) -> SemanticConfig {
        self.semantic.clone().with_env_overrides()
    }
}

impl Default for MenumatchConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            semantic: SemanticConfig::default(),
            segment: SegmentConfig::default(),
            build: BuildOptions::default(),
            resolver: ResolverConfig::default(),
            assembler: AssemblerConfig::default(),
            store: StoreYamlConfig::default(),
        }
    }
}

/// Where the catalog index lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreYamlConfig {
    /// `"in_memory"` or `"redb"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Database file, required for `redb`.
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub compression: CompressionConfig,
}

impl StoreYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.backend.as_str() {
            "in_memory" => Ok(()),
            "redb" => match self.path.as_deref().map(str::trim) {
                Some(path) if !path.is_empty() => Ok(()),
                _ => Err(ConfigLoadError::Validation(
                    "store: path is required for the redb backend".into(),
                )),
            },
            other => Err(ConfigLoadError::Validation(format!(
                "store: unknown backend `{other}` (expected \"in_memory\" or \"redb\")"
            ))),
        }
    }

    pub fn backend_config(&self) -> BackendConfig {
        match (self.backend.as_str(), &self.path) {
            ("redb", Some(path)) => BackendConfig::redb(path.clone()),
            _ => BackendConfig::in_memory(),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.backend == "redb"
    }
}

impl Default for StoreYamlConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
            compression: CompressionConfig::default(),
        }
    }
}

fn default_backend() -> String {
    "in_memory".to_string()
}
