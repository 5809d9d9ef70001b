//! `arbor` configuration, read from `.arbor/config.yaml`.

use std::path::Path;

use anyhow::{Context, Result};
use arbor_bt::TreeConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArborConfig {
    /// How demo trees are set up and driven.
    pub tree: TreeConfig,

    /// Tracing filter used when neither `RUST_LOG` nor `--verbose` is given.
    pub log_filter: Option<String>,
}

impl ArborConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load from project root (looks for .arbor/config.yaml)
    pub fn load_from_project(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".arbor/config.yaml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }
}
