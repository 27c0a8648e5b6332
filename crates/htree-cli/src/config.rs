//! Settings file for the `htree` tool.
//!
//! Tree geometry and output defaults are read from a TOML file so repeated
//! `generate` and `query` runs agree on block size and provider version.

use std::path::{Path, PathBuf};

use anyhow::Result;
use htree_common::constants::{
    DEFAULT_BLOCK_SIZE, DEFAULT_MAX_CHILDREN, DEFAULT_NODE_CACHE_CAPACITY,
};
use htree_storage::TreeConfig;
use serde::{Deserialize, Serialize};

/// Settings read by every `htree` subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Block size of generated trees.
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Maximum children per core node of generated trees.
    #[serde(default = "default_max_children")]
    pub max_children: usize,

    /// Provider version written by `generate` and expected by `open`.
    #[serde(default)]
    pub provider_version: i32,

    /// Nodes kept in memory while reading a tree.
    #[serde(default = "default_cache_capacity")]
    pub node_cache_capacity: usize,

    /// Output format used when `-o` is not given.
    #[serde(default = "default_format")]
    pub output_format: String,

    /// Seed used by `generate` when none is given.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

fn default_max_children() -> usize {
    DEFAULT_MAX_CHILDREN
}

fn default_cache_capacity() -> usize {
    DEFAULT_NODE_CACHE_CAPACITY
}

fn default_format() -> String {
    "table".to_string()
}

fn default_seed() -> u64 {
    42
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            max_children: default_max_children(),
            provider_version: 0,
            node_cache_capacity: default_cache_capacity(),
            output_format: default_format(),
            seed: default_seed(),
        }
    }
}

impl CliConfig {
    /// Parses a settings file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Writes the settings as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings from the first file found, or the built-in defaults.
    ///
    /// Search order:
    /// 1. ~/.config/htree/config.toml
    /// 2. ~/.htree/config.toml
    /// 3. Built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".htree").join("config.toml");
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// `htree/config.toml` under the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("htree").join("config.toml"))
    }

    /// Tree configuration for new and opened trees.
    pub fn tree_config(&self) -> TreeConfig {
        TreeConfig::default()
            .with_block_size(self.block_size)
            .with_max_children(self.max_children)
            .with_provider_version(self.provider_version)
            .with_node_cache_capacity(self.node_cache_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.block_size, 64 * 1024);
        assert_eq!(config.max_children, 50);
        assert_eq!(config.provider_version, 0);
        assert_eq!(config.output_format, "table");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = CliConfig {
            block_size: 8192,
            provider_version: 7,
            ..CliConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = CliConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
            max_children = 8
            output_format = "json"
        "#;

        let config: CliConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_children, 8);
        assert_eq!(config.output_format, "json");
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_tree_config() {
        let config = CliConfig {
            block_size: 4096,
            max_children: 3,
            provider_version: 2,
            ..CliConfig::default()
        };
        let tree = config.tree_config();
        assert_eq!(tree.block_size, 4096);
        assert_eq!(tree.max_children, 3);
        assert_eq!(tree.provider_version, 2);
        tree.validate().unwrap();
    }
}
