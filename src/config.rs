// Configuration management for Scaleup

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::RecommendationWindow;
use crate::corpus::{OutputFormat, DEFAULT_CHUNK_SIZE};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Pieces handed to the worker pool per batch
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Worker thread count; unset means one per available core
    #[serde(default)]
    pub workers: Option<usize>,

    /// File extensions picked up when scanning directories
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Where `extract` writes the feature table
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    #[serde(default)]
    pub output_format: OutputFormat,

    #[serde(default)]
    pub recommendation: RecommendationWindow,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            workers: None,
            extensions: default_extensions(),
            output_path: default_output_path(),
            output_format: OutputFormat::default(),
            recommendation: RecommendationWindow::default(),
        }
    }
}

impl Config {
    /// Load config from disk or return default
    pub fn load_or_default(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => return config,
                    Err(e) => {
                        log::warn!("Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read config file: {}", e);
                }
            }
        }

        Self::default()
    }

    /// Save config to disk
    pub fn save(&self, config_path: &Path) -> anyhow::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(config_path, contents)?;

        Ok(())
    }
}

/// Get the config file path
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scaleup")
        .join("config.toml")
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_extensions() -> Vec<String> {
    vec!["csv".to_string(), "mid".to_string(), "midi".to_string()]
}

fn default_output_path() -> PathBuf {
    PathBuf::from("features.csv")
}
