use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub clip: Option<ClipConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClipConfig {
    /// "osmconvert" or "osmosis"
    pub backend: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Path to the backend executable, if not on PATH
    pub executable: Option<PathBuf>,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
