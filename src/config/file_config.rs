use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub library_dir: Option<String>,

    // Per-mount settings
    pub devices: Option<Vec<DeviceConfig>>,
}

/// Per-device overrides, for mounts whose directory name is not the volume
/// label the index should be filed under.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DeviceConfig {
    pub mount_path: Option<String>,
    pub label: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
