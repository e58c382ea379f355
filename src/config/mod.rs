mod file_config;

pub use file_config::{DeviceConfig, FileConfig};

use crate::scan::Device;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub library_dir: Option<PathBuf>,
    pub mounts: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding one index database per device volume.
    pub library_dir: PathBuf,
    /// Devices to scan, with resolved volume labels.
    pub devices: Vec<Device>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let library_dir = file
            .library_dir
            .map(PathBuf::from)
            .or_else(|| cli.library_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("library_dir must be specified via --library-dir or in config file")
            })?;

        if !library_dir.exists() {
            bail!("Library directory does not exist: {:?}", library_dir);
        }
        if !library_dir.is_dir() {
            bail!("library_dir is not a directory: {:?}", library_dir);
        }

        if cli.mounts.is_empty() {
            bail!("At least one device mount path is required");
        }

        let overrides = file.devices.unwrap_or_default();
        let devices = cli
            .mounts
            .iter()
            .map(|mount| {
                let label = overrides.iter().find_map(|o| {
                    match (o.mount_path.as_deref(), o.label.as_deref()) {
                        (Some(path), Some(label)) if PathBuf::from(path) == *mount => {
                            Some(label.to_string())
                        }
                        _ => None,
                    }
                });
                match label {
                    Some(label) => Device::with_label(mount, label),
                    None => Device::new(mount),
                }
            })
            .collect();

        Ok(Self {
            library_dir,
            devices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn cli(library_dir: &Path, mounts: &[&str]) -> CliConfig {
        CliConfig {
            library_dir: Some(library_dir.to_path_buf()),
            mounts: mounts.iter().map(PathBuf::from).collect(),
        }
    }

    #[test]
    fn test_resolve_requires_library_dir() {
        let result = AppConfig::resolve(
            &CliConfig {
                library_dir: None,
                mounts: vec![PathBuf::from("/mnt/usb")],
            },
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_requires_mounts() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::resolve(&cli(dir.path(), &[]), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_file_config_overrides_label() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileConfig {
            library_dir: None,
            devices: Some(vec![DeviceConfig {
                mount_path: Some("/mnt/usb".to_string()),
                label: Some("RED STICK".to_string()),
            }]),
        };

        let config =
            AppConfig::resolve(&cli(dir.path(), &["/mnt/usb", "/mnt/sd"]), Some(file)).unwrap();

        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].volume_label, "RED STICK");
        assert_eq!(config.devices[1].volume_label, "sd");
    }

    #[test]
    fn test_file_library_dir_wins_over_cli() {
        let cli_dir = tempfile::tempdir().unwrap();
        let file_dir = tempfile::tempdir().unwrap();
        let file = FileConfig {
            library_dir: Some(file_dir.path().to_string_lossy().into_owned()),
            devices: None,
        };

        let config = AppConfig::resolve(&cli(cli_dir.path(), &["/mnt/usb"]), Some(file)).unwrap();
        assert_eq!(config.library_dir, file_dir.path());
    }
}
