use anyhow::{Context, Result};
use clap::Parser;
use mediadock::config::{AppConfig, CliConfig, FileConfig};
use mediadock::{DeviceWalker, LoftyTagReader, ScanManager};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Mount paths of the devices to scan.
    #[clap(required = true, value_parser = parse_path)]
    pub mounts: Vec<PathBuf>,

    /// Directory holding one index database per device volume.
    #[clap(short, long, value_parser = parse_path)]
    pub library_dir: Option<PathBuf>,

    /// Path to an optional TOML config file.
    #[clap(short, long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(
        &CliConfig {
            library_dir: cli_args.library_dir.clone(),
            mounts: cli_args.mounts.clone(),
        },
        file_config,
    )?;

    let manager = Arc::new(ScanManager::new(&config.library_dir));

    // One walker per device; ctrl-c cancels every in-flight walk, and the
    // cleanup pass that follows keeps each index consistent.
    let walkers: Vec<DeviceWalker> = config.devices.iter().map(|_| DeviceWalker::new()).collect();
    {
        let walkers = walkers.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling in-flight scans");
                for walker in &walkers {
                    walker.cancel();
                }
            }
        });
    }

    let mut handles = Vec::new();
    for (device, walker) in config.devices.iter().cloned().zip(walkers) {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            let report = manager
                .scan_device(&device, &LoftyTagReader::new(), &walker)
                .await;
            (device, report)
        }));
    }

    let mut failures = 0;
    for handle in handles {
        let (device, result) = handle.await?;
        match result {
            Ok(report) => {
                info!(
                    "{}: {} tracks indexed{}",
                    device.volume_label,
                    report.tracks_indexed,
                    if report.completed { "" } else { " (partial scan)" }
                );
            }
            Err(e) => {
                failures += 1;
                error!("Scan of {:?} failed: {}", device.volume_label, e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} device scan(s) failed", failures);
    }
    Ok(())
}
