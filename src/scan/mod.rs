//! Scan orchestration: walks one device and reconciles its index.
//!
//! The entity store is the only shared mutable resource; the whole
//! populate-through-cleanup sequence for a device runs under that device's
//! scan lock so a second scan never observes a half-reconciled state.
//! Different devices have independent database files and scan concurrently.

use crate::media_store::{MediaStore, SqliteMediaStore};
use crate::reconciler::{CleanupReport, ReconcileEngine};
use crate::sanitize;
use crate::tags::MetadataSource;
use crate::walker::DeviceWalker;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

/// Errors that can occur while scanning a device.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("Device mount not found: {0}")]
    MountNotFound(PathBuf),
}

/// A mounted removable device to index.
#[derive(Clone, Debug)]
pub struct Device {
    pub mount_path: PathBuf,
    pub volume_label: String,
}

impl Device {
    /// Describe a device by its mount path; the volume label defaults to
    /// the mount point's final component.
    pub fn new(mount_path: impl AsRef<Path>) -> Self {
        let mount_path = mount_path.as_ref().to_path_buf();
        let volume_label = mount_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            mount_path,
            volume_label,
        }
    }

    pub fn with_label(mount_path: impl AsRef<Path>, volume_label: impl Into<String>) -> Self {
        Self {
            mount_path: mount_path.as_ref().to_path_buf(),
            volume_label: volume_label.into(),
        }
    }
}

/// Summary of one device scan.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ScanReport {
    pub volume_label: String,
    pub paths_indexed: usize,
    pub tracks_indexed: usize,
    /// False when the walk was cancelled or ended early on an I/O failure;
    /// the index then reflects a partial scan.
    pub completed: bool,
    pub cancelled: bool,
    pub cleanup: CleanupReport,
}

/// Owns the per-device scan locks and runs the scan pipeline.
pub struct ScanManager {
    library_dir: PathBuf,
    locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ScanManager {
    /// Create a manager that keeps one index database per device volume
    /// under `library_dir`.
    pub fn new(library_dir: impl AsRef<Path>) -> Self {
        Self {
            library_dir: library_dir.as_ref().to_path_buf(),
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Path of the index database for a device volume.
    pub fn database_path(&self, volume_label: &str) -> PathBuf {
        self.library_dir
            .join(format!("{}.db", sanitize::encode_volume_label(volume_label)))
    }

    fn device_lock(&self, volume_label: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        Arc::clone(
            locks
                .entry(volume_label.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    /// Scan one device: walk its filesystem, reconcile every discovered
    /// entry into the device's store, clean out what the scan no longer
    /// saw, and rebuild the browse groups.
    ///
    /// A cancelled or early-terminated walk still goes through the full
    /// cleanup pass; the report's `completed` flag marks the partial scan.
    pub async fn scan_device(
        &self,
        device: &Device,
        tags: &dyn MetadataSource,
        walker: &DeviceWalker,
    ) -> Result<ScanReport, ScanError> {
        if !device.mount_path.is_dir() {
            return Err(ScanError::MountNotFound(device.mount_path.clone()));
        }

        let lock = self.device_lock(&device.volume_label);
        let _guard = lock.lock().await;

        let store: Arc<dyn MediaStore> =
            Arc::new(SqliteMediaStore::open(&self.database_path(&device.volume_label))?);
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        let mut report = ScanReport {
            volume_label: device.volume_label.clone(),
            ..ScanReport::default()
        };

        info!(
            "Scanning device {:?} mounted at {:?}",
            device.volume_label, device.mount_path
        );

        let mut walk = walker.walk(&device.mount_path);
        while let Some(descriptor) = walk.next().await {
            engine.populate_path(&descriptor)?;
            report.paths_indexed += 1;

            if descriptor.is_directory {
                continue;
            }
            if let Some((metadata, art_source)) = tags.read(&descriptor.path) {
                engine.populate_entry(&descriptor, &metadata, art_source.as_ref())?;
                report.tracks_indexed += 1;
            }
        }
        let outcome = walk.finish().await;
        report.completed = outcome.completed;
        report.cancelled = outcome.cancelled;
        if !outcome.completed {
            warn!(
                "Walk of {:?} ended early (cancelled: {}), index reflects a partial scan",
                device.volume_label, outcome.cancelled
            );
        }

        report.cleanup = engine.clean()?;
        engine.create_groups()?;

        info!(
            "Scan of {:?} done: {}",
            device.volume_label,
            serde_json::json!({
                "paths": report.paths_indexed,
                "tracks": report.tracks_indexed,
                "completed": report.completed,
                "tracks_removed": report.cleanup.tracks_removed,
                "paths_removed": report.cleanup.paths_removed,
                "albums_pruned": report.cleanup.albums_pruned,
                "artists_pruned": report.cleanup.artists_pruned,
            })
        );

        Ok(report)
    }
}
