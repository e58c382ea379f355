//! Storage walker: per-device producer of file descriptors.
//!
//! Walks a mounted device depth-first, parent before child, emitting every
//! directory plus every audio-playable file into a bounded channel. The walk
//! runs on a blocking thread; the consumer awaits descriptors. Cancellation
//! is cooperative: a flag checked at each entry boundary, reset when the
//! walk ends so the same walker can serve a later scan.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Supported audio file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "wma", "opus"];

/// Channel capacity between the walking thread and the consumer.
const CHANNEL_CAPACITY: usize = 128;

/// One discovered file or directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub last_modified_ms: i64,
    pub is_directory: bool,
}

/// How a walk ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkOutcome {
    /// False when the walk was cancelled or hit a device I/O failure;
    /// callers must treat the scan as partial.
    pub completed: bool,
    pub cancelled: bool,
    pub entries_emitted: usize,
}

/// Check if a path has a supported audio extension.
pub fn is_supported_audio(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    ext.map(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or(false)
}

/// Reusable per-device walker with a cooperative cancellation flag.
#[derive(Clone, Default)]
pub struct DeviceWalker {
    cancel_flag: Arc<AtomicBool>,
}

impl DeviceWalker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the in-flight walk stop at its next entry boundary.
    /// At most one more descriptor may still be emitted.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    /// Start walking a device mount. Directories come before their
    /// contents; files are filtered to audio-playable extensions.
    pub fn walk(&self, root: impl AsRef<Path>) -> DeviceWalk {
        let root = root.as_ref().to_path_buf();
        let cancel_flag = Arc::clone(&self.cancel_flag);
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let handle = tokio::task::spawn_blocking(move || {
            let outcome = run_walk(&root, &cancel_flag, &tx);
            // The flag is per-walk state; clear it so the walker can be
            // reused for a future scan.
            cancel_flag.store(false, Ordering::SeqCst);
            outcome
        });

        DeviceWalk { rx, handle }
    }
}

/// An in-flight walk: a descriptor stream plus the walk's final outcome.
pub struct DeviceWalk {
    rx: mpsc::Receiver<FileDescriptor>,
    handle: JoinHandle<WalkOutcome>,
}

impl DeviceWalk {
    /// Next descriptor, or `None` once the walk has finished.
    pub async fn next(&mut self) -> Option<FileDescriptor> {
        self.rx.recv().await
    }

    /// Drain the producer task and report how the walk ended.
    pub async fn finish(self) -> WalkOutcome {
        drop(self.rx);
        self.handle.await.unwrap_or_else(|e| {
            warn!("Walker task panicked: {}", e);
            WalkOutcome::default()
        })
    }
}

fn run_walk(
    root: &Path,
    cancel_flag: &AtomicBool,
    tx: &mpsc::Sender<FileDescriptor>,
) -> WalkOutcome {
    let mut outcome = WalkOutcome {
        completed: true,
        ..WalkOutcome::default()
    };

    for entry in WalkDir::new(root).follow_links(false) {
        if cancel_flag.load(Ordering::SeqCst) {
            debug!("Walk of {:?} cancelled after {} entries", root, outcome.entries_emitted);
            outcome.completed = false;
            outcome.cancelled = true;
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // Device I/O failures end the walk early; the caller sees a
                // partial scan, not an error.
                warn!("Walk of {:?} failed: {}", root, e);
                outcome.completed = false;
                break;
            }
        };

        let is_directory = entry.file_type().is_dir();
        if !is_directory && !is_supported_audio(entry.path()) {
            continue;
        }

        let last_modified_ms = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let descriptor = FileDescriptor {
            path: entry.path().to_path_buf(),
            last_modified_ms,
            is_directory,
        };

        if tx.blocking_send(descriptor).is_err() {
            // Consumer went away; nothing left to produce for.
            outcome.completed = false;
            break;
        }
        outcome.entries_emitted += 1;
    }

    outcome
}
