//! Reconciliation of discovered files into the media index.
//!
//! [`ReconcileEngine::populate_entry`] resolves entity identities one file
//! at a time, [`ReconcileEngine::clean`] removes whatever the last scan no
//! longer saw, and the group builder rebuilds the paged-browse index.

mod art;
mod engine;
mod groups;
mod models;

pub use art::needs_album_art_update;
pub use engine::{CleanupReport, ReconcileEngine, COMPILATION_ARTIST_NAME};
pub use groups::{rebuild as rebuild_groups, rebuild_all as rebuild_all_groups};
pub use models::{AlbumArtSource, TrackMetadata};
