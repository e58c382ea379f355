//! The reconciliation engine: turns discovered files into index rows.
//!
//! One engine instance serves one device's store for one or more scan
//! passes. Entry points are not safe for concurrent invocation; the caller
//! serializes them under the device-scoped scan lock.

use super::art::needs_album_art_update;
use super::groups;
use super::models::{AlbumArtSource, TrackMetadata};
use crate::media_store::{Album, Artist, MediaStore, PathEntry, Track, UNKNOWN_ID};
use crate::sanitize;
use crate::walker::FileDescriptor;
use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Display name identifying the synthetic compilation artist. This is an
/// internal identity key and deliberately independent of the UI locale.
pub const COMPILATION_ARTIST_NAME: &str = "Various Artists";

/// What a cleanup pass removed.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct CleanupReport {
    pub tracks_removed: usize,
    pub paths_removed: usize,
    pub albums_pruned: usize,
    pub artists_pruned: usize,
}

impl CleanupReport {
    /// True when the pass deleted anything.
    pub fn store_modified(&self) -> bool {
        self.tracks_removed > 0
            || self.paths_removed > 0
            || self.albums_pruned > 0
            || self.artists_pruned > 0
    }
}

/// Reconciles discovered files against one device's entity store.
pub struct ReconcileEngine {
    store: Arc<dyn MediaStore>,
    track_keep: HashSet<i64>,
    path_keep: HashSet<i64>,
    compilation_artist_id: Option<i64>,
}

impl ReconcileEngine {
    /// Create an engine bound to a device store. The compilation-artist id
    /// is re-resolved from the store on first use of each new instance.
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self {
            store,
            track_keep: HashSet::new(),
            path_keep: HashSet::new(),
            compilation_artist_id: None,
        }
    }

    // =========================================================================
    // Populate
    // =========================================================================

    /// Record one discovered file or directory in the path index, resolving
    /// its parent among already-recorded paths. Returns the new row's id.
    pub fn populate_path(&mut self, file: &FileDescriptor) -> Result<i64> {
        let (parent_string, name) = split_path(&file.path);

        let parent_path_id = match parent_of(&parent_string) {
            Some((grandparent, parent_name)) => self
                .store
                .find_path(&grandparent, &parent_name)?
                .unwrap_or(UNKNOWN_ID),
            None => UNKNOWN_ID,
        };

        let entry = PathEntry {
            id: UNKNOWN_ID,
            parent_path_id,
            parent_path_string: parent_string,
            name,
            is_directory: file.is_directory,
            last_modified_ms: file.last_modified_ms,
        };
        let id = self.store.insert_path(&entry)?;
        self.path_keep.insert(id);
        Ok(id)
    }

    /// Reconcile one playable audio file into the entity graph. Returns the
    /// new track row's id.
    pub fn populate_entry(
        &mut self,
        file: &FileDescriptor,
        meta: &TrackMetadata,
        art_source: Option<&AlbumArtSource>,
    ) -> Result<i64> {
        let (artist_id, album_artist_id) = self.resolve_artists(meta)?;
        let album = self.resolve_album(meta, album_artist_id, art_source)?;

        // Compilation tracks reference the album's pseudo-artist parent so
        // that pruning keeps it alive while compilation albums exist.
        let effective_album_artist_id = if meta.is_in_compilation {
            album.as_ref().map(|a| a.parent_artist_id).unwrap_or(UNKNOWN_ID)
        } else {
            album_artist_id
        };

        let title = meta.title.trim();
        let name = if title.is_empty() {
            file.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            title.to_string()
        };

        let album_art_uri = album
            .as_ref()
            .and_then(|a| a.album_art_uri.clone())
            .or_else(|| art_uri(art_source));

        let track = Track {
            id: UNKNOWN_ID,
            sort_name: sanitize::sort_key(&name),
            name,
            parent_artist_id: artist_id,
            parent_album_artist_id: effective_album_artist_id,
            parent_album_id: album.as_ref().map(|a| a.id).unwrap_or(UNKNOWN_ID),
            track_num: meta.track_num,
            disc_num: meta.disc_num,
            album_art_uri,
            year_epoch_ms: sanitize::normalize_year(&meta.year),
            file_uri: file.path.to_string_lossy().into_owned(),
            last_modified_ms: sanitize::truncate_to_seconds(file.last_modified_ms),
            duration_ms: meta.duration_ms,
        };
        let id = self.store.insert_track(&track)?;
        self.track_keep.insert(id);
        Ok(id)
    }

    /// Resolve (and where needed create) the plain-artist and album-artist
    /// rows for one track. Either id may stay at the sentinel.
    fn resolve_artists(&mut self, meta: &TrackMetadata) -> Result<(i64, i64)> {
        let artist_name = meta.artist.trim();
        let album_artist_name = meta.album_artist.trim();

        let mut artist_id = UNKNOWN_ID;
        let mut album_artist_id = UNKNOWN_ID;
        let mut existing_artist: Option<Artist> = None;
        let mut staged_artist: Option<Artist> = None;
        let mut staged_album_artist: Option<Artist> = None;

        if !artist_name.is_empty() {
            match self.store.find_artist_by_name(artist_name)? {
                Some(row) => {
                    artist_id = row.id;
                    existing_artist = Some(row);
                }
                None => {
                    staged_artist = Some(Artist {
                        id: UNKNOWN_ID,
                        name: artist_name.to_string(),
                        sort_name: sanitize::sort_key(artist_name),
                        is_album_artist: false,
                        is_compilation_artist: meta.is_in_compilation,
                    });
                }
            }
        }

        // A staged plain artist and a staged album artist with the same name
        // collapse into this single branch: one row serves both roles.
        let mut album_artist_is_artist = false;
        if !album_artist_name.is_empty() && album_artist_name == artist_name {
            album_artist_is_artist = true;
            if let Some(row) = &existing_artist {
                if !row.is_album_artist {
                    self.store.mark_album_artist(row.id)?;
                }
                album_artist_id = row.id;
            } else if let Some(staged) = staged_artist.as_mut() {
                staged.is_album_artist = true;
            }
        } else if !meta.is_in_compilation && !album_artist_name.is_empty() {
            match self.store.find_artist_by_name(album_artist_name)? {
                Some(row) => {
                    if !row.is_album_artist {
                        self.store.mark_album_artist(row.id)?;
                    }
                    album_artist_id = row.id;
                }
                None => {
                    staged_album_artist = Some(Artist {
                        id: UNKNOWN_ID,
                        name: album_artist_name.to_string(),
                        sort_name: sanitize::sort_key(album_artist_name),
                        is_album_artist: true,
                        is_compilation_artist: false,
                    });
                }
            }
        }

        // Insert staged rows now, artist before album artist.
        if let Some(staged) = &staged_artist {
            artist_id = self.store.insert_artist(staged)?;
            if album_artist_is_artist {
                album_artist_id = artist_id;
            }
        }
        if let Some(staged) = &staged_album_artist {
            album_artist_id = self.store.insert_artist(staged)?;
        }

        // Without an explicit album artist, a non-compilation track's plain
        // artist doubles as its album artist.
        if album_artist_name.is_empty() && !meta.is_in_compilation && album_artist_id <= UNKNOWN_ID
        {
            album_artist_id = artist_id;
        }

        Ok((artist_id, album_artist_id))
    }

    /// Resolve the album row a track files under, replacing it first when
    /// its art reference went stale.
    fn resolve_album(
        &mut self,
        meta: &TrackMetadata,
        album_artist_id: i64,
        art_source: Option<&AlbumArtSource>,
    ) -> Result<Option<Album>> {
        let album_name = meta.album.trim();
        if album_name.is_empty() {
            return Ok(None);
        }

        let parent_artist_id = if meta.is_in_compilation {
            self.compilation_artist_id()?
        } else {
            album_artist_id
        };

        if let Some(existing) = self.store.find_album(album_name, parent_artist_id)? {
            if needs_album_art_update(Some(&existing), art_source) {
                debug!(
                    "Album art for {:?} went stale ({:?} -> {:?}), replacing row",
                    existing.name, existing.album_art_source_uri, art_source
                );
                self.store.delete_album(existing.id)?;
            } else {
                return Ok(Some(existing));
            }
        }

        let mut album = Album {
            id: UNKNOWN_ID,
            name: album_name.to_string(),
            sort_name: sanitize::sort_key(album_name),
            parent_artist_id,
            album_art_uri: art_uri(art_source),
            album_art_source_uri: art_uri(art_source),
            has_folder_image: art_source.map(|s| s.is_folder_image).unwrap_or(false),
        };
        album.id = self.store.insert_album(&album)?;
        Ok(Some(album))
    }

    // =========================================================================
    // Compilation artist
    // =========================================================================

    /// Id of the synthetic compilation artist, created on first use and
    /// cached for this engine instance.
    pub fn compilation_artist_id(&mut self) -> Result<i64> {
        if let Some(id) = self.compilation_artist_id {
            return Ok(id);
        }
        let id = match self.store.find_artist_by_name(COMPILATION_ARTIST_NAME)? {
            Some(row) => row.id,
            None => self.store.insert_artist(&Artist {
                id: UNKNOWN_ID,
                name: COMPILATION_ARTIST_NAME.to_string(),
                sort_name: sanitize::sort_key(COMPILATION_ARTIST_NAME),
                is_album_artist: true,
                is_compilation_artist: false,
            })?,
        };
        self.compilation_artist_id = Some(id);
        Ok(id)
    }

    /// Non-creating variant for read paths that must not mutate the store.
    pub fn peek_compilation_artist(&self) -> Result<Option<Artist>> {
        self.store.find_artist_by_name(COMPILATION_ARTIST_NAME)
    }

    // =========================================================================
    // Cleanup
    // =========================================================================

    /// Remove every row no longer backed by a live file, then prune albums
    /// and artists nothing references. Clears both keep-sets.
    pub fn clean(&mut self) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();

        // Tracks and paths first; pruning counts depend on the post-deletion
        // track set.
        for id in self.store.all_track_ids()? {
            if !self.track_keep.contains(&id) {
                self.store.delete_track(id)?;
                report.tracks_removed += 1;
            }
        }
        self.track_keep.clear();

        for id in self.store.all_path_ids()? {
            if !self.path_keep.contains(&id) {
                self.store.delete_path(id)?;
                report.paths_removed += 1;
            }
        }
        self.path_keep.clear();

        for album in self.store.all_albums()? {
            if self.store.count_tracks_for_album(album.id)? == 0 {
                self.store.delete_album(album.id)?;
                report.albums_pruned += 1;
            }
        }

        for artist in self.store.all_artists()? {
            if self.store.count_tracks_for_artist(artist.id)? == 0 {
                self.store.delete_artist(artist.id)?;
                report.artists_pruned += 1;
                if self.compilation_artist_id == Some(artist.id) {
                    // The cached id now dangles; re-resolve on next use.
                    self.compilation_artist_id = None;
                }
            }
        }

        Ok(report)
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// Rebuild the paged-browse index for all three entity kinds.
    pub fn create_groups(&self) -> Result<()> {
        groups::rebuild_all(self.store.as_ref())
    }
}

/// Split a path into its parent string and final component. A path with no
/// parent keeps its full rendering as the name.
fn split_path(path: &Path) -> (String, String) {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.to_string_lossy().into_owned(),
    };
    let parent = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    (parent, name)
}

/// Split an already-rendered parent string into its own parent and name,
/// for looking the parent up among recorded paths.
fn parent_of(parent_string: &str) -> Option<(String, String)> {
    if parent_string.is_empty() {
        return None;
    }
    let path = Path::new(parent_string);
    let name = path.file_name()?.to_string_lossy().into_owned();
    let grandparent = path.parent()?.to_string_lossy().into_owned();
    Some((grandparent, name))
}

fn art_uri(art_source: Option<&AlbumArtSource>) -> Option<String> {
    art_source
        .map(|s| s.uri.clone())
        .filter(|uri| !uri.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_store::{GroupKind, SqliteMediaStore};
    use std::path::PathBuf;

    fn store() -> Arc<dyn MediaStore> {
        Arc::new(SqliteMediaStore::in_memory().unwrap())
    }

    fn file(path: &str) -> FileDescriptor {
        FileDescriptor {
            path: PathBuf::from(path),
            last_modified_ms: 1_700_000_000_500,
            is_directory: false,
        }
    }

    fn dir(path: &str) -> FileDescriptor {
        FileDescriptor {
            path: PathBuf::from(path),
            last_modified_ms: 1_700_000_000_500,
            is_directory: true,
        }
    }

    fn meta(title: &str, artist: &str, album: &str) -> TrackMetadata {
        TrackMetadata {
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            duration_ms: 200_000,
            ..TrackMetadata::default()
        }
    }

    fn art(uri: &str) -> AlbumArtSource {
        AlbumArtSource {
            uri: uri.to_string(),
            is_folder_image: false,
        }
    }

    #[test]
    fn test_artist_identity_reuse() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        engine
            .populate_entry(&file("/m/a1.mp3"), &meta("A1", "X", "Alb"), None)
            .unwrap();
        engine
            .populate_entry(&file("/m/a2.mp3"), &meta("A2", "X", "Alb"), None)
            .unwrap();

        let artists = store.all_artists().unwrap();
        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0].name, "X");

        let tracks = store.all_tracks().unwrap();
        assert_eq!(tracks.len(), 2);
        assert!(tracks.iter().all(|t| t.parent_artist_id == artists[0].id));
    }

    #[test]
    fn test_album_artist_same_name_shares_row() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        let mut m = meta("Song", "X", "Alb");
        m.album_artist = "X".to_string();
        engine.populate_entry(&file("/m/s.mp3"), &m, None).unwrap();

        let artists = store.all_artists().unwrap();
        assert_eq!(artists.len(), 1);
        assert!(artists[0].is_album_artist);

        let track = &store.all_tracks().unwrap()[0];
        assert_eq!(track.parent_artist_id, artists[0].id);
        assert_eq!(track.parent_album_artist_id, artists[0].id);
    }

    #[test]
    fn test_album_artist_flag_set_in_place_on_existing_row() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        // First track creates X as plain artist only.
        engine
            .populate_entry(&file("/m/s1.mp3"), &meta("S1", "X", "Alb"), None)
            .unwrap();
        assert!(!store.find_artist_by_name("X").unwrap().unwrap().is_album_artist);

        // Second track names X as its album artist explicitly.
        let mut m = meta("S2", "X", "Alb");
        m.album_artist = "X".to_string();
        engine.populate_entry(&file("/m/s2.mp3"), &m, None).unwrap();

        let x = store.find_artist_by_name("X").unwrap().unwrap();
        assert!(x.is_album_artist);
        assert_eq!(store.all_artists().unwrap().len(), 1);
    }

    #[test]
    fn test_separate_album_artist_resolution() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        let mut m = meta("Song", "Feat Artist", "Alb");
        m.album_artist = "Band".to_string();
        engine.populate_entry(&file("/m/s.mp3"), &m, None).unwrap();

        let band = store.find_artist_by_name("Band").unwrap().unwrap();
        assert!(band.is_album_artist);
        let feat = store.find_artist_by_name("Feat Artist").unwrap().unwrap();
        assert!(!feat.is_album_artist);

        let track = &store.all_tracks().unwrap()[0];
        assert_eq!(track.parent_artist_id, feat.id);
        assert_eq!(track.parent_album_artist_id, band.id);

        // The album files under the album artist, not the plain artist.
        let album = store.find_album("Alb", band.id).unwrap().unwrap();
        assert_eq!(track.parent_album_id, album.id);
    }

    #[test]
    fn test_plain_artist_doubles_as_album_artist_by_default() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        engine
            .populate_entry(&file("/m/s.mp3"), &meta("Song", "X", "Alb"), None)
            .unwrap();

        let x = store.find_artist_by_name("X").unwrap().unwrap();
        let track = &store.all_tracks().unwrap()[0];
        assert_eq!(track.parent_album_artist_id, x.id);
        assert!(store.find_album("Alb", x.id).unwrap().is_some());
    }

    #[test]
    fn test_compilation_scenario() {
        // Tracks [A1 by X, A2 by X, A3 by Y (compilation)]: two artist rows
        // without the compilation flag (X and Various Artists), three tracks
        // with correct parents.
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        engine
            .populate_entry(&file("/m/a1.mp3"), &meta("A1", "X", "XAlb"), None)
            .unwrap();
        engine
            .populate_entry(&file("/m/a2.mp3"), &meta("A2", "X", "XAlb"), None)
            .unwrap();
        let mut m = meta("A3", "Y", "Hits Comp");
        m.is_in_compilation = true;
        engine.populate_entry(&file("/m/a3.mp3"), &m, None).unwrap();

        let artists = store.all_artists().unwrap();
        let real: Vec<_> = artists.iter().filter(|a| !a.is_compilation_artist).collect();
        assert_eq!(real.len(), 2);
        assert!(real.iter().any(|a| a.name == "X"));
        assert!(real.iter().any(|a| a.name == COMPILATION_ARTIST_NAME));

        let y = store.find_artist_by_name("Y").unwrap().unwrap();
        assert!(y.is_compilation_artist);

        let va = store
            .find_artist_by_name(COMPILATION_ARTIST_NAME)
            .unwrap()
            .unwrap();
        let comp_album = store.find_album("Hits Comp", va.id).unwrap().unwrap();

        let tracks = store.all_tracks().unwrap();
        assert_eq!(tracks.len(), 3);
        let a3 = tracks.iter().find(|t| t.name == "A3").unwrap();
        assert_eq!(a3.parent_artist_id, y.id);
        assert_eq!(a3.parent_album_artist_id, va.id);
        assert_eq!(a3.parent_album_id, comp_album.id);
    }

    #[test]
    fn test_compilation_artist_cached_per_instance() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        assert!(engine.peek_compilation_artist().unwrap().is_none());
        let id = engine.compilation_artist_id().unwrap();
        assert_eq!(engine.compilation_artist_id().unwrap(), id);
        assert_eq!(
            engine.peek_compilation_artist().unwrap().unwrap().id,
            id
        );

        // A fresh engine re-resolves the same row instead of duplicating it.
        let mut engine2 = ReconcileEngine::new(Arc::clone(&store));
        assert_eq!(engine2.compilation_artist_id().unwrap(), id);
        assert_eq!(store.all_artists().unwrap().len(), 1);
    }

    #[test]
    fn test_art_extension_change_replaces_album_row() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        engine
            .populate_entry(
                &file("/m/s.mp3"),
                &meta("Song", "X", "Alb"),
                Some(&art("/m/art.jpg")),
            )
            .unwrap();
        let x = store.find_artist_by_name("X").unwrap().unwrap();
        let first = store.find_album("Alb", x.id).unwrap().unwrap();

        engine
            .populate_entry(
                &file("/m/s.mp3"),
                &meta("Song", "X", "Alb"),
                Some(&art("/m/art.png")),
            )
            .unwrap();

        let second = store.find_album("Alb", x.id).unwrap().unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(second.album_art_source_uri.as_deref(), Some("/m/art.png"));
        assert_eq!(store.all_albums().unwrap().len(), 1);
    }

    #[test]
    fn test_unchanged_art_reuses_album_row() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        engine
            .populate_entry(
                &file("/m/s1.mp3"),
                &meta("S1", "X", "Alb"),
                Some(&art("/m/art.jpg")),
            )
            .unwrap();
        engine
            .populate_entry(
                &file("/m/s2.mp3"),
                &meta("S2", "X", "Alb"),
                Some(&art("/m/art.jpg")),
            )
            .unwrap();

        assert_eq!(store.all_albums().unwrap().len(), 1);
    }

    #[test]
    fn test_populate_path_resolves_parent_chain() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        let root_id = engine.populate_path(&dir("/mnt/usb")).unwrap();
        let album_id = engine.populate_path(&dir("/mnt/usb/album")).unwrap();
        engine.populate_path(&file("/mnt/usb/album/t.mp3")).unwrap();

        assert_eq!(store.find_path("/mnt/usb", "album").unwrap(), Some(album_id));
        assert_eq!(store.find_path("/mnt", "usb").unwrap(), Some(root_id));

        // A child visited before its parent keeps the sentinel.
        let orphan_id = engine.populate_path(&file("/mnt/sd/t.mp3")).unwrap();
        assert!(orphan_id > 0);
    }

    #[test]
    fn test_clean_removes_unseen_rows_and_prunes() {
        // Scan three tracks, then rescan only one: cleanup removes the two
        // missing tracks and prunes the album/artist left with zero tracks.
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        engine
            .populate_entry(&file("/m/a1.mp3"), &meta("A1", "X", "XAlb"), None)
            .unwrap();
        engine
            .populate_entry(&file("/m/b1.mp3"), &meta("B1", "Y", "YAlb"), None)
            .unwrap();
        engine
            .populate_entry(&file("/m/b2.mp3"), &meta("B2", "Y", "YAlb"), None)
            .unwrap();
        let report = engine.clean().unwrap();
        assert!(!report.store_modified());

        // Second pass sees only A1.
        engine
            .populate_entry(&file("/m/a1.mp3"), &meta("A1", "X", "XAlb"), None)
            .unwrap();
        let report = engine.clean().unwrap();

        assert!(report.store_modified());
        // The three first-pass rows are all gone (A1 got a fresh row).
        assert_eq!(report.tracks_removed, 3);
        assert_eq!(report.albums_pruned, 1);
        assert_eq!(report.artists_pruned, 1);

        let tracks = store.all_tracks().unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "A1");
        assert!(store.find_artist_by_name("Y").unwrap().is_none());
        let x = store.find_artist_by_name("X").unwrap().unwrap();
        assert!(store.find_album("XAlb", x.id).unwrap().is_some());
        assert!(store.find_album("YAlb", x.id).unwrap().is_none());
    }

    #[test]
    fn test_clean_keepset_tolerates_duplicate_scans() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        // Same device scanned twice without cleanup in between: both rows
        // are in the keep-set and both survive the single cleanup.
        engine
            .populate_entry(&file("/m/a.mp3"), &meta("A", "X", ""), None)
            .unwrap();
        engine
            .populate_entry(&file("/m/a.mp3"), &meta("A", "X", ""), None)
            .unwrap();

        let report = engine.clean().unwrap();
        assert_eq!(report.tracks_removed, 0);
        assert_eq!(store.all_tracks().unwrap().len(), 2);
    }

    #[test]
    fn test_clean_prunes_stale_compilation_artist_and_invalidates_cache() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        let mut m = meta("C1", "Y", "Comp");
        m.is_in_compilation = true;
        engine.populate_entry(&file("/m/c1.mp3"), &m, None).unwrap();
        engine.clean().unwrap();
        assert!(engine.peek_compilation_artist().unwrap().is_some());

        // Next pass has no compilation tracks at all.
        engine
            .populate_entry(&file("/m/a.mp3"), &meta("A", "X", "XAlb"), None)
            .unwrap();
        engine.clean().unwrap();
        assert!(engine.peek_compilation_artist().unwrap().is_none());

        // Re-resolving creates a fresh row rather than using the dead id.
        let mut m = meta("C2", "Z", "Comp2");
        m.is_in_compilation = true;
        engine.populate_entry(&file("/m/c2.mp3"), &m, None).unwrap();
        let va = store
            .find_artist_by_name(COMPILATION_ARTIST_NAME)
            .unwrap()
            .unwrap();
        let album = store.find_album("Comp2", va.id).unwrap().unwrap();
        assert_eq!(album.parent_artist_id, va.id);
    }

    #[test]
    fn test_rescan_is_idempotent_on_graph_shape() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));

        let scan = |engine: &mut ReconcileEngine| {
            engine
                .populate_entry(&file("/m/a1.mp3"), &meta("A1", "X", "XAlb"), None)
                .unwrap();
            let mut m = meta("A3", "Y", "Comp");
            m.is_in_compilation = true;
            engine.populate_entry(&file("/m/a3.mp3"), &m, None).unwrap();
            engine.clean().unwrap();
        };

        scan(&mut engine);
        let names = |store: &Arc<dyn MediaStore>| {
            let mut artists: Vec<_> = store
                .all_artists()
                .unwrap()
                .into_iter()
                .map(|a| (a.name, a.is_album_artist, a.is_compilation_artist))
                .collect();
            artists.sort();
            let mut albums: Vec<_> = store
                .all_albums()
                .unwrap()
                .into_iter()
                .map(|a| a.name)
                .collect();
            albums.sort();
            let mut tracks: Vec<_> = store
                .all_tracks()
                .unwrap()
                .into_iter()
                .map(|t| t.name)
                .collect();
            tracks.sort();
            (artists, albums, tracks)
        };
        let first = names(&store);
        scan(&mut engine);
        assert_eq!(names(&store), first);
    }

    #[test]
    fn test_create_groups_delegates_to_builder() {
        let store = store();
        let mut engine = ReconcileEngine::new(Arc::clone(&store));
        engine
            .populate_entry(&file("/m/a.mp3"), &meta("A", "X", "Alb"), None)
            .unwrap();
        engine.create_groups().unwrap();

        assert_eq!(store.groups(GroupKind::Track).unwrap().len(), 1);
        assert_eq!(store.groups(GroupKind::Album).unwrap().len(), 1);
        assert_eq!(store.groups(GroupKind::Artist).unwrap().len(), 1);
    }
}
