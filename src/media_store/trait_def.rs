//! MediaStore trait definition.
//!
//! The reconciliation engine holds the store as a capability reference; a
//! store that cannot be opened is an explicit error at construction time,
//! never a silently-absent handle.

use super::models::{Album, Artist, Group, GroupKind, PathEntry, Track};
use anyhow::Result;

/// Storage backend for one device's media index.
pub trait MediaStore: Send + Sync {
    // =========================================================================
    // Artists
    // =========================================================================

    /// Point lookup by the artist identity key (exact, case-sensitive name).
    fn find_artist_by_name(&self, name: &str) -> Result<Option<Artist>>;

    /// Insert a new artist row; the row's `id` field is ignored.
    /// Returns the assigned id.
    fn insert_artist(&self, artist: &Artist) -> Result<i64>;

    /// Set the album-artist role flag on an existing row.
    fn mark_album_artist(&self, id: i64) -> Result<()>;

    fn delete_artist(&self, id: i64) -> Result<()>;

    fn all_artists(&self) -> Result<Vec<Artist>>;

    // =========================================================================
    // Albums
    // =========================================================================

    /// Point lookup by the album identity key `(name, parent_artist_id)`.
    fn find_album(&self, name: &str, parent_artist_id: i64) -> Result<Option<Album>>;

    /// Insert a new album row; returns the assigned id.
    fn insert_album(&self, album: &Album) -> Result<i64>;

    fn delete_album(&self, id: i64) -> Result<()>;

    fn all_albums(&self) -> Result<Vec<Album>>;

    // =========================================================================
    // Tracks
    // =========================================================================

    /// Insert a new track row; returns the assigned id.
    fn insert_track(&self, track: &Track) -> Result<i64>;

    fn delete_track(&self, id: i64) -> Result<()>;

    fn all_track_ids(&self) -> Result<Vec<i64>>;

    fn all_tracks(&self) -> Result<Vec<Track>>;

    /// Tracks whose id falls in `[start_id, end_id]`, natural sort order.
    /// This is the query shape the group boundaries exist for.
    fn tracks_in_id_range(&self, start_id: i64, end_id: i64) -> Result<Vec<Track>>;

    /// Number of tracks filed under an album.
    fn count_tracks_for_album(&self, album_id: i64) -> Result<i64>;

    /// Number of tracks referencing an artist as plain artist or album
    /// artist.
    fn count_tracks_for_artist(&self, artist_id: i64) -> Result<i64>;

    // =========================================================================
    // Paths
    // =========================================================================

    /// Insert a new path row; returns the assigned id.
    fn insert_path(&self, entry: &PathEntry) -> Result<i64>;

    /// Look up an already-inserted path row by its parent string and name.
    fn find_path(&self, parent_path_string: &str, name: &str) -> Result<Option<i64>>;

    fn delete_path(&self, id: i64) -> Result<()>;

    fn all_path_ids(&self) -> Result<Vec<i64>>;

    // =========================================================================
    // Groups
    // =========================================================================

    /// Delete every group row of one kind.
    fn delete_groups(&self, kind: GroupKind) -> Result<()>;

    fn insert_group(&self, kind: GroupKind, group: &Group) -> Result<()>;

    /// All groups of one kind, ordered by group index.
    fn groups(&self, kind: GroupKind) -> Result<Vec<Group>>;

    /// Total surviving row count of one kind.
    fn entity_count(&self, kind: GroupKind) -> Result<i64>;

    /// Id of the single row at `offset` in the kind's natural sort order.
    fn entity_id_at(&self, kind: GroupKind, offset: i64) -> Result<Option<i64>>;
}
