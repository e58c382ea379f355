//! Entity models for the media index.
//!
//! All ids are store-assigned rowids. A row that has not been inserted yet,
//! or a parent reference that could not be resolved, carries [`UNKNOWN_ID`].

use serde::{Deserialize, Serialize};

/// Sentinel for an unassigned or unresolved id.
///
/// Comparisons throughout the crate use `<= UNKNOWN_ID`, which assumes the
/// sentinel is the only non-positive id value.
pub const UNKNOWN_ID: i64 = -1;

/// Number of rows covered by one browse page.
///
/// Shared with the paged-browse layer; group boundaries are only meaningful
/// for a reader that pages with the same size.
pub const GROUP_PAGE_SIZE: i64 = 400;

/// One file or directory discovered on a device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub id: i64,
    /// Id of the parent directory's row, [`UNKNOWN_ID`] if the parent was
    /// not indexed before this entry.
    pub parent_path_id: i64,
    pub parent_path_string: String,
    pub name: String,
    pub is_directory: bool,
    pub last_modified_ms: i64,
}

/// An artist row. Identity key: `name`, case-sensitive.
///
/// The two role flags are independent; one row may serve as both plain
/// artist and album artist, and a name never occupies two rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub sort_name: String,
    pub is_album_artist: bool,
    pub is_compilation_artist: bool,
}

/// An album row. Identity key: `(name, parent_artist_id)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub name: String,
    pub sort_name: String,
    pub parent_artist_id: i64,
    pub album_art_uri: Option<String>,
    pub album_art_source_uri: Option<String>,
    pub has_folder_image: bool,
}

/// A track row. No identity reuse: every scanned file produces a new row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    pub name: String,
    pub sort_name: String,
    pub parent_artist_id: i64,
    pub parent_album_artist_id: i64,
    pub parent_album_id: i64,
    pub track_num: Option<i64>,
    pub disc_num: Option<i64>,
    pub album_art_uri: Option<String>,
    pub year_epoch_ms: Option<i64>,
    pub file_uri: String,
    pub last_modified_ms: i64,
    pub duration_ms: i64,
}

/// The entity kind a page-index group covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKind {
    Track,
    Album,
    Artist,
}

impl GroupKind {
    pub const ALL: [GroupKind; 3] = [GroupKind::Track, GroupKind::Album, GroupKind::Artist];

    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Track => "TRACK",
            GroupKind::Album => "ALBUM",
            GroupKind::Artist => "ARTIST",
        }
    }
}

/// One browse page: a contiguous id range covering at most
/// [`GROUP_PAGE_SIZE`] rows of one kind in natural sort order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub group_index: i64,
    pub start_id: i64,
    pub end_id: i64,
}
