//! Input value objects consumed by the reconciliation engine.
//!
//! Metadata extraction happens outside the engine; these carry whatever the
//! extractor produced, raw. Blank fields mean "not tagged".

use serde::{Deserialize, Serialize};

/// Extracted tag metadata for one audio file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album_artist: String,
    pub album: String,
    pub track_num: Option<i64>,
    pub disc_num: Option<i64>,
    /// Raw year string as tagged; normalized by the engine.
    pub year: String,
    pub duration_ms: i64,
    pub is_in_compilation: bool,
}

/// Reference to the on-disk source of an album's art.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlbumArtSource {
    pub uri: String,
    /// True when the art came from a folder image rather than an embedded tag.
    pub is_folder_image: bool,
}
