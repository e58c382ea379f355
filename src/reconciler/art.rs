//! Album-art staleness detection.

use super::models::AlbumArtSource;
use crate::media_store::Album;

/// Decide whether an existing album's art reference must be refreshed
/// because its source changed.
///
/// Rules, in order:
/// - no existing album or no new source: nothing to refresh
/// - stored source URI equals the new one: up to date
/// - one side empty, the other not: art was added or removed
/// - both non-empty and different: compare with the file extension
///   stripped. Different base names mean a genuinely different file and the
///   stored reference stands; an identical base name with a different
///   extension means the source was transcoded to another container and the
///   reference must be refreshed.
pub fn needs_album_art_update(existing: Option<&Album>, new_source: Option<&AlbumArtSource>) -> bool {
    let (Some(album), Some(source)) = (existing, new_source) else {
        return false;
    };
    let stored = album.album_art_source_uri.as_deref().unwrap_or("");
    let incoming = source.uri.as_str();
    if stored == incoming {
        return false;
    }
    if stored.is_empty() != incoming.is_empty() {
        return true;
    }
    strip_extension(stored) == strip_extension(incoming)
}

/// Everything up to the last dot. A dot elsewhere in the URI shifts the
/// split point; callers rely on this exact behavior.
fn strip_extension(uri: &str) -> &str {
    match uri.rfind('.') {
        Some(index) => &uri[..index],
        None => uri,
    }
}
