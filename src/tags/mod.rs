//! Tag-reading collaborator for the scan pipeline.
//!
//! The reconciliation engine consumes already-extracted metadata values;
//! this module produces them. Built on lofty, with a filename-derived
//! fallback for files whose tags cannot be read.

use crate::reconciler::{AlbumArtSource, TrackMetadata};
use lofty::file::TaggedFile;
use lofty::prelude::{Accessor, AudioFile, ItemKey, TaggedFileExt};
use lofty::probe::Probe;
use std::path::Path;
use tracing::debug;

/// Base names checked when looking for a folder image next to a track.
const FOLDER_IMAGE_NAMES: &[&str] = &["cover", "folder", "front", "albumart"];
const FOLDER_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Producer of extracted metadata for discovered audio files.
pub trait MetadataSource: Send + Sync {
    /// Extract metadata and an optional album-art source for one file.
    /// `None` means the file should not be indexed as a track.
    fn read(&self, path: &Path) -> Option<(TrackMetadata, Option<AlbumArtSource>)>;
}

/// lofty-backed tag reader.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoftyTagReader;

impl LoftyTagReader {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataSource for LoftyTagReader {
    fn read(&self, path: &Path) -> Option<(TrackMetadata, Option<AlbumArtSource>)> {
        let tagged_file = match read_tagged_file(path) {
            Ok(file) => file,
            Err(e) => {
                debug!("Failed to read tags from {:?}: {}", path, e);
                return Some((fallback_metadata(path), find_folder_image(path)));
            }
        };

        let tag = tagged_file.primary_tag().or(tagged_file.first_tag());
        let duration_ms = tagged_file.properties().duration().as_millis() as i64;

        let title = tag
            .and_then(|t| t.title().map(|s| s.to_string()))
            .unwrap_or_else(|| stem_of(path));
        let artist = tag
            .and_then(|t| t.artist().map(|s| s.to_string()))
            .unwrap_or_default();
        let album = tag
            .and_then(|t| t.album().map(|s| s.to_string()))
            .unwrap_or_default();
        let album_artist = tag
            .and_then(|t| t.get_string(&ItemKey::AlbumArtist).map(str::to_string))
            .unwrap_or_default();
        let year = tag
            .and_then(|t| {
                t.year().map(|y| y.to_string()).or_else(|| {
                    t.get_string(&ItemKey::Year)
                        .or_else(|| t.get_string(&ItemKey::RecordingDate))
                        .map(str::to_string)
                })
            })
            .unwrap_or_default();
        let is_in_compilation = tag
            .and_then(|t| t.get_string(&ItemKey::FlagCompilation))
            .map(|flag| flag == "1")
            .unwrap_or(false);

        let metadata = TrackMetadata {
            title,
            artist,
            album_artist,
            album,
            track_num: tag.and_then(|t| t.track()).map(i64::from),
            disc_num: tag.and_then(|t| t.disk()).map(i64::from),
            year,
            duration_ms,
            is_in_compilation,
        };

        // Embedded art is sourced from the audio file itself; otherwise a
        // folder image next to the track serves as the source.
        let has_embedded_art = tag.map(|t| !t.pictures().is_empty()).unwrap_or(false);
        let art_source = if has_embedded_art {
            Some(AlbumArtSource {
                uri: path.to_string_lossy().into_owned(),
                is_folder_image: false,
            })
        } else {
            find_folder_image(path)
        };

        Some((metadata, art_source))
    }
}

fn read_tagged_file(path: &Path) -> anyhow::Result<TaggedFile> {
    Ok(Probe::open(path)?.guess_file_type()?.read()?)
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn fallback_metadata(path: &Path) -> TrackMetadata {
    TrackMetadata {
        title: stem_of(path),
        ..TrackMetadata::default()
    }
}

/// Look for a conventional cover image in the track's directory.
fn find_folder_image(track_path: &Path) -> Option<AlbumArtSource> {
    let dir = track_path.parent()?;
    for name in FOLDER_IMAGE_NAMES {
        for ext in FOLDER_IMAGE_EXTENSIONS {
            let candidate = dir.join(format!("{}.{}", name, ext));
            if candidate.is_file() {
                return Some(AlbumArtSource {
                    uri: candidate.to_string_lossy().into_owned(),
                    is_folder_image: true,
                });
            }
        }
    }
    None
}
