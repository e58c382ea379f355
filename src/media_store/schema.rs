//! Database schema for the media index.
//!
//! One database file per device volume:
//! - paths: every file and directory seen during a scan
//! - artists / albums / tracks: the normalized entity graph
//! - entity_groups: fixed-size page boundaries for paged browsing

/// SQL schema for a device's media index database.
pub const MEDIA_SCHEMA_SQL: &str = r#"
-- Filesystem entries, one row per file or directory visited
CREATE TABLE IF NOT EXISTS paths (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_path_id INTEGER NOT NULL DEFAULT -1,
    parent_path_string TEXT NOT NULL,
    name TEXT NOT NULL,
    is_directory INTEGER NOT NULL DEFAULT 0,
    last_modified_ms INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS artists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    sort_name TEXT NOT NULL,
    is_album_artist INTEGER NOT NULL DEFAULT 0,
    is_compilation_artist INTEGER NOT NULL DEFAULT 0,
    UNIQUE (name)
);

CREATE TABLE IF NOT EXISTS albums (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    sort_name TEXT NOT NULL,
    parent_artist_id INTEGER NOT NULL DEFAULT -1,
    album_art_uri TEXT,
    album_art_source_uri TEXT,
    has_folder_image INTEGER NOT NULL DEFAULT 0,
    UNIQUE (name, parent_artist_id)
);

CREATE TABLE IF NOT EXISTS tracks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    sort_name TEXT NOT NULL,
    parent_artist_id INTEGER NOT NULL DEFAULT -1,
    parent_album_artist_id INTEGER NOT NULL DEFAULT -1,
    parent_album_id INTEGER NOT NULL DEFAULT -1,
    track_num INTEGER,
    disc_num INTEGER,
    album_art_uri TEXT,
    year_epoch_ms INTEGER,
    file_uri TEXT NOT NULL,
    last_modified_ms INTEGER NOT NULL DEFAULT 0,
    duration_ms INTEGER NOT NULL DEFAULT 0
);

-- Page boundaries for paged browsing, fully rebuilt after every cleanup
CREATE TABLE IF NOT EXISTS entity_groups (
    kind TEXT NOT NULL,
    group_index INTEGER NOT NULL,
    start_id INTEGER NOT NULL,
    end_id INTEGER NOT NULL,
    UNIQUE (kind, group_index)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_paths_parent_name ON paths(parent_path_string, name);
CREATE INDEX IF NOT EXISTS idx_albums_parent ON albums(parent_artist_id);
CREATE INDEX IF NOT EXISTS idx_tracks_album ON tracks(parent_album_id);
CREATE INDEX IF NOT EXISTS idx_tracks_artist ON tracks(parent_artist_id);
CREATE INDEX IF NOT EXISTS idx_tracks_album_artist ON tracks(parent_album_artist_id);
CREATE INDEX IF NOT EXISTS idx_tracks_sort ON tracks(sort_name);
CREATE INDEX IF NOT EXISTS idx_albums_sort ON albums(sort_name);
CREATE INDEX IF NOT EXISTS idx_artists_sort ON artists(sort_name);
"#;

/// Current schema version, stamped into `PRAGMA user_version`.
pub const MEDIA_SCHEMA_VERSION: i32 = 1;
