//! SQLite-backed media store implementation.

use super::models::{Album, Artist, Group, GroupKind, PathEntry, Track};
use super::schema::{MEDIA_SCHEMA_SQL, MEDIA_SCHEMA_VERSION};
use super::trait_def::MediaStore;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// SQLite implementation of [`MediaStore`], one database file per device.
pub struct SqliteMediaStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMediaStore {
    /// Open or create a device index database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open media index database: {:?}", path))?;
        Self::prepare(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::prepare(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn prepare(conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        conn.execute_batch(MEDIA_SCHEMA_SQL)?;
        conn.pragma_update(None, "user_version", MEDIA_SCHEMA_VERSION)?;
        Ok(())
    }

    fn row_to_artist(row: &rusqlite::Row) -> rusqlite::Result<Artist> {
        Ok(Artist {
            id: row.get("id")?,
            name: row.get("name")?,
            sort_name: row.get("sort_name")?,
            is_album_artist: row.get::<_, i32>("is_album_artist")? != 0,
            is_compilation_artist: row.get::<_, i32>("is_compilation_artist")? != 0,
        })
    }

    fn row_to_album(row: &rusqlite::Row) -> rusqlite::Result<Album> {
        Ok(Album {
            id: row.get("id")?,
            name: row.get("name")?,
            sort_name: row.get("sort_name")?,
            parent_artist_id: row.get("parent_artist_id")?,
            album_art_uri: row.get("album_art_uri")?,
            album_art_source_uri: row.get("album_art_source_uri")?,
            has_folder_image: row.get::<_, i32>("has_folder_image")? != 0,
        })
    }

    fn row_to_track(row: &rusqlite::Row) -> rusqlite::Result<Track> {
        Ok(Track {
            id: row.get("id")?,
            name: row.get("name")?,
            sort_name: row.get("sort_name")?,
            parent_artist_id: row.get("parent_artist_id")?,
            parent_album_artist_id: row.get("parent_album_artist_id")?,
            parent_album_id: row.get("parent_album_id")?,
            track_num: row.get("track_num")?,
            disc_num: row.get("disc_num")?,
            album_art_uri: row.get("album_art_uri")?,
            year_epoch_ms: row.get("year_epoch_ms")?,
            file_uri: row.get("file_uri")?,
            last_modified_ms: row.get("last_modified_ms")?,
            duration_ms: row.get("duration_ms")?,
        })
    }

    fn entity_table(kind: GroupKind) -> &'static str {
        match kind {
            GroupKind::Track => "tracks",
            GroupKind::Album => "albums",
            GroupKind::Artist => "artists",
        }
    }
}

impl MediaStore for SqliteMediaStore {
    // ==================== Artists ====================

    fn find_artist_by_name(&self, name: &str) -> Result<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        let artist = conn
            .query_row(
                "SELECT * FROM artists WHERE name = ?1",
                params![name],
                Self::row_to_artist,
            )
            .optional()?;
        Ok(artist)
    }

    fn insert_artist(&self, artist: &Artist) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO artists (name, sort_name, is_album_artist, is_compilation_artist)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                artist.name,
                artist.sort_name,
                artist.is_album_artist as i32,
                artist.is_compilation_artist as i32,
            ],
        )
        .with_context(|| format!("Failed to insert artist {:?}", artist.name))?;
        Ok(conn.last_insert_rowid())
    }

    fn mark_album_artist(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE artists SET is_album_artist = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    fn delete_artist(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM artists WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn all_artists(&self) -> Result<Vec<Artist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM artists")?;
        let artists = stmt
            .query_map([], Self::row_to_artist)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(artists)
    }

    // ==================== Albums ====================

    fn find_album(&self, name: &str, parent_artist_id: i64) -> Result<Option<Album>> {
        let conn = self.conn.lock().unwrap();
        let album = conn
            .query_row(
                "SELECT * FROM albums WHERE name = ?1 AND parent_artist_id = ?2",
                params![name, parent_artist_id],
                Self::row_to_album,
            )
            .optional()?;
        Ok(album)
    }

    fn insert_album(&self, album: &Album) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO albums (
                name, sort_name, parent_artist_id,
                album_art_uri, album_art_source_uri, has_folder_image
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                album.name,
                album.sort_name,
                album.parent_artist_id,
                album.album_art_uri,
                album.album_art_source_uri,
                album.has_folder_image as i32,
            ],
        )
        .with_context(|| format!("Failed to insert album {:?}", album.name))?;
        Ok(conn.last_insert_rowid())
    }

    fn delete_album(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM albums WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn all_albums(&self) -> Result<Vec<Album>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM albums")?;
        let albums = stmt
            .query_map([], Self::row_to_album)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(albums)
    }

    // ==================== Tracks ====================

    fn insert_track(&self, track: &Track) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO tracks (
                name, sort_name, parent_artist_id, parent_album_artist_id, parent_album_id,
                track_num, disc_num, album_art_uri, year_epoch_ms,
                file_uri, last_modified_ms, duration_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                track.name,
                track.sort_name,
                track.parent_artist_id,
                track.parent_album_artist_id,
                track.parent_album_id,
                track.track_num,
                track.disc_num,
                track.album_art_uri,
                track.year_epoch_ms,
                track.file_uri,
                track.last_modified_ms,
                track.duration_ms,
            ],
        )
        .with_context(|| format!("Failed to insert track {:?}", track.file_uri))?;
        Ok(conn.last_insert_rowid())
    }

    fn delete_track(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM tracks WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn all_track_ids(&self) -> Result<Vec<i64>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id FROM tracks")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn all_tracks(&self) -> Result<Vec<Track>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM tracks")?;
        let tracks = stmt
            .query_map([], Self::row_to_track)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tracks)
    }

    fn tracks_in_id_range(&self, start_id: i64, end_id: i64) -> Result<Vec<Track>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM tracks WHERE id BETWEEN ?1 AND ?2 ORDER BY sort_name, id",
        )?;
        let tracks = stmt
            .query_map(params![start_id, end_id], Self::row_to_track)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tracks)
    }

    fn count_tracks_for_album(&self, album_id: i64) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM tracks WHERE parent_album_id = ?1",
            params![album_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    fn count_tracks_for_artist(&self, artist_id: i64) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            r#"
            SELECT COUNT(*) FROM tracks
            WHERE parent_artist_id = ?1 OR parent_album_artist_id = ?1
            "#,
            params![artist_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    // ==================== Paths ====================

    fn insert_path(&self, entry: &PathEntry) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO paths (
                parent_path_id, parent_path_string, name, is_directory, last_modified_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                entry.parent_path_id,
                entry.parent_path_string,
                entry.name,
                entry.is_directory as i32,
                entry.last_modified_ms,
            ],
        )
        .with_context(|| format!("Failed to insert path {:?}", entry.name))?;
        Ok(conn.last_insert_rowid())
    }

    fn find_path(&self, parent_path_string: &str, name: &str) -> Result<Option<i64>> {
        let conn = self.conn.lock().unwrap();
        // Rescans insert fresh rows before cleanup removes the previous
        // generation, so the same location can briefly have two rows;
        // resolve to the newest.
        let id = conn
            .query_row(
                "SELECT id FROM paths WHERE parent_path_string = ?1 AND name = ?2 \
                 ORDER BY id DESC LIMIT 1",
                params![parent_path_string, name],
                |r| r.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn delete_path(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM paths WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn all_path_ids(&self) -> Result<Vec<i64>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id FROM paths")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    // ==================== Groups ====================

    fn delete_groups(&self, kind: GroupKind) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM entity_groups WHERE kind = ?1",
            params![kind.as_str()],
        )?;
        Ok(())
    }

    fn insert_group(&self, kind: GroupKind, group: &Group) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO entity_groups (kind, group_index, start_id, end_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![kind.as_str(), group.group_index, group.start_id, group.end_id],
        )?;
        Ok(())
    }

    fn groups(&self, kind: GroupKind) -> Result<Vec<Group>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT group_index, start_id, end_id FROM entity_groups
            WHERE kind = ?1 ORDER BY group_index
            "#,
        )?;
        let groups = stmt
            .query_map(params![kind.as_str()], |row| {
                Ok(Group {
                    group_index: row.get("group_index")?,
                    start_id: row.get("start_id")?,
                    end_id: row.get("end_id")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(groups)
    }

    fn entity_count(&self, kind: GroupKind) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", Self::entity_table(kind)),
            [],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    fn entity_id_at(&self, kind: GroupKind, offset: i64) -> Result<Option<i64>> {
        let conn = self.conn.lock().unwrap();
        let id = conn
            .query_row(
                &format!(
                    "SELECT id FROM {} ORDER BY sort_name, id LIMIT 1 OFFSET ?1",
                    Self::entity_table(kind)
                ),
                params![offset],
                |r| r.get(0),
            )
            .optional()?;
        Ok(id)
    }
}
