//! Relational store for one device's media index.
//!
//! Five entity kinds (paths, artists, albums, tracks, plus the three group
//! index kinds used for paged browsing), SQLite-backed, accessed through the
//! [`MediaStore`] trait.

mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{
    Album, Artist, Group, GroupKind, PathEntry, Track, GROUP_PAGE_SIZE, UNKNOWN_ID,
};
pub use schema::{MEDIA_SCHEMA_SQL, MEDIA_SCHEMA_VERSION};
pub use store::SqliteMediaStore;
pub use trait_def::MediaStore;
