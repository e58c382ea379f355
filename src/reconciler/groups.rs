//! Page-index builder.
//!
//! Partitions each entity kind's surviving rows into contiguous id ranges of
//! [`GROUP_PAGE_SIZE`] rows in natural sort order, so the browse layer can
//! page with `WHERE id BETWEEN start AND end` instead of `OFFSET`. Groups
//! are always rebuilt from scratch, never patched.

use crate::media_store::{Group, GroupKind, MediaStore, GROUP_PAGE_SIZE};
use anyhow::Result;
use tracing::{debug, warn};

/// Rebuild the page index for every entity kind.
pub fn rebuild_all(store: &dyn MediaStore) -> Result<()> {
    for kind in GroupKind::ALL {
        rebuild(store, kind)?;
    }
    Ok(())
}

/// Rebuild the page index for one entity kind.
pub fn rebuild(store: &dyn MediaStore, kind: GroupKind) -> Result<()> {
    store.delete_groups(kind)?;

    let count = store.entity_count(kind)?;
    let mut group_index = 0;
    let mut page_start = 0;
    while page_start < count {
        let page_end = (page_start + GROUP_PAGE_SIZE).min(count) - 1;
        let start_id = store.entity_id_at(kind, page_start)?;
        let end_id = store.entity_id_at(kind, page_end)?;
        let (Some(start_id), Some(end_id)) = (start_id, end_id) else {
            // A boundary row vanished under us (concurrent deletion); a
            // partial page would be wrong, so stop here.
            warn!(
                "{} row missing at page {} boundary, stopping group rebuild",
                kind.as_str(),
                group_index
            );
            break;
        };
        store.insert_group(
            kind,
            &Group {
                group_index,
                start_id,
                end_id,
            },
        )?;
        group_index += 1;
        page_start += GROUP_PAGE_SIZE;
    }

    debug!("Rebuilt {} {} groups over {} rows", group_index, kind.as_str(), count);
    Ok(())
}
