//! Pure string/value sanitation helpers used at the edges of the indexer.

use chrono::{TimeZone, Utc};

/// Articles dropped when deriving a sort key.
const SORT_PREFIXES: &[&str] = &["the ", "a ", "an "];

/// Derive the sort key used for the natural ordering of artists, albums
/// and tracks: lowercased, leading article stripped.
pub fn sort_key(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    for prefix in SORT_PREFIXES {
        if let Some(stripped) = lowered.strip_prefix(prefix) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    lowered
}

/// Normalize a raw tag year into epoch milliseconds of Jan 1st UTC.
///
/// Tags carry years in many shapes ("1994", "1994-06-01", "℗ 1994 ...");
/// the first run of four consecutive digits is taken as the year.
pub fn normalize_year(raw: &str) -> Option<i64> {
    let bytes = raw.as_bytes();
    let mut run_start = None;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            let start = *run_start.get_or_insert(i);
            if i - start + 1 == 4 {
                let year: i32 = raw[start..=i].parse().ok()?;
                return Utc
                    .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
                    .single()
                    .map(|dt| dt.timestamp_millis());
            }
        } else {
            run_start = None;
        }
    }
    None
}

/// Truncate an epoch-milliseconds timestamp to whole-second precision.
pub fn truncate_to_seconds(epoch_ms: i64) -> i64 {
    (epoch_ms / 1000) * 1000
}

/// Encode a device volume label into something safe to use as a database
/// file name. Alphanumerics, dashes and underscores pass through; anything
/// else becomes an underscore. An empty label yields "device".
pub fn encode_volume_label(label: &str) -> String {
    let encoded: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if encoded.is_empty() {
        "device".to_string()
    } else {
        encoded
    }
}
