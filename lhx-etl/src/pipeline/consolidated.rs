//! Consolidated per-source JSON files
//!
//! Each stage can dump its full result as one JSON array next to the
//! per-key caches, so later stages reload it without walking thousands of
//! small files.

use crate::error::EtlResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Merged scrobble history (`ScrobbleRecord`)
pub const LASTFM_TRACKS_FILE: &str = "lastfm_tracks.json";
/// Search outcome per lookup key (`SearchEntry`)
pub const SEARCH_INDEX_FILE: &str = "search_index.json";
/// Year per release id (`ReleaseRecord`)
pub const RELEASE_YEARS_FILE: &str = "release_years.json";
/// Join output (`EnrichedTrack`)
pub const ENRICHED_TRACKS_FILE: &str = "enriched_tracks.json";

/// Write `records` as a JSON array, atomically
pub fn dump_records<T: Serialize>(path: &Path, records: &[T]) -> EtlResult<()> {
    let bytes = serde_json::to_vec(records).map_err(lhx_common::Error::from)?;
    lhx_common::fs::write_atomic(path, &bytes)?;
    info!(path = %path.display(), records = records.len(), "Wrote consolidated file");
    Ok(())
}

/// Read a JSON array written by [`dump_records`]
pub fn load_records<T: DeserializeOwned>(path: &Path) -> EtlResult<Vec<T>> {
    let content = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            lhx_common::Error::NotFound(path.display().to_string())
        } else {
            lhx_common::Error::Io(e)
        }
    })?;
    let records: Vec<T> = serde_json::from_slice(&content).map_err(lhx_common::Error::from)?;
    info!(path = %path.display(), records = records.len(), "Loaded consolidated file");
    Ok(records)
}
