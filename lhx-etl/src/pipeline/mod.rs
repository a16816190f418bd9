//! Pipeline stages
//!
//! download → consolidate → fill search cache → fill release cache → join.
//! Every stage reads its inputs from caches or consolidated files, so any
//! stage can be re-run alone.

pub mod consolidated;
pub mod enrich;
pub mod history;
pub mod join;

pub use consolidated::{
    dump_records, load_records, ENRICHED_TRACKS_FILE, LASTFM_TRACKS_FILE, RELEASE_YEARS_FILE,
    SEARCH_INDEX_FILE,
};
pub use enrich::{
    fill_cache, release_keys, track_keys, unique_lookup_keys, unique_release_ids, FillSummary,
};
pub use history::{download_history, list_page_numbers, load_history, DownloadSummary};
pub use join::{enrich_one, join, ReleaseIndex, SearchEntry, SearchIndex};
