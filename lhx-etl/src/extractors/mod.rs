//! Extractors turning raw cached documents into typed records
//!
//! - `scrobble_parser`: Last.fm XML pages → scrobbles
//! - `search_results`: song search JSON → ranked candidates
//! - `release_year`: MusicBrainz release JSON → optional year

pub mod release_year;
pub mod scrobble_parser;
pub mod search_results;

pub use release_year::{extract_release, extract_year};
pub use scrobble_parser::{
    merge_pages, newest_first, parse_recent_tracks_page, render_recent_tracks_page,
    RecentTracksPage,
};
pub use search_results::{extract_candidates, top_candidate, top_features};
