//! Join output records

use crate::models::AudioFeatures;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Release year looked up for one MusicBrainz release id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub release_id: String,
    pub year: Option<i32>,
}

/// Album side of an enriched track
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnrichedAlbum {
    pub name: Option<String>,
    pub image: Option<String>,
    pub year: Option<i32>,
}

/// A scrobble joined with its audio features and release year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTrack {
    pub artist: String,
    pub album: EnrichedAlbum,
    pub name: String,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub listened_at: Option<DateTime<Utc>>,
    pub loved: bool,
    /// Features of the top-ranked search candidate, if any
    pub audio: Option<AudioFeatures>,
}
