//! Scrobble records and the artist/track lookup key

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Artist as reported on a scrobble
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
    /// From `track/artist/image[@size="extralarge"]`
    pub image: Option<String>,
}

/// Album as reported on a scrobble
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Album {
    pub name: Option<String>,
    /// From the track-level `track/image[@size="extralarge"]`
    pub image: Option<String>,
    /// MusicBrainz release id (mbid)
    pub release_id: Option<String>,
}

/// One logged play of a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrobbleRecord {
    pub artist: Artist,
    pub album: Album,
    pub name: String,
    /// `None` for the track that is currently playing
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub listened_at: Option<DateTime<Utc>>,
    pub loved: bool,
}

impl ScrobbleRecord {
    pub fn lookup_key(&self) -> LookupKey {
        LookupKey::new(&self.artist.name, &self.name)
    }

    pub fn is_now_playing(&self) -> bool {
        self.listened_at.is_none()
    }
}

/// (artist, track) pair used as search cache key and join key
///
/// Equality is exact: "Radiohead"/"Creep" and "radiohead"/"creep" are
/// different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LookupKey {
    pub artist: String,
    pub track: String,
}

impl LookupKey {
    pub fn new(artist: impl Into<String>, track: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            track: track.into(),
        }
    }

    /// Hex MD5 of `artist + track` (UTF-8, no separator, no case folding)
    pub fn digest(&self) -> String {
        let mut bytes = Vec::with_capacity(self.artist.len() + self.track.len());
        bytes.extend_from_slice(self.artist.as_bytes());
        bytes.extend_from_slice(self.track.as_bytes());
        format!("{:x}", md5::compute(&bytes))
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.track)
    }
}
