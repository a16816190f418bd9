//! Join engine: scrobbles × song search × release years
//!
//! Both indexes are built from cached blobs only; nothing here touches the
//! network. The join is a left join on the scrobble sequence: one output per
//! input, in input order, with `None` wherever a lookup has no answer.

use crate::cache::{read_json, CacheKey, CacheStore};
use crate::error::EtlResult;
use crate::extractors::{extract_release, top_features};
use crate::models::{
    AudioFeatures, EnrichedAlbum, EnrichedTrack, LookupKey, ReleaseRecord, ScrobbleRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// One row of the consolidated search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub artist: String,
    pub track: String,
    /// Features of the best-ranked candidate; `None` when the search was empty
    pub audio: Option<AudioFeatures>,
}

/// Lookup key → best-ranked audio features
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    features: HashMap<LookupKey, Option<AudioFeatures>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the search outcome for `key`
    pub fn insert(&mut self, key: LookupKey, audio: Option<AudioFeatures>) {
        self.features.insert(key, audio);
    }

    /// Features for `key`; `None` if never searched or nothing was found
    pub fn features(&self, key: &LookupKey) -> Option<&AudioFeatures> {
        self.features.get(key).and_then(Option::as_ref)
    }

    /// Whether a search result exists for `key` (even an empty one)
    pub fn contains(&self, key: &LookupKey) -> bool {
        self.features.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Build the index from cached search results
    ///
    /// Keys without a cached blob are skipped. A cached blob that is not JSON,
    /// or whose top-ranked entry lacks audio fields, aborts the load.
    pub fn load<S>(store: &S, keys: &[LookupKey]) -> EtlResult<Self>
    where
        S: CacheStore + ?Sized,
    {
        let mut index = Self::new();
        for key in keys {
            let cache_key = CacheKey::Track(key.clone());
            let Some(blob) = read_json(store, &cache_key)? else {
                debug!(key = %cache_key, "No cached search result");
                continue;
            };
            index.insert(key.clone(), top_features(&blob)?);
        }
        Ok(index)
    }

    /// Rows for the consolidated file, sorted by key for stable output
    pub fn to_entries(&self) -> Vec<SearchEntry> {
        let mut entries: Vec<SearchEntry> = self
            .features
            .iter()
            .map(|(key, audio)| SearchEntry {
                artist: key.artist.clone(),
                track: key.track.clone(),
                audio: *audio,
            })
            .collect();
        entries.sort_by(|a, b| (&a.artist, &a.track).cmp(&(&b.artist, &b.track)));
        entries
    }

    pub fn from_entries(entries: Vec<SearchEntry>) -> Self {
        entries
            .into_iter()
            .map(|e| (LookupKey::new(e.artist, e.track), e.audio))
            .collect()
    }
}

impl FromIterator<(LookupKey, Option<AudioFeatures>)> for SearchIndex {
    fn from_iter<I: IntoIterator<Item = (LookupKey, Option<AudioFeatures>)>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

/// Release id → release year
#[derive(Debug, Clone, Default)]
pub struct ReleaseIndex {
    years: HashMap<String, Option<i32>>,
}

impl ReleaseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, release_id: impl Into<String>, year: Option<i32>) {
        self.years.insert(release_id.into(), year);
    }

    pub fn year(&self, release_id: &str) -> Option<i32> {
        self.years.get(release_id).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Build the index from cached release documents; absent ids are skipped
    pub fn load<S>(store: &S, release_ids: &[String]) -> EtlResult<Self>
    where
        S: CacheStore + ?Sized,
    {
        let mut index = Self::new();
        for id in release_ids {
            let cache_key = CacheKey::Release(id.clone());
            let Some(blob) = read_json(store, &cache_key)? else {
                debug!(key = %cache_key, "No cached release");
                continue;
            };
            let record = extract_release(id, &blob);
            index.insert(record.release_id, record.year);
        }
        Ok(index)
    }

    /// Records for the consolidated file, sorted by release id
    pub fn to_records(&self) -> Vec<ReleaseRecord> {
        let mut records: Vec<ReleaseRecord> = self
            .years
            .iter()
            .map(|(id, year)| ReleaseRecord {
                release_id: id.clone(),
                year: *year,
            })
            .collect();
        records.sort_by(|a, b| a.release_id.cmp(&b.release_id));
        records
    }

    pub fn from_records(records: Vec<ReleaseRecord>) -> Self {
        Self {
            years: records.into_iter().map(|r| (r.release_id, r.year)).collect(),
        }
    }
}

/// Enrich a single scrobble
pub fn enrich_one(
    scrobble: &ScrobbleRecord,
    search: &SearchIndex,
    releases: &ReleaseIndex,
) -> EnrichedTrack {
    let year = scrobble
        .album
        .release_id
        .as_deref()
        .and_then(|id| releases.year(id));

    EnrichedTrack {
        artist: scrobble.artist.name.clone(),
        album: EnrichedAlbum {
            name: scrobble.album.name.clone(),
            image: scrobble.album.image.clone(),
            year,
        },
        name: scrobble.name.clone(),
        listened_at: scrobble.listened_at,
        loved: scrobble.loved,
        audio: search.features(&scrobble.lookup_key()).copied(),
    }
}

/// Left-join every scrobble against both indexes, preserving order
pub fn join(
    scrobbles: &[ScrobbleRecord],
    search: &SearchIndex,
    releases: &ReleaseIndex,
) -> Vec<EnrichedTrack> {
    scrobbles
        .iter()
        .map(|s| enrich_one(s, search, releases))
        .collect()
}
