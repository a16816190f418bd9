//! Cache filling for the enrichment sources

use crate::cache::{get_or_fetch, CacheKey, CacheStore, FetchSource, Fetcher};
use crate::error::{EtlError, EtlResult};
use crate::models::{LookupKey, ScrobbleRecord};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Progress is logged every this many keys
const PROGRESS_INTERVAL: usize = 100;

/// Distinct (artist, track) keys, most played first
///
/// Ties keep first-appearance order, so the result is deterministic for a
/// given scrobble sequence.
pub fn unique_lookup_keys(scrobbles: &[ScrobbleRecord]) -> Vec<LookupKey> {
    let mut counts: HashMap<LookupKey, (usize, usize)> = HashMap::new();
    for (position, scrobble) in scrobbles.iter().enumerate() {
        counts
            .entry(scrobble.lookup_key())
            .or_insert((0, position))
            .0 += 1;
    }

    let mut keys: Vec<(LookupKey, (usize, usize))> = counts.into_iter().collect();
    keys.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });
    keys.into_iter().map(|(key, _)| key).collect()
}

/// Distinct non-empty release ids in first-appearance order
pub fn unique_release_ids(scrobbles: &[ScrobbleRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    scrobbles
        .iter()
        .filter_map(|s| s.album.release_id.as_deref())
        .filter(|id| !id.trim().is_empty())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Outcome counts of a [`fill_cache`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillSummary {
    /// Already present, no request made
    pub cached: usize,
    /// Fetched and persisted
    pub fetched: usize,
    /// Fetch failed; left absent
    pub failed: usize,
}

impl FillSummary {
    pub fn total(&self) -> usize {
        self.cached + self.fetched + self.failed
    }
}

/// Ensure every key is cached, fetching the missing ones
///
/// A failed fetch is logged and counted and the run moves on; the key stays
/// uncached and joins as `None`. Cache I/O errors abort.
pub async fn fill_cache<S, F, I>(store: &S, fetcher: &F, keys: I) -> EtlResult<FillSummary>
where
    S: CacheStore + ?Sized,
    F: Fetcher + ?Sized,
    I: IntoIterator<Item = CacheKey>,
{
    let mut summary = FillSummary::default();

    for key in keys {
        match get_or_fetch(store, fetcher, &key).await {
            Ok(fetched) if fetched.source == FetchSource::Cache => summary.cached += 1,
            Ok(_) => summary.fetched += 1,
            Err(EtlError::Fetch(e)) => {
                warn!(key = %key, error = %e, "Fetch failed, leaving entry uncached");
                summary.failed += 1;
            }
            Err(e) => return Err(e),
        }

        let done = summary.total();
        if done % PROGRESS_INTERVAL == 0 {
            info!(
                done,
                cached = summary.cached,
                fetched = summary.fetched,
                failed = summary.failed,
                "Cache fill progress"
            );
        }
    }

    Ok(summary)
}

/// Cache keys for song searches
pub fn track_keys(keys: &[LookupKey]) -> impl Iterator<Item = CacheKey> + '_ {
    keys.iter().cloned().map(CacheKey::Track)
}

/// Cache keys for release lookups
pub fn release_keys(ids: &[String]) -> impl Iterator<Item = CacheKey> + '_ {
    ids.iter().cloned().map(CacheKey::Release)
}
