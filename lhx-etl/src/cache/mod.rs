//! Content-addressed cache for raw API responses
//!
//! Every remote document is stored verbatim under a name derived from its
//! key. Presence of an entry is the only hit signal: no TTL, no checksum, no
//! versioning. A hit never touches the network; a miss calls the injected
//! [`Fetcher`] once and persists the body before returning it.

pub mod file_store;
pub mod memory_store;

pub use file_store::FileCacheStore;
pub use memory_store::MemoryCacheStore;

use crate::error::{CacheError, EtlResult, FetchError};
use crate::models::LookupKey;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// What a cache entry is keyed by
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Song search result for an (artist, track) pair
    Track(LookupKey),
    /// MusicBrainz release by mbid
    Release(String),
    /// Last.fm recent-tracks page by page number
    Page(u32),
}

impl CacheKey {
    /// Entry name: `<md5-hex>.json`, `<release-id>.json` or `<page>.xml`
    pub fn file_name(&self) -> String {
        match self {
            CacheKey::Track(key) => format!("{}.json", key.digest()),
            CacheKey::Release(id) => format!("{}.json", id),
            CacheKey::Page(page) => format!("{}.xml", page),
        }
    }

    /// Whether the stored body is a JSON document
    pub fn is_json(&self) -> bool {
        !matches!(self, CacheKey::Page(_))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Track(key) => write!(f, "track \"{}\"", key),
            CacheKey::Release(id) => write!(f, "release {}", id),
            CacheKey::Page(page) => write!(f, "page {}", page),
        }
    }
}

/// Durable key → body storage
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    fn put(&self, key: &CacheKey, body: &str) -> Result<(), CacheError>;

    fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }
}

/// Remote source consulted on a cache miss
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, key: &CacheKey) -> Result<String, FetchError>;
}

/// Where a body came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Network,
}

/// Body returned by [`get_or_fetch`]
#[derive(Debug, Clone)]
pub struct Fetched {
    pub body: String,
    pub source: FetchSource,
}

/// Return the cached body for `key`, fetching and persisting it on a miss
pub async fn get_or_fetch<S, F>(store: &S, fetcher: &F, key: &CacheKey) -> EtlResult<Fetched>
where
    S: CacheStore + ?Sized,
    F: Fetcher + ?Sized,
{
    if let Some(body) = store.get(key)? {
        debug!(key = %key, "Cache hit");
        return Ok(Fetched {
            body,
            source: FetchSource::Cache,
        });
    }

    debug!(key = %key, "Cache miss, fetching");
    let body = fetcher.fetch(key).await?;
    store.put(key, &body)?;

    Ok(Fetched {
        body,
        source: FetchSource::Network,
    })
}

/// [`get_or_fetch`] for JSON entries; malformed JSON is fatal
pub async fn get_or_fetch_json<S, F>(
    store: &S,
    fetcher: &F,
    key: &CacheKey,
) -> EtlResult<(Value, FetchSource)>
where
    S: CacheStore + ?Sized,
    F: Fetcher + ?Sized,
{
    let fetched = get_or_fetch(store, fetcher, key).await?;
    let value = parse_blob(key, &fetched.body)?;
    Ok((value, fetched.source))
}

/// Read a cached JSON entry without fetching
pub fn read_json<S>(store: &S, key: &CacheKey) -> EtlResult<Option<Value>>
where
    S: CacheStore + ?Sized,
{
    match store.get(key)? {
        None => Ok(None),
        Some(body) => Ok(Some(parse_blob(key, &body)?)),
    }
}

fn parse_blob(key: &CacheKey, body: &str) -> Result<Value, CacheError> {
    serde_json::from_str(body).map_err(|source| CacheError::Corrupt {
        key: key.to_string(),
        source,
    })
}
