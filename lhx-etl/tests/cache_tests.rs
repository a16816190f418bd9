//! Integration tests for the response cache and cache filling
//!
//! A cached entry is never fetched again; a miss is fetched exactly once and
//! persisted verbatim; failures leave nothing behind.

mod helpers;

use helpers::{fixture, Reply, StubFetcher};
use lhx_etl::cache::{
    get_or_fetch, get_or_fetch_json, CacheKey, CacheStore, FetchSource, FileCacheStore,
    MemoryCacheStore,
};
use lhx_etl::error::{CacheError, EtlError, FetchError};
use lhx_etl::models::LookupKey;
use lhx_etl::pipeline::{fill_cache, track_keys};
use lhx_etl::services::{RetryPolicy, RetryingFetcher};
use std::time::Duration;
use tempfile::TempDir;

fn creep() -> CacheKey {
    CacheKey::Track(LookupKey::new("Radiohead", "Creep"))
}

// ============================================================================
// get_or_fetch
// ============================================================================

#[tokio::test]
async fn test_miss_fetches_once_then_hits() {
    let store = MemoryCacheStore::new();
    let fetcher = StubFetcher::new().with_body(creep(), fixture("search_radiohead_creep.json"));

    let first = get_or_fetch(&store, &fetcher, &creep()).await.unwrap();
    assert_eq!(first.source, FetchSource::Network);

    let second = get_or_fetch(&store, &fetcher, &creep()).await.unwrap();
    assert_eq!(second.source, FetchSource::Cache);
    assert_eq!(second.body, first.body);

    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_hit_never_touches_network() {
    let store = MemoryCacheStore::new();
    store.put(&creep(), "{\"cached\": true}").unwrap();

    // No reply scripted: any fetch would fail
    let fetcher = StubFetcher::new();
    let (value, source) = get_or_fetch_json(&store, &fetcher, &creep()).await.unwrap();

    assert_eq!(source, FetchSource::Cache);
    assert_eq!(value["cached"], true);
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_file_store_persists_body_verbatim() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileCacheStore::new(temp_dir.path());
    let body = fixture("search_radiohead_creep.json");
    let fetcher = StubFetcher::new().with_body(creep(), body.clone());

    get_or_fetch(&store, &fetcher, &creep()).await.unwrap();

    let path = temp_dir.path().join("47919f438a3492115511f89ff25ac059.json");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), body);
    assert!(!temp_dir
        .path()
        .join("47919f438a3492115511f89ff25ac059.json.tmp")
        .exists());

    // A fresh store over the same directory sees the entry
    let reopened = FileCacheStore::new(temp_dir.path());
    assert!(reopened.contains(&creep()).unwrap());
}

#[tokio::test]
async fn test_fetch_failure_persists_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileCacheStore::new(temp_dir.path());
    let fetcher = StubFetcher::new().with_reply(creep(), Reply::Permanent(400));

    let err = get_or_fetch(&store, &fetcher, &creep()).await.unwrap_err();
    assert!(matches!(
        err,
        EtlError::Fetch(FetchError::Permanent { status: 400, .. })
    ));
    assert!(!store.contains(&creep()).unwrap());
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_corrupt_cached_json_is_fatal_and_not_refetched() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileCacheStore::new(temp_dir.path());
    store.put(&creep(), "{\"response\": ").unwrap();
    let fetcher = StubFetcher::new().with_body(creep(), fixture("search_empty.json"));

    let err = get_or_fetch_json(&store, &fetcher, &creep())
        .await
        .unwrap_err();
    assert!(matches!(err, EtlError::Cache(CacheError::Corrupt { .. })));
    assert_eq!(fetcher.call_count(), 0);
}

#[test]
fn test_file_store_rejects_escaping_release_ids() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileCacheStore::new(temp_dir.path());

    let err = store
        .put(&CacheKey::Release("../outside".into()), "{}")
        .unwrap_err();
    assert!(matches!(err, CacheError::InvalidKey(_)));
}

// ============================================================================
// fill_cache
// ============================================================================

#[tokio::test]
async fn test_fill_cache_continues_after_failures() {
    let store = MemoryCacheStore::new();
    let keys = vec![
        LookupKey::new("Radiohead", "Creep"),
        LookupKey::new("Massive Attack", "Teardrop"),
        LookupKey::new("X", "Y"),
    ];
    let fetcher = StubFetcher::new()
        .with_body(creep(), fixture("search_radiohead_creep.json"))
        .with_reply(CacheKey::Track(keys[1].clone()), Reply::Transient)
        .with_body(CacheKey::Track(keys[2].clone()), fixture("search_empty.json"));

    let summary = fill_cache(&store, &fetcher, track_keys(&keys)).await.unwrap();

    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.cached, 0);
    assert_eq!(store.len(), 2);
    assert!(!store.contains(&CacheKey::Track(keys[1].clone())).unwrap());
    // Keys are visited in the order given
    assert_eq!(
        fetcher.calls(),
        keys.iter().cloned().map(CacheKey::Track).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_fill_cache_second_run_only_retries_missing() {
    let store = MemoryCacheStore::new();
    let keys = vec![LookupKey::new("Radiohead", "Creep"), LookupKey::new("A", "B")];
    let failing = StubFetcher::new()
        .with_body(creep(), fixture("search_radiohead_creep.json"))
        .with_reply(CacheKey::Track(keys[1].clone()), Reply::RateLimited);

    let first = fill_cache(&store, &failing, track_keys(&keys)).await.unwrap();
    assert_eq!((first.fetched, first.failed), (1, 1));

    let recovered = StubFetcher::new()
        .with_body(CacheKey::Track(keys[1].clone()), fixture("search_empty.json"));
    let second = fill_cache(&store, &recovered, track_keys(&keys)).await.unwrap();

    assert_eq!((second.cached, second.fetched, second.failed), (1, 1, 0));
    assert_eq!(recovered.calls(), vec![CacheKey::Track(keys[1].clone())]);
}

#[tokio::test]
async fn test_retrying_fetcher_inside_fill_cache() {
    let store = MemoryCacheStore::new();
    let key = LookupKey::new("A", "B");
    let fetcher = RetryingFetcher::new(
        StubFetcher::new().with_reply(CacheKey::Track(key.clone()), Reply::Transient),
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        },
    );

    let summary = fill_cache(&store, &fetcher, track_keys(&[key])).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert!(store.is_empty());
}
