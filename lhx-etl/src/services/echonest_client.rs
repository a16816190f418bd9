//! Echonest-style song search client
//!
//! Serves [`CacheKey::Track`] by searching `{base}/song/search` for the
//! artist and title. Responses carry an API status inside the JSON body;
//! only `code == 0` bodies are returned, so failures never reach the cache.

use crate::cache::{CacheKey, Fetcher};
use crate::error::FetchError;
use crate::models::LookupKey;
use crate::services::http;
use async_trait::async_trait;
use serde_json::Value;

pub const ECHONEST_BASE_URL: &str = "http://developer.echonest.com/api/v4";

/// Search results requested per lookup
pub const RESULTS_PER_SEARCH: u32 = 100;

/// Extra data requested alongside each song
const BUCKETS: &[&str] = &[
    "audio_summary",
    "artist_discovery",
    "artist_discovery_rank",
    "artist_familiarity",
    "artist_familiarity_rank",
    "artist_hotttnesss",
    "artist_hotttnesss_rank",
    "artist_location",
    "song_currency",
    "song_currency_rank",
    "song_hotttnesss",
    "song_hotttnesss_rank",
    "song_type",
];

const STATUS_SUCCESS: i64 = 0;
const STATUS_RATE_LIMIT: i64 = 3;

/// Song search client
pub struct EchonestClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl EchonestClient {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Result<Self, FetchError> {
        Ok(Self {
            http_client: http::build_client()?,
            base_url: base_url
                .unwrap_or_else(|| ECHONEST_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.into(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/song/search", self.base_url)
    }

    fn search_query(&self, key: &LookupKey) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("api_key", self.api_key.clone()),
            ("format", "json".to_string()),
            ("results", RESULTS_PER_SEARCH.to_string()),
            ("artist", key.artist.clone()),
            ("title", key.track.clone()),
        ];
        query.extend(BUCKETS.iter().map(|b| ("bucket", b.to_string())));
        query
    }

    /// Search for an (artist, track) pair and return the raw JSON body
    pub async fn search(&self, key: &LookupKey) -> Result<String, FetchError> {
        tracing::info!(artist = %key.artist, track = %key.track, "Searching song features");

        let body = http::get_text(
            self.http_client
                .get(self.search_url())
                .query(&self.search_query(key)),
        )
        .await?;

        check_status(&body)?;
        Ok(body)
    }
}

#[async_trait]
impl Fetcher for EchonestClient {
    async fn fetch(&self, key: &CacheKey) -> Result<String, FetchError> {
        match key {
            CacheKey::Track(lookup) => self.search(lookup).await,
            other => Err(FetchError::UnsupportedKey(other.to_string())),
        }
    }
}

/// Inspect `response.status` of a search body
fn check_status(body: &str) -> Result<(), FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|e| FetchError::Permanent {
        status: 0,
        message: format!("Search response is not JSON: {}", e),
    })?;

    let status = value.pointer("/response/status");
    let code = status
        .and_then(|s| s.get("code"))
        .and_then(Value::as_i64)
        .unwrap_or(STATUS_SUCCESS);
    let message = status
        .and_then(|s| s.get("message"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match code {
        STATUS_SUCCESS => Ok(()),
        STATUS_RATE_LIMIT => Err(FetchError::RateLimited { retry_after: None }),
        _ => Err(FetchError::Permanent {
            status: u16::try_from(code).unwrap_or(u16::MAX),
            message,
        }),
    }
}
