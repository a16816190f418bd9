//! MusicBrainz release lookup client
//!
//! Serves [`CacheKey::Release`] by fetching `/release/{mbid}?fmt=json`.
//! The body is returned verbatim so the cache holds exactly what the server
//! sent; the year is extracted later from the cached blob.

use crate::cache::{CacheKey, Fetcher};
use crate::error::FetchError;
use crate::services::http;
use async_trait::async_trait;
use reqwest::StatusCode;

pub const MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl MusicBrainzClient {
    pub fn new(base_url: Option<String>) -> Result<Self, FetchError> {
        Ok(Self {
            http_client: http::build_client()?,
            base_url: base_url
                .unwrap_or_else(|| MUSICBRAINZ_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn release_url(&self, release_id: &str) -> String {
        format!("{}/release/{}?fmt=json", self.base_url, release_id)
    }

    /// Fetch the raw release document
    pub async fn lookup_release(&self, release_id: &str) -> Result<String, FetchError> {
        let url = self.release_url(release_id);
        tracing::debug!(release_id = %release_id, url = %url, "Querying MusicBrainz API");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(http::classify_transport_error)?;

        let status = response.status();

        // MusicBrainz answers 503 when the client exceeds its request rate
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(FetchError::RateLimited {
                retry_after: http::retry_after(response.headers()),
            });
        }

        if !status.is_success() {
            let headers = response.headers().clone();
            let error_text = response.text().await.unwrap_or_default();
            return Err(http::classify_status(status, &headers, error_text));
        }

        let body = response
            .text()
            .await
            .map_err(http::classify_transport_error)?;

        tracing::debug!(release_id = %release_id, bytes = body.len(), "Retrieved release");
        Ok(body)
    }
}

#[async_trait]
impl Fetcher for MusicBrainzClient {
    async fn fetch(&self, key: &CacheKey) -> Result<String, FetchError> {
        match key {
            CacheKey::Release(id) => self.lookup_release(id).await,
            other => Err(FetchError::UnsupportedKey(other.to_string())),
        }
    }
}
