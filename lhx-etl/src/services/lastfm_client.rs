//! Last.fm `user.getRecentTracks` client
//!
//! Serves [`CacheKey::Page`]: one request returns one 200-track page of the
//! user's history as the raw `<lfm>` XML document.

use crate::cache::{CacheKey, Fetcher};
use crate::error::FetchError;
use crate::services::http;
use async_trait::async_trait;

pub const LASTFM_BASE_URL: &str = "http://ws.audioscrobbler.com/2.0/";

/// Tracks per page (API maximum)
pub const PAGE_SIZE: u32 = 200;

/// Last.fm error codes worth retrying
const ERROR_OPERATION_FAILED: u32 = 8;
const ERROR_SERVICE_OFFLINE: u32 = 11;
const ERROR_TEMPORARILY_UNAVAILABLE: u32 = 16;
const ERROR_RATE_LIMIT: u32 = 29;

/// Last.fm API client
pub struct LastfmClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    user: String,
}

impl LastfmClient {
    pub fn new(
        api_key: impl Into<String>,
        user: impl Into<String>,
        base_url: Option<String>,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            http_client: http::build_client()?,
            base_url: base_url.unwrap_or_else(|| LASTFM_BASE_URL.to_string()),
            api_key: api_key.into(),
            user: user.into(),
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    fn page_query(&self, page: u32) -> [(&'static str, String); 6] {
        [
            ("method", "user.getRecentTracks".to_string()),
            ("limit", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
            ("user", self.user.clone()),
            ("extended", "1".to_string()),
            ("api_key", self.api_key.clone()),
        ]
    }

    /// Download one page of recent tracks
    pub async fn recent_tracks_page(&self, page: u32) -> Result<String, FetchError> {
        tracing::info!(user = %self.user, page, "Downloading Last.fm tracks page");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&self.page_query(page))
            .send()
            .await
            .map_err(http::classify_transport_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(http::classify_transport_error)?;

        // Failed calls carry an <lfm status="failed"> body, sometimes with 200
        if let Some((code, message)) = api_error(&body) {
            return Err(classify_api_error(code, message));
        }

        if !status.is_success() {
            return Err(http::classify_status(status, &headers, body));
        }

        Ok(body)
    }
}

#[async_trait]
impl Fetcher for LastfmClient {
    async fn fetch(&self, key: &CacheKey) -> Result<String, FetchError> {
        match key {
            CacheKey::Page(page) => self.recent_tracks_page(*page).await,
            other => Err(FetchError::UnsupportedKey(other.to_string())),
        }
    }
}

/// Error code and message of an `<lfm status="failed">` document
fn api_error(body: &str) -> Option<(u32, String)> {
    let doc = roxmltree::Document::parse(body).ok()?;
    let root = doc.root_element();
    if !root.has_tag_name("lfm") || root.attribute("status") != Some("failed") {
        return None;
    }

    let error = root.children().find(|n| n.has_tag_name("error"))?;
    let code = error.attribute("code")?.trim().parse().ok()?;
    let message = error.text().unwrap_or_default().trim().to_string();
    Some((code, message))
}

fn classify_api_error(code: u32, message: String) -> FetchError {
    match code {
        ERROR_RATE_LIMIT => FetchError::RateLimited { retry_after: None },
        ERROR_OPERATION_FAILED | ERROR_SERVICE_OFFLINE | ERROR_TEMPORARILY_UNAVAILABLE => {
            FetchError::Transient(format!("Last.fm error {}: {}", code, message))
        }
        _ => FetchError::Permanent {
            status: u16::try_from(code).unwrap_or(u16::MAX),
            message,
        },
    }
}
