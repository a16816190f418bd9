//! Error types for lhx-etl
//!
//! Severity follows the pipeline contract:
//! - Malformed cached data (XML pages, JSON blobs) is fatal and surfaces as-is.
//! - Missing optional fields are values (`None`), never errors.
//! - Fetch failures are per-key: callers log them and keep going.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Scrobble page parsing errors
#[derive(Debug, Error)]
pub enum ParseError {
    /// Document is not well-formed XML
    #[error("Malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Required element is absent
    #[error("Missing element: {0}")]
    MissingElement(&'static str),

    /// Element or attribute holds a value of the wrong shape
    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

/// Errors extracting typed records from cached JSON blobs
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Required field is absent
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Field exists but is not of the expected type
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// A search result entry lacks part of its audio summary
    #[error("Invalid search result at rank {rank}: {reason}")]
    InvalidCandidate { rank: usize, reason: String },
}

/// Outbound request errors, classified for retry decisions
#[derive(Debug, Error)]
pub enum FetchError {
    /// Timeout, connection failure or 5xx; worth retrying
    #[error("Transient error: {0}")]
    Transient(String),

    /// Remote asked us to slow down
    #[error("Rate limit exceeded (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// 4xx or an API-level rejection; retrying will not help
    #[error("API error {status}: {message}")]
    Permanent { status: u16, message: String },

    /// Fetcher was asked for a key it does not serve
    #[error("Unsupported cache key: {0}")]
    UnsupportedKey(String),
}

impl FetchError {
    /// Only transient and rate-limit failures are retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient(_) | FetchError::RateLimited { .. })
    }
}

/// Cache store errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing a cache file failed
    #[error("Cache IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cached blob is not valid JSON; not re-fetched
    #[error("Corrupt cache entry {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Key cannot be mapped to a safe file name
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

/// Umbrella error for pipeline operations
#[derive(Debug, Error)]
pub enum EtlError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Missing or invalid settings for the requested stage
    #[error("Configuration error: {0}")]
    Config(String),

    /// lhx-common error (IO, JSON, config files)
    #[error("Common error: {0}")]
    Common(#[from] lhx_common::Error),
}

/// Result type for pipeline operations
pub type EtlResult<T> = Result<T, EtlError>;
