//! Shared HTTP plumbing: client construction and failure classification

use crate::error::FetchError;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;

pub const USER_AGENT: &str = concat!("lhx/", env!("CARGO_PKG_VERSION"), " (listening history explorer)");
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub fn build_client() -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| FetchError::Permanent {
            status: 0,
            message: format!("Failed to build HTTP client: {}", e),
        })
}

/// Classify a transport-level failure
pub fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        FetchError::Transient(err.to_string())
    } else {
        FetchError::Permanent {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            message: err.to_string(),
        }
    }
}

/// Classify a non-success HTTP status
///
/// 429 is a rate limit; 5xx is transient; anything else is permanent.
pub fn classify_status(status: StatusCode, headers: &HeaderMap, body: String) -> FetchError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return FetchError::RateLimited {
            retry_after: retry_after(headers),
        };
    }
    if status.is_server_error() {
        return FetchError::Transient(format!("HTTP {}: {}", status.as_u16(), body));
    }
    FetchError::Permanent {
        status: status.as_u16(),
        message: body,
    }
}

/// `Retry-After` in delta-seconds form; HTTP-date form is ignored
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Send a prepared GET and return the body of a successful response
pub async fn get_text(request: reqwest::RequestBuilder) -> Result<String, FetchError> {
    let response = request.send().await.map_err(classify_transport_error)?;
    let status = response.status();

    if !status.is_success() {
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(status, &headers, body));
    }

    response.text().await.map_err(classify_transport_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_classify_rate_limit_with_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));

        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, &headers, String::new());
        assert!(matches!(
            err,
            FetchError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(7)
        ));
    }

    #[test]
    fn test_classify_server_error_is_transient() {
        let err = classify_status(StatusCode::BAD_GATEWAY, &HeaderMap::new(), "oops".into());
        assert!(matches!(err, FetchError::Transient(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_client_error_is_permanent() {
        let err = classify_status(StatusCode::NOT_FOUND, &HeaderMap::new(), "missing".into());
        assert!(matches!(err, FetchError::Permanent { status: 404, .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retry_after_ignores_http_date() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }
}
