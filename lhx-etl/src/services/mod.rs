//! Remote sources and fetcher decorators
//!
//! Each client serves one kind of [`CacheKey`](crate::cache::CacheKey):
//! - `LastfmClient`: recent-tracks pages
//! - `EchonestClient`: song search by artist/title
//! - `MusicBrainzClient`: releases by mbid
//!
//! `ThrottledFetcher` and `RetryingFetcher` wrap any fetcher to add the
//! inter-request delay and the retry policy.

pub mod echonest_client;
pub mod http;
pub mod lastfm_client;
pub mod musicbrainz_client;
pub mod retry;
pub mod throttle;

pub use echonest_client::EchonestClient;
pub use lastfm_client::LastfmClient;
pub use musicbrainz_client::MusicBrainzClient;
pub use retry::{RetryPolicy, RetryingFetcher};
pub use throttle::{RateLimiter, ThrottledFetcher};
