//! lhx-etl library interface
//!
//! Joins a Last.fm scrobble history with song audio features and MusicBrainz
//! release years:
//! - `extractors`: raw XML/JSON documents → typed records
//! - `cache`: content-addressed response cache and the fetcher seam
//! - `services`: HTTP clients plus throttling and retry decorators
//! - `pipeline`: download, cache filling, consolidation and the join
//! - `report`: aggregate listening statistics

pub mod cache;
pub mod config;
pub mod error;
pub mod extractors;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod services;

pub use crate::error::{EtlError, EtlResult};
