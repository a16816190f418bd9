//! Data models for the join pipeline
//!
//! All records are immutable values: built once by a parser, extractor or
//! the join engine and never mutated afterwards.

pub mod enriched;
pub mod features;
pub mod scrobble;

pub use enriched::{EnrichedAlbum, EnrichedTrack, ReleaseRecord};
pub use features::{AudioFeatures, CandidateTrack};
pub use scrobble::{Album, Artist, LookupKey, ScrobbleRecord};
