//! MusicBrainz release year extractor

use crate::models::ReleaseRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// ASCII digits only; `\d` would also accept other Unicode digits
static LEADING_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})").expect("leading year pattern is valid"));

/// Year from the release's `date` field (`"1994-08-02"` → 1994)
///
/// Missing, non-string, or non-matching dates yield `None`.
pub fn extract_year(blob: &Value) -> Option<i32> {
    let date = blob.get("date")?.as_str()?;
    LEADING_YEAR
        .captures(date)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn extract_release(release_id: &str, blob: &Value) -> ReleaseRecord {
    ReleaseRecord {
        release_id: release_id.to_string(),
        year: extract_year(blob),
    }
}
