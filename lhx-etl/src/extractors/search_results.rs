//! Song search response extractor
//!
//! Response shape (only the parts read here):
//!
//! ```json
//! {"response": {"status": {"code": 0},
//!               "songs": [{"artist_name": "Radiohead", "title": "Creep",
//!                          "audio_summary": {"energy": 0.6, "tempo": 92.0, ...}}]}}
//! ```
//!
//! Candidates keep the service's ordering, which is its relevance ranking.

use crate::error::ExtractError;
use crate::models::{AudioFeatures, CandidateTrack};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct SongEntry {
    artist_name: String,
    title: String,
    audio_summary: AudioFeatures,
}

/// Lazily extract ranked candidates from a search blob
///
/// An empty `songs` list is a valid "no known audio profile" result. A
/// missing `songs` list, or an entry with an incomplete audio summary, is an
/// error.
pub fn extract_candidates(
    blob: &Value,
) -> Result<impl Iterator<Item = Result<CandidateTrack, ExtractError>> + '_, ExtractError> {
    let songs = blob
        .pointer("/response/songs")
        .ok_or(ExtractError::MissingField("response.songs"))?
        .as_array()
        .ok_or_else(|| ExtractError::InvalidField {
            field: "response.songs",
            reason: "expected an array".to_string(),
        })?;

    Ok(songs.iter().enumerate().map(|(rank, entry)| {
        SongEntry::deserialize(entry)
            .map(|song| CandidateTrack {
                artist: song.artist_name,
                name: song.title,
                audio: song.audio_summary,
            })
            .map_err(|e| ExtractError::InvalidCandidate {
                rank,
                reason: e.to_string(),
            })
    }))
}

/// Best-ranked candidate (rank 0), if the result list is non-empty
pub fn top_candidate(blob: &Value) -> Result<Option<CandidateTrack>, ExtractError> {
    extract_candidates(blob)?.next().transpose()
}

/// Audio features of the best-ranked candidate
pub fn top_features(blob: &Value) -> Result<Option<AudioFeatures>, ExtractError> {
    Ok(top_candidate(blob)?.map(|c| c.audio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(energy: f64) -> Value {
        json!({
            "energy": energy, "liveness": 0.1, "tempo": 92.0, "speechiness": 0.03,
            "acousticness": 0.01, "danceability": 0.5, "instrumentalness": 0.0,
            "duration": 238.6, "loudness": -9.2, "key": 7, "mode": 1
        })
    }

    #[test]
    fn test_candidates_keep_response_order() {
        let blob = json!({"response": {"status": {"code": 0}, "songs": [
            {"artist_name": "Radiohead", "title": "Creep", "audio_summary": summary(0.6)},
            {"artist_name": "Radiohead", "title": "Creep (Acoustic)", "audio_summary": summary(0.2)}
        ]}});

        let candidates: Vec<_> = extract_candidates(&blob)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "Creep");
        assert_eq!(candidates[0].audio.energy, 0.6);
        assert_eq!(candidates[1].name, "Creep (Acoustic)");
    }

    #[test]
    fn test_empty_result_is_not_error() {
        let blob = json!({"response": {"status": {"code": 0}, "songs": []}});
        assert_eq!(extract_candidates(&blob).unwrap().count(), 0);
        assert_eq!(top_candidate(&blob).unwrap(), None);
    }

    #[test]
    fn test_missing_songs_is_error() {
        let blob = json!({"response": {"status": {"code": 5, "message": "bad"}}});
        assert!(matches!(
            extract_candidates(&blob).err(),
            Some(ExtractError::MissingField("response.songs"))
        ));
    }

    #[test]
    fn test_missing_audio_field_is_error() {
        let mut partial = summary(0.6);
        partial.as_object_mut().unwrap().remove("tempo");
        let blob = json!({"response": {"songs": [
            {"artist_name": "A", "title": "B", "audio_summary": partial}
        ]}});

        let err = top_candidate(&blob).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidCandidate { rank: 0, .. }));
    }

    #[test]
    fn test_only_consumed_entries_are_validated() {
        // The broken entry sits at rank 1; taking rank 0 never touches it
        let blob = json!({"response": {"songs": [
            {"artist_name": "A", "title": "B", "audio_summary": summary(0.4)},
            {"artist_name": "A", "title": "C"}
        ]}});

        let top = top_candidate(&blob).unwrap().unwrap();
        assert_eq!(top.audio.energy, 0.4);
        assert_eq!(extract_candidates(&blob).unwrap().filter(|c| c.is_err()).count(), 1);
    }
}
