//! Audio features and ranked search candidates

use serde::{Deserialize, Serialize};

/// Audio summary of one recording, as computed by the search service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub energy: f64,
    pub liveness: f64,
    /// Beats per minute
    pub tempo: f64,
    pub speechiness: f64,
    pub acousticness: f64,
    pub danceability: f64,
    pub instrumentalness: f64,
    /// Seconds
    pub duration: f64,
    /// dB
    pub loudness: f64,
}

impl AudioFeatures {
    /// Feature names in declaration order
    pub const NAMES: [&'static str; 9] = [
        "energy",
        "liveness",
        "tempo",
        "speechiness",
        "acousticness",
        "danceability",
        "instrumentalness",
        "duration",
        "loudness",
    ];

    pub fn values(&self) -> [f64; 9] {
        [
            self.energy,
            self.liveness,
            self.tempo,
            self.speechiness,
            self.acousticness,
            self.danceability,
            self.instrumentalness,
            self.duration,
            self.loudness,
        ]
    }

    pub fn from_values(v: [f64; 9]) -> Self {
        Self {
            energy: v[0],
            liveness: v[1],
            tempo: v[2],
            speechiness: v[3],
            acousticness: v[4],
            danceability: v[5],
            instrumentalness: v[6],
            duration: v[7],
            loudness: v[8],
        }
    }
}

/// One search result; rank is its position in the response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTrack {
    pub artist: String,
    pub name: String,
    pub audio: AudioFeatures,
}
