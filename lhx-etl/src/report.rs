//! Aggregate listening statistics over enriched tracks
//!
//! Now-playing entries count toward totals, top lists and coverage, but have
//! no month and are left out of the monthly series.

use crate::models::{AudioFeatures, EnrichedTrack};
use lhx_common::time::month_key;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Default length of the top artist / track lists
pub const DEFAULT_TOP_N: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListeningReport {
    pub total_plays: usize,
    pub now_playing: usize,
    pub loved_plays: usize,
    /// Ascending by month
    pub months: Vec<MonthStats>,
    pub top_artists: Vec<PlayCount>,
    pub top_tracks: Vec<PlayCount>,
    /// Plays per album release year
    pub release_years: BTreeMap<i32, usize>,
    pub coverage: Coverage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthStats {
    /// `YYYY-MM`
    pub month: String,
    pub plays: usize,
    pub loved: usize,
    /// Mean of each feature over this month's plays that have features
    pub feature_means: Option<AudioFeatures>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayCount {
    pub name: String,
    pub plays: usize,
}

/// Share of plays that found a match in each enrichment source
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coverage {
    pub with_audio: usize,
    pub with_year: usize,
    pub audio_ratio: f64,
    pub year_ratio: f64,
}

#[derive(Default)]
struct MonthAccumulator {
    plays: usize,
    loved: usize,
    feature_sums: [f64; 9],
    with_features: usize,
}

impl MonthAccumulator {
    fn add(&mut self, track: &EnrichedTrack) {
        self.plays += 1;
        if track.loved {
            self.loved += 1;
        }
        if let Some(audio) = &track.audio {
            for (sum, value) in self.feature_sums.iter_mut().zip(audio.values()) {
                *sum += value;
            }
            self.with_features += 1;
        }
    }

    fn finish(self, month: String) -> MonthStats {
        let feature_means = (self.with_features > 0).then(|| {
            let n = self.with_features as f64;
            AudioFeatures::from_values(self.feature_sums.map(|sum| sum / n))
        });
        MonthStats {
            month,
            plays: self.plays,
            loved: self.loved,
            feature_means,
        }
    }
}

/// Build the report; `top_n` bounds both top lists
pub fn build_report(tracks: &[EnrichedTrack], top_n: usize) -> ListeningReport {
    let mut months: BTreeMap<String, MonthAccumulator> = BTreeMap::new();
    let mut artists: HashMap<&str, usize> = HashMap::new();
    let mut songs: HashMap<(&str, &str), usize> = HashMap::new();
    let mut release_years = BTreeMap::new();
    let mut now_playing = 0;
    let mut loved_plays = 0;
    let mut with_audio = 0;
    let mut with_year = 0;

    for track in tracks {
        match &track.listened_at {
            Some(at) => months.entry(month_key(at)).or_default().add(track),
            None => now_playing += 1,
        }

        if track.loved {
            loved_plays += 1;
        }
        if track.audio.is_some() {
            with_audio += 1;
        }
        if let Some(year) = track.album.year {
            with_year += 1;
            *release_years.entry(year).or_insert(0) += 1;
        }

        *artists.entry(track.artist.as_str()).or_insert(0) += 1;
        *songs
            .entry((track.artist.as_str(), track.name.as_str()))
            .or_insert(0) += 1;
    }

    let total_plays = tracks.len();
    let ratio = |n: usize| {
        if total_plays == 0 {
            0.0
        } else {
            n as f64 / total_plays as f64
        }
    };

    ListeningReport {
        total_plays,
        now_playing,
        loved_plays,
        months: months
            .into_iter()
            .map(|(month, acc)| acc.finish(month))
            .collect(),
        top_artists: top_counts(
            artists.into_iter().map(|(name, plays)| (name.to_string(), plays)),
            top_n,
        ),
        top_tracks: top_counts(
            songs
                .into_iter()
                .map(|((artist, name), plays)| (format!("{} - {}", artist, name), plays)),
            top_n,
        ),
        release_years,
        coverage: Coverage {
            with_audio,
            with_year,
            audio_ratio: ratio(with_audio),
            year_ratio: ratio(with_year),
        },
    }
}

/// Most played first, ties broken by name
fn top_counts(counts: impl Iterator<Item = (String, usize)>, top_n: usize) -> Vec<PlayCount> {
    let mut counts: Vec<PlayCount> = counts
        .map(|(name, plays)| PlayCount { name, plays })
        .collect();
    counts.sort_by(|a, b| b.plays.cmp(&a.plays).then_with(|| a.name.cmp(&b.name)));
    counts.truncate(top_n);
    counts
}
