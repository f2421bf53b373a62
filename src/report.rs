use serde::Serialize;

use crate::config::MelodyConfig;
use crate::evaluation::MelodyScores;
use crate::types::{MelodyOutput, MelodySeries};

pub const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub tracks: Vec<TrackReport>,
    pub aggregate: AggregateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub method: String,
    pub probability_threshold: f64,
    pub penalty: f64,
    pub grid_step_seconds: f64,
    pub track_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackReport {
    pub id: String,
    pub grid_len: usize,
    pub voiced_frames: usize,
    pub voiced_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<MelodyScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub melody: Option<MelodySeries>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub scored_tracks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<MelodyScores>,
}

impl Meta {
    pub fn new(generated_at: String, config: &MelodyConfig, track_count: usize) -> Self {
        Self {
            generated_at,
            method: config.method.as_str().to_string(),
            probability_threshold: config.probability_threshold,
            penalty: config.penalty,
            grid_step_seconds: crate::config::GRID_STEP_SECONDS,
            track_count,
        }
    }
}

pub fn track_report(
    id: &str,
    output: &MelodyOutput,
    scores: Option<MelodyScores>,
    include_series: bool,
) -> TrackReport {
    let voiced_frames = output.voiced_count();
    let mut notes = Vec::new();
    if voiced_frames == 0 {
        notes.push("unvoiced_output".to_string());
    }
    TrackReport {
        id: id.to_string(),
        grid_len: output.len(),
        voiced_frames,
        voiced_ratio: if output.is_empty() {
            0.0
        } else {
            voiced_frames as f64 / output.len() as f64
        },
        scores,
        melody: include_series.then(|| output.to_series()),
        notes,
    }
}

pub fn aggregate_tracks(tracks: &[TrackReport]) -> AggregateReport {
    let scored: Vec<&MelodyScores> = tracks.iter().filter_map(|t| t.scores.as_ref()).collect();
    if scored.is_empty() {
        return AggregateReport {
            scored_tracks: 0,
            mean: None,
        };
    }

    let n = scored.len() as f64;
    let mean_of = |f: fn(&MelodyScores) -> f64| scored.iter().map(|s| f(s)).sum::<f64>() / n;
    AggregateReport {
        scored_tracks: scored.len(),
        mean: Some(MelodyScores {
            voicing_recall: mean_of(|s| s.voicing_recall),
            voicing_false_alarm: mean_of(|s| s.voicing_false_alarm),
            raw_pitch_accuracy: mean_of(|s| s.raw_pitch_accuracy),
            raw_chroma_accuracy: mean_of(|s| s.raw_chroma_accuracy),
            overall_accuracy: mean_of(|s| s.overall_accuracy),
        }),
    }
}
