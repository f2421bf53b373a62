pub mod config;
pub mod decoding;
pub mod error;
pub mod evaluation;
pub mod pipeline;
pub mod report;
pub mod types;

pub use config::{DecodeMethod, MelodyConfig, GRID_STEP_SECONDS};
pub use decoding::normalize::{normalize, NormalizeAxis};
pub use decoding::viterbi::viterbi;
pub use error::MelodyError;
pub use evaluation::{score_melodies, MelodyEvaluator, MelodyScores, StandardMelodyEvaluator};
pub use pipeline::builder::MelodyDecoderBuilder;
pub use pipeline::defaults::{JsonContourProvider, LogPitchTransitionModel, ViterbiPathDecoder};
pub use pipeline::runtime::MelodyDecoder;
pub use pipeline::traits::{ContourProvider, PathDecoder, TransitionModel};
pub use report::{aggregate_tracks, track_report, Meta, Report, TrackReport};
pub use types::{CandidateSample, Contour, ContourId, ContourPoint, MelodyOutput, MelodySeries};
