use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::decoding::transition::pitch_transition_matrix;
use crate::decoding::viterbi::viterbi;
use crate::error::MelodyError;
use crate::pipeline::traits::{ContourProvider, PathDecoder, TransitionModel};
use crate::types::{Contour, ContourId};

pub struct LogPitchTransitionModel;

impl TransitionModel for LogPitchTransitionModel {
    fn transition_matrix(&self, center_freqs: &[f64]) -> Result<Vec<Vec<f64>>, MelodyError> {
        pitch_transition_matrix(center_freqs)
    }
}

/// Scaled Viterbi with a uniform prior.
pub struct ViterbiPathDecoder;

impl PathDecoder for ViterbiPathDecoder {
    fn decode_path(
        &self,
        posterior: &[Vec<f64>],
        transition: &[Vec<f64>],
        penalty: f64,
    ) -> Result<Vec<usize>, MelodyError> {
        viterbi(posterior, Some(transition), None, penalty)
    }
}

#[derive(Debug, Deserialize)]
struct ContourFile {
    contours: Vec<ContourRecord>,
}

#[derive(Debug, Deserialize)]
struct ContourRecord {
    id: ContourId,
    probability: f64,
    times: Vec<f64>,
    /// `null` entries are padding.
    frequencies: Vec<Option<f64>>,
}

/// Reads `{"contours": [{"id", "probability", "times", "frequencies"}]}`.
pub struct JsonContourProvider {
    path: PathBuf,
}

impl JsonContourProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse(data: &str) -> Result<Vec<Contour>, MelodyError> {
        let file: ContourFile =
            serde_json::from_str(data).map_err(|e| MelodyError::json("parse contour file", e))?;
        Ok(file
            .contours
            .into_iter()
            .map(|r| Contour::from_arrays(r.id, &r.times, &r.frequencies, r.probability))
            .collect())
    }
}

impl ContourProvider for JsonContourProvider {
    fn contours(&self) -> Result<Vec<Contour>, MelodyError> {
        let data = std::fs::read_to_string(&self.path)
            .map_err(|e| MelodyError::io("read contour file", e))?;
        Self::parse(&data)
    }
}
