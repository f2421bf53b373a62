use crate::config::{DecodeMethod, MelodyConfig};
use crate::decoding::assemble::{assemble_max, assemble_viterbi, ClusterDecoding};
use crate::decoding::candidates::{
    flatten, max_observed_time, mean_frequencies, sort_by_time_then_probability,
    threshold_contours,
};
use crate::decoding::grid::TimeGrid;
use crate::error::MelodyError;
use crate::pipeline::traits::{ContourProvider, PathDecoder, TransitionModel};
use crate::types::{Contour, GridCandidate, MelodyOutput};

pub struct MelodyDecoder {
    config: MelodyConfig,
    transition_model: Box<dyn TransitionModel>,
    path_decoder: Box<dyn PathDecoder>,
}

pub(crate) struct MelodyDecoderParts {
    pub config: MelodyConfig,
    pub transition_model: Box<dyn TransitionModel>,
    pub path_decoder: Box<dyn PathDecoder>,
}

impl MelodyDecoder {
    pub(crate) fn from_parts(parts: MelodyDecoderParts) -> Self {
        Self {
            config: parts.config,
            transition_model: parts.transition_model,
            path_decoder: parts.path_decoder,
        }
    }

    pub fn config(&self) -> &MelodyConfig {
        &self.config
    }

    pub fn decode_from(&self, provider: &dyn ContourProvider) -> Result<MelodyOutput, MelodyError> {
        let contours = provider.contours()?;
        self.decode(&contours)
    }

    /// Resolves the contours into one melody on the fixed time grid.
    pub fn decode(&self, contours: &[Contour]) -> Result<MelodyOutput, MelodyError> {
        let kept = threshold_contours(contours, self.config.probability_threshold);
        let mut samples = flatten(kept.iter().copied());

        let Some(max_time) = samples.iter().map(|s| s.time).reduce(f64::max) else {
            let fallback_max = max_observed_time(contours).unwrap_or(0.0);
            let grid = TimeGrid::covering(fallback_max);
            tracing::warn!(
                threshold = self.config.probability_threshold,
                contours = contours.len(),
                grid_len = grid.len(),
                "no contours above threshold; emitting unvoiced melody"
            );
            return Ok(MelodyOutput::unvoiced(grid.into_times()));
        };

        sort_by_time_then_probability(&mut samples);
        let grid = TimeGrid::covering(max_time);
        let candidates: Vec<GridCandidate> = samples
            .into_iter()
            .map(|sample| GridCandidate {
                grid_index: grid.snap(sample.time),
                sample,
            })
            .collect();

        tracing::debug!(
            method = self.config.method.as_str(),
            contours_kept = kept.len(),
            candidates = candidates.len(),
            grid_len = grid.len(),
            "decoding melody"
        );

        match self.config.method {
            DecodeMethod::Max => Ok(assemble_max(grid, &candidates)),
            DecodeMethod::Viterbi => {
                let means = mean_frequencies(kept.iter().copied());
                let decoding = ClusterDecoding {
                    mean_frequencies: &means,
                    transition_model: self.transition_model.as_ref(),
                    path_decoder: self.path_decoder.as_ref(),
                    penalty: self.config.penalty,
                };
                assemble_viterbi(grid, &candidates, &decoding)
            }
        }
    }
}
