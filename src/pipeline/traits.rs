use crate::error::MelodyError;
use crate::types::Contour;

/// Source of classified contours for one track.
pub trait ContourProvider: Send + Sync {
    fn contours(&self) -> Result<Vec<Contour>, MelodyError>;
}

pub trait TransitionModel: Send + Sync {
    fn transition_matrix(&self, center_freqs: &[f64]) -> Result<Vec<Vec<f64>>, MelodyError>;
}

pub trait PathDecoder: Send + Sync {
    fn decode_path(
        &self,
        posterior: &[Vec<f64>],
        transition: &[Vec<f64>],
        penalty: f64,
    ) -> Result<Vec<usize>, MelodyError>;
}
