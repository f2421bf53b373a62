use crate::decoding::normalize::normalize_rows;
use crate::error::MelodyError;

/// Row-stochastic transition matrix from contour centre pitches.
///
/// Entry (i, j) starts as |log2 f_j - log2 f_i|, is row-normalised, flipped to
/// an affinity (`1 - d`) and row-normalised again. Off-diagonal penalties are
/// applied later by the decoder.
pub fn pitch_transition_matrix(center_freqs: &[f64]) -> Result<Vec<Vec<f64>>, MelodyError> {
    if let Some(bad) = center_freqs.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
        return Err(MelodyError::invalid_input(format!(
            "centre frequencies must be finite and positive, got {bad}"
        )));
    }

    let log_freqs: Vec<f64> = center_freqs.iter().map(|f| f.log2()).collect();
    let distances: Vec<Vec<f64>> = log_freqs
        .iter()
        .map(|&from| log_freqs.iter().map(|&to| (to - from).abs()).collect())
        .collect();

    let affinity: Vec<Vec<f64>> = normalize_rows(&distances)
        .into_iter()
        .map(|row| row.into_iter().map(|d| 1.0 - d).collect())
        .collect();
    Ok(normalize_rows(&affinity))
}
