use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::MelodyError;
use crate::types::{MelodyOutput, MelodySeries};

const CENTS_TOLERANCE: f64 = 50.0;
const CENTS_REFERENCE_HZ: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MelodyScores {
    pub voicing_recall: f64,
    pub voicing_false_alarm: f64,
    pub raw_pitch_accuracy: f64,
    pub raw_chroma_accuracy: f64,
    pub overall_accuracy: f64,
}

/// Compares an estimated melody against a reference annotation.
pub trait MelodyEvaluator: Send + Sync {
    fn evaluate(
        &self,
        reference: &MelodySeries,
        estimate: &MelodySeries,
    ) -> Result<MelodyScores, MelodyError>;
}

/// Frame-level melody metrics on the estimate's time base.
///
/// The reference is resampled onto the estimate timestamps: voicing from the
/// nearest reference frame, pitch interpolated linearly in cents when both
/// neighbouring reference frames are voiced. Pitch is correct within 50 cents;
/// chroma accuracy also forgives octave errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMelodyEvaluator;

impl MelodyEvaluator for StandardMelodyEvaluator {
    fn evaluate(
        &self,
        reference: &MelodySeries,
        estimate: &MelodySeries,
    ) -> Result<MelodyScores, MelodyError> {
        check_series("reference", reference)?;
        check_series("estimate", estimate)?;

        let ref_cents = resample_cents(reference, &estimate.times);
        let est_cents: Vec<Option<f64>> = estimate.frequencies.iter().map(|&f| hz_to_cents(f)).collect();

        let mut ref_voiced = 0usize;
        let mut ref_unvoiced = 0usize;
        let mut recall_hits = 0usize;
        let mut false_alarms = 0usize;
        let mut pitch_hits = 0usize;
        let mut chroma_hits = 0usize;
        let mut unvoiced_hits = 0usize;

        for (r, e) in ref_cents.iter().zip(est_cents.iter()) {
            match (r, e) {
                (Some(r), Some(e)) => {
                    ref_voiced += 1;
                    recall_hits += 1;
                    let diff = (e - r).abs();
                    if diff <= CENTS_TOLERANCE {
                        pitch_hits += 1;
                    }
                    let folded = (diff - 1200.0 * (diff / 1200.0).round()).abs();
                    if folded <= CENTS_TOLERANCE {
                        chroma_hits += 1;
                    }
                }
                (Some(_), None) => ref_voiced += 1,
                (None, Some(_)) => {
                    ref_unvoiced += 1;
                    false_alarms += 1;
                }
                (None, None) => {
                    ref_unvoiced += 1;
                    unvoiced_hits += 1;
                }
            }
        }

        let total = ref_voiced + ref_unvoiced;
        Ok(MelodyScores {
            voicing_recall: ratio(recall_hits, ref_voiced),
            voicing_false_alarm: ratio(false_alarms, ref_unvoiced),
            raw_pitch_accuracy: ratio(pitch_hits, ref_voiced),
            raw_chroma_accuracy: ratio(chroma_hits, ref_voiced),
            overall_accuracy: ratio(pitch_hits + unvoiced_hits, total),
        })
    }
}

/// Scores every decoded track against its annotation, in track-id order.
/// Tracks whose output is `None` are skipped.
pub fn score_melodies(
    outputs: &BTreeMap<String, Option<MelodyOutput>>,
    annotations: &BTreeMap<String, MelodySeries>,
    evaluator: &dyn MelodyEvaluator,
) -> Result<BTreeMap<String, MelodyScores>, MelodyError> {
    let mut scores = BTreeMap::new();
    for (track_id, output) in outputs {
        let Some(output) = output else {
            tracing::info!(track = track_id.as_str(), "scoring: skipping track without output");
            continue;
        };
        let reference = annotations.get(track_id).ok_or_else(|| {
            MelodyError::invalid_input(format!("no annotation for track '{track_id}'"))
        })?;
        let track_scores = evaluator.evaluate(reference, &output.to_series())?;
        tracing::info!(
            track = track_id.as_str(),
            overall_accuracy = format!("{:.3}", track_scores.overall_accuracy),
            "scoring: track scored"
        );
        scores.insert(track_id.clone(), track_scores);
    }
    Ok(scores)
}

fn check_series(label: &str, series: &MelodySeries) -> Result<(), MelodyError> {
    if series.times.len() != series.frequencies.len() {
        return Err(MelodyError::invalid_input(format!(
            "{label} has {} times but {} frequencies",
            series.times.len(),
            series.frequencies.len()
        )));
    }
    Ok(())
}

fn hz_to_cents(freq: f64) -> Option<f64> {
    (freq.is_finite() && freq > 0.0).then(|| 1200.0 * (freq / CENTS_REFERENCE_HZ).log2())
}

fn resample_cents(reference: &MelodySeries, times: &[f64]) -> Vec<Option<f64>> {
    let ref_times = &reference.times;
    let cents: Vec<Option<f64>> = reference.frequencies.iter().map(|&f| hz_to_cents(f)).collect();
    if ref_times.is_empty() {
        return vec![None; times.len()];
    }

    times
        .iter()
        .map(|&t| {
            let right = ref_times.partition_point(|&r| r < t);
            if right == 0 {
                return cents[0];
            }
            if right == ref_times.len() {
                return cents[right - 1];
            }
            let left = right - 1;
            let (t0, t1) = (ref_times[left], ref_times[right]);
            match (cents[left], cents[right]) {
                (Some(c0), Some(c1)) if t1 > t0 => {
                    let w = (t - t0) / (t1 - t0);
                    Some(c0 + w * (c1 - c0))
                }
                _ => {
                    if (t - t0).abs() <= (t1 - t).abs() {
                        cents[left]
                    } else {
                        cents[right]
                    }
                }
            }
        })
        .collect()
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(times: &[f64], freqs: &[f64]) -> MelodySeries {
        MelodySeries {
            times: times.to_vec(),
            frequencies: freqs.to_vec(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn perfect_estimate_scores_one() {
        let reference = series(&[0.0, 0.1, 0.2, 0.3], &[440.0, 440.0, 0.0, 220.0]);
        let scores = StandardMelodyEvaluator.evaluate(&reference, &reference).unwrap();
        assert!(close(scores.voicing_recall, 1.0));
        assert!(close(scores.voicing_false_alarm, 0.0));
        assert!(close(scores.raw_pitch_accuracy, 1.0));
        assert!(close(scores.raw_chroma_accuracy, 1.0));
        assert!(close(scores.overall_accuracy, 1.0));
    }

    #[test]
    fn octave_error_counts_for_chroma_only() {
        let reference = series(&[0.0, 0.1], &[220.0, 220.0]);
        let estimate = series(&[0.0, 0.1], &[440.0, 440.0]);
        let scores = StandardMelodyEvaluator.evaluate(&reference, &estimate).unwrap();
        assert!(close(scores.raw_pitch_accuracy, 0.0));
        assert!(close(scores.raw_chroma_accuracy, 1.0));
        assert!(close(scores.voicing_recall, 1.0));
    }

    #[test]
    fn false_alarm_and_missed_voicing() {
        let reference = series(&[0.0, 0.1, 0.2, 0.3], &[0.0, 0.0, 300.0, 300.0]);
        let estimate = series(&[0.0, 0.1, 0.2, 0.3], &[300.0, 0.0, 0.0, 301.0]);
        let scores = StandardMelodyEvaluator.evaluate(&reference, &estimate).unwrap();
        assert!(close(scores.voicing_recall, 0.5));
        assert!(close(scores.voicing_false_alarm, 0.5));
        assert!(close(scores.raw_pitch_accuracy, 0.5));
        assert!(close(scores.overall_accuracy, 0.5));
    }

    #[test]
    fn reference_is_interpolated_onto_estimate_times() {
        let reference = series(&[0.0, 1.0], &[100.0, 400.0]);
        // Halfway in cents between 100 Hz and 400 Hz is 200 Hz.
        let estimate = series(&[0.5], &[200.0]);
        let scores = StandardMelodyEvaluator.evaluate(&reference, &estimate).unwrap();
        assert!(close(scores.raw_pitch_accuracy, 1.0));
    }

    #[test]
    fn mismatched_series_is_rejected() {
        let bad = series(&[0.0, 0.1], &[100.0]);
        let good = series(&[0.0], &[100.0]);
        assert!(StandardMelodyEvaluator.evaluate(&bad, &good).is_err());
    }

    #[test]
    fn score_melodies_skips_missing_outputs() {
        let mut outputs = BTreeMap::new();
        outputs.insert(
            "a".to_string(),
            Some(MelodyOutput {
                times: vec![0.0, 0.1],
                frequencies: vec![440.0, 0.0],
            }),
        );
        outputs.insert("b".to_string(), None);
        let mut annotations = BTreeMap::new();
        annotations.insert("a".to_string(), series(&[0.0, 0.1], &[440.0, 0.0]));

        let scores = score_melodies(&outputs, &annotations, &StandardMelodyEvaluator).unwrap();
        assert_eq!(scores.len(), 1);
        assert!(close(scores["a"].overall_accuracy, 1.0));
    }

    #[test]
    fn score_melodies_requires_annotation() {
        let mut outputs = BTreeMap::new();
        outputs.insert("x".to_string(), Some(MelodyOutput::unvoiced(vec![0.0])));
        let result = score_melodies(&outputs, &BTreeMap::new(), &StandardMelodyEvaluator);
        assert!(matches!(result, Err(MelodyError::InvalidInput { .. })));
    }
}
