use std::collections::BTreeMap;

use crate::types::{CandidateSample, Contour, ContourId};

/// Contours whose voicing probability reaches `threshold`.
pub fn threshold_contours(contours: &[Contour], threshold: f64) -> Vec<&Contour> {
    contours
        .iter()
        .filter(|c| c.probability >= threshold)
        .collect()
}

/// Pitch of a point if it carries one. Missing, non-finite and non-positive
/// frequencies are padding.
fn pitched(frequency: Option<f64>) -> Option<f64> {
    frequency.filter(|f| f.is_finite() && *f > 0.0)
}

/// Flattens contours into one sample per (time, frequency) point.
///
/// Padding points and non-finite times are dropped.
pub fn flatten<'a, I>(contours: I) -> Vec<CandidateSample>
where
    I: IntoIterator<Item = &'a Contour>,
{
    contours
        .into_iter()
        .flat_map(|contour| {
            contour.points.iter().filter_map(move |point| {
                let frequency = pitched(point.frequency)?;
                if !point.time.is_finite() {
                    return None;
                }
                Some(CandidateSample {
                    time: point.time,
                    frequency,
                    probability: contour.probability,
                    contour_id: contour.id,
                })
            })
        })
        .collect()
}

/// Mean frequency of every contour over its full span, ignoring padding.
/// Contours with no pitched point are absent from the map.
pub fn mean_frequencies<'a, I>(contours: I) -> BTreeMap<ContourId, f64>
where
    I: IntoIterator<Item = &'a Contour>,
{
    let mut out = BTreeMap::new();
    for contour in contours {
        let (sum, count) = contour
            .points
            .iter()
            .filter_map(|p| pitched(p.frequency))
            .fold((0.0f64, 0usize), |(s, n), f| (s + f, n + 1));
        if count > 0 {
            out.insert(contour.id, sum / count as f64);
        }
    }
    out
}

/// Largest finite time over all contours, used to size the fallback grid.
pub fn max_observed_time(contours: &[Contour]) -> Option<f64> {
    contours.iter().filter_map(Contour::max_time).reduce(f64::max)
}

/// Orders samples by time, then probability, keeping input order for ties.
/// The highest-probability sample ends up last among equal times.
pub fn sort_by_time_then_probability(samples: &mut [CandidateSample]) {
    samples.sort_by(|a, b| {
        a.time
            .total_cmp(&b.time)
            .then(a.probability.total_cmp(&b.probability))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContourPoint;

    fn contour(id: ContourId, points: &[(f64, Option<f64>)], probability: f64) -> Contour {
        Contour::new(
            id,
            points
                .iter()
                .map(|&(time, frequency)| ContourPoint { time, frequency })
                .collect(),
            probability,
        )
    }

    #[test]
    fn threshold_is_inclusive() {
        let contours = vec![
            contour(0, &[(0.0, Some(100.0))], 0.5),
            contour(1, &[(0.0, Some(100.0))], 0.49),
        ];
        let kept = threshold_contours(&contours, 0.5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 0);
    }

    #[test]
    fn flatten_drops_padding() {
        let contours = vec![contour(
            4,
            &[
                (0.0, Some(200.0)),
                (0.1, None),
                (f64::NAN, Some(210.0)),
                (0.3, Some(f64::NAN)),
                (0.4, Some(220.0)),
            ],
            0.8,
        )];
        let samples = flatten(&contours);
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.contour_id == 4 && s.probability == 0.8));
        assert_eq!(samples[1].frequency, 220.0);
    }

    #[test]
    fn non_positive_frequencies_are_padding() {
        let contours = vec![contour(
            1,
            &[(0.0, Some(0.0)), (0.1, Some(-5.0)), (0.2, Some(330.0))],
            0.7,
        )];
        let samples = flatten(&contours);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].frequency, 330.0);
        assert_eq!(mean_frequencies(&contours).get(&1), Some(&330.0));

        let silent = vec![contour(2, &[(0.0, Some(0.0))], 0.7)];
        assert!(flatten(&silent).is_empty());
        assert!(mean_frequencies(&silent).is_empty());
    }

    #[test]
    fn mean_frequency_uses_full_span() {
        let contours = vec![
            contour(0, &[(0.0, Some(100.0)), (0.1, Some(300.0)), (0.2, None)], 0.9),
            contour(1, &[(0.0, None)], 0.9),
        ];
        let means = mean_frequencies(&contours);
        assert_eq!(means.get(&0), Some(&200.0));
        assert!(!means.contains_key(&1));
    }

    #[test]
    fn max_observed_time_spans_all_contours() {
        let contours = vec![
            contour(0, &[(0.5, None)], 0.1),
            contour(1, &[(1.5, Some(100.0)), (f64::NAN, None)], 0.2),
        ];
        assert_eq!(max_observed_time(&contours), Some(1.5));
        assert_eq!(max_observed_time(&[]), None);
    }

    #[test]
    fn sort_places_highest_probability_last_per_time() {
        let mut samples = vec![
            CandidateSample { time: 1.0, frequency: 1.0, probability: 0.9, contour_id: 0 },
            CandidateSample { time: 0.0, frequency: 2.0, probability: 0.7, contour_id: 1 },
            CandidateSample { time: 1.0, frequency: 3.0, probability: 0.6, contour_id: 1 },
            CandidateSample { time: 0.0, frequency: 4.0, probability: 0.8, contour_id: 0 },
        ];
        sort_by_time_then_probability(&mut samples);
        let freqs: Vec<f64> = samples.iter().map(|s| s.frequency).collect();
        assert_eq!(freqs, vec![2.0, 4.0, 3.0, 1.0]);
    }
}
