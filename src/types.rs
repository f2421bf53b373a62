use serde::{Deserialize, Serialize};

pub type ContourId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourPoint {
    pub time: f64,
    /// `None` marks a padding position with no pitch.
    pub frequency: Option<f64>,
}

/// A candidate pitch trajectory with its classifier voicing probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub id: ContourId,
    pub points: Vec<ContourPoint>,
    pub probability: f64,
}

impl Contour {
    pub fn new(id: ContourId, points: Vec<ContourPoint>, probability: f64) -> Self {
        Self {
            id,
            points,
            probability,
        }
    }

    /// Builds a contour from parallel time/frequency arrays. Extra entries on
    /// either side are treated as padding and dropped.
    pub fn from_arrays(
        id: ContourId,
        times: &[f64],
        frequencies: &[Option<f64>],
        probability: f64,
    ) -> Self {
        let points = times
            .iter()
            .zip(frequencies.iter())
            .map(|(&time, &frequency)| ContourPoint { time, frequency })
            .collect();
        Self::new(id, points, probability)
    }

    /// Largest finite sample time, if any.
    pub fn max_time(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.time)
            .filter(|t| t.is_finite())
            .reduce(f64::max)
    }
}

/// One flattened (time, frequency, probability, contour) sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateSample {
    pub time: f64,
    pub frequency: f64,
    pub probability: f64,
    pub contour_id: ContourId,
}

/// A candidate sample snapped onto the output grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCandidate {
    pub grid_index: usize,
    pub sample: CandidateSample,
}

/// Decoded melody on the fixed time grid. `0.0` means unvoiced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MelodyOutput {
    pub times: Vec<f64>,
    pub frequencies: Vec<f64>,
}

impl MelodyOutput {
    pub fn unvoiced(times: Vec<f64>) -> Self {
        let frequencies = vec![0.0; times.len()];
        Self { times, frequencies }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn voiced_count(&self) -> usize {
        self.frequencies.iter().filter(|&&f| f > 0.0).count()
    }

    pub fn to_series(&self) -> MelodySeries {
        MelodySeries {
            times: self.times.clone(),
            frequencies: self.frequencies.clone(),
        }
    }
}

/// Aligned (time, frequency) arrays as exchanged with an evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodySeries {
    pub times: Vec<f64>,
    pub frequencies: Vec<f64>,
}
