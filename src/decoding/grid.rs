use crate::config::GRID_STEP_SECONDS;

/// Fixed-step output time axis `0, S, 2S, ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    step: f64,
    times: Vec<f64>,
}

impl TimeGrid {
    /// Grid spanning `[0, max_time + 1)` seconds at the contour hop size.
    pub fn covering(max_time: f64) -> Self {
        Self::with_step(max_time, GRID_STEP_SECONDS)
    }

    pub fn with_step(max_time: f64, step: f64) -> Self {
        let stop = if max_time.is_finite() { max_time.max(0.0) + 1.0 } else { 1.0 };
        let len = ((stop / step).ceil() as usize).max(1);
        let times = (0..len).map(|i| i as f64 * step).collect();
        Self { step, times }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn into_times(self) -> Vec<f64> {
        self.times
    }

    /// Nearest grid index for `time`. Equidistant times go to the later point.
    pub fn snap(&self, time: f64) -> usize {
        let last = self.times.len().saturating_sub(1);
        // Insertion point, as a left-sided binary search.
        let idx = self.times.partition_point(|&g| g < time).min(last);
        if idx > 0 && (time - self.times[idx - 1]).abs() < (time - self.times[idx]).abs() {
            idx - 1
        } else {
            idx
        }
    }

    pub fn snap_all(&self, times: &[f64]) -> Vec<usize> {
        times.iter().map(|&t| self.snap(t)).collect()
    }
}
