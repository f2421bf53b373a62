use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MelodyError;

/// Contour time stamp step: one hop of 128 samples at 44.1 kHz.
pub const GRID_STEP_SECONDS: f64 = 128.0 / 44_100.0;

/// How competing candidates at one grid slot are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMethod {
    /// Highest-probability candidate per slot, independently.
    Max,
    /// Singletons pass through; conflict clusters are Viterbi-decoded.
    #[default]
    Viterbi,
}

impl DecodeMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Viterbi => "viterbi",
        }
    }
}

impl fmt::Display for DecodeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecodeMethod {
    type Err = MelodyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "viterbi" => Ok(Self::Viterbi),
            other => Err(MelodyError::invalid_input(format!(
                "unknown decoding method '{other}' (expected 'max' or 'viterbi')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodyConfig {
    /// Minimum contour voicing probability for a contour to be kept.
    #[serde(default = "default_probability_threshold")]
    pub probability_threshold: f64,
    /// Exponent of the off-diagonal transition penalty; 0 disables it.
    #[serde(default)]
    pub penalty: f64,
    #[serde(default)]
    pub method: DecodeMethod,
}

fn default_probability_threshold() -> f64 {
    MelodyConfig::DEFAULT_PROBABILITY_THRESHOLD
}

impl MelodyConfig {
    pub const DEFAULT_PROBABILITY_THRESHOLD: f64 = 0.5;

    pub fn load(path: &Path) -> Result<Self, MelodyError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| MelodyError::io("read melody config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| MelodyError::json("parse melody config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MelodyError> {
        if !self.probability_threshold.is_finite() {
            return Err(MelodyError::invalid_input(format!(
                "probability_threshold must be finite, got {}",
                self.probability_threshold
            )));
        }
        if !self.penalty.is_finite() || self.penalty < 0.0 {
            return Err(MelodyError::invalid_input(format!(
                "penalty must be finite and >= 0, got {}",
                self.penalty
            )));
        }
        Ok(())
    }
}

impl Default for MelodyConfig {
    fn default() -> Self {
        Self {
            probability_threshold: Self::DEFAULT_PROBABILITY_THRESHOLD,
            penalty: 0.0,
            method: DecodeMethod::default(),
        }
    }
}
