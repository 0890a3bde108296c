use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectraError};

/// Whether the resonance shows up as a transmission dip or a peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakType {
    #[default]
    Min,
    Max,
}

impl std::fmt::Display for PeakType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeakType::Min => write!(f, "min"),
            PeakType::Max => write!(f, "max"),
        }
    }
}

/// Options for one run of the feature-extraction pipeline.
///
/// Passed explicitly into every stage; nothing in the pipeline reads
/// configuration from anywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingParams {
    /// Apply the boxcar smoother before feature extraction.
    pub smooth: bool,
    /// Boxcar window width in samples.
    pub smooth_points: usize,
    /// Divide transmission by its maximum.
    pub normalise: bool,
    /// Resample onto a uniform wavelength grid.
    pub interpolate: bool,
    /// Grid step in nm used when `interpolate` is set.
    pub sampling_rate: f64,
    /// Degree of the least-squares polynomial used for windowing.
    pub polynomial_order: usize,
    pub peak_type: PeakType,
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            smooth: false,
            smooth_points: 5,
            normalise: false,
            interpolate: false,
            sampling_rate: 1.0,
            polynomial_order: 51,
            peak_type: PeakType::Min,
        }
    }
}

impl ProcessingParams {
    pub fn validate(&self) -> Result<()> {
        if self.smooth_points < 2 {
            return Err(SpectraError::InvalidParams(format!(
                "smooth_points must be >= 2, got {}",
                self.smooth_points
            )));
        }
        if !(self.sampling_rate > 0.0 && self.sampling_rate.is_finite()) {
            return Err(SpectraError::InvalidParams(format!(
                "sampling_rate must be > 0, got {}",
                self.sampling_rate
            )));
        }
        if self.polynomial_order < 2 {
            return Err(SpectraError::InvalidParams(format!(
                "polynomial_order must be >= 2, got {}",
                self.polynomial_order
            )));
        }
        Ok(())
    }

    /// Load parameters from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading parameter file {}", path.display()))?;
        let params: ProcessingParams =
            serde_json::from_str(&text).context("parsing parameter JSON")?;
        params.validate()?;
        Ok(params)
    }
}
