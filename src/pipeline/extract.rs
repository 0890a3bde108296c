use serde::Serialize;

use crate::data::model::Curve;
use crate::error::Result;

use super::fwhm::{fwhm, FwhmStats};
use super::normalise::normalise;
use super::params::{PeakType, ProcessingParams};
use super::peak::{smoothed_peak, smoothed_series};
use super::reframe::reframe;
use super::resample::resample;
use super::smooth::smooth;
use super::window::{select_window, WindowSelection};

/// The numbers reported for one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureResult {
    /// Resonance wavelength; 0.0 when the final window was too short.
    pub peak_wavelength: f64,
    pub fwhm: f64,
    pub height: f64,
    pub baseline: f64,
}

/// Every intermediate curve of one extraction, for plotting.
///
/// Curves are in the input orientation even when `peak_type` is `Max`.
#[derive(Debug, Clone)]
pub struct FeatureTrace {
    pub preprocessed: Curve,
    pub fwhm: FwhmStats,
    pub selection: WindowSelection,
    pub windowed: Curve,
    pub reframed: Curve,
    /// Final 31-sample running mean, if the reframed curve was long enough.
    pub smoothed: Option<Curve>,
    pub result: FeatureResult,
}

/// Optional resampling, normalisation and smoothing, in that order.
pub fn preprocess(curve: &Curve, params: &ProcessingParams) -> Result<Curve> {
    let mut current = curve.clone();
    if params.interpolate {
        current = resample(&current, params.sampling_rate)?;
    }
    if params.normalise {
        current = normalise(&current)?;
    }
    if params.smooth {
        current = smooth(&current, params.smooth_points)?;
    }
    Ok(current)
}

/// Run the full chain and keep every intermediate curve.
pub fn extract_features_traced(curve: &Curve, params: &ProcessingParams) -> Result<FeatureTrace> {
    params.validate()?;

    let preprocessed = preprocess(curve, params)?;
    let stats = fwhm(&preprocessed)?;

    // Peaks are found as dips of the negated curve.
    let flip = |c: &Curve| match params.peak_type {
        PeakType::Min => c.clone(),
        PeakType::Max => c.map_transmission(|t| -t),
    };
    let oriented = flip(&preprocessed);

    let selection = select_window(&oriented, params.polynomial_order)?;
    let windowed = oriented.slice(selection.range.clone());
    let reframed = reframe(&windowed);
    let peak_wavelength = smoothed_peak(&reframed);
    let smoothed = smoothed_series(&reframed).map(|s| flip(&s));

    let result = FeatureResult {
        peak_wavelength,
        fwhm: stats.fwhm,
        height: stats.height,
        baseline: stats.baseline,
    };
    log::debug!(
        "extracted peak={:.3} fwhm={:.3} height={:.3} baseline={:.3}",
        result.peak_wavelength,
        result.fwhm,
        result.height,
        result.baseline
    );

    Ok(FeatureTrace {
        preprocessed,
        fwhm: stats,
        selection,
        windowed: flip(&windowed),
        reframed: flip(&reframed),
        smoothed,
        result,
    })
}

/// Run the full chain on one curve.
pub fn extract_features(curve: &Curve, params: &ProcessingParams) -> Result<FeatureResult> {
    extract_features_traced(curve, params).map(|trace| trace.result)
}
