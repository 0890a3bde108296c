use crate::data::model::Curve;
use crate::error::{Result, SpectraError};

/// Centred boxcar moving average of `window_points` samples.
///
/// The output has `len - window_points + 1` samples. Each average is placed
/// at the wavelength `(window_points - 1) / 2` samples into its window, so an
/// even window trims one more sample from the right edge than from the left.
pub fn smooth(curve: &Curve, window_points: usize) -> Result<Curve> {
    if window_points == 0 {
        return Err(SpectraError::Domain("smoothing window must be >= 1".into()));
    }
    if window_points > curve.len() {
        return Err(SpectraError::Domain(format!(
            "smoothing window of {window_points} exceeds curve length {}",
            curve.len()
        )));
    }

    let lead = (window_points - 1) / 2;
    let averaged = moving_average(curve.transmission(), window_points);
    let wavelengths = curve.wavelengths()[lead..lead + averaged.len()].to_vec();
    Ok(Curve::from_parts(wavelengths, averaged))
}

/// Plain running mean, one value per complete window.
pub(crate) fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || window > values.len() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len() - window + 1);
    let mut sum: f64 = values[..window].iter().sum();
    out.push(sum / window as f64);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out.push(sum / window as f64);
    }
    out
}
