use crate::data::model::Curve;

use super::smooth::moving_average;

/// Samples either side of the centre in the final averaging window.
pub const PEAK_HALF_WINDOW: usize = 15;
const PEAK_WINDOW: usize = 2 * PEAK_HALF_WINDOW + 1;

/// The 31-sample running mean of `curve`, placed on the centre wavelength of
/// each window. `None` when the curve is shorter than one window.
pub fn smoothed_series(curve: &Curve) -> Option<Curve> {
    if curve.len() < PEAK_WINDOW {
        return None;
    }
    let averaged = moving_average(curve.transmission(), PEAK_WINDOW);
    let wavelengths =
        curve.wavelengths()[PEAK_HALF_WINDOW..PEAK_HALF_WINDOW + averaged.len()].to_vec();
    Some(Curve::from_parts(wavelengths, averaged))
}

/// Wavelength of the minimum of the heavily smoothed curve.
///
/// Returns 0.0 when the curve is too short to smooth. For transmission peaks
/// the caller negates the curve first.
pub fn smoothed_peak(curve: &Curve) -> f64 {
    let Some(series) = smoothed_series(curve) else {
        log::debug!(
            "smoothed peak: {} samples is below the {PEAK_WINDOW}-sample window",
            curve.len()
        );
        return 0.0;
    };
    let t = series.transmission();
    let idx = (1..t.len()).fold(0, |best, i| if t[i] < t[best] { i } else { best });
    series.wavelengths()[idx]
}
