use crate::data::model::Curve;
use crate::error::{Result, SpectraError};

/// Linearly interpolate `curve` onto a uniform grid starting at its first
/// wavelength with spacing `step`.
///
/// The grid is half-open: `first, first + step, ...` while `< last`, so the
/// final wavelength of the input is not reproduced unless it falls short of
/// `last` by a fraction of a step.
pub fn resample(curve: &Curve, step: f64) -> Result<Curve> {
    if curve.len() < 2 {
        return Err(SpectraError::Domain(format!(
            "resampling needs at least 2 samples, got {}",
            curve.len()
        )));
    }
    if !(step > 0.0 && step.is_finite()) {
        return Err(SpectraError::Domain(format!(
            "resampling step must be > 0, got {step}"
        )));
    }

    let xs = curve.wavelengths();
    let ys = curve.transmission();
    let start = curve.first_wavelength();
    let stop = curve.last_wavelength();
    let n = ((stop - start) / step).ceil() as usize;

    let mut grid = Vec::with_capacity(n);
    let mut values = Vec::with_capacity(n);
    let mut seg = 0;
    for i in 0..n {
        let x = start + i as f64 * step;
        // Advance to the segment [xs[seg], xs[seg + 1]] containing x.
        while seg + 2 < xs.len() && xs[seg + 1] < x {
            seg += 1;
        }
        let (x0, x1) = (xs[seg], xs[seg + 1]);
        let (y0, y1) = (ys[seg], ys[seg + 1]);
        let frac = ((x - x0) / (x1 - x0)).clamp(0.0, 1.0);
        grid.push(x);
        values.push(y0 + frac * (y1 - y0));
    }

    log::debug!("resample: {} -> {} samples (step {step})", curve.len(), n);
    Ok(Curve::from_parts(grid, values))
}
