use std::ops::Range;

use crate::data::model::Curve;
use crate::error::{Result, SpectraError};

use super::poly::Polynomial;

/// Where the polynomial windowing stage decided to cut.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSelection {
    /// Wavelength of the deepest first-derivative sign flip.
    pub minima: f64,
    /// Nearest second-derivative sign flip left of `minima`, or the first
    /// wavelength of the curve.
    pub left_cut: f64,
    /// Nearest second-derivative sign flip right of `minima`, or the last
    /// wavelength of the curve.
    pub right_cut: f64,
    /// Half-open index range `left_cut..right_cut` in the input curve.
    pub range: Range<usize>,
}

/// Indices where `values` changes sign.
///
/// Sign state is sticky: zeros never start or end a segment, and a flip is
/// recorded once, at the first sample of the new sign.
pub fn sign_flips(values: &[f64]) -> Vec<usize> {
    let mut was_negative = false;
    let mut was_positive = false;
    let mut flips = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        if v < 0.0 {
            if was_positive {
                flips.push(i);
            }
            was_negative = true;
            was_positive = false;
        } else if v > 0.0 {
            if was_negative {
                flips.push(i);
            }
            was_positive = true;
            was_negative = false;
        }
    }
    flips
}

/// Choose the window around the deepest feature of `curve`.
///
/// A degree-`order` least-squares polynomial is fitted to the whole curve.
/// Sign flips of its first derivative are candidate extrema; the one with
/// the lowest transmission is `minima`. The window runs between the
/// nearest second-derivative sign flips on either side of it.
pub fn select_window(curve: &Curve, order: usize) -> Result<WindowSelection> {
    if curve.len() < 2 {
        return Err(SpectraError::Domain(format!(
            "polynomial windowing needs at least 2 samples, got {}",
            curve.len()
        )));
    }
    let w = curve.wavelengths();
    let t = curve.transmission();

    let fit = Polynomial::fit(w, t, order)?;
    let d1 = fit.polynomial.derivative();
    let d2 = d1.derivative();
    let first = d1.eval_all(w);
    let second = d2.eval_all(w);

    let minima_idx = lowest_of(t, &sign_flips(&first)).unwrap_or_else(|| {
        log::debug!("polynomial window: no first-derivative flips, using global minimum");
        lowest_of(t, &(0..t.len()).collect::<Vec<_>>()).unwrap_or(0)
    });
    let minima = w[minima_idx];

    let mut left_cut: Option<f64> = None;
    let mut right_cut: Option<f64> = None;
    for idx in sign_flips(&second) {
        let x = w[idx];
        if x < minima && left_cut.map_or(true, |best| minima - x < minima - best) {
            left_cut = Some(x);
        }
        if x > minima && right_cut.map_or(true, |best| x - minima < best - minima) {
            right_cut = Some(x);
        }
    }

    let (left_cut, left_idx) = resolve_cut(curve, left_cut, 0);
    let (right_cut, right_idx) = resolve_cut(curve, right_cut, curve.len() - 1);

    log::debug!(
        "polynomial window: minima={minima} cuts=[{left_cut}, {right_cut}) rank_deficit={}",
        fit.rank_deficit
    );

    Ok(WindowSelection {
        minima,
        left_cut,
        right_cut,
        range: left_idx..right_idx,
    })
}

/// Sub-curve between the second-derivative cuts around the deepest feature.
pub fn polynomial_window(curve: &Curve, order: usize) -> Result<Curve> {
    let selection = select_window(curve, order)?;
    Ok(curve.slice(selection.range))
}

/// Index among `candidates` with the lowest transmission; first wins ties.
fn lowest_of(t: &[f64], candidates: &[usize]) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .fold(None, |best: Option<usize>, i| match best {
            Some(b) if t[b] <= t[i] => Some(b),
            _ => Some(i),
        })
}

/// Map a cut wavelength to its sample index, clamping to `fallback` when the
/// cut is absent or not an exact sample of the curve.
fn resolve_cut(curve: &Curve, cut: Option<f64>, fallback: usize) -> (f64, usize) {
    match cut.and_then(|x| curve.index_of_wavelength(x).map(|i| (x, i))) {
        Some(found) => found,
        None => (curve.wavelengths()[fallback], fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_flips_are_sticky() {
        assert_eq!(sign_flips(&[-1.0, -2.0, 1.0, 2.0, -1.0]), vec![2, 4]);
        // Zeros neither break nor start a segment.
        assert_eq!(sign_flips(&[-1.0, 0.0, 0.0, 1.0]), vec![3]);
        assert_eq!(sign_flips(&[0.0, 0.0, 1.0, 0.0, 1.0]), Vec::<usize>::new());
        assert_eq!(sign_flips(&[]), Vec::<usize>::new());
    }

    #[test]
    fn test_lowest_of_prefers_first_on_ties() {
        let t = [5.0, 1.0, 3.0, 1.0];
        assert_eq!(lowest_of(&t, &[0, 2, 3, 1]), Some(3));
        assert_eq!(lowest_of(&t, &[1, 3]), Some(1));
        assert_eq!(lowest_of(&t, &[]), None);
    }

    #[test]
    fn test_window_brackets_gaussian_dip() {
        let xs: Vec<f64> = (0..=500).map(|i| 400.0 + i as f64).collect();
        let ys: Vec<f64> = xs
            .iter()
            .map(|x| 100.0 - 40.0 * (-(x - 650.0f64).powi(2) / 1250.0).exp())
            .collect();
        let curve = Curve::new(xs, ys).unwrap();

        let sel = select_window(&curve, 51).unwrap();
        assert!((sel.minima - 650.0).abs() <= 2.0, "minima {}", sel.minima);
        // Inflections of a Gaussian sit one sigma (25 nm) from the centre.
        assert!((sel.left_cut - 625.0).abs() <= 3.0, "left {}", sel.left_cut);
        assert!((sel.right_cut - 675.0).abs() <= 3.0, "right {}", sel.right_cut);

        let window = polynomial_window(&curve, 51).unwrap();
        assert_eq!(window.len(), sel.range.len());
        assert_eq!(window.first_wavelength(), sel.left_cut);
    }

    #[test]
    fn test_cuts_clamp_to_curve_bounds() {
        // A parabola has no second-derivative flips at all.
        let xs: Vec<f64> = (0..21).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| (x - 10.5).powi(2)).collect();
        let curve = Curve::new(xs, ys).unwrap();

        let sel = select_window(&curve, 2).unwrap();
        // The slope turns positive at the first sample past the vertex.
        assert_eq!(sel.minima, 11.0);
        assert_eq!(sel.left_cut, 0.0);
        assert_eq!(sel.right_cut, 20.0);
        assert_eq!(sel.range, 0..20);
    }

    #[test]
    fn test_single_sample_is_domain_error() {
        let curve = Curve::new(vec![500.0], vec![50.0]).unwrap();
        assert!(matches!(select_window(&curve, 51), Err(SpectraError::Domain(_))));
    }
}
