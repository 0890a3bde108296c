use serde::Serialize;

use crate::data::model::Curve;
use crate::error::{Result, SpectraError};

/// Baseline averages samples `1..BASELINE_END`.
const BASELINE_END: usize = 100;
/// Crossing search starts here; instrument edges often dip below half-max.
const SCAN_START: usize = 30;
/// Minimum wavelength separation between the two half-max crossings.
const MIN_SIDE_SEPARATION: f64 = 10.0;

/// Width, depth and reference level of a transmission dip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FwhmStats {
    /// `side2 - side1`, or 0.0 when no crossing pair was found.
    pub fwhm: f64,
    /// `baseline - minimum`.
    pub height: f64,
    /// Mean transmission over samples 1..100.
    pub baseline: f64,
    /// Wavelengths of the falling and rising half-max crossings.
    pub edges: Option<(f64, f64)>,
}

impl FwhmStats {
    pub fn side1(&self) -> f64 {
        self.edges.map_or(0.0, |(s1, _)| s1)
    }

    pub fn side2(&self) -> f64 {
        self.edges.map_or(0.0, |(_, s2)| s2)
    }

    pub fn is_resolved(&self) -> bool {
        self.edges.is_some()
    }
}

/// Estimate full width at half maximum of the dominant dip.
///
/// The scan skips the first 30 samples and requires the rising edge to sit
/// more than 10 wavelength units beyond the falling edge. Curves without a
/// dip (`height <= 0`) report no crossings.
pub fn fwhm(curve: &Curve) -> Result<FwhmStats> {
    let t = curve.transmission();
    let w = curve.wavelengths();
    if t.len() < 2 {
        return Err(SpectraError::Domain(format!(
            "FWHM needs at least 2 samples, got {}",
            t.len()
        )));
    }

    let baseline_window = &t[1..t.len().min(BASELINE_END)];
    let baseline = baseline_window.iter().sum::<f64>() / baseline_window.len() as f64;
    let min_value = t[1..].iter().copied().fold(f64::INFINITY, f64::min);
    let height = baseline - min_value;
    let half_max = min_value + height / 2.0;

    let edges = if height > 0.0 {
        find_crossings(w, t, half_max)
    } else {
        None
    };

    let stats = FwhmStats {
        fwhm: edges.map_or(0.0, |(s1, s2)| s2 - s1),
        height,
        baseline,
        edges,
    };
    log::debug!(
        "fwhm: baseline={:.3} height={:.3} edges={:?}",
        stats.baseline,
        stats.height,
        stats.edges
    );
    Ok(stats)
}

fn find_crossings(w: &[f64], t: &[f64], half_max: f64) -> Option<(f64, f64)> {
    let mut side1: Option<f64> = None;
    for i in SCAN_START..t.len() {
        match side1 {
            None if t[i] <= half_max => side1 = Some(w[i]),
            Some(s1) if t[i] >= half_max && w[i] > s1 + MIN_SIDE_SEPARATION => {
                return Some((s1, w[i]));
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dip_curve(centre: f64, sigma: f64, depth: f64) -> Curve {
        let xs: Vec<f64> = (0..=500).map(|i| 400.0 + i as f64).collect();
        let ys = xs
            .iter()
            .map(|x| 100.0 - depth * (-(x - centre).powi(2) / (2.0 * sigma * sigma)).exp())
            .collect();
        Curve::new(xs, ys).unwrap()
    }

    #[test]
    fn test_gaussian_dip() {
        let stats = fwhm(&dip_curve(650.0, 25.0, 40.0)).unwrap();
        assert!((stats.baseline - 100.0).abs() < 1e-6);
        assert!((stats.height - 40.0).abs() < 1e-6);
        assert_eq!(stats.edges, Some((621.0, 680.0)));
        assert_eq!(stats.fwhm, 59.0);
    }

    #[test]
    fn test_monotonic_curve_has_no_edges() {
        let xs: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 100.0 - x * 0.3).collect();
        let stats = fwhm(&Curve::new(xs, ys).unwrap()).unwrap();
        assert_eq!((stats.side1(), stats.side2()), (0.0, 0.0));
        assert_eq!(stats.fwhm, 0.0);
        assert!(!stats.is_resolved());
    }

    #[test]
    fn test_rising_edge_must_clear_separation() {
        let xs: Vec<f64> = (0..300).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs
            .iter()
            .map(|&x| if (100.0..=105.0).contains(&x) { 0.0 } else { 100.0 })
            .collect();
        let stats = fwhm(&Curve::new(xs, ys).unwrap()).unwrap();
        // Samples 106..=110 are back above half-max but too close to side1.
        assert_eq!(stats.edges, Some((100.0, 111.0)));
        assert_eq!(stats.fwhm, 11.0);
    }

    #[test]
    fn test_baseline_excludes_sample_100() {
        let xs: Vec<f64> = (0..300).map(|i| i as f64).collect();
        let mut ys = vec![100.0; 300];
        ys[100] = 0.0;
        let stats = fwhm(&Curve::new(xs, ys).unwrap()).unwrap();
        assert_eq!(stats.baseline, 100.0);
        assert_eq!(stats.height, 100.0);
    }

    #[test]
    fn test_crossings_before_sample_30_are_ignored() {
        let xs: Vec<f64> = (0..300).map(|i| i as f64).collect();
        let ys: Vec<f64> = (0..300)
            .map(|i| if (5..=10).contains(&i) || (150..=170).contains(&i) { 0.0 } else { 100.0 })
            .collect();
        let stats = fwhm(&Curve::new(xs, ys).unwrap()).unwrap();
        // The edge notch pulls the baseline down but never opens side1.
        assert!((stats.baseline - 9300.0 / 99.0).abs() < 1e-9);
        assert_eq!(stats.edges, Some((150.0, 171.0)));
        assert_eq!(stats.fwhm, 21.0);
    }

    #[test]
    fn test_short_curve_clamps_baseline_window() {
        let xs: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let ys = vec![80.0; 20];
        let stats = fwhm(&Curve::new(xs, ys).unwrap()).unwrap();
        assert_eq!(stats.baseline, 80.0);
        assert_eq!(stats.height, 0.0);
        assert!(stats.edges.is_none());
    }
}
