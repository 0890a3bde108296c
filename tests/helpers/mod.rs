use resonance_finder::Curve;

/// Uniform grid `start..=end` with spacing `step`.
#[allow(dead_code)]
pub fn grid(start: f64, end: f64, step: f64) -> Vec<f64> {
    let n = ((end - start) / step).round() as usize;
    (0..=n).map(|i| start + i as f64 * step).collect()
}

#[inline]
#[allow(dead_code)]
pub fn gaussian_dip(x: f64, mu: f64, sigma: f64, depth: f64) -> f64 {
    depth * (-0.5 * ((x - mu) / sigma).powi(2)).exp()
}

/// Deterministic pseudo-noise in `[-0.5, 0.5)`.
#[allow(dead_code)]
pub fn jitter(i: u32) -> f64 {
    let mut x = i.wrapping_mul(1664525).wrapping_add(1013904223);
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    (x as f64 / (u32::MAX as f64)) - 0.5
}

/// `base` minus Gaussian dips `(mu, sigma, depth)`, plus `noise * jitter`.
#[allow(dead_code)]
pub fn dip_curve(xs: &[f64], dips: &[(f64, f64, f64)], base: f64, noise: f64) -> Curve {
    let ys = xs
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let absorbed: f64 = dips
                .iter()
                .map(|&(mu, sigma, depth)| gaussian_dip(x, mu, sigma, depth))
                .sum();
            base - absorbed + noise * jitter(i as u32)
        })
        .collect();
    Curve::new(xs.to_vec(), ys).expect("valid synthetic curve")
}

#[allow(dead_code)]
pub fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

#[allow(dead_code)]
pub fn assert_close_tol(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {actual} ≈ {expected} (±{tol})"
    );
}
