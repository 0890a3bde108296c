use crate::data::model::Curve;

/// Trim the higher-shouldered side of a windowed dip so both sides rise to
/// the same level.
///
/// The curve is split at `len / 2`. The half with the lower maximum sets the
/// limit; the other half is cut at the first sample (walking in from its
/// outer edge on the left, out from the centre on the right) that reaches
/// that limit. Halves with exactly equal maxima pass through unchanged.
pub fn reframe(curve: &Curve) -> Curve {
    let n = curve.len();
    if n < 2 {
        return curve.clone();
    }
    let t = curve.transmission();
    let mid = n / 2;
    let left_max = max_of(&t[..mid]);
    let right_max = max_of(&t[mid..]);

    let range = if left_max < right_max {
        let end = (mid..n)
            .find(|&i| t[i] >= left_max)
            .map_or(n, |i| i + 1);
        0..end
    } else if right_max < left_max {
        let start = (0..mid).find(|&i| t[i] <= right_max).unwrap_or(0);
        start..n
    } else {
        0..n
    };

    log::debug!("reframe: {n} -> {} samples ({range:?})", range.len());
    curve.slice(range)
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
