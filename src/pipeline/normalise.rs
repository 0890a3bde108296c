use crate::data::model::Curve;
use crate::error::{Result, SpectraError};

/// Scale transmission so the curve's maximum becomes 1.0.
pub fn normalise(curve: &Curve) -> Result<Curve> {
    let max = curve.max_transmission();
    if max == 0.0 {
        return Err(SpectraError::Domain(
            "cannot normalise a curve whose maximum is zero".into(),
        ));
    }
    Ok(curve.map_transmission(|t| t / max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_max_is_one() {
        let curve = Curve::new(vec![1.0, 2.0, 3.0], vec![20.0, 80.0, 40.0]).unwrap();
        let out = normalise(&curve).unwrap();
        assert_eq!(out.transmission(), &[0.25, 1.0, 0.5]);
        assert_eq!(out.wavelengths(), curve.wavelengths());
    }

    #[test]
    fn test_normalise_zero_max_fails() {
        let curve = Curve::new(vec![1.0, 2.0], vec![0.0, 0.0]).unwrap();
        assert!(matches!(normalise(&curve), Err(SpectraError::Domain(_))));
    }
}
