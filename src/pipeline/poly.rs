//! Least-squares polynomial fitting with analytic derivatives.
//!
//! The polynomial is held as a Chebyshev series over the fitted wavelength
//! range mapped onto `[-1, 1]`. At the high degrees used for windowing a
//! plain power basis is numerically rank-deficient; the Chebyshev basis
//! keeps the least-squares system well conditioned while derivatives are
//! still exact term-by-term differentiation of the series.

use nalgebra::{DMatrix, DVector, SVD};

use crate::error::{Result, SpectraError};

/// A polynomial `p(x) = Σ c_k T_k(t)` with `t` the affine map of
/// `[lo, hi]` onto `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<f64>,
    lo: f64,
    hi: f64,
}

/// Outcome of [`Polynomial::fit`].
#[derive(Debug, Clone)]
pub struct PolyFit {
    pub polynomial: Polynomial,
    /// Singular directions of the design matrix treated as zero.
    pub rank_deficit: usize,
}

impl Polynomial {
    /// Least-squares fit of degree `degree` to `(xs, ys)`.
    ///
    /// The degree is lowered to `len - 1` when there are too few samples.
    /// Numerically dependent directions are dropped from the solution instead
    /// of failing the fit.
    pub fn fit(xs: &[f64], ys: &[f64], degree: usize) -> Result<PolyFit> {
        if xs.len() != ys.len() {
            return Err(SpectraError::Domain(format!(
                "polynomial fit: {} x values but {} y values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(SpectraError::Domain(format!(
                "polynomial fit needs at least 2 samples, got {}",
                xs.len()
            )));
        }

        let degree = if degree >= xs.len() {
            log::warn!(
                "polynomial degree {degree} lowered to {} for a {}-sample curve",
                xs.len() - 1,
                xs.len()
            );
            xs.len() - 1
        } else {
            degree
        };

        let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if hi <= lo {
            return Err(SpectraError::Domain(
                "polynomial fit over a zero-width wavelength range".into(),
            ));
        }

        let mut poly = Polynomial {
            coeffs: Vec::new(),
            lo,
            hi,
        };
        let design = poly.design_matrix(xs, degree + 1);
        let (coeffs, rank_deficit) = least_squares(design, ys)?;
        if rank_deficit > 0 {
            log::debug!("polynomial fit: rank deficient by {rank_deficit} of {}", degree + 1);
        }
        poly.coeffs = coeffs;
        Ok(PolyFit {
            polynomial: poly,
            rank_deficit,
        })
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    fn to_unit(&self, x: f64) -> f64 {
        (2.0 * x - (self.lo + self.hi)) / (self.hi - self.lo)
    }

    /// Chebyshev design matrix, `T_k(t_i)` at row `i`, column `k`.
    fn design_matrix(&self, xs: &[f64], n_terms: usize) -> DMatrix<f64> {
        let ts: Vec<f64> = xs.iter().map(|&x| self.to_unit(x)).collect();
        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(n_terms);
        for k in 0..n_terms {
            let col = match k {
                0 => vec![1.0; ts.len()],
                1 => ts.clone(),
                _ => (0..ts.len())
                    .map(|i| 2.0 * ts[i] * columns[k - 1][i] - columns[k - 2][i])
                    .collect(),
            };
            columns.push(col);
        }
        DMatrix::from_iterator(ts.len(), n_terms, columns.into_iter().flatten())
    }

    /// Evaluate with the Clenshaw recurrence.
    pub fn eval(&self, x: f64) -> f64 {
        let Some((&c0, rest)) = self.coeffs.split_first() else {
            return 0.0;
        };
        let t = self.to_unit(x);
        let (mut b1, mut b2) = (0.0, 0.0);
        for &c in rest.iter().rev() {
            let b0 = c + 2.0 * t * b1 - b2;
            b2 = b1;
            b1 = b0;
        }
        c0 + t * b1 - b2
    }

    pub fn eval_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }

    /// First derivative with respect to `x`.
    pub fn derivative(&self) -> Polynomial {
        let n = self.degree();
        if n == 0 {
            return Polynomial {
                coeffs: vec![0.0],
                lo: self.lo,
                hi: self.hi,
            };
        }
        // d_{k-1} = d_{k+1} + 2k c_k, halving d_0 at the end.
        let mut d = vec![0.0; n + 2];
        for k in (1..=n).rev() {
            d[k - 1] = d[k + 1] + 2.0 * k as f64 * self.coeffs[k];
        }
        d[0] /= 2.0;
        d.truncate(n);

        let scale = 2.0 / (self.hi - self.lo);
        Polynomial {
            coeffs: d.into_iter().map(|c| c * scale).collect(),
            lo: self.lo,
            hi: self.hi,
        }
    }
}

/// Minimum-norm least squares through the SVD of the design matrix.
///
/// Singular values at or below `max(rows, cols) * EPSILON * σ_max` are
/// treated as zero. Returns the coefficients and how many were dropped.
fn least_squares(a: DMatrix<f64>, ys: &[f64]) -> Result<(Vec<f64>, usize)> {
    let (rows, cols) = a.shape();
    let b = DVector::from_column_slice(ys);
    let svd = SVD::new(a, true, true);

    let eps = svd.singular_values.max() * rows.max(cols) as f64 * f64::EPSILON;
    let rank = svd.singular_values.iter().filter(|&&s| s > eps).count();
    let coeffs = svd
        .solve(&b, eps)
        .map_err(|e| SpectraError::Domain(format!("polynomial fit: {e}")))?;
    Ok((coeffs.iter().copied().collect(), cols - rank))
}
