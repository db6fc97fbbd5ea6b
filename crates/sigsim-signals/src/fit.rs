//! Least-squares polynomial fit over irregularly spaced samples.

use nalgebra::{DMatrix, DVector};
use sigsim_core::{Real, factorial};

use crate::error::{SignalError, SignalResult};

/// Coefficients `p[0..=degree]` of `p[0] + p[1] t + ... + p[degree] t^degree`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialFit {
    coefficients: Vec<Real>,
}

impl PolynomialFit {
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn coefficients(&self) -> &[Real] {
        &self.coefficients
    }

    /// `k`-th derivative of the polynomial at `t = 0`.
    pub fn derivative_at_origin(&self, k: usize) -> Real {
        self.coefficients
            .get(k)
            .map_or(0.0, |p| p * factorial(k))
    }

    pub fn evaluate(&self, t: Real) -> Real {
        self.coefficients.iter().rev().fold(0.0, |acc, p| acc * t + p)
    }
}

/// Number of distinct abscissae in `times`.
pub fn distinct_points(times: &[Real]) -> usize {
    let mut sorted = times.to_vec();
    sorted.sort_by(Real::total_cmp);
    sorted.dedup();
    sorted.len()
}

/// Fit a degree-`degree` polynomial to `(times, values)` by least squares.
///
/// The time axis is rescaled by its largest magnitude before the design
/// matrix is built and the coefficients are scaled back afterwards, so
/// short windows with high degrees stay well conditioned. The solve goes
/// through an SVD.
///
/// # Errors
///
/// - [`SignalError::UnderdeterminedFit`] if there are fewer than
///   `degree + 1` distinct time points (no unique solution exists).
/// - [`SignalError::FitFailed`] on mismatched inputs or solver failure.
pub fn fit_polynomial(times: &[Real], values: &[Real], degree: usize) -> SignalResult<PolynomialFit> {
    if times.len() != values.len() {
        return Err(SignalError::FitFailed {
            what: "times and values differ in length",
        });
    }
    let samples = distinct_points(times);
    if samples < degree + 1 {
        return Err(SignalError::UnderdeterminedFit { samples, degree });
    }

    let scale = times.iter().fold(0.0_f64, |m, t| m.max(t.abs()));
    let scale = if scale > 0.0 { scale } else { 1.0 };

    let n = times.len();
    let design = DMatrix::from_fn(n, degree + 1, |r, c| (times[r] / scale).powi(c as i32));
    let rhs = DVector::from_column_slice(values);

    let svd = design.svd(true, true);
    let sigma_max = svd.singular_values.max();
    let eps = Real::EPSILON * (n.max(degree + 1) as Real) * sigma_max;
    let scaled = svd
        .solve(&rhs, eps)
        .map_err(|what| SignalError::FitFailed { what })?;

    let mut coefficients = Vec::with_capacity(degree + 1);
    let mut power = 1.0;
    for q in scaled.iter() {
        let p = q / power;
        if !p.is_finite() {
            return Err(SignalError::NonFinite {
                what: "polynomial coefficient",
                value: p,
            });
        }
        coefficients.push(p);
        power *= scale;
    }
    Ok(PolynomialFit { coefficients })
}
