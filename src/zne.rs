// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Zero-noise extrapolation.
//!
//! An observable is measured at several noise scale factors s ≥ 1 and a
//! least-squares polynomial in s is evaluated at s = 0.
//!
//! Ref: Temme, Bravyi & Gambetta (2017), PRL 119, 180509.

use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, ValidationError};
use crate::linalg::solve;

/// Fitted polynomial, lowest power first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZneFit {
    pub coefficients: Vec<f64>,
    /// Order actually fitted (may be below the request).
    pub order: usize,
    pub value_at_zero: f64,
}

impl ZneFit {
    pub fn evaluate(&self, scale: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &a| acc * scale + a)
    }
}

/// Observable values per scale plus the fit through them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZneResult {
    pub scales: Vec<f64>,
    pub values: Vec<f64>,
    pub fit: ZneFit,
}

impl ZneResult {
    /// Extrapolated zero-noise value.
    pub fn mitigated(&self) -> f64 {
        self.fit.value_at_zero
    }
}

/// Fit a polynomial of degree `order` (clamped to `len − 1`) and evaluate
/// it at zero.
///
/// When the normal equations are singular, for example with repeated
/// scales, the order is lowered until they are not. Order 0 is the mean.
///
/// # Errors
///
/// Empty input, or `scales` and `values` of different lengths.
pub fn extrapolate(scales: &[f64], values: &[f64], order: usize) -> Result<ZneFit> {
    if scales.is_empty() {
        return Err(ValidationError::field("scales", "need at least one point").into());
    }
    if scales.len() != values.len() {
        return Err(ValidationError::Dimension {
            expected: scales.len(),
            actual: values.len(),
        }
        .into());
    }

    let requested = order;
    let mut order = order.min(scales.len() - 1);
    loop {
        if let Some(coefficients) = least_squares(scales, values, order) {
            let value_at_zero = coefficients[0];
            if order < requested {
                debug!(requested, fitted = order, "ZNE order reduced");
            }
            return Ok(ZneFit {
                coefficients,
                order,
                value_at_zero,
            });
        }
        if order == 0 {
            return Err(ValidationError::PhysicsConstraint(
                "ZNE fit is not finite".into(),
            )
            .into());
        }
        order -= 1;
    }
}

/// Solve (VᵀV) a = Vᵀy for the Vandermonde matrix V.
fn least_squares(x: &[f64], y: &[f64], order: usize) -> Option<Vec<f64>> {
    let k = order + 1;
    let mut v = Array2::zeros((x.len(), k));
    for (i, &xi) in x.iter().enumerate() {
        let mut p = 1.0;
        for j in 0..k {
            v[[i, j]] = p;
            p *= xi;
        }
    }
    let y = Array1::from(y.to_vec());
    let a = v.t().dot(&v);
    let b = v.t().dot(&y);
    solve(a, b).map(|c| c.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_recovery() {
        let scales = [1.0, 2.0, 3.0];
        let values: Vec<f64> = scales.iter().map(|s| 0.95 - 0.1 * s).collect();
        let fit = extrapolate(&scales, &values, 1).unwrap();
        assert_eq!(fit.order, 1);
        assert_relative_eq!(fit.value_at_zero, 0.95, epsilon = 1e-12);
        assert_relative_eq!(fit.coefficients[1], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_quadratic_exact() {
        let scales = [1.0, 1.5, 2.0, 3.0];
        let f = |s: f64| 1.0 - 0.2 * s + 0.03 * s * s;
        let values: Vec<f64> = scales.iter().map(|&s| f(s)).collect();
        let fit = extrapolate(&scales, &values, 2).unwrap();
        assert_relative_eq!(fit.value_at_zero, 1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.evaluate(2.5), f(2.5), epsilon = 1e-10);
    }

    #[test]
    fn test_order_clamped_to_points() {
        let fit = extrapolate(&[1.0, 2.0], &[0.8, 0.6], 5).unwrap();
        assert_eq!(fit.order, 1);
        assert_relative_eq!(fit.value_at_zero, 1.0, epsilon = 1e-12);

        let single = extrapolate(&[2.0], &[0.4], 2).unwrap();
        assert_eq!(single.order, 0);
        assert_eq!(single.value_at_zero, 0.4);
    }

    #[test]
    fn test_repeated_scales_fall_back_to_mean() {
        let fit = extrapolate(&[1.0, 1.0, 1.0], &[0.5, 0.7, 0.6], 2).unwrap();
        assert_eq!(fit.order, 0);
        assert_relative_eq!(fit.value_at_zero, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_input() {
        assert!(extrapolate(&[], &[], 1).is_err());
        assert!(extrapolate(&[1.0, 2.0], &[0.5], 1).is_err());
    }
}
