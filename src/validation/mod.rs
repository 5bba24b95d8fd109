// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Input validation for simulation requests.
//!
//! Only structural misuse is rejected here. Physically degenerate values
//! (zero time, zero rates) pass and are handled as identity maps downstream.

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{Result, ValidationError};
use crate::linalg::{hermiticity_defect, trace_real};

/// Largest register the dense simulator accepts.
pub const MAX_QUBITS: usize = 6;

/// Validate a density matrix against a register size.
///
/// Checks shape, finiteness, Hermiticity and unit trace (to `tol`).
pub fn validate_density_matrix(
    rho: &Array2<Complex64>,
    n_qubits: usize,
    tol: f64,
) -> Result<()> {
    if rho.nrows() != rho.ncols() {
        return Err(ValidationError::field(
            "rho",
            format!("must be square, got {} × {}", rho.nrows(), rho.ncols()),
        )
        .into());
    }

    let expected = 1usize << n_qubits;
    if rho.nrows() != expected {
        return Err(ValidationError::Dimension {
            expected,
            actual: rho.nrows(),
        }
        .into());
    }

    for (idx, z) in rho.indexed_iter() {
        if !z.re.is_finite() || !z.im.is_finite() {
            return Err(ValidationError::field(
                "rho",
                format!("contains non-finite value at {:?}", idx),
            )
            .into());
        }
    }

    let defect = hermiticity_defect(rho);
    if defect > tol {
        return Err(ValidationError::PhysicsConstraint(format!(
            "density matrix is not Hermitian (defect {defect:.2e})"
        ))
        .into());
    }

    let tr = trace_real(rho);
    if (tr - 1.0).abs() > tol {
        return Err(ValidationError::PhysicsConstraint(format!(
            "density matrix trace is {tr}, expected 1"
        ))
        .into());
    }

    Ok(())
}

/// Validate a list of pulse fractions: finite, strictly inside (0,1), sorted.
pub fn validate_pulse_fractions(fractions: &[f64]) -> Result<()> {
    for (i, &f) in fractions.iter().enumerate() {
        if f.is_nan() {
            return Err(
                ValidationError::field("fractions", format!("contains NaN at index {i}")).into(),
            );
        }
        if f <= 0.0 || f >= 1.0 {
            return Err(ValidationError::field(
                "fractions",
                format!("value {f} at index {i} is outside (0, 1)"),
            )
            .into());
        }
    }

    if let Some(i) = fractions.windows(2).position(|w| w[1] < w[0]) {
        return Err(ValidationError::field(
            "fractions",
            format!("not sorted at index {}", i + 1),
        )
        .into());
    }

    Ok(())
}

/// Validate a register size.
pub fn validate_num_qubits(n_qubits: usize) -> Result<()> {
    if n_qubits == 0 {
        return Err(ValidationError::field("num_qubits", "must be greater than 0").into());
    }
    if n_qubits > MAX_QUBITS {
        return Err(ValidationError::field(
            "num_qubits",
            format!("{n_qubits} exceeds maximum {MAX_QUBITS}"),
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_utils::{mixed_state, plus_plus_state, plus_state};

    #[test]
    fn test_valid_density_matrices() {
        assert!(validate_density_matrix(&plus_state(), 1, 1e-9).is_ok());
        assert!(validate_density_matrix(&mixed_state(), 1, 1e-9).is_ok());
        assert!(validate_density_matrix(&plus_plus_state(), 2, 1e-9).is_ok());
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = validate_density_matrix(&plus_state(), 2, 1e-9);
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::Dimension {
                expected: 4,
                actual: 2
            }))
        ));
    }

    #[test]
    fn test_non_square_rejected() {
        let rho: Array2<Complex64> = Array2::zeros((2, 3));
        assert!(validate_density_matrix(&rho, 1, 1e-9).is_err());
    }

    #[test]
    fn test_non_hermitian_rejected() {
        let mut rho = plus_state();
        rho[[0, 1]] = Complex64::new(0.5, 0.3);
        let err = validate_density_matrix(&rho, 1, 1e-9).unwrap_err();
        assert!(err.to_string().contains("Hermitian"));
    }

    #[test]
    fn test_bad_trace_rejected() {
        let rho = plus_state().mapv(|z| z * 2.0);
        let err = validate_density_matrix(&rho, 1, 1e-9).unwrap_err();
        assert!(err.to_string().contains("trace"));
    }

    #[test]
    fn test_nan_rejected() {
        let mut rho = plus_state();
        rho[[1, 1]] = Complex64::new(f64::NAN, 0.0);
        assert!(validate_density_matrix(&rho, 1, 1e-9).is_err());
    }

    #[test]
    fn test_pulse_fractions() {
        assert!(validate_pulse_fractions(&[]).is_ok());
        assert!(validate_pulse_fractions(&[0.25, 0.75]).is_ok());
        assert!(validate_pulse_fractions(&[0.0, 0.5]).is_err());
        assert!(validate_pulse_fractions(&[0.5, 1.0]).is_err());
        assert!(validate_pulse_fractions(&[0.6, 0.4]).is_err());
        assert!(validate_pulse_fractions(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_num_qubits() {
        assert!(validate_num_qubits(0).is_err());
        assert!(validate_num_qubits(1).is_ok());
        assert!(validate_num_qubits(MAX_QUBITS).is_ok());
        assert!(validate_num_qubits(MAX_QUBITS + 1).is_err());
    }
}
