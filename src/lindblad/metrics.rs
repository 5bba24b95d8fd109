// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scalar figures of merit for density matrices.

use ndarray::Array2;
use num_complex::Complex64;

use crate::linalg::{hermitian_eigenvalues, trace, trace_real};

/// Purity Tr(ρ²).
pub fn purity(rho: &Array2<Complex64>) -> f64 {
    trace_real(&rho.dot(rho))
}

/// Fidelity against a pure target ρ_target = |ψ⟩⟨ψ|: F = Re Tr(ρ_target · ρ),
/// clamped to [0, 1].
pub fn state_fidelity(rho: &Array2<Complex64>, target_rho: &Array2<Complex64>) -> f64 {
    trace_real(&target_rho.dot(rho)).clamp(0.0, 1.0)
}

/// Expectation value ⟨O⟩ = Re Tr(O · ρ).
pub fn expectation(rho: &Array2<Complex64>, observable: &Array2<Complex64>) -> f64 {
    trace(&observable.dot(rho)).re
}

/// Trace distance: D(ρ, σ) = ½ ‖ρ − σ‖₁
///
/// Analytic for 2×2; larger matrices sum the absolute eigenvalues of ρ − σ.
pub fn trace_distance(rho: &Array2<Complex64>, sigma: &Array2<Complex64>) -> f64 {
    let diff = rho - sigma;

    if diff.nrows() == 2 {
        // λ± = (a+d)/2 ± sqrt(((a−d)/2)² + |b|²)
        let a = diff[[0, 0]].re;
        let d = diff[[1, 1]].re;
        let b = diff[[0, 1]];
        let half_sum = (a + d) / 2.0;
        let half_diff = (a - d) / 2.0;
        let sqrt_disc = (half_diff * half_diff + b.norm_sqr()).sqrt();
        0.5 * ((half_sum + sqrt_disc).abs() + (half_sum - sqrt_disc).abs())
    } else {
        0.5 * hermitian_eigenvalues(&diff)
            .iter()
            .map(|l| l.abs())
            .sum::<f64>()
    }
}

/// Von Neumann entropy S(ρ) = −Σ λ log₂ λ, in bits.
pub fn von_neumann_entropy(rho: &Array2<Complex64>) -> f64 {
    hermitian_eigenvalues(rho)
        .into_iter()
        .filter(|&l| l > 1e-12)
        .map(|l| -l * l.log2())
        .sum::<f64>()
        .max(0.0)
}
