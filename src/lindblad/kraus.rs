// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Discrete-time decoherence channels.
//!
//! Each channel is a completely positive, trace-preserving map written in
//! operator-sum form ρ' = Σ_k K_k ρ K_k† with Σ_k K_k†K_k = I. The 2 × 2 (or
//! 4 × 4 for ZZ) operators are lifted onto the full register before use.
//!
//! Ref: Nielsen & Chuang (2010), §8.3.5–8.3.6.

use ndarray::Array2;
use num_complex::Complex64;

use crate::linalg::{apply_kraus, c, embed, identity};

/// Decay probability over one step: p = 1 − exp(−γ·dt), clamped to [0,1].
pub fn damping_probability(rate: f64, dt: f64) -> f64 {
    (1.0 - (-rate * dt).exp()).clamp(0.0, 1.0)
}

/// Dephasing strength over one step: λ = ½(1 − exp(−2γ·dt)), clamped to [0,1].
///
/// Coherences are multiplied by (1 − 2λ) = exp(−2γ·dt).
pub fn dephasing_lambda(rate: f64, dt: f64) -> f64 {
    (0.5 * (1.0 - (-2.0 * rate * dt).exp())).clamp(0.0, 1.0)
}

/// Amplitude damping on `qubit`:
/// E₀ = diag(1, √(1−p)), E₁ = [[0, √p], [0, 0]].
pub fn amplitude_damping(
    rho: &Array2<Complex64>,
    qubit: usize,
    n_qubits: usize,
    p: f64,
) -> Array2<Complex64> {
    let p = p.clamp(0.0, 1.0);
    if p == 0.0 {
        return rho.clone();
    }

    let mut e0 = Array2::zeros((2, 2));
    e0[[0, 0]] = c(1.0);
    e0[[1, 1]] = c((1.0 - p).sqrt());
    let mut e1 = Array2::zeros((2, 2));
    e1[[0, 1]] = c(p.sqrt());

    let ops = [
        embed(&[(qubit, &e0)], n_qubits),
        embed(&[(qubit, &e1)], n_qubits),
    ];
    apply_kraus(rho, &ops)
}

/// Phase damping on `qubit`: K₀ = √(1−λ)·I, K₁ = √λ·Z.
pub fn dephasing(
    rho: &Array2<Complex64>,
    qubit: usize,
    n_qubits: usize,
    lambda: f64,
) -> Array2<Complex64> {
    let lambda = lambda.clamp(0.0, 1.0);
    if lambda == 0.0 {
        return rho.clone();
    }
    let z = pauli_z() * c(lambda.sqrt());
    let ops = [
        identity(rho.nrows()) * c((1.0 - lambda).sqrt()),
        embed(&[(qubit, &z)], n_qubits),
    ];
    apply_kraus(rho, &ops)
}

/// Correlated phase damping on the pair (i, j): K₀ = √(1−λ)·I, K₁ = √λ·Z⊗Z.
pub fn correlated_dephasing(
    rho: &Array2<Complex64>,
    i: usize,
    j: usize,
    n_qubits: usize,
    lambda: f64,
) -> Array2<Complex64> {
    let lambda = lambda.clamp(0.0, 1.0);
    if lambda == 0.0 || i == j {
        return rho.clone();
    }
    let z = pauli_z();
    let zz = embed(&[(i, &z), (j, &z)], n_qubits) * c(lambda.sqrt());
    let ops = [identity(rho.nrows()) * c((1.0 - lambda).sqrt()), zz];
    apply_kraus(rho, &ops)
}

/// Rescale ρ to unit trace when it has drifted by more than 1e-12.
///
/// A zero (or non-finite) trace is left untouched.
pub fn renormalize(rho: Array2<Complex64>) -> Array2<Complex64> {
    let tr = crate::linalg::trace_real(&rho);
    if !tr.is_finite() || tr.abs() < f64::MIN_POSITIVE || (tr - 1.0).abs() <= 1e-12 {
        return rho;
    }
    rho.mapv(|z| z / tr)
}

fn pauli_z() -> Array2<Complex64> {
    let mut z = Array2::zeros((2, 2));
    z[[0, 0]] = c(1.0);
    z[[1, 1]] = c(-1.0);
    z
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::trace_real;
    use crate::test_utils::{excited_state, ground_state, plus_state, plus_plus_state};
    use approx::assert_relative_eq;

    #[test]
    fn test_probabilities_clamped() {
        assert_eq!(damping_probability(1.0, 0.0), 0.0);
        assert_eq!(damping_probability(-5.0, 1.0), 0.0);
        assert_eq!(dephasing_lambda(-5.0, 1.0), 0.0);
        assert_relative_eq!(damping_probability(1e12, 1.0), 1.0, epsilon = 1e-15);
        assert_relative_eq!(dephasing_lambda(1e12, 1.0), 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_amplitude_damping_moves_population() {
        let p = 0.3;
        let out = amplitude_damping(&excited_state(), 0, 1, p);
        assert_relative_eq!(out[[0, 0]].re, p, epsilon = 1e-14);
        assert_relative_eq!(out[[1, 1]].re, 1.0 - p, epsilon = 1e-14);
        assert_relative_eq!(trace_real(&out), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_amplitude_damping_ground_state_fixed() {
        let out = amplitude_damping(&ground_state(), 0, 1, 0.7);
        assert_relative_eq!(out[[0, 0]].re, 1.0, epsilon = 1e-15);
        assert_relative_eq!(out[[1, 1]].re, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_dephasing_scales_coherence() {
        let lambda = 0.2;
        let out = dephasing(&plus_state(), 0, 1, lambda);
        assert_relative_eq!(out[[0, 1]].re, 0.5 * (1.0 - 2.0 * lambda), epsilon = 1e-14);
        assert_relative_eq!(out[[0, 0]].re, 0.5, epsilon = 1e-14);
        assert_relative_eq!(out[[1, 1]].re, 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_dephasing_targets_one_qubit() {
        // Dephase qubit 1 of |++⟩: elements differing only in qubit 0 keep coherence.
        let lambda = 0.25;
        let out = dephasing(&plus_plus_state(), 1, 2, lambda);
        // |00⟩⟨10|: qubit 1 identical → untouched
        assert_relative_eq!(out[[0, 2]].re, 0.25, epsilon = 1e-14);
        // |00⟩⟨01|: qubit 1 differs → scaled by (1 − 2λ)
        assert_relative_eq!(out[[0, 1]].re, 0.25 * 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_correlated_dephasing_parity() {
        let lambda = 0.1;
        let out = correlated_dephasing(&plus_plus_state(), 0, 1, 2, lambda);
        // |00⟩⟨11| has equal ZZ parity → untouched
        assert_relative_eq!(out[[0, 3]].re, 0.25, epsilon = 1e-14);
        // |00⟩⟨01| has opposite parity → scaled
        assert_relative_eq!(out[[0, 1]].re, 0.25 * (1.0 - 2.0 * lambda), epsilon = 1e-14);
        assert_relative_eq!(trace_real(&out), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_zero_strength_is_identity() {
        let rho = plus_state();
        assert_eq!(amplitude_damping(&rho, 0, 1, 0.0), rho);
        assert_eq!(dephasing(&rho, 0, 1, 0.0), rho);
    }

    #[test]
    fn test_renormalize() {
        let rho = plus_state().mapv(|z| z * 2.0);
        let out = renormalize(rho);
        assert_relative_eq!(trace_real(&out), 1.0, epsilon = 1e-15);

        let zero: Array2<Complex64> = Array2::zeros((2, 2));
        assert_eq!(renormalize(zero.clone()), zero);
    }
}
