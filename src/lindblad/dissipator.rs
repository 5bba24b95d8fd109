// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lindblad dissipator computation.
//!
//! Computes D[L](ρ) = γ (L ρ L† − ½{L†L, ρ}) for each collapse operator.
//!
//! Ref: Breuer & Petruccione, "The Theory of Open Quantum Systems" (2002), Ch. 3.

use ndarray::Array2;
use num_complex::Complex64;

use super::types::CollapseOperator;
use crate::linalg::{c, dagger};

/// Dissipator contribution of a single collapse operator.
///
/// D[L](ρ) = γ (L ρ L† − ½ L†L ρ − ½ ρ L†L)
pub fn dissipator(op: &CollapseOperator, rho: &Array2<Complex64>) -> Array2<Complex64> {
    let l = &op.matrix;
    if op.rate == 0.0 {
        return Array2::zeros(rho.raw_dim());
    }

    let l_dag = dagger(l);
    let l_dag_l = l_dag.dot(l);
    let jump = l.dot(rho).dot(&l_dag);
    let anti = l_dag_l.dot(rho) + rho.dot(&l_dag_l);

    (jump - anti * c(0.5)) * c(op.rate)
}

/// Σ_k D[L_k](ρ). Operators whose dimension does not match ρ are skipped.
pub fn total_dissipator(
    collapse_ops: &[CollapseOperator],
    rho: &Array2<Complex64>,
) -> Array2<Complex64> {
    let d = rho.nrows();
    let mut total = Array2::zeros((d, d));
    for op in collapse_ops.iter().filter(|op| op.matrix.nrows() == d) {
        total = total + dissipator(op, rho);
    }
    total
}

/// Full generator: dρ/dt = −i[H, ρ] + Σ_k D[L_k](ρ).
pub fn lindblad_rhs(
    hamiltonian: &Array2<Complex64>,
    collapse_ops: &[CollapseOperator],
    rho: &Array2<Complex64>,
) -> Array2<Complex64> {
    let i = Complex64::new(0.0, 1.0);
    let commutator = (hamiltonian.dot(rho) - rho.dot(hamiltonian)) * (-i);
    commutator + total_dissipator(collapse_ops, rho)
}
