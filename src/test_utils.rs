// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared density-matrix fixtures for unit tests.

use ndarray::Array2;
use num_complex::Complex64;

use crate::linalg::c;

/// ρ = |0⟩⟨0|
pub fn ground_state() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 0]] = c(1.0);
    m
}

/// ρ = |1⟩⟨1|
pub fn excited_state() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[1, 1]] = c(1.0);
    m
}

/// ρ = |+⟩⟨+| = ½(I + σx)
pub fn plus_state() -> Array2<Complex64> {
    Array2::from_elem((2, 2), c(0.5))
}

/// ρ = |++⟩⟨++|, every element ¼.
pub fn plus_plus_state() -> Array2<Complex64> {
    Array2::from_elem((4, 4), c(0.25))
}

/// |+⟩^{⊗n}, every element 2⁻ⁿ.
pub fn plus_register(n_qubits: usize) -> Array2<Complex64> {
    let d = 1usize << n_qubits;
    Array2::from_elem((d, d), c(1.0 / d as f64))
}

/// A generic mixed single-qubit state with complex coherence.
pub fn mixed_state() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 0]] = c(0.6);
    m[[1, 1]] = c(0.4);
    m[[0, 1]] = Complex64::new(0.2, 0.1);
    m[[1, 0]] = Complex64::new(0.2, -0.1);
    m
}
