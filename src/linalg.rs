// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Small dense linear-algebra kernels.
//!
//! Matrices in this crate are at most 2⁶ × 2⁶, so everything here is a
//! straightforward O(d³) routine on `ndarray` arrays. Qubit 0 is the most
//! significant bit of the computational-basis index (|q0 q1 … q_{n-1}⟩).

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Helper: create Complex64 from f64
#[inline]
pub fn c(x: f64) -> Complex64 {
    Complex64::new(x, 0.0)
}

/// d × d complex identity.
pub fn identity(d: usize) -> Array2<Complex64> {
    Array2::from_diag_elem(d, c(1.0))
}

/// Conjugate transpose (dagger) of a matrix.
pub fn dagger(m: &Array2<Complex64>) -> Array2<Complex64> {
    m.t().mapv(|z| z.conj())
}

/// Trace of a square complex matrix.
pub fn trace(m: &Array2<Complex64>) -> Complex64 {
    m.diag().iter().copied().sum()
}

/// Real part of the trace.
pub fn trace_real(m: &Array2<Complex64>) -> f64 {
    trace(m).re
}

/// Kronecker product A ⊗ B.
pub fn kron(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    let mut out = Array2::zeros((ar * br, ac * bc));
    for ((i, j), &aij) in a.indexed_iter() {
        if aij == Complex64::new(0.0, 0.0) {
            continue;
        }
        for ((k, l), &bkl) in b.indexed_iter() {
            out[[i * br + k, j * bc + l]] = aij * bkl;
        }
    }
    out
}

/// Lift single-qubit operators into the full 2ⁿ-dimensional space.
///
/// `ops` pairs a qubit index with its 2 × 2 operator; every other qubit
/// receives the identity.
pub fn embed(ops: &[(usize, &Array2<Complex64>)], n_qubits: usize) -> Array2<Complex64> {
    let eye2 = identity(2);
    let mut full = identity(1);
    for q in 0..n_qubits {
        let factor = ops
            .iter()
            .find(|(idx, _)| *idx == q)
            .map(|(_, op)| *op)
            .unwrap_or(&eye2);
        full = kron(&full, factor);
    }
    full
}

/// U ρ U†
pub fn conjugate(rho: &Array2<Complex64>, u: &Array2<Complex64>) -> Array2<Complex64> {
    u.dot(rho).dot(&dagger(u))
}

/// Apply a Kraus map: Σ_k K_k ρ K_k†.
pub fn apply_kraus(rho: &Array2<Complex64>, kraus: &[Array2<Complex64>]) -> Array2<Complex64> {
    let mut out = Array2::zeros(rho.raw_dim());
    for k in kraus {
        out = out + conjugate(rho, k);
    }
    out
}

/// Largest |A − A†| element.
pub fn hermiticity_defect(m: &Array2<Complex64>) -> f64 {
    let mut worst = 0.0f64;
    for ((i, j), &v) in m.indexed_iter() {
        worst = worst.max((v - m[[j, i]].conj()).norm());
    }
    worst
}

/// Solve A x = b for real A using Gaussian elimination with partial pivoting.
///
/// Returns `None` for singular (or numerically singular) systems.
pub fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return None;
    }

    for col in 0..n {
        let mut max_val = 0.0;
        let mut max_row = col;
        for row in col..n {
            let val = a[[row, col]].abs();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }
        if max_val < 1e-300 {
            return None;
        }

        if max_row != col {
            for j in 0..n {
                a.swap([col, j], [max_row, j]);
            }
            b.swap(col, max_row);
        }

        let pivot = a[[col, col]];
        for row in (col + 1)..n {
            let factor = a[[row, col]] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                let val = a[[col, j]];
                a[[row, j]] -= factor * val;
            }
            let bc = b[col];
            b[row] -= factor * bc;
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in (row + 1)..n {
            sum -= a[[row, k]] * x[k];
        }
        x[row] = sum / a[[row, row]];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

/// Eigenvalues of a complex Hermitian matrix, sorted ascending.
///
/// Only the lower triangle is read. Non-square input has no spectrum.
pub fn hermitian_eigenvalues(h: &Array2<Complex64>) -> Vec<f64> {
    let n = h.nrows();
    if h.ncols() != n {
        return Vec::new();
    }
    let m = DMatrix::from_fn(n, n, |i, j| h[[i, j]]);
    let mut eig: Vec<f64> = SymmetricEigen::new(m).eigenvalues.iter().copied().collect();
    eig.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    eig
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pauli_z() -> Array2<Complex64> {
        Array2::from_diag(&ndarray::arr1(&[c(1.0), c(-1.0)]))
    }

    #[test]
    fn test_kron_dimensions_and_values() {
        let z = pauli_z();
        let zz = kron(&z, &z);
        assert_eq!(zz.dim(), (4, 4));
        assert_eq!(zz[[0, 0]], c(1.0));
        assert_eq!(zz[[1, 1]], c(-1.0));
        assert_eq!(zz[[2, 2]], c(-1.0));
        assert_eq!(zz[[3, 3]], c(1.0));
    }

    #[test]
    fn test_embed_places_qubit_zero_as_msb() {
        let z = pauli_z();
        let z0 = embed(&[(0, &z)], 2);
        // Z on qubit 0: |00⟩,|01⟩ → +1, |10⟩,|11⟩ → −1
        assert_eq!(z0[[0, 0]], c(1.0));
        assert_eq!(z0[[1, 1]], c(1.0));
        assert_eq!(z0[[2, 2]], c(-1.0));
        assert_eq!(z0[[3, 3]], c(-1.0));
    }

    #[test]
    fn test_dagger() {
        let mut m = Array2::zeros((2, 2));
        m[[0, 1]] = Complex64::new(1.0, 2.0);
        m[[1, 0]] = Complex64::new(3.0, 4.0);
        let dag = dagger(&m);
        assert_eq!(dag[[0, 1]], Complex64::new(3.0, -4.0));
        assert_eq!(dag[[1, 0]], Complex64::new(1.0, -2.0));
    }

    #[test]
    fn test_solve_small_system() {
        let a = ndarray::arr2(&[[2.0, 1.0], [1.0, 3.0]]);
        let b = ndarray::arr1(&[3.0, 5.0]);
        let x = solve(a, b).unwrap();
        assert_relative_eq!(x[0], 0.8, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.4, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_needs_pivoting() {
        let a = ndarray::arr2(&[[0.0, 1.0], [1.0, 0.0]]);
        let b = ndarray::arr1(&[2.0, 7.0]);
        let x = solve(a, b).unwrap();
        assert_relative_eq!(x[0], 7.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_singular_returns_none() {
        let a = ndarray::arr2(&[[1.0, 2.0], [2.0, 4.0]]);
        let b = ndarray::arr1(&[1.0, 1.0]);
        assert!(solve(a, b).is_none());
    }

    #[test]
    fn test_hermitian_eigenvalues_real_symmetric() {
        let a = ndarray::arr2(&[[c(2.0), c(1.0)], [c(1.0), c(2.0)]]);
        let eig = hermitian_eigenvalues(&a);
        assert_relative_eq!(eig[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(eig[1], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_hermitian_eigenvalues_pauli_y() {
        let mut y = Array2::zeros((2, 2));
        y[[0, 1]] = Complex64::new(0.0, -1.0);
        y[[1, 0]] = Complex64::new(0.0, 1.0);
        let eig = hermitian_eigenvalues(&y);
        assert_eq!(eig.len(), 2);
        assert_relative_eq!(eig[0], -1.0, epsilon = 1e-10);
        assert_relative_eq!(eig[1], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_hermitian_eigenvalues_two_qubit() {
        // Z ⊗ Y + ½·I has eigenvalues {−½, −½, 3/2, 3/2}.
        let mut y = Array2::zeros((2, 2));
        y[[0, 1]] = Complex64::new(0.0, -1.0);
        y[[1, 0]] = Complex64::new(0.0, 1.0);
        let h = kron(&pauli_z(), &y) + identity(4).mapv(|z| z * 0.5);
        let eig = hermitian_eigenvalues(&h);
        assert_eq!(eig.len(), 4);
        for (got, want) in eig.iter().zip([-0.5, -0.5, 1.5, 1.5]) {
            assert_relative_eq!(*got, want, epsilon = 1e-10);
        }
        assert!(hermitian_eigenvalues(&Array2::zeros((2, 3))).is_empty());
    }

    #[test]
    fn test_apply_kraus_identity_channel() {
        let mut rho = Array2::zeros((2, 2));
        rho[[0, 0]] = c(0.3);
        rho[[1, 1]] = c(0.7);
        rho[[0, 1]] = Complex64::new(0.1, 0.2);
        rho[[1, 0]] = Complex64::new(0.1, -0.2);
        let out = apply_kraus(&rho, &[identity(2)]);
        assert_eq!(out, rho);
        assert_relative_eq!(hermiticity_defect(&out), 0.0, epsilon = 1e-15);
    }
}
