// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Spatially correlated dephasing.
//!
//! The correlation matrix superposes exponential kernels of several length
//! scales:
//!
//!   C[i,j] = Σ_m w_m · exp(−d_ij / ξ_m),  Σ_m w_m = 1
//!
//! so every diagonal entry is exactly 1.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Off-diagonal entries below this fraction of the stronger diagonal are
/// treated as uncorrelated.
pub const PAIR_THRESHOLD: f64 = 0.01;

/// One exponential correlation kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMode {
    /// Correlation length ξ (same unit as the coordinates).
    pub length: f64,
    /// Relative weight (normalized on construction).
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl CorrelationMode {
    pub fn new(length: f64, weight: f64) -> Self {
        Self { length, weight }
    }
}

/// Read-only symmetric correlation matrix over the register.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationModel {
    matrix: Array2<f64>,
}

impl CorrelationModel {
    /// No cross-talk: C = I.
    pub fn uncorrelated(n_qubits: usize) -> Self {
        Self {
            matrix: Array2::eye(n_qubits),
        }
    }

    /// Build from qubit coordinates and one or more kernels.
    ///
    /// Weights are normalized to sum to 1. An empty mode list yields the
    /// uncorrelated model.
    pub fn from_coordinates(coordinates: &[[f64; 3]], modes: &[CorrelationMode]) -> Result<Self> {
        let n = coordinates.len();
        if modes.is_empty() {
            return Ok(Self::uncorrelated(n));
        }

        for (k, mode) in modes.iter().enumerate() {
            if mode.length <= 0.0 || !mode.length.is_finite() {
                return Err(ValidationError::field(
                    "correlation.modes",
                    format!("mode {k}: length must be positive, got {}", mode.length),
                )
                .into());
            }
            if mode.weight < 0.0 || !mode.weight.is_finite() {
                return Err(ValidationError::field(
                    "correlation.modes",
                    format!("mode {k}: weight must be non-negative, got {}", mode.weight),
                )
                .into());
            }
        }
        let total_weight: f64 = modes.iter().map(|m| m.weight).sum();
        if total_weight <= 0.0 {
            return Err(
                ValidationError::field("correlation.modes", "weights sum to zero").into(),
            );
        }

        let mut matrix = Array2::zeros((n, n));
        for i in 0..n {
            for j in 0..n {
                let d = distance(&coordinates[i], &coordinates[j]);
                matrix[[i, j]] = modes
                    .iter()
                    .map(|m| (m.weight / total_weight) * (-d / m.length).exp())
                    .sum();
            }
        }

        Ok(Self { matrix })
    }

    /// Wrap an explicit matrix. Must be square and symmetric.
    pub fn from_matrix(matrix: Array2<f64>) -> Result<Self> {
        let n = matrix.nrows();
        if matrix.ncols() != n {
            return Err(ValidationError::Dimension {
                expected: n,
                actual: matrix.ncols(),
            }
            .into());
        }
        for i in 0..n {
            for j in 0..i {
                if (matrix[[i, j]] - matrix[[j, i]]).abs() > 1e-12 {
                    return Err(ValidationError::PhysicsConstraint(format!(
                        "correlation matrix is not symmetric at ({i}, {j})"
                    ))
                    .into());
                }
            }
        }
        Ok(Self { matrix })
    }

    pub fn n_qubits(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// C[i, j]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[[i, j]]
    }

    /// Pairs (i < j) whose coupling passes [`PAIR_THRESHOLD`], with C[i, j].
    pub fn correlated_pairs(&self) -> Vec<(usize, usize, f64)> {
        let n = self.n_qubits();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let cij = self.matrix[[i, j]];
                let strongest = self.matrix[[i, i]].max(self.matrix[[j, j]]);
                if cij > PAIR_THRESHOLD * strongest {
                    pairs.push((i, j, cij));
                }
            }
        }
        pairs
    }
}

fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
