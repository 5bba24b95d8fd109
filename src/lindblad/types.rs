// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Open-system types: noise parameters, collapse operators and trajectories.
//!
//! Ref: Lindblad (1976), Commun. Math. Phys. 48, 119.
//! Ref: Nielsen & Chuang (2010), §8.3 (amplitude damping and phase damping).

use ndarray::Array2;
use num_complex::Complex64;
use serde::Serialize;

use crate::error::{Result, ValidationError};
use crate::linalg::{c, embed};

/// Decoherence rates of one engine instance.
///
/// Fixed at construction. With only `t2` supplied the rates are derived so
/// that pure dephasing alone decays coherences as exp(−t/T2):
///
///   γ_φ = 1/(2·T2),  γ₁ = γ_φ/2
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoiseParameters {
    /// Coherence time T2 (same time unit as `dt`).
    pub t2: f64,
    /// Initial suppression coefficient ε₀.
    pub epsilon_0: f64,
    /// Pure dephasing rate γ_φ.
    pub gamma_phi: f64,
    /// Amplitude damping rate γ₁.
    pub gamma_1: f64,
}

impl NoiseParameters {
    /// Derive both rates from T2.
    pub fn from_t2(t2: f64, epsilon_0: f64) -> Self {
        let gamma_phi = if t2 > 0.0 { 1.0 / (2.0 * t2) } else { 0.0 };
        Self {
            t2,
            epsilon_0,
            gamma_phi,
            gamma_1: gamma_phi / 2.0,
        }
    }

    /// Override the derived rates. `None` keeps the derived value; negative
    /// rates are clamped to zero.
    pub fn with_rates(mut self, gamma_phi: Option<f64>, gamma_1: Option<f64>) -> Self {
        if let Some(g) = gamma_phi {
            self.gamma_phi = g.max(0.0);
        }
        if let Some(g) = gamma_1 {
            self.gamma_1 = g.max(0.0);
        }
        self
    }
}

/// A Lindblad collapse (jump) operator with its rate.
///
/// Represents a single dissipation channel:
///   D[L](ρ) = γ (L ρ L† − ½{L†L, ρ})
///
/// The constructors pick operators whose continuous-time action matches the
/// discrete Kraus channels of [`super::kraus`]: σ⁻ at γ₁ for damping and σz
/// (not σz/2) at γ_φ for dephasing, so coherences decay as exp(−2γ_φ t).
#[derive(Debug, Clone)]
pub struct CollapseOperator {
    /// Operator matrix, already embedded in the full 2ⁿ space.
    pub matrix: Array2<Complex64>,
    /// Decay rate (inverse time unit).
    pub rate: f64,
    /// Human-readable label (e.g., "T1_q0", "Tphi_q1", "ZZ_q0q1").
    pub label: String,
}

impl CollapseOperator {
    /// Amplitude damping on one qubit: L = σ⁻ = |0⟩⟨1|.
    pub fn amplitude_damping(rate: f64, qubit: usize, n_qubits: usize) -> Self {
        let mut sigma_minus = Array2::zeros((2, 2));
        sigma_minus[[0, 1]] = c(1.0);
        Self {
            matrix: embed(&[(qubit, &sigma_minus)], n_qubits),
            rate: rate.max(0.0),
            label: format!("T1_q{qubit}"),
        }
    }

    /// Pure dephasing on one qubit: L = σz.
    pub fn dephasing(rate: f64, qubit: usize, n_qubits: usize) -> Self {
        Self {
            matrix: embed(&[(qubit, &sigma_z())], n_qubits),
            rate: rate.max(0.0),
            label: format!("Tphi_q{qubit}"),
        }
    }

    /// Correlated dephasing on a pair: L = σz ⊗ σz.
    pub fn correlated_dephasing(rate: f64, i: usize, j: usize, n_qubits: usize) -> Self {
        let z = sigma_z();
        Self {
            matrix: embed(&[(i, &z), (j, &z)], n_qubits),
            rate: rate.max(0.0),
            label: format!("ZZ_q{i}q{j}"),
        }
    }
}

fn sigma_z() -> Array2<Complex64> {
    let mut z = Array2::zeros((2, 2));
    z[[0, 0]] = c(1.0);
    z[[1, 1]] = c(-1.0);
    z
}

/// Configuration for the reference master-equation solver.
#[derive(Debug, Clone)]
pub struct LindbladConfig {
    /// Number of time steps for integration.
    pub num_time_steps: usize,
    /// Total evolution time.
    pub duration: f64,
    /// Collapse operators.
    pub collapse_ops: Vec<CollapseOperator>,
    /// Whether to store intermediate density matrices.
    pub store_trajectory: bool,
}

impl LindbladConfig {
    /// Integration step.
    pub fn dt(&self) -> f64 {
        self.duration / self.num_time_steps as f64
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.num_time_steps == 0 {
            return Err(ValidationError::field("num_time_steps", "must be > 0").into());
        }
        if self.duration <= 0.0 {
            return Err(ValidationError::field("duration", "must be > 0").into());
        }
        for op in &self.collapse_ops {
            if op.rate < 0.0 {
                return Err(ValidationError::PhysicsConstraint(format!(
                    "collapse operator '{}' has negative rate {:.2e}",
                    op.label, op.rate
                ))
                .into());
            }
            if op.matrix.nrows() != op.matrix.ncols() {
                return Err(ValidationError::field(
                    &op.label,
                    format!(
                        "matrix must be square ({} × {})",
                        op.matrix.nrows(),
                        op.matrix.ncols()
                    ),
                )
                .into());
            }
        }
        Ok(())
    }
}

/// Result of a master-equation integration.
#[derive(Debug, Clone)]
pub struct LindbladResult {
    /// Final density matrix.
    pub final_density_matrix: Array2<Complex64>,
    /// Trace of the final density matrix (should be ~1.0).
    pub final_trace: f64,
    /// Purity Tr(ρ²) of the final state.
    pub final_purity: f64,
    /// Intermediate density matrices (if `store_trajectory` was true).
    pub trajectory: Option<Vec<Array2<Complex64>>>,
    /// Number of integration steps taken.
    pub steps: usize,
}

/// A sampled trajectory: `times[k]` pairs with `states[k]`.
#[derive(Debug, Clone)]
pub struct Evolution {
    pub times: Vec<f64>,
    pub states: Vec<Array2<Complex64>>,
}

impl Evolution {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            times: Vec::with_capacity(n),
            states: Vec::with_capacity(n),
        }
    }

    pub(crate) fn push(&mut self, t: f64, rho: Array2<Complex64>) {
        self.times.push(t);
        self.states.push(rho);
    }

    /// Last state, if any step was recorded.
    pub fn final_state(&self) -> Option<&Array2<Complex64>> {
        self.states.last()
    }
}

/// Two branches run side by side from the same initial state.
#[derive(Debug, Clone)]
pub struct CorrectedEvolution {
    pub times: Vec<f64>,
    pub uncorrected: Vec<Array2<Complex64>>,
    pub corrected: Vec<Array2<Complex64>>,
}

/// Toggles for [`super::DecoherenceEngine::simulate_with_correction`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrectionOptions {
    /// Counter-rotate the accumulated phase drift.
    pub phase: bool,
    /// Run the corrected branch's noise at scale (1 − ε_total).
    pub amplitude: bool,
    /// Angular frequency converting Δε into a drift angle.
    pub omega_0: f64,
}

impl Default for CorrectionOptions {
    fn default() -> Self {
        Self {
            phase: true,
            amplitude: true,
            omega_0: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_noise_parameters_from_t2() {
        let p = NoiseParameters::from_t2(1e-7, 0.355);
        assert_relative_eq!(p.gamma_phi, 5e6, max_relative = 1e-12);
        assert_relative_eq!(p.gamma_1, 2.5e6, max_relative = 1e-12);
        assert_eq!(p.epsilon_0, 0.355);
    }

    #[test]
    fn test_noise_parameters_override() {
        let p = NoiseParameters::from_t2(1.0, 0.0).with_rates(Some(3.0), Some(-1.0));
        assert_eq!(p.gamma_phi, 3.0);
        assert_eq!(p.gamma_1, 0.0);
    }

    #[test]
    fn test_nonpositive_t2_gives_zero_rates() {
        let p = NoiseParameters::from_t2(0.0, 0.0);
        assert_eq!(p.gamma_phi, 0.0);
        assert_eq!(p.gamma_1, 0.0);
    }

    #[test]
    fn test_amplitude_damping_creates_sigma_minus() {
        let op = CollapseOperator::amplitude_damping(2.0, 0, 1);
        assert_eq!(op.matrix[[0, 1]], c(1.0));
        assert_eq!(op.matrix[[1, 0]], c(0.0));
        assert_eq!(op.rate, 2.0);
        assert_eq!(op.label, "T1_q0");
    }

    #[test]
    fn test_dephasing_operator_embedded() {
        let op = CollapseOperator::dephasing(1.0, 1, 2);
        assert_eq!(op.matrix.dim(), (4, 4));
        // Z on qubit 1 (least significant): diag(1, −1, 1, −1)
        assert_eq!(op.matrix[[1, 1]], c(-1.0));
        assert_eq!(op.matrix[[2, 2]], c(1.0));
        assert_eq!(op.label, "Tphi_q1");
    }

    #[test]
    fn test_correlated_dephasing_operator() {
        let op = CollapseOperator::correlated_dephasing(1.0, 0, 1, 2);
        assert_eq!(op.matrix[[0, 0]], c(1.0));
        assert_eq!(op.matrix[[1, 1]], c(-1.0));
        assert_eq!(op.matrix[[2, 2]], c(-1.0));
        assert_eq!(op.matrix[[3, 3]], c(1.0));
        assert_eq!(op.label, "ZZ_q0q1");
    }

    #[test]
    fn test_config_validation() {
        let config = LindbladConfig {
            num_time_steps: 100,
            duration: 20.0,
            collapse_ops: vec![],
            store_trajectory: false,
        };
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.dt(), 0.2, epsilon = 1e-15);

        let bad = LindbladConfig {
            num_time_steps: 0,
            ..config.clone()
        };
        assert!(bad.validate().is_err());

        let bad = LindbladConfig {
            duration: -1.0,
            ..config
        };
        assert!(bad.validate().is_err());
    }
}
