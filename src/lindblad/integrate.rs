// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! RK4 integrator for the Lindblad master equation.
//!
//! Integrates dρ/dt = −i[H(t), ρ] + Σ D[L](ρ) with classical 4th-order
//! Runge–Kutta and piecewise-constant Hamiltonians. Serves as the
//! continuous-time reference for the discrete Kraus step.
//!
//! Ref: Press et al., "Numerical Recipes" (2007), §17.1.

use ndarray::Array2;
use num_complex::Complex64;

use super::dissipator::lindblad_rhs;
use super::metrics::purity;
use super::types::{CollapseOperator, LindbladConfig, LindbladResult};
use crate::error::{Result, ValidationError};
use crate::linalg::{c, trace_real};

/// Solve the master equation with one Hamiltonian per time step.
///
/// # Arguments
/// * `initial_rho`: Initial density matrix (d × d, trace 1).
/// * `hamiltonians`: Hamiltonian at each time step, length = `config.num_time_steps`.
/// * `config`: Solver configuration (time steps, collapse operators, etc.).
pub fn solve_lindblad(
    initial_rho: &Array2<Complex64>,
    hamiltonians: &[Array2<Complex64>],
    config: &LindbladConfig,
) -> Result<LindbladResult> {
    config.validate()?;

    let n_steps = config.num_time_steps;

    if initial_rho.nrows() != initial_rho.ncols() {
        return Err(ValidationError::field(
            "initial_rho",
            format!(
                "must be square, got {} × {}",
                initial_rho.nrows(),
                initial_rho.ncols()
            ),
        )
        .into());
    }

    if hamiltonians.len() != n_steps {
        return Err(ValidationError::Dimension {
            expected: n_steps,
            actual: hamiltonians.len(),
        }
        .into());
    }

    let dt = config.dt();
    let mut rho = initial_rho.clone();

    let mut trajectory = config
        .store_trajectory
        .then(|| Vec::with_capacity(n_steps + 1));
    if let Some(ref mut traj) = trajectory {
        traj.push(rho.clone());
    }

    for h in hamiltonians {
        rho = rk4_step(&rho, h, &config.collapse_ops, dt);
        if let Some(ref mut traj) = trajectory {
            traj.push(rho.clone());
        }
    }

    Ok(LindbladResult {
        final_trace: trace_real(&rho),
        final_purity: purity(&rho),
        final_density_matrix: rho,
        trajectory,
        steps: n_steps,
    })
}

/// Single RK4 step; the Hamiltonian is held constant across the four stages.
fn rk4_step(
    rho: &Array2<Complex64>,
    hamiltonian: &Array2<Complex64>,
    collapse_ops: &[CollapseOperator],
    dt: f64,
) -> Array2<Complex64> {
    let dt_c = c(dt);
    let half = c(0.5);

    let k1 = lindblad_rhs(hamiltonian, collapse_ops, rho);
    let rho2 = rho + &(&k1 * (half * dt_c));
    let k2 = lindblad_rhs(hamiltonian, collapse_ops, &rho2);
    let rho3 = rho + &(&k2 * (half * dt_c));
    let k3 = lindblad_rhs(hamiltonian, collapse_ops, &rho3);
    let rho4 = rho + &(&k3 * dt_c);
    let k4 = lindblad_rhs(hamiltonian, collapse_ops, &rho4);

    rho + &((k1 + k2 * c(2.0) + k3 * c(2.0) + k4) * (dt_c / 6.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{excited_state, ground_state, plus_state};
    use approx::assert_relative_eq;

    fn zero_hamiltonians(n: usize) -> Vec<Array2<Complex64>> {
        (0..n).map(|_| Array2::zeros((2, 2))).collect()
    }

    #[test]
    fn test_unitary_evolution_preserves_purity() {
        let omega = 2.0 * std::f64::consts::PI * 100e6;
        let mut h = Array2::zeros((2, 2));
        h[[0, 0]] = c(omega / 2.0);
        h[[1, 1]] = c(-omega / 2.0);
        let n_steps = 1000;
        let hamiltonians: Vec<_> = (0..n_steps).map(|_| h.clone()).collect();

        let config = LindbladConfig {
            num_time_steps: n_steps,
            duration: 20e-9,
            collapse_ops: vec![],
            store_trajectory: false,
        };
        let result = solve_lindblad(&plus_state(), &hamiltonians, &config).unwrap();
        assert_relative_eq!(result.final_purity, 1.0, epsilon = 1e-4);
        assert_relative_eq!(result.final_trace, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_t1_decay_to_ground_state() {
        // γ₁ = 2e4 s⁻¹, 500 μs = 10/γ₁
        let n_steps = 5000;
        let config = LindbladConfig {
            num_time_steps: n_steps,
            duration: 500e-6,
            collapse_ops: vec![CollapseOperator::amplitude_damping(2e4, 0, 1)],
            store_trajectory: false,
        };
        let result =
            solve_lindblad(&excited_state(), &zero_hamiltonians(n_steps), &config).unwrap();
        let expected = (-10.0_f64).exp();
        assert_relative_eq!(result.final_density_matrix[[1, 1]].re, expected, epsilon = 1e-3);
        assert_relative_eq!(result.final_trace, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dephasing_decay_matches_closed_form() {
        // σz dephasing at γ: ρ₀₁(t) = ½ e^{−2γt}
        let gamma = 1e4;
        let duration = 50e-6;
        let n_steps = 2000;
        let config = LindbladConfig {
            num_time_steps: n_steps,
            duration,
            collapse_ops: vec![CollapseOperator::dephasing(gamma, 0, 1)],
            store_trajectory: false,
        };
        let result = solve_lindblad(&plus_state(), &zero_hamiltonians(n_steps), &config).unwrap();
        let expected = 0.5 * (-2.0 * gamma * duration).exp();
        assert_relative_eq!(result.final_density_matrix[[0, 1]].re, expected, epsilon = 1e-6);
        assert!(result.final_purity < 1.0);
    }

    #[test]
    fn test_ground_state_is_steady_state() {
        let n_steps = 100;
        let config = LindbladConfig {
            num_time_steps: n_steps,
            duration: 1e-6,
            collapse_ops: vec![CollapseOperator::amplitude_damping(2e4, 0, 1)],
            store_trajectory: false,
        };
        let result =
            solve_lindblad(&ground_state(), &zero_hamiltonians(n_steps), &config).unwrap();
        assert_relative_eq!(result.final_density_matrix[[0, 0]].re, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_trajectory_storage() {
        let n_steps = 10;
        let config = LindbladConfig {
            num_time_steps: n_steps,
            duration: 20e-9,
            collapse_ops: vec![],
            store_trajectory: true,
        };
        let result =
            solve_lindblad(&ground_state(), &zero_hamiltonians(n_steps), &config).unwrap();
        assert_eq!(result.trajectory.unwrap().len(), n_steps + 1);
        assert_eq!(result.steps, n_steps);
    }

    #[test]
    fn test_validation_errors() {
        let config = LindbladConfig {
            num_time_steps: 10,
            duration: 20e-9,
            collapse_ops: vec![],
            store_trajectory: false,
        };
        let result = solve_lindblad(&ground_state(), &zero_hamiltonians(1), &config);
        assert!(result.unwrap_err().to_string().contains("expected 10"));

        let bad_rho = Array2::zeros((2, 3));
        assert!(solve_lindblad(&bad_rho, &zero_hamiltonians(10), &config).is_err());
    }
}
