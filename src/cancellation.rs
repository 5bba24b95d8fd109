// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Active cancellation of a coherent background field.
//!
//! A classical field B(t) rotates every qubit about z by B·dt per step. The
//! canceller applies the opposite rotation scaled by its efficiency, leaving
//! a residual (1 − efficiency)·B.

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::lindblad::gates::rz_all;
use crate::lindblad::metrics::state_fidelity;
use crate::lindblad::DecoherenceEngine;
use crate::linalg::conjugate;

/// B(t) = A·sin(ωt + φ)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldModel {
    pub amplitude: f64,
    pub omega: f64,
    pub phase: f64,
}

impl FieldModel {
    pub fn new(amplitude: f64, omega: f64, phase: f64) -> Self {
        Self {
            amplitude,
            omega,
            phase,
        }
    }

    /// Constant field B(t) = A.
    pub fn static_detuning(amplitude: f64) -> Self {
        Self::new(amplitude, 0.0, std::f64::consts::FRAC_PI_2)
    }

    /// Field of strength ε₀ oscillating once per T2, starting at its peak.
    pub fn from_t2(epsilon_0: f64, t2: f64) -> Self {
        let omega = if t2 > 0.0 {
            2.0 * std::f64::consts::PI / t2
        } else {
            0.0
        };
        Self::new(epsilon_0, omega, std::f64::consts::FRAC_PI_2)
    }

    pub fn value(&self, t: f64) -> f64 {
        self.amplitude * (self.omega * t + self.phase).sin()
    }
}

/// diag(e^{+iB·dt/2}, e^{−iB·dt/2}) on every qubit; undoes the field
/// rotation of one step.
pub fn cancellation_unitary(b: f64, dt: f64, n_qubits: usize) -> Array2<Complex64> {
    rz_all(-b * dt, n_qubits)
}

/// Rotation the field imposes over one step.
fn field_unitary(b: f64, dt: f64, n_qubits: usize) -> Array2<Complex64> {
    rz_all(b * dt, n_qubits)
}

/// Per-step fidelities of the two branches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancellationReport {
    pub efficiency: f64,
    pub field: FieldModel,
    /// Start time of each step, where the field is sampled. The fidelities
    /// are taken after the step.
    pub times: Vec<f64>,
    pub fidelity_without: Vec<f64>,
    pub fidelity_with: Vec<f64>,
}

impl CancellationReport {
    /// (1 − F_without)/(1 − F_with) at the last step, with the denominator
    /// floored at 1e-10.
    pub fn suppression_factor(&self) -> f64 {
        match (self.fidelity_without.last(), self.fidelity_with.last()) {
            (Some(&without), Some(&with)) => (1.0 - without) / (1.0 - with).max(1e-10),
            _ => 1.0,
        }
    }
}

/// Runs noise plus field with and without cancellation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveCanceller {
    efficiency: f64,
    field: FieldModel,
}

impl ActiveCanceller {
    /// `efficiency` is clamped to [0, 1]; NaN counts as 0.
    pub fn new(efficiency: f64, field: FieldModel) -> Self {
        let efficiency = if efficiency.is_nan() {
            0.0
        } else {
            efficiency.clamp(0.0, 1.0)
        };
        Self { efficiency, field }
    }

    /// Canceller for the engine's own field, [`FieldModel::from_t2`].
    pub fn for_engine(engine: &DecoherenceEngine, efficiency: f64) -> Self {
        let p = engine.noise_parameters();
        Self::new(efficiency, FieldModel::from_t2(p.epsilon_0, p.t2))
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn field(&self) -> &FieldModel {
        &self.field
    }

    /// Evolve `rho0` for `n_steps` steps in both branches and record the
    /// fidelity to `rho0` after each step. The field is sampled at the
    /// start of each step.
    pub fn simulate(
        &self,
        engine: &DecoherenceEngine,
        rho0: &Array2<Complex64>,
        total_time: f64,
        n_steps: usize,
    ) -> Result<CancellationReport> {
        engine.check_shape(rho0)?;
        let n = engine.num_qubits();
        let dt = if n_steps > 0 {
            total_time / n_steps as f64
        } else {
            0.0
        };

        let mut without = rho0.clone();
        let mut with = rho0.clone();
        let mut times = Vec::with_capacity(n_steps);
        let mut fidelity_without = Vec::with_capacity(n_steps);
        let mut fidelity_with = Vec::with_capacity(n_steps);

        for k in 0..n_steps {
            let t = k as f64 * dt;
            let b = self.field.value(t);
            let noise = field_unitary(b, dt, n);

            without = engine.apply_decoherence_step(&without, dt, 1.0)?;
            without = conjugate(&without, &noise);

            with = engine.apply_decoherence_step(&with, dt, 1.0)?;
            with = conjugate(&with, &noise);
            with = conjugate(&with, &cancellation_unitary(self.efficiency * b, dt, n));

            times.push(t);
            fidelity_without.push(state_fidelity(&without, rho0));
            fidelity_with.push(state_fidelity(&with, rho0));
        }

        let report = CancellationReport {
            efficiency: self.efficiency,
            field: self.field,
            times,
            fidelity_without,
            fidelity_with,
        };
        debug!(
            n_steps,
            total_time,
            efficiency = self.efficiency,
            suppression = report.suppression_factor(),
            "Active cancellation run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::test_utils::{plus_register, plus_state};
    use approx::assert_relative_eq;

    fn quiet_engine(n_qubits: usize) -> DecoherenceEngine {
        DecoherenceEngine::new(EngineConfig::new(n_qubits, 1e6)).unwrap()
    }

    #[test]
    fn test_field_model() {
        let f = FieldModel::from_t2(0.355, 10.0);
        assert_relative_eq!(f.value(0.0), 0.355, epsilon = 1e-15);
        assert_relative_eq!(f.value(5.0), -0.355, epsilon = 1e-12);
        assert_relative_eq!(f.value(2.5), 0.0, epsilon = 1e-12);

        let s = FieldModel::static_detuning(2.0);
        assert_eq!(s.value(0.0), 2.0);
        assert_eq!(s.value(123.0), 2.0);
    }

    #[test]
    fn test_cancellation_undoes_field() {
        let u = field_unitary(0.8, 0.1, 2).dot(&cancellation_unitary(0.8, 0.1, 2));
        for ((i, j), z) in u.indexed_iter() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_relative_eq!(z.re, expected, epsilon = 1e-14);
            assert_relative_eq!(z.im, 0.0, epsilon = 1e-14);
        }
        // sign convention: |0⟩ gains e^{+iBdt/2}
        let c = cancellation_unitary(1.0, 0.5, 1);
        assert_relative_eq!(c[[0, 0]].arg(), 0.25, epsilon = 1e-14);
    }

    #[test]
    fn test_static_detuning_is_cancelled() {
        let engine = quiet_engine(1);
        let field = FieldModel::static_detuning(1.0);
        let canceller = ActiveCanceller::new(0.9, field);
        let report = canceller
            .simulate(&engine, &plus_state(), std::f64::consts::PI, 400)
            .unwrap();

        assert_eq!(report.times.len(), 400);
        assert_eq!(report.times[0], 0.0);
        let dt = std::f64::consts::PI / 400.0;
        assert_relative_eq!(
            *report.times.last().unwrap(),
            std::f64::consts::PI - dt,
            epsilon = 1e-12
        );
        // phase π without cancellation, 0.1π with
        assert!(*report.fidelity_without.last().unwrap() < 0.01);
        let expected = (0.05 * std::f64::consts::PI).cos().powi(2);
        assert_relative_eq!(*report.fidelity_with.last().unwrap(), expected, epsilon = 1e-4);
        assert!(report.suppression_factor() > 10.0);
    }

    #[test]
    fn test_perfect_cancellation_matches_plain_evolution() {
        let engine = DecoherenceEngine::new(EngineConfig::new(2, 5.0)).unwrap();
        let rho0 = plus_register(2);
        let canceller = ActiveCanceller::for_engine(&engine, 1.0);
        let report = canceller.simulate(&engine, &rho0, 10.0, 200).unwrap();

        let plain = engine.simulate_evolution(&rho0, 10.0, 200).unwrap();
        let expected = state_fidelity(plain.final_state().unwrap(), &rho0);
        assert_relative_eq!(*report.fidelity_with.last().unwrap(), expected, epsilon = 1e-10);
    }

    #[test]
    fn test_efficiency_clamped() {
        let f = FieldModel::static_detuning(1.0);
        assert_eq!(ActiveCanceller::new(1.5, f).efficiency(), 1.0);
        assert_eq!(ActiveCanceller::new(-0.5, f).efficiency(), 0.0);
        assert_eq!(ActiveCanceller::new(f64::NAN, f).efficiency(), 0.0);
    }

    #[test]
    fn test_zero_steps_and_bad_shape() {
        let engine = quiet_engine(1);
        let canceller = ActiveCanceller::new(0.5, FieldModel::static_detuning(1.0));
        let report = canceller.simulate(&engine, &plus_state(), 1.0, 0).unwrap();
        assert!(report.times.is_empty());
        assert_eq!(report.suppression_factor(), 1.0);

        assert!(canceller.simulate(&engine, &plus_register(2), 1.0, 10).is_err());
    }
}
