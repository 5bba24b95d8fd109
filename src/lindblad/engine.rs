// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Open-system evolution engine.
//!
//! [`DecoherenceEngine`] advances a density matrix with one Kraus step per
//! time step: amplitude damping and dephasing on every qubit, then ZZ
//! dephasing on every correlated pair, then trace renormalization. On top of
//! that step it runs the decoupling, correction, circuit and ZNE drivers.
//!
//! The engine owns one [`SuppressionAccumulator`]; runs that advance it take
//! `&mut self`.

use ndarray::Array2;
use num_complex::Complex64;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::correlation::CorrelationModel;
use super::gates::{rz_all, Gate};
use super::kraus::{
    amplitude_damping, correlated_dephasing, damping_probability, dephasing, dephasing_lambda,
    renormalize,
};
use super::metrics::{expectation, purity, state_fidelity};
use super::types::{
    CollapseOperator, CorrectedEvolution, CorrectionOptions, Evolution, NoiseParameters,
};
use crate::cancellation::FieldModel;
use crate::config::{EngineConfig, PhysicalConstants};
use crate::decoupling::PulseSequence;
use crate::error::{Error, Result, ValidationError};
use crate::linalg::{conjugate, hermiticity_defect, trace_real};
use crate::suppression::{predict_fidelity, FidelityModel, FidelityParams, SuppressionAccumulator};
use crate::validation::validate_density_matrix;
use crate::zne::{extrapolate, ZneResult};

/// Trace drift above this is logged before renormalizing.
const TRACE_DRIFT_WARN: f64 = 1e-6;

/// Serializable snapshot of an engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineInfo {
    pub num_qubits: usize,
    pub noise: NoiseParameters,
    pub t_sfe: f64,
    pub epsilon_mass: f64,
    pub epsilon_total: f64,
    pub correlated_pairs: Vec<(usize, usize, f64)>,
}

/// Kraus-step evolution engine.
#[derive(Debug, Clone)]
pub struct DecoherenceEngine {
    num_qubits: usize,
    params: NoiseParameters,
    correlation: CorrelationModel,
    accumulator: SuppressionAccumulator,
    epsilon_mass: f64,
}

impl DecoherenceEngine {
    /// Build with the default [`PhysicalConstants`].
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_constants(config, &PhysicalConstants::default())
    }

    /// Build with explicit constants. `config.t_sfe`, when set, wins over
    /// the value derived from `constants`.
    pub fn with_constants(config: EngineConfig, constants: &PhysicalConstants) -> Result<Self> {
        config.validate()?;

        let params = config.noise_parameters();
        let correlation = config.correlation_model()?;
        let t_sfe = config.t_sfe.unwrap_or_else(|| constants.t_sfe());
        let epsilon_mass = constants.epsilon_mass();

        info!(
            num_qubits = config.num_qubits,
            t2 = params.t2,
            gamma_phi = params.gamma_phi,
            gamma_1 = params.gamma_1,
            t_sfe,
            epsilon_mass,
            correlated_pairs = correlation.correlated_pairs().len(),
            "Decoherence engine initialized"
        );

        Ok(Self {
            num_qubits: config.num_qubits,
            params,
            correlation,
            accumulator: SuppressionAccumulator::new(params.epsilon_0, t_sfe),
            epsilon_mass,
        })
    }

    /// Replace the correlation model.
    ///
    /// # Errors
    ///
    /// The model's size differs from the register.
    pub fn with_correlation(mut self, correlation: CorrelationModel) -> Result<Self> {
        if correlation.n_qubits() != self.num_qubits {
            return Err(ValidationError::Dimension {
                expected: self.num_qubits,
                actual: correlation.n_qubits(),
            }
            .into());
        }
        self.correlation = correlation;
        Ok(self)
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn dimension(&self) -> usize {
        1 << self.num_qubits
    }

    pub fn noise_parameters(&self) -> &NoiseParameters {
        &self.params
    }

    pub fn correlation(&self) -> &CorrelationModel {
        &self.correlation
    }

    pub fn accumulator(&self) -> &SuppressionAccumulator {
        &self.accumulator
    }

    pub fn epsilon_mass(&self) -> f64 {
        self.epsilon_mass
    }

    pub fn epsilon_total(&self) -> f64 {
        self.accumulator.epsilon_total()
    }

    /// Charge `gate_time` to the accumulator and return the new ε_total.
    pub fn update_epsilon(&mut self, gate_time: f64) -> f64 {
        self.accumulator.update_epsilon(gate_time)
    }

    pub fn reset_epsilon(&mut self) {
        self.accumulator.reset_epsilon();
    }

    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            num_qubits: self.num_qubits,
            noise: self.params,
            t_sfe: self.accumulator.t_sfe(),
            epsilon_mass: self.epsilon_mass,
            epsilon_total: self.accumulator.epsilon_total(),
            correlated_pairs: self.correlation.correlated_pairs(),
        }
    }

    /// Timescales for the closed-form fidelity laws.
    pub fn fidelity_params(&self) -> FidelityParams {
        FidelityParams {
            t2: self.params.t2,
            t_sfe: self.accumulator.t_sfe(),
            epsilon_0: self.params.epsilon_0,
            epsilon_mass: self.epsilon_mass,
        }
    }

    /// Closed-form F(t) with this engine's timescales.
    pub fn predict_fidelity(&self, t: f64, model: FidelityModel, f0: f64) -> f64 {
        predict_fidelity(t, model, &self.fidelity_params(), f0)
    }

    /// Continuous-time generators matching the Kraus step at scale 1.
    pub fn collapse_operators(&self) -> Vec<CollapseOperator> {
        let n = self.num_qubits;
        let mut ops = Vec::with_capacity(2 * n);
        for q in 0..n {
            ops.push(CollapseOperator::amplitude_damping(self.params.gamma_1, q, n));
            ops.push(CollapseOperator::dephasing(
                self.params.gamma_phi * self.correlation.get(q, q),
                q,
                n,
            ));
        }
        for (i, j, cij) in self.correlation.correlated_pairs() {
            ops.push(CollapseOperator::correlated_dephasing(
                self.params.gamma_phi * cij,
                i,
                j,
                n,
            ));
        }
        ops
    }

    /// Reject a matrix that is not 2ⁿ × 2ⁿ.
    pub fn check_shape(&self, rho: &Array2<Complex64>) -> Result<()> {
        if rho.nrows() != rho.ncols() {
            return Err(ValidationError::field(
                "rho",
                format!("must be square, got {} × {}", rho.nrows(), rho.ncols()),
            )
            .into());
        }
        if rho.nrows() != self.dimension() {
            return Err(ValidationError::Dimension {
                expected: self.dimension(),
                actual: rho.nrows(),
            }
            .into());
        }
        Ok(())
    }

    /// Full density-matrix check (shape, Hermiticity, unit trace) for this
    /// register.
    pub fn validate_state(&self, rho: &Array2<Complex64>, tol: f64) -> Result<()> {
        validate_density_matrix(rho, self.num_qubits, tol)
    }

    /// One decoherence step of length `dt` with every rate multiplied by
    /// `scale`. Non-positive (or NaN) `dt` or `scale` returns ρ unchanged.
    pub fn apply_decoherence_step(
        &self,
        rho: &Array2<Complex64>,
        dt: f64,
        scale: f64,
    ) -> Result<Array2<Complex64>> {
        self.check_shape(rho)?;
        Ok(self.step(rho, dt, scale))
    }

    fn step(&self, rho: &Array2<Complex64>, dt: f64, scale: f64) -> Array2<Complex64> {
        if dt.is_nan() || dt <= 0.0 || scale.is_nan() || scale <= 0.0 {
            return rho.clone();
        }

        let n = self.num_qubits;
        let gamma_1 = self.params.gamma_1 * scale;
        let gamma_phi = self.params.gamma_phi * scale;
        let p = damping_probability(gamma_1, dt);

        let mut out = rho.clone();
        for q in 0..n {
            out = amplitude_damping(&out, q, n, p);
            let lambda = dephasing_lambda(gamma_phi * self.correlation.get(q, q), dt);
            out = dephasing(&out, q, n, lambda);
        }
        for (i, j, cij) in self.correlation.correlated_pairs() {
            out = correlated_dephasing(&out, i, j, n, dephasing_lambda(gamma_phi * cij, dt));
        }

        let tr = trace_real(&out);
        if tr.is_finite() && tr != 0.0 && (tr - 1.0).abs() > TRACE_DRIFT_WARN {
            warn!(trace = tr, "Renormalizing density matrix with drifted trace");
        }
        let out = renormalize(out);

        debug_assert!(hermiticity_defect(&out) < 1e-9, "step broke Hermiticity");
        debug_assert!({
            let tr = trace_real(&out);
            !tr.is_finite() || tr == 0.0 || (tr - 1.0).abs() < 1e-9
        });
        out
    }

    fn step_size(total_time: f64, n_steps: usize) -> Result<f64> {
        if !total_time.is_finite() {
            return Err(ValidationError::field("total_time", "must be finite").into());
        }
        Ok(if n_steps == 0 {
            0.0
        } else {
            total_time / n_steps as f64
        })
    }

    fn evolve_scaled(
        &self,
        rho0: &Array2<Complex64>,
        total_time: f64,
        n_steps: usize,
        scale: f64,
    ) -> Result<Evolution> {
        self.check_shape(rho0)?;
        let dt = Self::step_size(total_time, n_steps)?;

        let mut evolution = Evolution::with_capacity(n_steps + 1);
        let mut rho = rho0.clone();
        evolution.push(0.0, rho.clone());
        for k in 1..=n_steps {
            rho = self.step(&rho, dt, scale);
            evolution.push(k as f64 * dt, rho.clone());
        }
        Ok(evolution)
    }

    /// Free decay: `n_steps + 1` states starting with `rho0` at t = 0.
    pub fn simulate_evolution(
        &self,
        rho0: &Array2<Complex64>,
        total_time: f64,
        n_steps: usize,
    ) -> Result<Evolution> {
        let evolution = self.evolve_scaled(rho0, total_time, n_steps, 1.0)?;
        if let Some(last) = evolution.final_state() {
            debug!(
                total_time,
                n_steps,
                final_purity = purity(last),
                "Free evolution finished"
            );
        }
        Ok(evolution)
    }

    /// Decay under a coherent field with π pulses in the toggling frame.
    ///
    /// Step k applies the Kraus step, then rotates every qubit about z by
    /// y·B(k·dt)·dt, with y the toggling sign at the step midpoint.
    pub fn simulate_with_decoupling(
        &self,
        rho0: &Array2<Complex64>,
        total_time: f64,
        n_steps: usize,
        sequence: &PulseSequence,
        field: &FieldModel,
    ) -> Result<Evolution> {
        self.check_shape(rho0)?;
        let dt = Self::step_size(total_time, n_steps)?;
        let n = self.num_qubits;

        let mut evolution = Evolution::with_capacity(n_steps + 1);
        let mut rho = rho0.clone();
        evolution.push(0.0, rho.clone());
        for k in 0..n_steps {
            rho = self.step(&rho, dt, 1.0);
            let y = sequence.toggling_sign((k as f64 + 0.5) / n_steps as f64);
            let angle = y * field.value(k as f64 * dt) * dt;
            rho = conjugate(&rho, &rz_all(angle, n));
            evolution.push((k + 1) as f64 * dt, rho.clone());
        }

        debug!(
            sequence = %sequence.kind(),
            n_pulses = sequence.n_pulses(),
            total_time,
            n_steps,
            "Decoupled evolution finished"
        );
        Ok(evolution)
    }

    /// Run an uncorrected and a corrected branch side by side.
    ///
    /// Each step charges `dt` to the accumulator. Both branches take the
    /// Kraus step and a drift rotation by Δε·ω₀. The corrected branch
    /// counter-rotates when `options.phase` is set and runs its Kraus step at
    /// the accumulator's amplitude noise scale (1 − ε_total, back to 1 once
    /// ε_total ≥ 1) when `options.amplitude` is set.
    pub fn simulate_with_correction(
        &mut self,
        rho0: &Array2<Complex64>,
        total_time: f64,
        n_steps: usize,
        options: CorrectionOptions,
    ) -> Result<CorrectedEvolution> {
        self.check_shape(rho0)?;
        let dt = Self::step_size(total_time, n_steps)?;
        let n = self.num_qubits;

        let mut times = Vec::with_capacity(n_steps + 1);
        let mut uncorrected = Vec::with_capacity(n_steps + 1);
        let mut corrected = Vec::with_capacity(n_steps + 1);
        let mut rho_u = rho0.clone();
        let mut rho_c = rho0.clone();
        times.push(0.0);
        uncorrected.push(rho_u.clone());
        corrected.push(rho_c.clone());

        for k in 1..=n_steps {
            let before = self.accumulator.phase_correction_angle(options.omega_0);
            self.accumulator.update_epsilon(dt);
            let after = self.accumulator.phase_correction_angle(options.omega_0);
            // Half-angle to full Bloch rotation.
            let drift = 2.0 * (after - before);

            rho_u = self.step(&rho_u, dt, 1.0);
            if drift != 0.0 {
                rho_u = conjugate(&rho_u, &rz_all(drift, n));
            }

            let scale = if options.amplitude {
                self.accumulator.amplitude_noise_scale()
            } else {
                1.0
            };
            rho_c = self.step(&rho_c, dt, scale);
            let residual = if options.phase { 0.0 } else { drift };
            if residual != 0.0 {
                rho_c = conjugate(&rho_c, &rz_all(residual, n));
            }

            times.push(k as f64 * dt);
            uncorrected.push(rho_u.clone());
            corrected.push(rho_c.clone());
        }

        debug!(
            phase = options.phase,
            amplitude = options.amplitude,
            epsilon_total = self.accumulator.epsilon_total(),
            phase_angle = self.accumulator.phase_correction_angle(options.omega_0),
            amplitude_factor = self.accumulator.amplitude_correction_factor(),
            n_steps,
            "Corrected evolution finished"
        );
        Ok(CorrectedEvolution {
            times,
            uncorrected,
            corrected,
        })
    }

    /// F = Re Tr(target·ρ) per state, clamped to [0, 1].
    pub fn calculate_fidelity_history(
        &self,
        states: &[Array2<Complex64>],
        target: &Array2<Complex64>,
    ) -> Result<Vec<f64>> {
        self.check_shape(target)?;
        states
            .iter()
            .map(|rho| {
                self.check_shape(rho)?;
                Ok(state_fidelity(rho, target))
            })
            .collect()
    }

    /// Apply `gates` in order, each followed by a Kraus step of length
    /// `gate_time` and an accumulator charge of the same length.
    ///
    /// With `use_suppression` the Kraus step runs at scale (1 − ε_mass).
    pub fn simulate_circuit(
        &mut self,
        rho0: &Array2<Complex64>,
        gates: &[Gate],
        gate_time: f64,
        use_suppression: bool,
    ) -> Result<Evolution> {
        self.check_shape(rho0)?;
        let n = self.num_qubits;
        let unitaries = gates
            .iter()
            .map(|g| g.unitary(n))
            .collect::<Result<Vec<_>>>()?;

        let scale = if use_suppression {
            (1.0 - self.epsilon_mass).max(0.0)
        } else {
            1.0
        };

        let mut evolution = Evolution::with_capacity(gates.len() + 1);
        let mut rho = rho0.clone();
        let mut t = 0.0;
        evolution.push(t, rho.clone());
        for u in &unitaries {
            rho = conjugate(&rho, u);
            rho = self.step(&rho, gate_time, scale);
            self.accumulator.update_epsilon(gate_time);
            t += gate_time;
            evolution.push(t, rho.clone());
        }

        debug!(
            n_gates = gates.len(),
            gate_time,
            use_suppression,
            epsilon_total = self.accumulator.epsilon_total(),
            "Circuit finished"
        );
        Ok(evolution)
    }

    /// Measure ⟨observable⟩ after free decay at each noise scale and
    /// extrapolate to zero noise.
    ///
    /// # Errors
    ///
    /// Empty `scales`, a negative or non-finite scale, or mismatched shapes.
    pub fn zero_noise_extrapolate(
        &self,
        observable: &Array2<Complex64>,
        rho0: &Array2<Complex64>,
        total_time: f64,
        n_steps: usize,
        scales: &[f64],
        order: usize,
    ) -> Result<ZneResult> {
        if scales.is_empty() {
            return Err(ValidationError::field("scales", "need at least one point").into());
        }
        if let Some(&s) = scales.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(Error::Validation(ValidationError::field(
                "scales",
                format!("scale {s} must be finite and non-negative"),
            )));
        }
        self.check_shape(observable)?;

        let values = scales
            .iter()
            .map(|&s| {
                let evolution = self.evolve_scaled(rho0, total_time, n_steps, s)?;
                Ok(evolution
                    .final_state()
                    .map(|rho| expectation(rho, observable))
                    .unwrap_or_default())
            })
            .collect::<Result<Vec<f64>>>()?;

        let fit = extrapolate(scales, &values, order)?;
        debug!(
            n_scales = scales.len(),
            order = fit.order,
            mitigated = fit.value_at_zero,
            "Zero-noise extrapolation finished"
        );
        Ok(ZneResult {
            scales: scales.to_vec(),
            values,
            fit,
        })
    }
}
