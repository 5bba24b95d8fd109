// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Suppression-exposure accumulator.
//!
//! Tracks the cumulative suppression coefficient over applied gate time:
//!
//!   ε_total = ε₀ + Σ t_gate / T_sfe
//!
//! ε_total is non-decreasing between explicit resets. The value is pure
//! bookkeeping; it is not fed back into the Kraus rates unless a caller
//! asks for it (see the correction and circuit paths of the engine).

use serde::Serialize;

/// Single-owner mutable accumulator.
///
/// Mutation goes through `&mut self`; [`SuppressionAccumulator::advanced`]
/// offers the same update as a pure value transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SuppressionAccumulator {
    epsilon_0: f64,
    epsilon_acc: f64,
    t_sfe: f64,
}

impl SuppressionAccumulator {
    pub fn new(epsilon_0: f64, t_sfe: f64) -> Self {
        Self {
            epsilon_0,
            epsilon_acc: 0.0,
            t_sfe,
        }
    }

    /// Exposure contributed by `gate_time`. Negative or non-finite gate
    /// times, and a non-positive T_sfe, contribute nothing.
    fn increment(&self, gate_time: f64) -> f64 {
        if !gate_time.is_finite() || gate_time <= 0.0 || self.t_sfe.is_nan() || self.t_sfe <= 0.0
        {
            return 0.0;
        }
        gate_time / self.t_sfe
    }

    /// Add `gate_time / T_sfe` and return the new ε_total.
    pub fn update_epsilon(&mut self, gate_time: f64) -> f64 {
        self.epsilon_acc += self.increment(gate_time);
        self.epsilon_total()
    }

    /// Same update as [`Self::update_epsilon`], returning a new value.
    #[must_use]
    pub fn advanced(&self, gate_time: f64) -> Self {
        Self {
            epsilon_acc: self.epsilon_acc + self.increment(gate_time),
            ..*self
        }
    }

    /// Clear the accumulated part; ε₀ is kept.
    pub fn reset_epsilon(&mut self) {
        self.epsilon_acc = 0.0;
    }

    pub fn epsilon_total(&self) -> f64 {
        self.epsilon_0 + self.epsilon_acc
    }

    pub fn epsilon_0(&self) -> f64 {
        self.epsilon_0
    }

    pub fn epsilon_acc(&self) -> f64 {
        self.epsilon_acc
    }

    pub fn t_sfe(&self) -> f64 {
        self.t_sfe
    }

    /// Phase-correction angle θ = ε_total·ω₀/2.
    pub fn phase_correction_angle(&self, omega_0: f64) -> f64 {
        self.epsilon_total() * omega_0 / 2.0
    }

    /// √(1 − ε_total), saturating to 1 once ε_total ≥ 1.
    pub fn amplitude_correction_factor(&self) -> f64 {
        self.amplitude_noise_scale().sqrt()
    }

    /// Rate multiplier for amplitude-corrected noise: 1 − ε_total, back to 1
    /// (no correction) once ε_total ≥ 1.
    pub fn amplitude_noise_scale(&self) -> f64 {
        let eps = self.epsilon_total();
        if eps >= 1.0 {
            return 1.0;
        }
        1.0 - eps.max(0.0)
    }
}
