// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Notch-filter pulse placement.
//!
//! Searches for pulse fractions that null the normalized filter function at
//! ⌊n/2⌋ target frequencies linearly spaced in [0.1, ω_max]. The real and
//! imaginary parts at each target form the residual vector, minimized by
//! Levenberg–Marquardt with a forward-difference Jacobian, seeded from UDD.
//! The result is clamped to [1e-4, 1 − 1e-4] and sorted; if that does not
//! beat the seed's residual, the UDD seed is returned instead.

use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::{debug, warn};

use super::filter::normalized_filter;
use super::sequence::PulseSequence;
use crate::error::{Result, ValidationError};
use crate::linalg::solve;

const LOWEST_TARGET: f64 = 0.1;
const FRACTION_MARGIN: f64 = 1e-4;
const JACOBIAN_STEP: f64 = 1e-7;

/// Solver settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotchSolver {
    pub n_pulses: usize,
    pub omega_max: f64,
    pub max_iterations: usize,
    /// Stop once the squared residual drops below this.
    pub tolerance: f64,
}

/// Outcome of a notch search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotchResult {
    pub sequence: PulseSequence,
    pub target_omegas: Vec<f64>,
    /// ‖r‖ of the UDD seed.
    pub initial_residual: f64,
    /// ‖r‖ of the returned sequence.
    pub final_residual: f64,
    pub iterations: usize,
    /// True when the UDD seed was kept.
    pub fell_back: bool,
}

impl NotchSolver {
    pub fn new(n_pulses: usize, omega_max: f64) -> Self {
        Self {
            n_pulses,
            omega_max,
            max_iterations: 200,
            tolerance: 1e-20,
        }
    }

    pub fn target_omegas(&self) -> Vec<f64> {
        let k = self.n_pulses / 2;
        match k {
            0 => Vec::new(),
            1 => vec![LOWEST_TARGET],
            _ => {
                let step = (self.omega_max - LOWEST_TARGET) / (k - 1) as f64;
                (0..k).map(|i| LOWEST_TARGET + i as f64 * step).collect()
            }
        }
    }

    pub fn solve(&self) -> Result<NotchResult> {
        if !(self.omega_max.is_finite() && self.omega_max > 0.0) {
            return Err(ValidationError::field("omega_max", "must be positive").into());
        }

        let targets = self.target_omegas();
        let seed = PulseSequence::udd(self.n_pulses);
        let seed_x = Array1::from(seed.fractions().to_vec());
        let initial_residual = norm(&residuals(&seed_x, &targets));

        if targets.is_empty() {
            return Ok(NotchResult {
                sequence: seed,
                target_omegas: targets,
                initial_residual,
                final_residual: initial_residual,
                iterations: 0,
                fell_back: true,
            });
        }

        let (x, iterations) = self.levenberg_marquardt(seed_x, &targets);

        let mut fractions: Vec<f64> = x
            .iter()
            .map(|v| {
                if v.is_finite() {
                    v.clamp(FRACTION_MARGIN, 1.0 - FRACTION_MARGIN)
                } else {
                    0.5
                }
            })
            .collect();
        fractions.sort_by(|a, b| a.total_cmp(b));
        let final_residual = norm(&residuals(&Array1::from(fractions.clone()), &targets));

        if final_residual.is_nan() || final_residual >= initial_residual {
            warn!(
                n_pulses = self.n_pulses,
                omega_max = self.omega_max,
                initial_residual,
                final_residual,
                "Notch search did not improve on UDD, keeping seed"
            );
            return Ok(NotchResult {
                sequence: seed,
                target_omegas: targets,
                initial_residual,
                final_residual: initial_residual,
                iterations,
                fell_back: true,
            });
        }

        debug!(
            n_pulses = self.n_pulses,
            iterations, initial_residual, final_residual, "Notch search converged"
        );
        Ok(NotchResult {
            sequence: PulseSequence::from_fractions(fractions)?,
            target_omegas: targets,
            initial_residual,
            final_residual,
            iterations,
            fell_back: false,
        })
    }

    fn levenberg_marquardt(&self, mut x: Array1<f64>, targets: &[f64]) -> (Array1<f64>, usize) {
        let n = x.len();
        let mut r = residuals(&x, targets);
        let mut cost = r.dot(&r);
        let mut lambda = 1e-3;
        let mut iterations = 0;

        while iterations < self.max_iterations && cost > self.tolerance {
            iterations += 1;

            let jac = jacobian(&x, &r, targets);
            let jtj = jac.t().dot(&jac);
            let grad = jac.t().dot(&r);

            let mut a = jtj.clone();
            for i in 0..n {
                a[[i, i]] += lambda * (jtj[[i, i]] + 1e-12);
            }

            let Some(delta) = solve(a, -&grad) else {
                lambda *= 10.0;
                if lambda > 1e12 {
                    break;
                }
                continue;
            };

            let candidate = &x + &delta;
            let r_new = residuals(&candidate, targets);
            let cost_new = r_new.dot(&r_new);

            if cost_new.is_finite() && cost_new < cost {
                let gain = cost - cost_new;
                x = candidate;
                r = r_new;
                cost = cost_new;
                lambda = (lambda / 10.0).max(1e-15);
                if gain <= 1e-15 * cost {
                    break;
                }
            } else {
                lambda *= 10.0;
                if lambda > 1e12 {
                    break;
                }
            }
        }

        (x, iterations)
    }
}

/// Convenience wrapper around [`NotchSolver::solve`].
pub fn solve_notch_sequence(n_pulses: usize, omega_max: f64) -> Result<NotchResult> {
    NotchSolver::new(n_pulses, omega_max).solve()
}

fn residuals(x: &Array1<f64>, targets: &[f64]) -> Array1<f64> {
    let fractions = x.to_vec();
    let mut out = Array1::zeros(2 * targets.len());
    for (k, &w) in targets.iter().enumerate() {
        let f = normalized_filter(w, &fractions);
        out[2 * k] = f.re;
        out[2 * k + 1] = f.im;
    }
    out
}

fn jacobian(x: &Array1<f64>, r: &Array1<f64>, targets: &[f64]) -> Array2<f64> {
    let n = x.len();
    let mut jac = Array2::zeros((r.len(), n));
    for j in 0..n {
        let h = JACOBIAN_STEP * x[j].abs().max(1.0);
        let mut xp = x.clone();
        xp[j] += h;
        let rp = residuals(&xp, targets);
        for i in 0..r.len() {
            jac[[i, j]] = (rp[i] - r[i]) / h;
        }
    }
    jac
}

fn norm(r: &Array1<f64>) -> f64 {
    r.dot(r).sqrt()
}
