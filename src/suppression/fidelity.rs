// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Closed-form fidelity predictions.
//!
//! Each [`FidelityModel`] variant is a pure function of elapsed time:
//!
//! | model          | F(t) / F₀                       |
//! |----------------|---------------------------------|
//! | `Standard`     | exp(−t/T2)                      |
//! | `EpsilonRatio` | exp(−(ε₀ + t/T_sfe)/ε_crit)     |
//! | `PowerLaw`     | 1/(1 + t/T_sfe)                 |
//! | `SfeTheory`    | exp(−t·(1 − ε_mass)/T2)         |

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

/// ε_crit used when a ratio model is parsed from a bare name.
pub const DEFAULT_EPSILON_CRIT: f64 = 0.01;

/// Largest suppression coefficient the scaling helpers accept.
pub const MAX_EPSILON: f64 = 1.0 - 1e-9;

/// Fidelity decay law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FidelityModel {
    Standard,
    EpsilonRatio { epsilon_crit: f64 },
    PowerLaw,
    SfeTheory,
}

impl FidelityModel {
    /// Every model, with the ratio model at its default ε_crit.
    pub fn all() -> [FidelityModel; 4] {
        [
            FidelityModel::Standard,
            FidelityModel::EpsilonRatio {
                epsilon_crit: DEFAULT_EPSILON_CRIT,
            },
            FidelityModel::PowerLaw,
            FidelityModel::SfeTheory,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            FidelityModel::Standard => "standard",
            FidelityModel::EpsilonRatio { .. } => "sfe",
            FidelityModel::PowerLaw => "sfe_power",
            FidelityModel::SfeTheory => "sfe_theory",
        }
    }
}

impl fmt::Display for FidelityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FidelityModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(FidelityModel::Standard),
            "sfe" | "ratio" => Ok(FidelityModel::EpsilonRatio {
                epsilon_crit: DEFAULT_EPSILON_CRIT,
            }),
            "sfe_power" | "power_law" => Ok(FidelityModel::PowerLaw),
            "sfe_theory" => Ok(FidelityModel::SfeTheory),
            _ => Err(Error::InvalidMode {
                parameter: "fidelity mode".into(),
                value: s.to_string(),
            }),
        }
    }
}

/// Timescales the models read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FidelityParams {
    pub t2: f64,
    pub t_sfe: f64,
    pub epsilon_0: f64,
    pub epsilon_mass: f64,
}

/// Predict F(t) under `model`, scaled by `f0` and clamped to [0, 1].
///
/// Negative `t` is treated as 0. Degenerate timescales (non-positive T2 or
/// T_sfe, non-positive ε_crit) saturate instead of failing.
pub fn predict_fidelity(t: f64, model: FidelityModel, params: &FidelityParams, f0: f64) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.max(0.0) };

    let decay = match model {
        FidelityModel::Standard => exp_decay(t, params.t2),
        FidelityModel::EpsilonRatio { epsilon_crit } => {
            let eps = params.epsilon_0 + ratio(t, params.t_sfe);
            if epsilon_crit > 0.0 {
                (-eps / epsilon_crit).exp()
            } else if eps > 0.0 {
                0.0
            } else {
                1.0
            }
        }
        FidelityModel::PowerLaw => 1.0 / (1.0 + ratio(t, params.t_sfe)),
        FidelityModel::SfeTheory => {
            exp_decay(t, SfeScaling::new(params.epsilon_mass).theoretical_t2(params.t2))
        }
    };

    let f = f0 * decay;
    if f.is_nan() {
        return 0.0;
    }
    f.clamp(0.0, 1.0)
}

fn ratio(t: f64, timescale: f64) -> f64 {
    if timescale > 0.0 {
        t / timescale
    } else if t > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

fn exp_decay(t: f64, timescale: f64) -> f64 {
    (-ratio(t, timescale)).exp()
}

/// Rate and lifetime factors implied by a fixed suppression coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SfeScaling {
    epsilon: f64,
}

impl SfeScaling {
    /// ε is clamped to [0, [`MAX_EPSILON`]].
    pub fn new(epsilon: f64) -> Self {
        let epsilon = if epsilon.is_nan() { 0.0 } else { epsilon };
        Self {
            epsilon: epsilon.clamp(0.0, MAX_EPSILON),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Noise-rate multiplier 1 − ε.
    pub fn rate_factor(&self) -> f64 {
        1.0 - self.epsilon
    }

    /// 1/(1 − ε)
    pub fn decoherence_factor(&self) -> f64 {
        1.0 / self.rate_factor()
    }

    /// 1/√(1 − ε)
    pub fn lifetime_factor(&self) -> f64 {
        1.0 / self.rate_factor().sqrt()
    }

    /// T2_theory / T2 = 1/(1 − ε).
    pub fn theoretical_t2_ratio(&self) -> f64 {
        self.decoherence_factor()
    }

    pub fn theoretical_t2(&self, t2: f64) -> f64 {
        t2 * self.theoretical_t2_ratio()
    }
}
