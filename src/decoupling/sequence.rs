// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dynamical-decoupling pulse sequences.
//!
//! A [`PulseSequence`] is a sorted list of π-pulse positions given as
//! fractions of the total evolution time, each strictly inside (0, 1).
//! Every pulse flips the sign of the toggling function y(t), which starts
//! at +1.
//!
//! Placement rules for the j-th of n pulses (j = 1..n):
//!
//! - CPMG: (j − ½)/n
//! - UDD:  sin²(jπ/(2n + 2))
//! - log-warped: ln(1 + β·j/(n+1)) / ln(1 + β)
//!
//! Ref: Uhrig (2007), PRL 98, 100504.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::validate_pulse_fractions;

/// Named placement rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    /// No pulses (free induction decay).
    Free,
    /// A single pulse at T/2.
    HahnEcho,
    Cpmg,
    Udd,
    LogWarped,
    /// Externally supplied positions.
    Custom,
}

impl SequenceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SequenceKind::Free => "free",
            SequenceKind::HahnEcho => "hahn_echo",
            SequenceKind::Cpmg => "cpmg",
            SequenceKind::Udd => "udd",
            SequenceKind::LogWarped => "log_warped",
            SequenceKind::Custom => "custom",
        }
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SequenceKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" | "none" => Ok(SequenceKind::Free),
            "hahn" | "hahn_echo" | "echo" => Ok(SequenceKind::HahnEcho),
            "cpmg" => Ok(SequenceKind::Cpmg),
            "udd" => Ok(SequenceKind::Udd),
            "log" | "log_warped" => Ok(SequenceKind::LogWarped),
            _ => Err(Error::InvalidMode {
                parameter: "decoupling sequence".into(),
                value: s.to_string(),
            }),
        }
    }
}

/// Sorted π-pulse positions in (0, 1).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PulseSequence {
    kind: SequenceKind,
    fractions: Vec<f64>,
}

/// β used by [`PulseSequence::build`] for log-warped sequences.
pub const DEFAULT_LOG_BETA: f64 = 4.0;

impl PulseSequence {
    pub fn free() -> Self {
        Self {
            kind: SequenceKind::Free,
            fractions: Vec::new(),
        }
    }

    pub fn hahn_echo() -> Self {
        Self {
            kind: SequenceKind::HahnEcho,
            fractions: vec![0.5],
        }
    }

    pub fn cpmg(n: usize) -> Self {
        let nf = n as f64;
        Self {
            kind: SequenceKind::Cpmg,
            fractions: (1..=n).map(|j| (j as f64 - 0.5) / nf).collect(),
        }
    }

    pub fn udd(n: usize) -> Self {
        let denom = 2.0 * n as f64 + 2.0;
        Self {
            kind: SequenceKind::Udd,
            fractions: (1..=n)
                .map(|j| {
                    let s = (j as f64 * std::f64::consts::PI / denom).sin();
                    s * s
                })
                .collect(),
        }
    }

    /// Pulses bunched toward the start for β > 0; β ≤ 0 gives equal spacing
    /// j/(n+1).
    pub fn log_warped(n: usize, beta: f64) -> Self {
        let np1 = n as f64 + 1.0;
        let fractions = (1..=n)
            .map(|j| {
                let u = j as f64 / np1;
                if beta > 0.0 {
                    (beta * u).ln_1p() / beta.ln_1p()
                } else {
                    u
                }
            })
            .collect();
        Self {
            kind: SequenceKind::LogWarped,
            fractions,
        }
    }

    /// Wrap externally supplied positions.
    ///
    /// # Errors
    ///
    /// Any value outside (0, 1), NaN, or unsorted input.
    pub fn from_fractions(fractions: Vec<f64>) -> Result<Self> {
        validate_pulse_fractions(&fractions)?;
        Ok(Self {
            kind: SequenceKind::Custom,
            fractions,
        })
    }

    /// Build a named sequence with `n` pulses.
    ///
    /// `Free` ignores `n`; `HahnEcho` always has one pulse; `Custom` has no
    /// rule and yields the free sequence.
    pub fn build(kind: SequenceKind, n: usize) -> Self {
        match kind {
            SequenceKind::Free | SequenceKind::Custom => Self::free(),
            SequenceKind::HahnEcho => Self::hahn_echo(),
            SequenceKind::Cpmg => Self::cpmg(n),
            SequenceKind::Udd => Self::udd(n),
            SequenceKind::LogWarped => Self::log_warped(n, DEFAULT_LOG_BETA),
        }
    }

    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    pub fn n_pulses(&self) -> usize {
        self.fractions.len()
    }

    /// y at normalized time `fraction`: +1 before the first pulse, flipped
    /// at every pulse (a pulse exactly at `fraction` counts as applied).
    pub fn toggling_sign(&self, fraction: f64) -> f64 {
        let flips = self.fractions.partition_point(|&b| b <= fraction);
        if flips % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Interval boundaries in absolute time: [0, t₁, …, tₙ, T].
    pub fn boundaries(&self, total_time: f64) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.fractions.len() + 2);
        out.push(0.0);
        out.extend(self.fractions.iter().map(|f| f * total_time));
        out.push(total_time);
        out
    }
}
