// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Frequency-domain filter functions and the decoherence integral.
//!
//! For boundaries 0 = t₀ < t₁ < … < tₙ < tₙ₊₁ = T and toggling signs
//! y_k = (−1)^k on [t_k, t_{k+1}):
//!
//!   F(ω) = Σ_k y_k (e^{iωt_{k+1}} − e^{iωt_k}) / (iω),   F(0) = Σ_k y_k Δt_k
//!
//!   W(T) = (1/π) ∫ S(ω) |F(ω)|² / ω² dω
//!
//! The integral is a trapezoid rule over a [`FrequencyGrid`]; points with
//! ω ≤ 0 are skipped.
//!
//! Ref: Cywiński et al. (2008), PRB 77, 174509.

use num_complex::Complex64;
use serde::Serialize;
use tracing::debug;

use super::sequence::{PulseSequence, SequenceKind};
use crate::error::{Result, ValidationError};

/// Power spectral density S(ω).
pub trait NoiseSpectrum {
    fn density(&self, omega: f64) -> f64;
}

impl<F> NoiseSpectrum for F
where
    F: Fn(f64) -> f64,
{
    fn density(&self, omega: f64) -> f64 {
        self(omega)
    }
}

/// S(ω) = A / ω^α
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerLawSpectrum {
    pub amplitude: f64,
    pub alpha: f64,
}

impl PowerLawSpectrum {
    pub fn new(amplitude: f64, alpha: f64) -> Self {
        Self { amplitude, alpha }
    }

    /// Unit-amplitude 1/f^α noise.
    pub fn one_over_f(alpha: f64) -> Self {
        Self::new(1.0, alpha)
    }
}

impl NoiseSpectrum for PowerLawSpectrum {
    fn density(&self, omega: f64) -> f64 {
        self.amplitude / omega.powf(self.alpha)
    }
}

/// Wraps a spectrum and scales it by (1 − ε_mass).
#[derive(Debug, Clone, Copy)]
pub struct Suppressed<S> {
    pub inner: S,
    pub epsilon_mass: f64,
}

impl<S: NoiseSpectrum> Suppressed<S> {
    pub fn new(inner: S, epsilon_mass: f64) -> Self {
        Self {
            inner,
            epsilon_mass,
        }
    }
}

impl<S: NoiseSpectrum> NoiseSpectrum for Suppressed<S> {
    fn density(&self, omega: f64) -> f64 {
        (1.0 - self.epsilon_mass).max(0.0) * self.inner.density(omega)
    }
}

/// Sample points for the frequency quadrature.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyGrid {
    omegas: Vec<f64>,
}

pub const DEFAULT_OMEGA_MIN: f64 = 1e-3;
pub const DEFAULT_OMEGA_MAX: f64 = 1e3;
pub const DEFAULT_GRID_POINTS: usize = 4000;

impl Default for FrequencyGrid {
    fn default() -> Self {
        Self {
            omegas: log_points(DEFAULT_OMEGA_MIN, DEFAULT_OMEGA_MAX, DEFAULT_GRID_POINTS),
        }
    }
}

impl FrequencyGrid {
    /// `points` values geometrically spaced from `min` to `max` inclusive.
    pub fn log_spaced(min: f64, max: f64, points: usize) -> Result<Self> {
        if !(min.is_finite() && min > 0.0) {
            return Err(ValidationError::field("omega_min", "must be positive").into());
        }
        check_range(min, max, points)?;
        Ok(Self {
            omegas: log_points(min, max, points),
        })
    }

    /// `points` values evenly spaced from `min` to `max` inclusive.
    pub fn linear(min: f64, max: f64, points: usize) -> Result<Self> {
        check_range(min, max, points)?;
        let step = (max - min) / (points - 1) as f64;
        Ok(Self {
            omegas: (0..points).map(|k| min + k as f64 * step).collect(),
        })
    }

    /// Caller-supplied points; must be sorted ascending.
    pub fn from_points(omegas: Vec<f64>) -> Result<Self> {
        if omegas.windows(2).any(|w| w[1].is_nan() || w[1] < w[0]) {
            return Err(ValidationError::field("omegas", "must be sorted ascending").into());
        }
        Ok(Self { omegas })
    }

    pub fn omegas(&self) -> &[f64] {
        &self.omegas
    }

    pub fn len(&self) -> usize {
        self.omegas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.omegas.is_empty()
    }
}

fn check_range(min: f64, max: f64, points: usize) -> Result<()> {
    if !(max.is_finite() && max > min) {
        return Err(ValidationError::field("omega_max", "must exceed omega_min").into());
    }
    if points < 2 {
        return Err(ValidationError::field("grid_points", "must be at least 2").into());
    }
    Ok(())
}

fn log_points(min: f64, max: f64, points: usize) -> Vec<f64> {
    let (lo, hi) = (min.ln(), max.ln());
    let step = (hi - lo) / (points - 1) as f64;
    (0..points)
        .map(|k| {
            if k == points - 1 {
                max
            } else {
                (lo + k as f64 * step).exp()
            }
        })
        .collect()
}

/// F(ω) for `seq` stretched over `total_time`.
pub fn filter_function(omega: f64, seq: &PulseSequence, total_time: f64) -> Complex64 {
    let bounds = seq.boundaries(total_time);

    if omega == 0.0 {
        let integral: f64 = bounds
            .windows(2)
            .enumerate()
            .map(|(k, w)| sign(k) * (w[1] - w[0]))
            .sum();
        return Complex64::new(integral, 0.0);
    }

    let i_omega = Complex64::new(0.0, omega);
    let phase = |t: f64| Complex64::from_polar(1.0, omega * t);
    bounds
        .windows(2)
        .enumerate()
        .map(|(k, w)| (phase(w[1]) - phase(w[0])) * sign(k))
        .sum::<Complex64>()
        / i_omega
}

/// Normalized filter 1 + (−1)^{n+1} e^{iω} + 2 Σ_j (−1)^j e^{iωt_j} over
/// raw fractions (T = 1). Equals −iω·F(ω).
pub fn normalized_filter(omega: f64, fractions: &[f64]) -> Complex64 {
    let n = fractions.len();
    let mut val = Complex64::new(1.0, 0.0) + Complex64::from_polar(sign(n + 1), omega);
    for (j, &t) in fractions.iter().enumerate() {
        // 1-indexed pulse j+1 carries (−1)^{j+1}
        val += Complex64::from_polar(2.0 * sign(j + 1), omega * t);
    }
    val
}

fn sign(k: usize) -> f64 {
    if k % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// W(T) = (1/π) ∫ S(ω)|F(ω)|²/ω² dω, trapezoid over the positive grid points.
pub fn decoherence_integral<S>(
    seq: &PulseSequence,
    total_time: f64,
    spectrum: &S,
    grid: &FrequencyGrid,
) -> f64
where
    S: NoiseSpectrum + ?Sized,
{
    let samples: Vec<(f64, f64)> = grid
        .omegas()
        .iter()
        .copied()
        .filter(|&w| w > 0.0)
        .map(|w| {
            let f = filter_function(w, seq, total_time);
            (w, spectrum.density(w) * f.norm_sqr() / (w * w))
        })
        .collect();

    let integral: f64 = samples
        .windows(2)
        .map(|p| 0.5 * (p[0].1 + p[1].1) * (p[1].0 - p[0].0))
        .sum();

    integral / std::f64::consts::PI
}

/// W for a named sequence with `n_pulses` pulses.
pub fn decoherence_function<S>(
    total_time: f64,
    spectrum: &S,
    kind: SequenceKind,
    n_pulses: usize,
    grid: &FrequencyGrid,
) -> f64
where
    S: NoiseSpectrum + ?Sized,
{
    decoherence_integral(&PulseSequence::build(kind, n_pulses), total_time, spectrum, grid)
}

/// Coherence left after accumulating W: exp(−W).
pub fn coherence(w: f64) -> f64 {
    (-w).exp()
}

/// W for free decay, CPMG and UDD at the same pulse count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SequenceComparison {
    pub n_pulses: usize,
    pub total_time: f64,
    pub free: f64,
    pub cpmg: f64,
    pub udd: f64,
}

impl SequenceComparison {
    /// The pulsed sequence with the lower W.
    pub fn best(&self) -> (SequenceKind, f64) {
        if self.udd < self.cpmg {
            (SequenceKind::Udd, self.udd)
        } else {
            (SequenceKind::Cpmg, self.cpmg)
        }
    }
}

pub fn compare_sequences<S>(
    n_pulses: usize,
    spectrum: &S,
    total_time: f64,
    grid: &FrequencyGrid,
) -> SequenceComparison
where
    S: NoiseSpectrum + ?Sized,
{
    let free = decoherence_integral(&PulseSequence::free(), total_time, spectrum, grid);
    let cpmg = decoherence_integral(&PulseSequence::cpmg(n_pulses), total_time, spectrum, grid);
    let udd = decoherence_integral(&PulseSequence::udd(n_pulses), total_time, spectrum, grid);
    debug!(n_pulses, total_time, free, cpmg, udd, "Compared decoupling sequences");
    SequenceComparison {
        n_pulses,
        total_time,
        free,
        cpmg,
        udd,
    }
}
