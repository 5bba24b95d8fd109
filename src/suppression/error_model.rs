// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Saturating error-versus-pulse-count model.
//!
//!   e(s) = e_min + (e0 − e_min)·exp(−r·s)
//!
//! where s is the pulse count normalized by the smallest count measured.

use serde::Serialize;

use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorModel {
    pub e0: f64,
    pub e_min: f64,
    pub r: f64,
}

impl ErrorModel {
    pub fn new(e0: f64, e_min: f64, r: f64) -> Self {
        Self { e0, e_min, r }
    }

    pub fn value(&self, step: f64) -> f64 {
        self.e_min + (self.e0 - self.e_min) * (-self.r * step).exp()
    }
}

/// Fit an [`ErrorModel`] to measured errors.
///
/// e0 is the error at the smallest pulse count and e_min the smallest error.
/// r comes from a least-squares line through the origin of
/// ln((e − e_min)/(e0 − e_min)) against the normalized step; it is 0 when
/// the data carry no decay or the fit is not finite.
pub fn fit_error_model(pulse_counts: &[f64], errors: &[f64]) -> Result<ErrorModel> {
    if pulse_counts.is_empty() {
        return Err(ValidationError::field("pulse_counts", "must not be empty").into());
    }
    if pulse_counts.len() != errors.len() {
        return Err(ValidationError::Dimension {
            expected: pulse_counts.len(),
            actual: errors.len(),
        }
        .into());
    }

    let (idx0, min_pulse) = pulse_counts
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, p)| {
            if p < best.1 {
                (i, p)
            } else {
                best
            }
        });
    if min_pulse.is_nan() || min_pulse <= 0.0 {
        return Err(ValidationError::field("pulse_counts", "must be positive").into());
    }

    let e0 = errors[idx0];
    let e_min = errors.iter().copied().fold(f64::INFINITY, f64::min);
    let denom = e0 - e_min;
    if denom <= 0.0 {
        return Ok(ErrorModel::new(e0, e_min, 0.0));
    }

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (&p, &e) in pulse_counts.iter().zip(errors) {
        let num = e - e_min;
        if num <= 0.0 {
            continue;
        }
        let x = p / min_pulse;
        let y = (num / denom).ln();
        sxy += x * y;
        sxx += x * x;
    }

    let r = if sxx > 0.0 { -sxy / sxx } else { 0.0 };
    let r = if r.is_finite() { r } else { 0.0 };
    Ok(ErrorModel::new(e0, e_min, r))
}
