// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Suppression bookkeeping and closed-form fidelity laws.

pub mod accumulator;
pub mod error_model;
pub mod fidelity;

pub use accumulator::SuppressionAccumulator;
pub use error_model::{fit_error_model, ErrorModel};
pub use fidelity::{predict_fidelity, FidelityModel, FidelityParams, SfeScaling};
