// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Open-system noise simulator for small qubit registers.
//!
//! This crate evolves density matrices under Kraus decoherence and compares
//! the strategies that fight it: a time-accumulating suppression
//! coefficient, dynamical decoupling, active field cancellation and
//! zero-noise extrapolation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              sfe-sim (CLI)                  │
//! ├──────────────┬──────────────┬───────────────┤
//! │ cancellation │     zne      │  decoupling   │
//! ├──────────────┴──────────────┤  (filter fn,  │
//! │  lindblad::DecoherenceEngine│   notch)      │
//! ├──────────────┬──────────────┴───────────────┤
//! │ suppression  │   kraus · gates · metrics    │
//! └──────────────┴──────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`lindblad`]: Kraus engine, gates, reference master-equation solver
//! - [`suppression`]: ε accumulator and closed-form fidelity laws
//! - [`decoupling`]: Pulse sequences, filter functions, notch solver
//! - [`cancellation`]: Active cancellation of a coherent field
//! - [`zne`]: Zero-noise extrapolation
//! - [`validation`]: Input validation utilities
//! - [`error`]: Error types

pub mod cancellation;
pub mod config;
pub mod decoupling;
pub mod error;
pub mod linalg;
pub mod lindblad;
pub mod suppression;
pub mod validation;
pub mod zne;

pub use config::Config;
pub use error::{Error, Result};

#[cfg(test)]
pub mod test_utils;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
