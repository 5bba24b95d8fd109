// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Open-system dynamics for small qubit registers.
//!
//! The production path is the discrete Kraus step of [`DecoherenceEngine`]:
//!
//!   ρ → Σ_k K_k ρ K_k†
//!
//! with amplitude damping and dephasing per qubit plus ZZ dephasing on
//! spatially correlated pairs. A fourth-order Runge–Kutta integrator of the
//! GKSL master equation,
//!
//!   dρ/dt = −i[H(t), ρ] + Σ_k γ_k (L_k ρ L_k† − ½{L_k†L_k, ρ}),
//!
//! is kept as a reference for the Kraus step.
//!
//! # Example
//!
//! ```ignore
//! use sfe_quantum::config::EngineConfig;
//! use sfe_quantum::lindblad::DecoherenceEngine;
//!
//! let engine = DecoherenceEngine::new(EngineConfig::new(1, 10.0))?;
//! let evolution = engine.simulate_evolution(&rho0, 50.0, 1000)?;
//! let history = engine.calculate_fidelity_history(&evolution.states, &rho0)?;
//! ```
//!
//! # References
//!
//! - Lindblad, G. (1976). Commun. Math. Phys. 48, 119.
//! - Nielsen, M. A. & Chuang, I. L. (2010). "Quantum Computation and Quantum
//!   Information", §8.3.
//! - Breuer, H.-P. & Petruccione, F. (2002). "The Theory of Open Quantum Systems." Oxford.

pub mod correlation;
pub mod dissipator;
pub mod engine;
pub mod gates;
pub mod integrate;
pub mod kraus;
pub mod metrics;
pub mod types;

pub use correlation::{CorrelationMode, CorrelationModel};
pub use engine::{DecoherenceEngine, EngineInfo};
pub use gates::{parse_circuit, Gate};
pub use integrate::solve_lindblad;
pub use metrics::{expectation, purity, state_fidelity, trace_distance, von_neumann_entropy};
pub use types::{
    CollapseOperator, CorrectedEvolution, CorrectionOptions, Evolution, LindbladConfig,
    LindbladResult, NoiseParameters,
};
