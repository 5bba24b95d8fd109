// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dynamical decoupling: pulse placement, filter functions and the
//! frequency-domain decoherence integral.
//!
//! - [`PulseSequence`] and [`SequenceKind`] place π pulses
//! - [`filter_function`] and [`decoherence_integral`] score a sequence
//!   against a [`NoiseSpectrum`]
//! - [`NotchSolver`] searches for placements with filter zeros

pub mod filter;
pub mod notch;
pub mod sequence;

pub use filter::{
    coherence, compare_sequences, decoherence_function, decoherence_integral, filter_function,
    normalized_filter, FrequencyGrid, NoiseSpectrum, PowerLawSpectrum, SequenceComparison,
    Suppressed,
};
pub use notch::{solve_notch_sequence, NotchResult, NotchSolver};
pub use sequence::{PulseSequence, SequenceKind, DEFAULT_LOG_BETA};
