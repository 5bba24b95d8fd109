// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ideal gate unitaries for circuit-level simulation.
//!
//! Two-qubit gates are assembled from control projectors, so any pair of
//! distinct qubits works:
//!
//!   CNOT(c, t) = |0⟩⟨0|_c ⊗ I + |1⟩⟨1|_c ⊗ X_t
//!   CZ(a, b)   = |0⟩⟨0|_a ⊗ I + |1⟩⟨1|_a ⊗ Z_b

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ValidationError};
use crate::linalg::{c, embed};

/// A gate acting on named qubits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    H(usize),
    X(usize),
    Y(usize),
    Z(usize),
    S(usize),
    /// Rotation about z by θ: diag(e^{−iθ/2}, e^{iθ/2}).
    Rz(usize, f64),
    /// Control, target.
    Cnot(usize, usize),
    Cz(usize, usize),
}

impl Gate {
    /// Qubits the gate touches.
    pub fn qubits(&self) -> Vec<usize> {
        match *self {
            Gate::H(q) | Gate::X(q) | Gate::Y(q) | Gate::Z(q) | Gate::S(q) | Gate::Rz(q, _) => {
                vec![q]
            }
            Gate::Cnot(a, b) | Gate::Cz(a, b) => vec![a, b],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Gate::H(_) => "h",
            Gate::X(_) => "x",
            Gate::Y(_) => "y",
            Gate::Z(_) => "z",
            Gate::S(_) => "s",
            Gate::Rz(..) => "rz",
            Gate::Cnot(..) => "cnot",
            Gate::Cz(..) => "cz",
        }
    }

    /// Full 2ⁿ × 2ⁿ unitary on an `n_qubits` register.
    ///
    /// # Errors
    ///
    /// A qubit index outside the register, or a two-qubit gate whose
    /// operands coincide.
    pub fn unitary(&self, n_qubits: usize) -> Result<Array2<Complex64>> {
        let qubits = self.qubits();
        if let Some(&q) = qubits.iter().find(|&&q| q >= n_qubits) {
            return Err(ValidationError::field(
                "gate",
                format!("{self}: qubit {q} outside a {n_qubits}-qubit register"),
            )
            .into());
        }
        if qubits.len() == 2 && qubits[0] == qubits[1] {
            return Err(
                ValidationError::field("gate", format!("{self}: operands must differ")).into(),
            );
        }

        let u = match *self {
            Gate::H(q) => embed(&[(q, &hadamard())], n_qubits),
            Gate::X(q) => embed(&[(q, &pauli_x())], n_qubits),
            Gate::Y(q) => embed(&[(q, &pauli_y())], n_qubits),
            Gate::Z(q) => embed(&[(q, &pauli_z())], n_qubits),
            Gate::S(q) => embed(&[(q, &phase_s())], n_qubits),
            Gate::Rz(q, theta) => embed(&[(q, &rz(theta))], n_qubits),
            Gate::Cnot(ctrl, tgt) => controlled(ctrl, tgt, &pauli_x(), n_qubits),
            Gate::Cz(a, b) => controlled(a, b, &pauli_z(), n_qubits),
        };
        Ok(u)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Gate::Rz(q, theta) => write!(f, "rz:{q}:{theta}"),
            Gate::Cnot(a, b) | Gate::Cz(a, b) => write!(f, "{}:{a}:{b}", self.name()),
            Gate::H(q) | Gate::X(q) | Gate::Y(q) | Gate::Z(q) | Gate::S(q) => {
                write!(f, "{}:{q}", self.name())
            }
        }
    }
}

/// Parses `h:0`, `rz:1:0.785`, `cnot:0:1`, and so on.
impl FromStr for Gate {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || Error::InvalidMode {
            parameter: "gate".into(),
            value: s.to_string(),
        };
        let parts: Vec<&str> = s.trim().split(':').map(str::trim).collect();
        let qubit = |i: usize| -> std::result::Result<usize, Error> {
            parts
                .get(i)
                .and_then(|p| p.parse().ok())
                .ok_or_else(invalid)
        };

        let name = parts.first().map(|p| p.to_ascii_lowercase()).unwrap_or_default();
        let gate = match (name.as_str(), parts.len()) {
            ("h", 2) => Gate::H(qubit(1)?),
            ("x", 2) => Gate::X(qubit(1)?),
            ("y", 2) => Gate::Y(qubit(1)?),
            ("z", 2) => Gate::Z(qubit(1)?),
            ("s", 2) => Gate::S(qubit(1)?),
            ("rz", 3) => {
                let theta: f64 = parts[2].parse().map_err(|_| invalid())?;
                Gate::Rz(qubit(1)?, theta)
            }
            ("cnot" | "cx", 3) => Gate::Cnot(qubit(1)?, qubit(2)?),
            ("cz", 3) => Gate::Cz(qubit(1)?, qubit(2)?),
            _ => return Err(invalid()),
        };
        Ok(gate)
    }
}

/// Parse a comma-separated gate list such as `h:0,cnot:0:1`.
pub fn parse_circuit(s: &str) -> Result<Vec<Gate>> {
    s.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::parse)
        .collect()
}

/// diag(e^{−iθ/2}, e^{iθ/2})
pub fn rz(theta: f64) -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 0]] = Complex64::from_polar(1.0, -theta / 2.0);
    m[[1, 1]] = Complex64::from_polar(1.0, theta / 2.0);
    m
}

/// `rz(theta)` on every qubit of the register.
pub fn rz_all(theta: f64, n_qubits: usize) -> Array2<Complex64> {
    let r = rz(theta);
    let ops: Vec<(usize, &Array2<Complex64>)> = (0..n_qubits).map(|q| (q, &r)).collect();
    embed(&ops, n_qubits)
}

fn controlled(
    ctrl: usize,
    target: usize,
    op: &Array2<Complex64>,
    n_qubits: usize,
) -> Array2<Complex64> {
    let mut p0 = Array2::zeros((2, 2));
    p0[[0, 0]] = c(1.0);
    let mut p1 = Array2::zeros((2, 2));
    p1[[1, 1]] = c(1.0);
    embed(&[(ctrl, &p0)], n_qubits) + embed(&[(ctrl, &p1), (target, op)], n_qubits)
}

fn hadamard() -> Array2<Complex64> {
    let h = std::f64::consts::FRAC_1_SQRT_2;
    let mut m = Array2::from_elem((2, 2), c(h));
    m[[1, 1]] = c(-h);
    m
}

fn pauli_x() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 1]] = c(1.0);
    m[[1, 0]] = c(1.0);
    m
}

fn pauli_y() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 1]] = Complex64::new(0.0, -1.0);
    m[[1, 0]] = Complex64::new(0.0, 1.0);
    m
}

fn pauli_z() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 0]] = c(1.0);
    m[[1, 1]] = c(-1.0);
    m
}

fn phase_s() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 0]] = c(1.0);
    m[[1, 1]] = Complex64::new(0.0, 1.0);
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{dagger, identity};
    use approx::assert_relative_eq;

    fn assert_unitary(u: &Array2<Complex64>) {
        let prod = u.dot(&dagger(u));
        let eye = identity(u.nrows());
        for (a, b) in prod.iter().zip(eye.iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-12);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_all_gates_unitary() {
        let gates = [
            Gate::H(0),
            Gate::X(1),
            Gate::Y(2),
            Gate::Z(0),
            Gate::S(1),
            Gate::Rz(2, 0.7),
            Gate::Cnot(0, 2),
            Gate::Cnot(2, 0),
            Gate::Cz(1, 2),
        ];
        for g in gates {
            let u = g.unitary(3).unwrap();
            assert_eq!(u.dim(), (8, 8));
            assert_unitary(&u);
        }
    }

    #[test]
    fn test_cnot_truth_table() {
        let u = Gate::Cnot(0, 1).unitary(2).unwrap();
        // |10⟩ → |11⟩, |11⟩ → |10⟩, |0x⟩ fixed
        assert_eq!(u[[0, 0]], c(1.0));
        assert_eq!(u[[1, 1]], c(1.0));
        assert_eq!(u[[3, 2]], c(1.0));
        assert_eq!(u[[2, 3]], c(1.0));
        assert_eq!(u[[2, 2]], c(0.0));
    }

    #[test]
    fn test_reversed_cnot() {
        let u = Gate::Cnot(1, 0).unitary(2).unwrap();
        // control is qubit 1 (LSB): |01⟩ ↔ |11⟩
        assert_eq!(u[[3, 1]], c(1.0));
        assert_eq!(u[[1, 3]], c(1.0));
        assert_eq!(u[[2, 2]], c(1.0));
    }

    #[test]
    fn test_cz_is_symmetric() {
        let a = Gate::Cz(0, 1).unitary(2).unwrap();
        let b = Gate::Cz(1, 0).unitary(2).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[[3, 3]], c(-1.0));
    }

    #[test]
    fn test_invalid_operands() {
        assert!(Gate::H(2).unitary(2).is_err());
        assert!(Gate::Cnot(1, 1).unitary(2).is_err());
    }

    #[test]
    fn test_rz_all_product() {
        let u = rz_all(0.4, 2);
        // |00⟩ picks up e^{−iθ}, |11⟩ e^{+iθ}, |01⟩ nothing
        assert_relative_eq!(u[[0, 0]].arg(), -0.4, epsilon = 1e-12);
        assert_relative_eq!(u[[3, 3]].arg(), 0.4, epsilon = 1e-12);
        assert_relative_eq!(u[[1, 1]].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parse_round_trip() {
        let gates = parse_circuit("h:0, cnot:0:1, rz:1:0.5,cz:1:0").unwrap();
        assert_eq!(
            gates,
            vec![Gate::H(0), Gate::Cnot(0, 1), Gate::Rz(1, 0.5), Gate::Cz(1, 0)]
        );
        assert_eq!(Gate::Cnot(0, 1).to_string(), "cnot:0:1");
        assert_eq!("cx:2:0".parse::<Gate>().unwrap(), Gate::Cnot(2, 0));
        assert!("t:0".parse::<Gate>().is_err());
        assert!("h:x".parse::<Gate>().is_err());
        assert!("cnot:0".parse::<Gate>().is_err());
    }
}
