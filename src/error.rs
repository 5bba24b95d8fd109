// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the simulator.
//!
//! Physically degenerate inputs (zero time steps, zero rates, out-of-range
//! probabilities) never produce an error: they are clamped or treated as the
//! identity map. Errors are reserved for malformed requests.

use std::fmt;

/// Result type alias for simulator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Simulator error types.
#[derive(Debug)]
pub enum Error {
    /// Configuration error
    Config(String),
    /// Validation error
    Validation(ValidationError),
    /// Unknown enumerated mode string
    InvalidMode { parameter: String, value: String },
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::InvalidMode { parameter, value } => {
                write!(f, "Invalid {}: '{}'", parameter, value)
            }
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Validation errors.
#[derive(Debug)]
pub enum ValidationError {
    /// Field validation failed
    Field { field: String, message: String },
    /// Physics constraint violated
    PhysicsConstraint(String),
    /// Matrix dimension mismatch
    Dimension { expected: usize, actual: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Field { field, message } => {
                write!(f, "Field '{}': {}", field, message)
            }
            ValidationError::PhysicsConstraint(msg) => {
                write!(f, "Physics constraint violated: {}", msg)
            }
            ValidationError::Dimension { expected, actual } => {
                write!(
                    f,
                    "Dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Shorthand for a [`ValidationError::Field`].
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ValidationError::Field {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
