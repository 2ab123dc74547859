//! Error types for SimLab configuration.

use thiserror::Error;

/// Errors raised while constructing agents, simulations or scenarios.
///
/// These are always reported before the first simulated day runs; nothing
/// inside a running simulation produces a `ConfigError`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A numeric parameter lies outside its allowed interval
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A rate or count that must be non-negative was negative
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: String, value: f64 },

    /// An enumeration value was not recognised
    #[error("unknown {field} '{value}' (expected one of: {expected})")]
    UnknownVariant {
        field: String,
        value: String,
        expected: String,
    },

    /// Structurally invalid configuration
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates an out-of-range error.
    pub fn out_of_range(field: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        }
    }

    /// Creates a negative-value error.
    pub fn negative(field: impl Into<String>, value: f64) -> Self {
        Self::Negative {
            field: field.into(),
            value,
        }
    }

    /// Creates an unknown-variant error.
    pub fn unknown_variant(field: impl Into<String>, value: impl Into<String>, expected: &[&str]) -> Self {
        Self::UnknownVariant {
            field: field.into(),
            value: value.into(),
            expected: expected.join(", "),
        }
    }

    /// Checks `value` lies in `[min, max]` (NaN is rejected).
    pub fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), Self> {
        if value >= min && value <= max {
            Ok(())
        } else {
            Err(Self::out_of_range(field, value, min, max))
        }
    }

    /// Checks `value` is a non-negative number (NaN is rejected).
    pub fn check_non_negative(field: &str, value: f64) -> Result<(), Self> {
        if value >= 0.0 {
            Ok(())
        } else {
            Err(Self::negative(field, value))
        }
    }
}
