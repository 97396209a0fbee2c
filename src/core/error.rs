//! Error types shared by the simulation core.

use std::io;

use thiserror::Error;

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
    /// Array shapes or lengths that do not line up (mismatched neuron counts etc).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A scalar parameter outside its valid domain (e.g. `dt <= 0`).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("dataset I/O: {0}")]
    Io(#[from] io::Error),

    #[error("metadata encoding: {0}")]
    Meta(#[from] serde_json::Error),
}

/// Reject non-finite or non-positive values.
pub(crate) fn require_positive(name: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter(format!(
            "{name} must be finite and > 0 (got {value})"
        )))
    }
}

pub(crate) fn require_non_negative(name: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter(format!(
            "{name} must be finite and >= 0 (got {value})"
        )))
    }
}

pub(crate) fn require_finite(name: &str, value: f64) -> SimResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidParameter(format!(
            "{name} must be finite (got {value})"
        )))
    }
}

pub(crate) fn require_unit_interval(name: &str, value: f64) -> SimResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidParameter(format!(
            "{name} must lie in [0, 1] (got {value})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_checks() {
        assert!(require_positive("dt", 0.01).is_ok());
        assert!(require_positive("dt", 0.0).is_err());
        assert!(require_positive("dt", f64::NAN).is_err());
        assert!(require_non_negative("sigma", 0.0).is_ok());
        assert!(require_non_negative("sigma", -1e-9).is_err());
        assert!(require_finite("mu", f64::INFINITY).is_err());
        assert!(require_unit_interval("p_reject", 1.0).is_ok());
        assert!(require_unit_interval("p_reject", 1.5).is_err());
        assert!(require_unit_interval("p_reject", f64::NAN).is_err());
    }

    #[test]
    fn messages_name_the_parameter() {
        let err = require_positive("track_length", -1.0).unwrap_err();
        assert!(err.to_string().contains("track_length"));
    }
}
