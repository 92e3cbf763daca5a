//! Core types for GW injection
//!
//! Error taxonomy shared by every synthesis stage. Errors fall into two
//! families:
//!
//! - **Domain** errors: the requested configuration is mathematically
//!   undefined (singular correlation matrix, coincident pulsars under a
//!   rejecting policy, vanishing antenna denominator, a binary that merges
//!   inside the data span).
//! - **Configuration** errors: inconsistent shapes or non-positive
//!   parameters supplied by the caller.
//!
//! Both are raised at the point of detection. The computation is
//! deterministic, so none of them is retryable.

/// Result type for injection operations
pub type InjectResult<T> = Result<T, InjectError>;

/// Errors that can occur while synthesizing GW perturbations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InjectError {
    #[error("Correlation matrix is not positive semidefinite (pivot {pivot} at row {row})")]
    NotPositiveDefinite { row: usize, pivot: f64 },

    #[error("Pulsars {first} and {second} share a line of sight; overlap reduction is undefined")]
    CoincidentPulsars { first: usize, second: usize },

    #[error("Antenna response is unbounded: 1 + Ω·p = {denominator:e}")]
    DegenerateAntenna { denominator: f64 },

    #[error("Binary merges within the data span (1 - fac1·t = {remaining:e} at t = {time} s)")]
    BinaryMerged { time: f64, remaining: f64 },

    #[error("Pulsar-term phase cannot fix a distance for a pulsar on the source axis")]
    UndefinedPulsarPhase,

    #[error("No pulsars supplied")]
    NoPulsars,

    #[error("Pulsar {index} has no observation epochs")]
    EmptyEpochs { index: usize },

    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Frequency grid too coarse: {samples} samples after inverse FFT, need at least {required}")]
    GridTooCoarse { samples: usize, required: usize },

    #[error("Missing parameter '{0}'")]
    MissingParameter(String),
}

impl InjectError {
    /// Mathematically undefined or singular configuration
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            InjectError::NotPositiveDefinite { .. }
                | InjectError::CoincidentPulsars { .. }
                | InjectError::DegenerateAntenna { .. }
                | InjectError::BinaryMerged { .. }
                | InjectError::UndefinedPulsarPhase
        )
    }

    /// Inconsistent or out-of-range caller input
    pub fn is_configuration(&self) -> bool {
        !self.is_domain()
    }

    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        InjectError::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

/// Reject non-finite or non-positive values.
pub(crate) fn require_positive(name: &'static str, value: f64) -> InjectResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(InjectError::invalid(name, value, "must be finite and positive"))
    }
}

/// Reject NaN and infinities.
pub(crate) fn require_finite(name: &'static str, value: f64) -> InjectResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InjectError::invalid(name, value, "must be finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(InjectError::UndefinedPulsarPhase.is_domain());
        assert!(InjectError::BinaryMerged {
            time: 1.0,
            remaining: -0.5
        }
        .is_domain());
        assert!(InjectError::NoPulsars.is_configuration());
        assert!(InjectError::GridTooCoarse {
            samples: 10,
            required: 20
        }
        .is_configuration());
    }

    #[test]
    fn test_require_positive() {
        assert_eq!(require_positive("x", 2.0), Ok(2.0));
        assert!(require_positive("x", 0.0).is_err());
        assert!(require_positive("x", f64::NAN).is_err());
        assert!(require_finite("y", f64::INFINITY).is_err());
        assert_eq!(require_finite("y", -3.0), Ok(-3.0));
    }

    #[test]
    fn test_error_message() {
        let err = InjectError::LengthMismatch {
            what: "residuals",
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Length mismatch for residuals: expected 4, got 3"
        );
    }
}
