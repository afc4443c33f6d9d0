//! Error types for the pricing engine
//!
//! Invalid input is rejected before any calculation runs. Numeric edge cases
//! reachable from valid input (float scenarios, solver non-convergence) are
//! reported as flags on the result types and never surface here.

use thiserror::Error;

/// A loan configuration field violates its constraint
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{field} = {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be a whole number, got {value}")]
    NotWholeNumber { field: &'static str, value: f64 },

    #[error("installment frequency of {days} days is not supported (use 30 or 14)")]
    UnsupportedFrequency { days: u32 },

    #[error("{parameter} cannot be swept for the {metric} metric")]
    UnsupportedSweep {
        parameter: &'static str,
        metric: &'static str,
    },
}

impl ConfigurationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ConfigurationError::OutOfRange { field, .. }
            | ConfigurationError::NotFinite { field }
            | ConfigurationError::NotWholeNumber { field, .. } => field,
            ConfigurationError::UnsupportedFrequency { .. } => "installment_frequency_days",
            ConfigurationError::UnsupportedSweep { parameter, .. } => parameter,
        }
    }
}

/// Top-level error for library operations that touch files
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = PricingError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = ConfigurationError::OutOfRange {
            field: "installment_count",
            value: 1.0,
            min: 2.0,
            max: 12.0,
        };
        assert_eq!(
            err.to_string(),
            "installment_count = 1 is outside the allowed range [2, 12]"
        );
        assert_eq!(err.field(), "installment_count");
    }

    #[test]
    fn test_configuration_error_converts() {
        let err: PricingError = ConfigurationError::NotFinite { field: "principal" }.into();
        assert!(matches!(err, PricingError::Configuration(_)));
        assert!(err.to_string().contains("principal"));
    }
}
