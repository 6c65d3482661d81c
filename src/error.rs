//! Error types for the fieldstat library.
//!
//! This module provides error handling using the `thiserror` crate, with
//! specific variants for design-generation parameters, data validation,
//! degenerate denominators, and analysis selection.
//!
//! All errors are deterministic input-validation failures raised at the point
//! of detection; there is no retry or partial-result behavior anywhere in the
//! crate.

use thiserror::Error;

/// The main error type for the fieldstat library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ============ Parameter Validation Errors ============
    /// Invalid design-generation or analysis parameters.
    #[error("invalid parameters: {message}")]
    InvalidParameters {
        /// Description of what is invalid.
        message: String,
    },

    // ============ Data Errors ============
    /// The dataset does not carry enough observations (or degrees of freedom)
    /// for the requested analysis.
    #[error("insufficient data: {message}")]
    InsufficientData {
        /// Description of what is missing.
        message: String,
    },

    /// A denominator in a derived statistic is zero or undefined.
    #[error("degenerate data: {message}")]
    DegenerateData {
        /// Description of the degenerate quantity.
        message: String,
    },

    // ============ Analysis Selection Errors ============
    /// The requested mean-comparison test is not recognized.
    #[error("unknown mean-comparison test '{name}' (expected lsd, tukey, or duncan)")]
    UnknownTest {
        /// The unrecognized test identifier.
        name: String,
    },

    /// Too few environments for a stability regression.
    #[error("insufficient sites for stability analysis: found {found}, need at least {required}")]
    InsufficientSites {
        /// The number of distinct sites present.
        found: usize,
        /// The minimum number of sites required.
        required: usize,
    },
}

/// A specialized `Result` type for fieldstat operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InvalidParameters` error.
    #[must_use]
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a new `InsufficientData` error.
    #[must_use]
    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::InsufficientData {
            message: message.into(),
        }
    }

    /// Create a new `DegenerateData` error.
    #[must_use]
    pub fn degenerate_data(message: impl Into<String>) -> Self {
        Self::DegenerateData {
            message: message.into(),
        }
    }

    /// Create a new `UnknownTest` error.
    #[must_use]
    pub fn unknown_test(name: impl Into<String>) -> Self {
        Self::UnknownTest { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_parameters("treatments must be at least 1");
        assert!(err.to_string().contains("invalid parameters"));
        assert!(err.to_string().contains("at least 1"));

        let err = Error::unknown_test("scheffe");
        assert!(err.to_string().contains("scheffe"));
        assert!(err.to_string().contains("duncan"));

        let err = Error::InsufficientSites {
            found: 2,
            required: 3,
        };
        assert!(err.to_string().contains("2"));
        assert!(err.to_string().contains("3"));
    }

    #[test]
    fn test_error_equality() {
        let err1 = Error::unknown_test("x");
        let err2 = Error::unknown_test("x");
        let err3 = Error::unknown_test("y");

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
