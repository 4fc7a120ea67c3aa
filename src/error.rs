//! Error types for singleflight
//!
//! Centralized error handling using thiserror. Producer failures are never
//! wrapped in these variants: a coordinator hands the producer's own error type
//! back to every coalesced caller unchanged.

use thiserror::Error;

/// Errors raised by the tooling around a coordinator
#[derive(Debug, Error)]
pub enum FlightError {
    /// An option value is out of range
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

/// Result type alias for singleflight operations
pub type Result<T> = std::result::Result<T, FlightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_option_error() {
        let err = FlightError::InvalidOption("event_capacity must be at least 1".to_string());
        assert_eq!(err.to_string(), "Invalid option: event_capacity must be at least 1");
    }

    #[test]
    fn test_error_is_std_error() {
        let err: Box<dyn std::error::Error + Send + Sync> =
            Box::new(FlightError::InvalidOption("callers must be at least 1".to_string()));
        assert!(err.to_string().contains("callers"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(FlightError::InvalidOption("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
