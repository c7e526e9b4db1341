//! Domain error types
//!
//! This module defines the error hierarchy for Ferry. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Ferry error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum FerryError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote platform errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Chunk codec errors (compression, record parsing)
    #[error("Codec error: {0}")]
    Codec(String),

    /// Duplicate record identifiers detected across chunk files
    #[error("Duplicate record ids for type {entity_type}: {ids:?}")]
    DuplicateIds {
        entity_type: String,
        ids: Vec<String>,
    },

    /// The user declined a destructive action; the whole run stops
    #[error("Run aborted: {0}")]
    Aborted(String),

    /// A poll deadline elapsed before all tracked jobs finished
    #[error("Batch job polling timed out after {waited_seconds}s")]
    PollTimeout { waited_seconds: u64 },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Remote platform-specific errors
///
/// Errors raised while talking to the remote data platform. These don't
/// expose the underlying HTTP client types.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Failed to reach the platform at all
    #[error("Failed to connect to platform: {0}")]
    ConnectionFailed(String),

    /// Retries were exhausted for a retryable failure
    #[error("{prefix}: giving up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        prefix: String,
        attempts: usize,
        last_error: String,
    },

    /// Response body could not be decoded in any supported shape
    #[error("Invalid response from platform: {0}")]
    InvalidResponse(String),

    /// Remote file or resource missing (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// File transfer failed
    #[error("File transfer failed: {0}")]
    TransferFailed(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for FerryError {
    fn from(err: std::io::Error) -> Self {
        FerryError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for FerryError {
    fn from(err: serde_json::Error) -> Self {
        FerryError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for FerryError {
    fn from(err: toml::de::Error) -> Self {
        FerryError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ferry_error_display() {
        let err = FerryError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_platform_error_conversion() {
        let platform_err = PlatformError::ConnectionFailed("Network error".to_string());
        let ferry_err: FerryError = platform_err.into();
        assert!(matches!(ferry_err, FerryError::Platform(_)));
    }

    #[test]
    fn test_retries_exhausted_carries_prefix() {
        let err = PlatformError::RetriesExhausted {
            prefix: "Unsuccessful kicking off export of type Order".to_string(),
            attempts: 4,
            last_error: "connection reset".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Unsuccessful kicking off export of type Order"));
        assert!(msg.contains("4 attempts"));
    }

    #[test]
    fn test_duplicate_ids_display_lists_offenders() {
        let err = FerryError::DuplicateIds {
            entity_type: "Order".into(),
            ids: vec!["42".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Order"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let ferry_err: FerryError = io_err.into();
        assert!(matches!(ferry_err, FerryError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let ferry_err: FerryError = json_err.into();
        assert!(matches!(ferry_err, FerryError::Serialization(_)));
    }

    #[test]
    fn test_ferry_error_implements_std_error() {
        let err = FerryError::Other("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
