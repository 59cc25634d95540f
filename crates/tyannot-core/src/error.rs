//! Error types and error code constants for tyannot.
//!
//! `TyannotError` is the single error type the CLI renders. Subsystem errors
//! (module description loading, expression compilation, value conversion)
//! are bridged into it with `From` impls in the crates that define them.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (file not found, malformed module description)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! Diagnostics about the analyzed program are *not* errors: they go to the
//! [`ErrorLog`](crate::errorlog::ErrorLog) and the run still succeeds.

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller.
    InvalidArguments = 2,
    /// The input could not be resolved or understood.
    ResolutionError = 3,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum TyannotError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// The module description is malformed or refers to unknown entities.
    #[error("invalid module: {message}")]
    InvalidModule { message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl From<&TyannotError> for OutputErrorCode {
    fn from(err: &TyannotError) -> Self {
        match err {
            TyannotError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            TyannotError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            TyannotError::InvalidModule { .. } => OutputErrorCode::ResolutionError,
            TyannotError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<TyannotError> for OutputErrorCode {
    fn from(err: TyannotError) -> Self {
        OutputErrorCode::from(&err)
    }
}

impl From<serde_json::Error> for TyannotError {
    fn from(err: serde_json::Error) -> Self {
        TyannotError::InvalidModule {
            message: format!("JSON error: {}", err),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl TyannotError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        TyannotError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an invalid module error.
    pub fn invalid_module(message: impl Into<String>) -> Self {
        TyannotError::InvalidModule {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        TyannotError::InternalError {
            message: message.into(),
        }
    }

    /// Map an IO error on `path` to the matching variant.
    pub fn from_io(path: impl Into<String>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            TyannotError::FileNotFound { path }
        } else {
            TyannotError::InternalError {
                message: format!("IO error on {}: {}", path, err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            OutputErrorCode::from(&TyannotError::invalid_args("x")).code(),
            2
        );
        assert_eq!(
            OutputErrorCode::from(&TyannotError::invalid_module("x")).code(),
            3
        );
        assert_eq!(OutputErrorCode::from(TyannotError::internal("x")).code(), 10);
    }

    #[test]
    fn test_from_io_not_found() {
        let err = TyannotError::from_io(
            "mod.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, TyannotError::FileNotFound { ref path } if path == "mod.json"));
        assert_eq!(err.to_string(), "file not found: mod.json");
    }

    #[test]
    fn test_json_errors_are_invalid_module() {
        let err: TyannotError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, TyannotError::InvalidModule { .. }));
    }
}
