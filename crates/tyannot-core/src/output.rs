//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Status first:** every response has `status` as its first field
//! 2. **Deterministic:** same input, same output (field and array order)
//! 3. **Versioned:** the schema version is part of every response

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{OutputErrorCode, TyannotError};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

/// Error information for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
}

impl ErrorInfo {
    /// Create from a TyannotError.
    pub fn from_error(err: &TyannotError) -> Self {
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
        }
    }
}

/// Response emitted when a command fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a TyannotError.
    pub fn from_error(err: &TyannotError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}
