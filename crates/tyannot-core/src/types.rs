//! Common types shared between the error log, error and output modules.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Location Type
// ============================================================================

/// Location of an analyzed operation.
///
/// `file` is absent for synthetic code, such as an annotation expression
/// compiled on the fly; such code always reports line 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Location {
    /// File path, if the operation belongs to a real file.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file: Option<String>,
    /// Line number (1-indexed).
    pub line: u32,
}

impl Location {
    /// Create a location in a real file.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Location {
            file: Some(file.into()),
            line,
        }
    }

    /// The location used for code that has no source file.
    pub fn synthetic() -> Self {
        Location {
            file: None,
            line: 1,
        }
    }

    /// Whether this location points into a real file.
    pub fn is_synthetic(&self) -> bool {
        self.file.is_none()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}", file, self.line),
            None => write!(f, "<synthetic>:{}", self.line),
        }
    }
}
