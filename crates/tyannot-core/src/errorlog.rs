//! The diagnostics log.
//!
//! Diagnostics are appended in the order they are reported. The log supports
//! transactional use: [`ErrorLog::save`] returns a [`Checkpoint`] (the log
//! length at that moment), and [`ErrorLog::revert_to`] truncates the log back
//! to it. Only code that caused the entries after a checkpoint may revert
//! them.
//!
//! ## Example
//!
//! ```
//! use tyannot_core::errorlog::{ErrorKind, ErrorLog};
//! use tyannot_core::types::Location;
//!
//! let mut log = ErrorLog::new();
//! let checkpoint = log.save();
//! log.name_error(&Location::synthetic(), "Foo");
//! assert_eq!(log.since(&checkpoint).len(), 1);
//! log.revert_to(checkpoint);
//! assert!(log.is_empty());
//! ```

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Location;

// ============================================================================
// Diagnostic
// ============================================================================

/// The kind of a diagnostic. Serialized with its stable hyphenated name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// An annotation that is not a usable type.
    InvalidAnnotation,
    /// A type comment attached to a single operation failed to resolve.
    InvalidTypeComment,
    /// A function-level type comment failed to resolve.
    InvalidFunctionTypeComment,
    /// A name could not be resolved.
    NameError,
    /// Subscripting a value that does not take parameters.
    NotSubscriptable,
}

impl ErrorKind {
    /// The stable name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::InvalidAnnotation => "invalid-annotation",
            ErrorKind::InvalidTypeComment => "invalid-type-comment",
            ErrorKind::InvalidFunctionTypeComment => "invalid-function-type-comment",
            ErrorKind::NameError => "name-error",
            ErrorKind::NotSubscriptable => "not-subscriptable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single reported diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic kind.
    pub kind: ErrorKind,
    /// Where the diagnostic was reported.
    pub location: Location,
    /// One-line message.
    pub message: String,
    /// Additional detail, such as the messages of a failed evaluation.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.location, self.message, self.kind)?;
        if let Some(details) = &self.details {
            for line in details.lines() {
                write!(f, "\n  {}", line)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Error Log
// ============================================================================

/// A saved position in an [`ErrorLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Checkpoint(usize);

impl Checkpoint {
    /// The log length when the checkpoint was taken.
    pub fn position(&self) -> usize {
        self.0
    }
}

/// Append-only diagnostics log with checkpoint/revert.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    errors: Vec<Diagnostic>,
}

impl ErrorLog {
    /// Create an empty log.
    pub fn new() -> Self {
        ErrorLog { errors: Vec::new() }
    }

    /// Number of diagnostics in the log.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over the diagnostics in report order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.errors.iter()
    }

    /// Take a checkpoint of the current log length.
    pub fn save(&self) -> Checkpoint {
        Checkpoint(self.errors.len())
    }

    /// The diagnostics reported since `checkpoint`.
    pub fn since(&self, checkpoint: &Checkpoint) -> &[Diagnostic] {
        self.errors.get(checkpoint.0..).unwrap_or(&[])
    }

    /// Drop every diagnostic reported after `checkpoint`.
    pub fn revert_to(&mut self, checkpoint: Checkpoint) {
        if checkpoint.0 < self.errors.len() {
            debug!(
                "reverting {} diagnostic(s) to checkpoint {}",
                self.errors.len() - checkpoint.0,
                checkpoint.0
            );
            self.errors.truncate(checkpoint.0);
        }
    }

    /// Consume the log, returning its diagnostics.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.errors
    }

    /// Append a diagnostic.
    pub fn report(
        &mut self,
        kind: ErrorKind,
        location: &Location,
        message: impl Into<String>,
        details: Option<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            location: location.clone(),
            message: message.into(),
            details,
        };
        debug!("reported {}", diagnostic);
        self.errors.push(diagnostic);
    }

    /// Report an annotation that cannot be used as a type.
    ///
    /// `annotation` is the printed form of the offending value, `name` the
    /// parameter (or `return`) it annotates.
    pub fn invalid_annotation(
        &mut self,
        location: &Location,
        annotation: &dyn fmt::Display,
        details: Option<&str>,
        name: Option<&str>,
    ) {
        let message = match name {
            Some(name) => format!("Invalid type annotation '{}' for {}", annotation, name),
            None => format!("Invalid type annotation '{}'", annotation),
        };
        self.report(
            ErrorKind::InvalidAnnotation,
            location,
            message,
            details.map(str::to_string),
        );
    }

    /// Report a type comment on a single operation that failed to resolve.
    pub fn invalid_type_comment(&mut self, location: &Location, comment: &str, details: &str) {
        self.report(
            ErrorKind::InvalidTypeComment,
            location,
            format!("Invalid type comment: {}", comment),
            Some(details.to_string()),
        );
    }

    /// Report a function-level type comment that failed to resolve.
    pub fn invalid_function_type_comment(
        &mut self,
        location: &Location,
        comment: &str,
        details: Option<&str>,
    ) {
        self.report(
            ErrorKind::InvalidFunctionTypeComment,
            location,
            format!("Invalid function type comment: {}", comment),
            details.map(str::to_string),
        );
    }

    /// Report an unresolvable name.
    pub fn name_error(&mut self, location: &Location, name: &str) {
        self.report(
            ErrorKind::NameError,
            location,
            format!("Name '{}' is not defined", name),
            None,
        );
    }

    /// Report subscripting of a value that takes no parameters.
    pub fn not_subscriptable(&mut self, location: &Location, what: &dyn fmt::Display) {
        self.report(
            ErrorKind::NotSubscriptable,
            location,
            format!("'{}' is not subscriptable", what),
            None,
        );
    }
}

impl Index<usize> for ErrorLog {
    type Output = Diagnostic;

    fn index(&self, index: usize) -> &Diagnostic {
        &self.errors[index]
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::new("mod.py", 3)
    }

    #[test]
    fn test_save_and_revert_drops_only_later_entries() {
        let mut log = ErrorLog::new();
        log.name_error(&loc(), "A");
        let checkpoint = log.save();
        log.name_error(&loc(), "B");
        log.name_error(&loc(), "C");
        assert_eq!(log.since(&checkpoint).len(), 2);

        log.revert_to(checkpoint);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].message, "Name 'A' is not defined");
    }

    #[test]
    fn test_revert_to_later_checkpoint_is_noop() {
        let mut log = ErrorLog::new();
        let checkpoint = {
            let mut other = ErrorLog::new();
            other.name_error(&loc(), "X");
            other.name_error(&loc(), "Y");
            other.save()
        };
        log.name_error(&loc(), "A");
        log.revert_to(checkpoint);
        assert_eq!(log.len(), 1);
        assert!(log.since(&checkpoint).is_empty());
    }

    #[test]
    fn test_invalid_annotation_message() {
        let mut log = ErrorLog::new();
        log.invalid_annotation(&loc(), &"Union", Some("Needs options"), Some("x"));
        let diag = &log[0];
        assert_eq!(diag.kind, ErrorKind::InvalidAnnotation);
        assert_eq!(diag.message, "Invalid type annotation 'Union' for x");
        assert_eq!(diag.details.as_deref(), Some("Needs options"));
    }

    #[test]
    fn test_kind_serializes_with_stable_name() {
        let json = serde_json::to_string(&ErrorKind::InvalidFunctionTypeComment).unwrap();
        assert_eq!(json, "\"invalid-function-type-comment\"");
        assert_eq!(
            ErrorKind::InvalidFunctionTypeComment.name(),
            "invalid-function-type-comment"
        );
    }

    #[test]
    fn test_diagnostic_display_includes_details() {
        let mut log = ErrorLog::new();
        log.invalid_function_type_comment(&loc(), "(int) -> str", Some("Expected 2 args, 1 given"));
        let text = log[0].to_string();
        assert!(text.starts_with("mod.py:3: Invalid function type comment"));
        assert!(text.contains("Expected 2 args, 1 given"));
    }
}
