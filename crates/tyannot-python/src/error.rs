// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for annotation resolution.
//!
//! None of these reach the user directly: resolution turns them into
//! diagnostics at the position of the annotation that failed. Only
//! [`ModuleError`] (a malformed module description) is bridged into
//! [`TyannotError`] for the CLI.

use thiserror::Error;
use tyannot_core::error::TyannotError;

use crate::config::ArityMismatch;
use crate::lattice::ConversionError;
use crate::vm::CompileError;

/// An annotation expression failed to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// The text did not compile.
    #[error("{0}")]
    Compile(#[from] CompileError),

    /// Evaluation reported diagnostics; their messages, newline-joined.
    #[error("{messages}")]
    Diagnostics { messages: String },
}

/// A type comment (or a function type comment's argument list) did not
/// resolve to types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeCommentError {
    /// The comment text failed to evaluate.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// The result was not a single value, or not a tuple of single values.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The result was a value, not a type.
    #[error("'{found}' is not a type")]
    NotAType { found: String },

    /// A function type comment's argument list does not fit the function.
    #[error(transparent)]
    Arity(#[from] ArityMismatch),
}

/// A module description that cannot be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// A definition refers to a function that was never defined.
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    /// An expression in the description does not compile.
    #[error("invalid expression in {context}: {source}")]
    InvalidExpression {
        context: String,
        #[source]
        source: CompileError,
    },

    /// A type variable bound did not resolve to a type.
    #[error("invalid bound for type variable '{name}': {reason}")]
    InvalidBound { name: String, reason: String },

    /// An annotation payload could not be read.
    #[error("malformed annotations for '{function}': {source}")]
    MalformedAnnotations {
        function: String,
        #[source]
        source: ConversionError,
    },
}

impl From<ModuleError> for TyannotError {
    fn from(err: ModuleError) -> Self {
        TyannotError::invalid_module(err.to_string())
    }
}
