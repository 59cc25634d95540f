// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Annotation resolution settings.

use thiserror::Error;

/// Names treated as an implicit receiver (`self`, `cls`) when reconciling a
/// function type comment's argument list with the function's formals.
///
/// A signature comment on a method usually omits the receiver:
///
/// ```text
/// def f(self, x):
///     # type: (int) -> None
/// ```
///
/// When the comment has one fewer argument than the function and the first
/// formal is a receiver name, the receiver is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverPolicy {
    names: Vec<String>,
}

impl Default for ReceiverPolicy {
    fn default() -> Self {
        ReceiverPolicy::new(["self", "cls"])
    }
}

/// A function type comment whose argument count does not match the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Expected {expected} args, {given} given")]
pub struct ArityMismatch {
    /// Arguments the function takes (after receiver adjustment).
    pub expected: usize,
    /// Arguments the comment supplies.
    pub given: usize,
}

impl ReceiverPolicy {
    /// A policy recognizing the given receiver names.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        ReceiverPolicy {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// A policy that never skips a formal.
    pub fn none() -> Self {
        ReceiverPolicy { names: Vec::new() }
    }

    /// Whether `name` is a receiver name.
    pub fn is_receiver(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// The receiver names, in configuration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Match `given` comment arguments against the first `expected` formals.
    ///
    /// Returns the formals the comment's arguments bind to, in order.
    pub fn reconcile<'n>(
        &self,
        formals: &'n [String],
        expected: usize,
        given: usize,
    ) -> Result<&'n [String], ArityMismatch> {
        let mut names = &formals[..expected.min(formals.len())];
        let mut expected = expected;
        if expected != given {
            if let Some((first, rest)) = names.split_first() {
                if self.is_receiver(first) {
                    names = rest;
                    expected -= 1;
                }
            }
        }
        if expected != given {
            return Err(ArityMismatch { expected, given });
        }
        Ok(names)
    }
}

/// Settings for annotation resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationConfig {
    /// Implicit receiver handling for function type comments.
    pub receiver_policy: ReceiverPolicy,
}

impl AnnotationConfig {
    /// Settings with a specific receiver policy.
    pub fn with_receiver_policy(receiver_policy: ReceiverPolicy) -> Self {
        AnnotationConfig { receiver_policy }
    }
}
