// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Type comments on single operations.
//!
//! ```text
//! x = []  # type: List[int]
//! ```
//!
//! When the interpreter executes an operation on a line that carries a type
//! comment, the comment's type replaces the value the operation computed.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::TypeCommentError;
use crate::lattice::Variable;
use crate::resolver::AnnotationResolver;
use crate::vm::{FrameState, Interpreter, Opcode};

/// A line carrying a type comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCommentLine {
    /// The code on the line; empty when the comment stands alone.
    pub code: String,
    /// The comment text after `type:`.
    pub comment: String,
}

/// The type comments of one file, by line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeComments {
    filename: String,
    by_line: BTreeMap<u32, TypeCommentLine>,
}

impl TypeComments {
    /// An empty table for `filename`.
    pub fn new(filename: impl Into<String>) -> Self {
        TypeComments {
            filename: filename.into(),
            by_line: BTreeMap::new(),
        }
    }

    /// The file the comments belong to.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Record the comment on `line`.
    pub fn insert(&mut self, line: u32, code: impl Into<String>, comment: impl Into<String>) {
        self.by_line.insert(
            line,
            TypeCommentLine {
                code: code.into(),
                comment: comment.into(),
            },
        );
    }

    /// The comment on `line`.
    pub fn get(&self, line: u32) -> Option<&TypeCommentLine> {
        self.by_line.get(&line)
    }

    /// Number of commented lines.
    pub fn len(&self) -> usize {
        self.by_line.len()
    }

    /// Whether no line has a comment.
    pub fn is_empty(&self) -> bool {
        self.by_line.is_empty()
    }
}

impl<I: Interpreter> AnnotationResolver<'_, I> {
    /// Apply the type comment on `op`'s line, if any, to `value`.
    ///
    /// Operations from other files are never affected. A comment that fails
    /// to resolve is reported and `value` is kept.
    pub fn apply_type_comment(
        &mut self,
        state: &FrameState<'_>,
        op: &Opcode,
        value: Variable,
        comments: &TypeComments,
    ) -> Variable {
        if op.filename != comments.filename() {
            return value;
        }
        let Some(line) = comments.get(op.line) else {
            return value;
        };
        if line.code.trim().is_empty() {
            return value;
        }
        match self.eval_type_comment(state, &line.comment) {
            Ok(commented) => {
                debug!("type comment at {} gives {}", op.location(), commented);
                commented
            }
            Err(err) => {
                self.log
                    .invalid_type_comment(&op.location(), &line.comment, &err.to_string());
                value
            }
        }
    }

    fn eval_type_comment(
        &mut self,
        state: &FrameState<'_>,
        comment: &str,
    ) -> Result<Variable, TypeCommentError> {
        let var = self.eval_expr(state.node, state.globals, comment)?;
        let value = var.atomic_value()?;
        value
            .instantiate(state.node, &self.builtins)
            .ok_or_else(|| TypeCommentError::NotAType {
                found: value.to_string(),
            })
    }
}
