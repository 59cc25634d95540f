// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Evaluating annotation text.
//!
//! Annotation text runs in a fresh, empty local scope chained only to the
//! supplied globals, never to the locals of the code being analyzed. Two
//! annotations mentioning the same undefined name therefore fail the same
//! way, independently of each other.
//!
//! Anything the interpreter reports while running the text carries a
//! synthetic location. [`AnnotationResolver::eval_expr`] takes those
//! diagnostics back out of the log and returns their messages as an
//! [`EvaluationError`]; the caller reports a single diagnostic at the real
//! position.

use tracing::trace;

use crate::error::{EvaluationError, TypeCommentError};
use crate::lattice::{AbstractValue, Node, Scope, Variable};
use crate::resolver::AnnotationResolver;
use crate::vm::{CompileError, CompileMode, Interpreter};

impl<I: Interpreter> AnnotationResolver<'_, I> {
    /// Evaluate `text` at `node`. Diagnostics go straight to the log.
    pub fn run_expr(
        &mut self,
        node: Node,
        globals: &Scope,
        text: &str,
    ) -> Result<Variable, CompileError> {
        let code = self.vm.compile(text, CompileMode::Eval)?;
        let mut locals = Scope::new();
        let execution = self.vm.run(node, &code, globals, &mut locals, self.log);
        Ok(execution.value)
    }

    /// Evaluate `text` at `node` with diagnostic isolation.
    ///
    /// If evaluation reports anything, the reports are removed from the log
    /// and returned, newline-joined, as [`EvaluationError::Diagnostics`].
    pub fn eval_expr(
        &mut self,
        node: Node,
        globals: &Scope,
        text: &str,
    ) -> Result<Variable, EvaluationError> {
        let checkpoint = self.log.save();
        let value = self.run_expr(node, globals, text)?;

        let reported = self.log.since(&checkpoint);
        if reported.is_empty() {
            trace!("evaluated {:?} to {}", text, value);
            return Ok(value);
        }
        let messages = reported
            .iter()
            .map(|diagnostic| diagnostic.message.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.log.revert_to(checkpoint);
        Err(EvaluationError::Diagnostics { messages })
    }

    /// Evaluate `text` and expand a tuple result into its elements.
    ///
    /// Empty text is the empty sequence and is not evaluated. A result that
    /// is not a tuple constant is a one-element sequence. The result and
    /// every tuple element must be a single value.
    pub fn eval_expr_as_tuple(
        &mut self,
        node: Node,
        globals: &Scope,
        text: &str,
    ) -> Result<Vec<AbstractValue>, TypeCommentError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let var = self.eval_expr(node, globals, text)?;
        let result = var.atomic_value()?;
        match result.tuple_constant() {
            Some(items) => Ok(items
                .iter()
                .map(|item| item.atomic_value().cloned())
                .collect::<Result<_, _>>()?),
            None => Ok(vec![result.clone()]),
        }
    }
}
