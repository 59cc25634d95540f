// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The interpreter contract annotation resolution is written against.
//!
//! Annotation expressions are evaluated by the same abstract interpreter
//! that analyzes the rest of the program. This module describes the part of
//! that interpreter the annotation core consumes: compiling a snippet of
//! source and running it at an analysis node against explicit global and
//! local scopes. [`ExprVm`](crate::evaluator::ExprVm) is the implementation
//! shipped with this crate.

use thiserror::Error;
use tyannot_core::errorlog::ErrorLog;
use tyannot_core::types::Location;

use crate::lattice::{Builtins, Node, Scope, Variable};

/// How source text is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileMode {
    /// A single expression whose value is the result.
    Eval,
    /// A sequence of statements.
    Exec,
}

/// Source text that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileError {
    /// Description of the failure.
    pub message: String,
}

impl CompileError {
    /// Create a compile error.
    pub fn new(message: impl Into<String>) -> Self {
        CompileError {
            message: message.into(),
        }
    }
}

/// Result of running compiled code.
#[derive(Debug, Clone)]
pub struct Execution {
    /// The node reached after execution.
    pub node: Node,
    /// The value the code produced.
    pub value: Variable,
}

/// The abstract interpreter, as seen by annotation resolution.
pub trait Interpreter {
    /// Compiled code.
    type Code;

    /// The builtin classes of the analyzed language.
    fn builtins(&self) -> &Builtins;

    /// Compile `source` in the given mode.
    fn compile(&self, source: &str, mode: CompileMode) -> Result<Self::Code, CompileError>;

    /// Run `code` at `node`. Names resolve through `locals`, then `globals`,
    /// then the builtins. Problems found while running are reported to `log`.
    fn run(
        &mut self,
        node: Node,
        code: &Self::Code,
        globals: &Scope,
        locals: &mut Scope,
        log: &mut ErrorLog,
    ) -> Execution;
}

/// The operation currently being executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
    /// File the operation's code object belongs to.
    pub filename: String,
    /// Source line of the operation.
    pub line: u32,
}

impl Opcode {
    /// Create an opcode position.
    pub fn new(filename: impl Into<String>, line: u32) -> Self {
        Opcode {
            filename: filename.into(),
            line,
        }
    }

    /// The location diagnostics about this operation are reported at.
    pub fn location(&self) -> Location {
        Location::new(self.filename.clone(), self.line)
    }
}

/// The slice of interpreter frame state an operation executes in.
#[derive(Debug, Clone, Copy)]
pub struct FrameState<'a> {
    /// The current node.
    pub node: Node,
    /// The frame's globals.
    pub globals: &'a Scope,
}
