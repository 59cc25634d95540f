// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The annotation resolver.
//!
//! [`AnnotationResolver`] ties together the interpreter, the diagnostics log
//! and the resolution settings. Its operations live next to the concern they
//! implement:
//!
//! - [`crate::sandbox`]: evaluating annotation text with diagnostic isolation
//! - [`crate::normalize`]: turning one raw annotation into a descriptor
//! - [`crate::collect`]: splitting a function's annotations into immediate
//!   and late ones
//! - [`crate::late`]: resolving late annotations once globals are final
//! - [`crate::type_comment`]: per-operation type comment overrides
//!
//! ## Example
//!
//! ```
//! use tyannot_core::errorlog::ErrorLog;
//! use tyannot_python::config::AnnotationConfig;
//! use tyannot_python::evaluator::ExprVm;
//! use tyannot_python::lattice::{Node, Scope};
//! use tyannot_python::resolver::AnnotationResolver;
//!
//! let mut vm = ExprVm::new();
//! let mut log = ErrorLog::new();
//! let config = AnnotationConfig::default();
//! let mut resolver = AnnotationResolver::new(&mut vm, &mut log, &config);
//!
//! let value = resolver.eval_expr(Node::ROOT, &Scope::new(), "List[int]").unwrap();
//! assert_eq!(value.to_string(), "list[int]");
//! ```

use crate::config::AnnotationConfig;
use crate::lattice::Builtins;
use crate::vm::Interpreter;
use tyannot_core::errorlog::ErrorLog;

/// Resolves annotations against an interpreter, reporting to a log.
pub struct AnnotationResolver<'a, I: Interpreter> {
    pub(crate) vm: &'a mut I,
    pub(crate) log: &'a mut ErrorLog,
    pub(crate) config: &'a AnnotationConfig,
    pub(crate) builtins: Builtins,
}

impl<'a, I: Interpreter> AnnotationResolver<'a, I> {
    /// Create a resolver.
    pub fn new(vm: &'a mut I, log: &'a mut ErrorLog, config: &'a AnnotationConfig) -> Self {
        let builtins = vm.builtins().clone();
        AnnotationResolver {
            vm,
            log,
            config,
            builtins,
        }
    }

    /// The interpreter's builtins.
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// The diagnostics reported so far.
    pub fn log(&self) -> &ErrorLog {
        self.log
    }

    /// The resolution settings.
    pub fn config(&self) -> &AnnotationConfig {
        self.config
    }
}
