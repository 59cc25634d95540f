// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Shared fixtures for resolver tests.
//!
//! A [`Fixture`] owns everything an [`AnnotationResolver`] borrows, so a
//! test can build a resolver, drive it, drop it and then inspect the log:
//!
//! ```ignore
//! let mut fx = Fixture::new();
//! let mut resolver = fx.resolver();
//! resolver.eval_late_annotations(Node::ROOT, &mut f, &Scope::new());
//! assert_eq!(fx.log.len(), 1);
//! ```

use tyannot_core::errorlog::ErrorLog;
use tyannot_core::types::Location;

use crate::config::AnnotationConfig;
use crate::evaluator::ExprVm;
use crate::lattice::{AbstractValue, Builtins, ClassDef, Node, Scope, Variable};
use crate::resolver::AnnotationResolver;
use crate::signature::{Function, FunctionCode};

/// Interpreter, log, settings and globals for one test.
pub struct Fixture {
    pub vm: ExprVm,
    pub log: ErrorLog,
    pub config: AnnotationConfig,
    pub globals: Scope,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// A fixture with default settings and empty globals.
    pub fn new() -> Self {
        Fixture {
            vm: ExprVm::new(),
            log: ErrorLog::new(),
            config: AnnotationConfig::default(),
            globals: Scope::new(),
        }
    }

    /// The interpreter's builtins.
    pub fn builtins(&self) -> &Builtins {
        crate::vm::Interpreter::builtins(&self.vm)
    }

    /// A resolver over this fixture.
    pub fn resolver(&mut self) -> AnnotationResolver<'_, ExprVm> {
        AnnotationResolver::new(&mut self.vm, &mut self.log, &self.config)
    }
}

/// A location in `mod.py`.
pub fn loc(line: u32) -> Location {
    Location::new("mod.py", line)
}

/// A variable holding a fresh class named `name`.
pub fn class_var(name: &str) -> Variable {
    Variable::from_value(Node::ROOT, AbstractValue::Class(ClassDef::new(name)))
}

/// A function in `mod.py` whose formals are exactly `params`.
pub fn function(name: &str, params: &[&str]) -> Function {
    Function::new(FunctionCode {
        name: name.to_string(),
        filename: "mod.py".to_string(),
        first_line: 1,
        argcount: params.len(),
        varnames: params.iter().map(|p| p.to_string()).collect(),
        ..FunctionCode::default()
    })
}

/// An annotation payload: each value, then the tuple of names.
pub fn annotation_payload(builtins: &Builtins, entries: Vec<(&str, Variable)>) -> Vec<Variable> {
    let mut payload = Vec::with_capacity(entries.len() + 1);
    let mut names = Vec::with_capacity(entries.len());
    for (name, value) in entries {
        names.push(Variable::from_value(Node::ROOT, builtins.str_constant(name)));
        payload.push(value);
    }
    payload.push(Variable::from_value(
        Node::ROOT,
        builtins.tuple_constant(names),
    ));
    payload
}
