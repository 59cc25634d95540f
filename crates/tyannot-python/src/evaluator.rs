// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Reference interpreter for annotation expressions.
//!
//! `ExprVm` implements [`Interpreter`] for the expression slice parsed by
//! [`crate::expr`]. It evaluates names, literals, tuples and subscripts over
//! the lattice:
//!
//! - names resolve through locals, globals, then builtins; `typing.X`
//!   resolves `X` in the builtins; unknown names report `name-error` and
//!   evaluate to `Any`
//! - subscripting a container or a generic class binds its declared type
//!   parameters; `Tuple[...]` builds a tuple-shaped generic keyed by position
//! - `Union[...]` flattens nested unions, `Optional[X]` is `Union[X, NoneType]`
//!
//! Everything reported while running is tied to the synthetic location: the
//! evaluator does not know where inside the file the expression came from.

use std::rc::Rc;

use tyannot_core::errorlog::ErrorLog;
use tyannot_core::types::Location;

use crate::expr::{parse_expr, Expr};
use crate::lattice::{
    AbstractValue, Ambiguity, Builtins, ClassRef, Generic, GenericKind, Node, Scope, SpecialForm,
    Union, Variable,
};
use crate::vm::{CompileError, CompileMode, Execution, Interpreter};

/// A compiled annotation expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExpr {
    /// The source text.
    pub source: String,
    /// The parsed expression.
    pub expr: Expr,
}

/// Interpreter for annotation expressions.
#[derive(Debug, Clone, Default)]
pub struct ExprVm {
    builtins: Builtins,
}

impl ExprVm {
    /// Create an evaluator with fresh builtins.
    pub fn new() -> Self {
        ExprVm {
            builtins: Builtins::new(),
        }
    }

    /// Create an evaluator sharing existing builtins.
    pub fn with_builtins(builtins: Builtins) -> Self {
        ExprVm { builtins }
    }
}

impl Interpreter for ExprVm {
    type Code = CompiledExpr;

    fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    fn compile(&self, source: &str, mode: CompileMode) -> Result<CompiledExpr, CompileError> {
        match mode {
            CompileMode::Eval => Ok(CompiledExpr {
                source: source.to_string(),
                expr: parse_expr(source)?,
            }),
            CompileMode::Exec => Err(CompileError::new(
                "only single expressions can be compiled",
            )),
        }
    }

    fn run(
        &mut self,
        node: Node,
        code: &CompiledExpr,
        globals: &Scope,
        locals: &mut Scope,
        log: &mut ErrorLog,
    ) -> Execution {
        let mut frame = Frame {
            builtins: &self.builtins,
            node,
            globals,
            locals,
            log,
            location: Location::synthetic(),
        };
        let value = frame.eval(&code.expr);
        Execution { node, value }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

struct Frame<'a> {
    builtins: &'a Builtins,
    node: Node,
    globals: &'a Scope,
    locals: &'a Scope,
    log: &'a mut ErrorLog,
    location: Location,
}

impl Frame<'_> {
    fn eval(&mut self, expr: &Expr) -> Variable {
        match expr {
            Expr::Name(name) => self.load_name(name),
            Expr::Str(s) => Variable::from_value(self.node, self.builtins.str_constant(s.clone())),
            Expr::Int(i) => Variable::from_value(self.node, self.builtins.int_constant(*i)),
            Expr::Tuple(items) => {
                let items = items.iter().map(|item| self.eval(item)).collect();
                Variable::from_value(self.node, self.builtins.tuple_constant(items))
            }
            Expr::Subscript { value, index } => {
                let base = self.eval(value);
                let args: Vec<AbstractValue> = match index.as_ref() {
                    Expr::Tuple(items) => items.iter().map(|item| self.eval_single(item)).collect(),
                    other => vec![self.eval_single(other)],
                };
                let mut result = Variable::new();
                for data in base.data() {
                    let value = self.subscript(data, &args);
                    result.add_binding(self.node, value);
                }
                result
            }
        }
    }

    /// Evaluate to one value; several possibilities become a union.
    fn eval_single(&mut self, expr: &Expr) -> AbstractValue {
        let var = self.eval(expr);
        match var.len() {
            0 => AbstractValue::Ambiguous(Ambiguity::Empty),
            1 => var.data().next().cloned().unwrap_or(AbstractValue::Ambiguous(Ambiguity::Empty)),
            _ => AbstractValue::Union(Union::new(var.data().cloned().collect())),
        }
    }

    fn load_name(&mut self, name: &str) -> Variable {
        if let Some(var) = self.locals.get(name).or_else(|| self.globals.get(name)) {
            return var.clone();
        }
        let builtin = match name.split_once('.') {
            Some(("typing", attr)) => self.builtins.lookup(attr),
            Some(_) => None,
            None => self.builtins.lookup(name),
        };
        match builtin {
            Some(value) => Variable::from_value(self.node, value),
            None => {
                self.log.name_error(&self.location, name);
                Variable::from_value(self.node, AbstractValue::Ambiguous(Ambiguity::Unsolvable))
            }
        }
    }

    fn subscript(&mut self, base: &AbstractValue, args: &[AbstractValue]) -> AbstractValue {
        match base {
            AbstractValue::AnnotationContainer(cls) => self.parameterize(cls, args),
            AbstractValue::Class(cls) if cls.is_generic() => self.parameterize(cls, args),
            AbstractValue::SpecialForm(SpecialForm::Union) => {
                let mut options = Vec::new();
                for arg in args {
                    flatten_into(&mut options, arg);
                }
                AbstractValue::Union(Union::new(options))
            }
            AbstractValue::SpecialForm(SpecialForm::Optional) => match args {
                [arg] => {
                    let mut options = Vec::new();
                    flatten_into(&mut options, arg);
                    flatten_into(
                        &mut options,
                        &AbstractValue::Class(Rc::clone(&self.builtins.none_type)),
                    );
                    AbstractValue::Union(Union::new(options))
                }
                _ => {
                    self.log.invalid_annotation(
                        &self.location,
                        base,
                        Some("Optional takes exactly one parameter"),
                        None,
                    );
                    AbstractValue::Ambiguous(Ambiguity::Unsolvable)
                }
            },
            AbstractValue::Ambiguous(ambiguity) => AbstractValue::Ambiguous(*ambiguity),
            other => {
                self.log.not_subscriptable(&self.location, other);
                AbstractValue::Ambiguous(Ambiguity::Unsolvable)
            }
        }
    }

    fn parameterize(&mut self, cls: &ClassRef, args: &[AbstractValue]) -> AbstractValue {
        if Rc::ptr_eq(cls, &self.builtins.tuple_type) {
            let params = args
                .iter()
                .enumerate()
                .map(|(i, arg)| (i.to_string(), arg.clone()))
                .collect();
            return AbstractValue::Parameterized(Generic::new(
                Rc::clone(cls),
                GenericKind::Tuple,
                params,
            ));
        }
        if args.len() != cls.template.len() {
            let details = format!(
                "Expected {} parameter(s), got {}",
                cls.template.len(),
                args.len()
            );
            self.log
                .invalid_annotation(&self.location, &cls.name, Some(&details), None);
            return AbstractValue::Ambiguous(Ambiguity::Unsolvable);
        }
        let params = cls
            .template_names()
            .map(str::to_string)
            .zip(args.iter().cloned())
            .collect();
        AbstractValue::Parameterized(Generic::new(Rc::clone(cls), GenericKind::Plain, params))
    }
}

fn flatten_into(options: &mut Vec<AbstractValue>, value: &AbstractValue) {
    match value {
        AbstractValue::Union(union) => {
            for option in &union.options {
                flatten_into(options, option);
            }
        }
        other => {
            if !options.contains(other) {
                options.push(other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::ClassDef;

    fn eval(vm: &mut ExprVm, globals: &Scope, log: &mut ErrorLog, source: &str) -> Variable {
        let code = vm.compile(source, CompileMode::Eval).unwrap();
        vm.run(Node::ROOT, &code, globals, &mut Scope::new(), log)
            .value
    }

    #[test]
    fn test_builtin_class_lookup() {
        let mut vm = ExprVm::new();
        let mut log = ErrorLog::new();
        let var = eval(&mut vm, &Scope::new(), &mut log, "int");
        assert_eq!(var.atomic_value().unwrap().to_string(), "int");
        assert!(log.is_empty());
    }

    #[test]
    fn test_unknown_name_reports_and_yields_any() {
        let mut vm = ExprVm::new();
        let mut log = ErrorLog::new();
        let var = eval(&mut vm, &Scope::new(), &mut log, "Missing");
        assert!(var.atomic_value().unwrap().is_ambiguous());
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].message, "Name 'Missing' is not defined");
        assert!(log[0].location.is_synthetic());
    }

    #[test]
    fn test_locals_shadow_globals() {
        let mut vm = ExprVm::new();
        let mut log = ErrorLog::new();
        let mut globals = Scope::new();
        globals.insert(
            "A",
            Variable::from_value(Node::ROOT, AbstractValue::Class(ClassDef::new("Global"))),
        );
        let mut locals = Scope::new();
        locals.insert(
            "A",
            Variable::from_value(Node::ROOT, AbstractValue::Class(ClassDef::new("Local"))),
        );
        let code = vm.compile("A", CompileMode::Eval).unwrap();
        let var = vm.run(Node::ROOT, &code, &globals, &mut locals, &mut log).value;
        assert_eq!(var.atomic_value().unwrap().to_string(), "Local");
    }

    #[test]
    fn test_subscript_container() {
        let mut vm = ExprVm::new();
        let mut log = ErrorLog::new();
        let var = eval(&mut vm, &Scope::new(), &mut log, "Dict[str, List[int]]");
        assert_eq!(var.atomic_value().unwrap().to_string(), "dict[str, list[int]]");
        match var.atomic_value().unwrap() {
            AbstractValue::Parameterized(generic) => {
                assert_eq!(generic.kind, GenericKind::Plain);
                assert!(generic.param("K").is_some());
                assert!(generic.param("V").is_some());
            }
            other => panic!("Expected Parameterized, got {:?}", other),
        }
    }

    #[test]
    fn test_subscript_tuple_is_positional() {
        let mut vm = ExprVm::new();
        let mut log = ErrorLog::new();
        let var = eval(&mut vm, &Scope::new(), &mut log, "Tuple[int, str]");
        match var.atomic_value().unwrap() {
            AbstractValue::Parameterized(generic) => {
                assert_eq!(generic.kind, GenericKind::Tuple);
                assert_eq!(generic.params[0].0, "0");
                assert_eq!(generic.params[1].0, "1");
            }
            other => panic!("Expected Parameterized, got {:?}", other),
        }
    }

    #[test]
    fn test_union_flattens_and_optional_adds_none() {
        let mut vm = ExprVm::new();
        let mut log = ErrorLog::new();
        let var = eval(&mut vm, &Scope::new(), &mut log, "Union[int, Union[str, int]]");
        assert_eq!(var.atomic_value().unwrap().to_string(), "Union[int, str]");
        let var = eval(&mut vm, &Scope::new(), &mut log, "Optional[int]");
        assert_eq!(var.atomic_value().unwrap().to_string(), "Union[int, NoneType]");
        assert!(log.is_empty());
    }

    #[test]
    fn test_wrong_parameter_count_reports() {
        let mut vm = ExprVm::new();
        let mut log = ErrorLog::new();
        let var = eval(&mut vm, &Scope::new(), &mut log, "List[int, str]");
        assert!(var.atomic_value().unwrap().is_ambiguous());
        assert_eq!(log.len(), 1);
        assert_eq!(
            log[0].details.as_deref(),
            Some("Expected 1 parameter(s), got 2")
        );
    }

    #[test]
    fn test_subscript_plain_class_reports() {
        let mut vm = ExprVm::new();
        let mut log = ErrorLog::new();
        eval(&mut vm, &Scope::new(), &mut log, "int[str]");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].message, "'int' is not subscriptable");
    }

    #[test]
    fn test_typing_prefix_and_constants() {
        let mut vm = ExprVm::new();
        let mut log = ErrorLog::new();
        let var = eval(&mut vm, &Scope::new(), &mut log, "typing.List");
        assert!(matches!(
            var.atomic_value().unwrap(),
            AbstractValue::AnnotationContainer(_)
        ));
        let var = eval(&mut vm, &Scope::new(), &mut log, "('A', 3)");
        assert_eq!(var.atomic_value().unwrap().to_string(), "('A', 3)");
    }

    #[test]
    fn test_exec_mode_is_rejected() {
        let vm = ExprVm::new();
        assert!(vm.compile("x = 1", CompileMode::Exec).is_err());
    }
}
