// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! End-to-end properties of annotation resolution and substitution,
//! exercised through the public API only.

use std::collections::BTreeMap;
use std::rc::Rc;

use tyannot_core::errorlog::{ErrorKind, ErrorLog};
use tyannot_core::types::Location;
use tyannot_python::config::AnnotationConfig;
use tyannot_python::evaluator::ExprVm;
use tyannot_python::lattice::{
    AbstractValue, Builtins, ClassDef, ClassRef, Generic, GenericKind, Node, Scope,
    TypeDescriptor, TypeParameter, Variable,
};
use tyannot_python::normalize::Normalized;
use tyannot_python::resolver::AnnotationResolver;
use tyannot_python::signature::{Function, FunctionCode};
use tyannot_python::subst::{sub_annotations, substitute, SubstitutionMap};
use tyannot_python::vm::Interpreter;

fn at(line: u32) -> Location {
    Location::new("props.py", line)
}

fn instances(cls: &ClassRef) -> Variable {
    Variable::from_value(
        Node::ROOT,
        AbstractValue::instance(TypeDescriptor::Class(Rc::clone(cls))),
    )
}

fn map(entries: &[(&str, Variable)]) -> SubstitutionMap {
    entries
        .iter()
        .map(|(name, var)| (name.to_string(), var.clone()))
        .collect()
}

// ============================================================================
// Substitution
// ============================================================================

#[test]
fn substitution_without_maps_is_identity() {
    let b = Builtins::new();
    let t = TypeDescriptor::TypeParameter(TypeParameter::new("T"));
    let list_of_t = TypeDescriptor::Generic(Generic::new(
        Rc::clone(&b.list_type),
        GenericKind::Plain,
        vec![("T".to_string(), t.clone())],
    ));
    assert_eq!(substitute(Node::ROOT, &b, &t, &[]), t);
    assert_eq!(substitute(Node::ROOT, &b, &list_of_t, &[]), list_of_t);
}

#[test]
fn partial_coverage_falls_back_to_bound() {
    let b = Builtins::new();
    let a = ClassDef::new("A");
    let base = ClassDef::new("Base");
    let t = TypeDescriptor::TypeParameter(TypeParameter::with_bound(
        "T",
        TypeDescriptor::Class(Rc::clone(&base)),
    ));
    // The second call site binds U but not T.
    let maps = [
        map(&[("T", instances(&a))]),
        map(&[("U", instances(&b.int_type))]),
    ];
    let result = substitute(Node::ROOT, &b, &t, &maps);
    assert_eq!(result, TypeDescriptor::Class(base));
}

#[test]
fn unbounded_parameter_falls_back_to_any() {
    let b = Builtins::new();
    let a = ClassDef::new("A");
    let t = TypeDescriptor::TypeParameter(TypeParameter::new("T"));
    let maps = [
        map(&[("T", instances(&a))]),
        map(&[("U", instances(&a))]),
    ];
    assert_eq!(
        substitute(Node::ROOT, &b, &t, &maps),
        TypeDescriptor::unsolvable()
    );
}

#[test]
fn agreeing_maps_merge_to_one_class() {
    let b = Builtins::new();
    let a = ClassDef::new("A");
    let t = TypeDescriptor::TypeParameter(TypeParameter::new("T"));
    let maps = [map(&[("T", instances(&a))]), map(&[("T", instances(&a))])];
    assert_eq!(
        substitute(Node::ROOT, &b, &t, &maps),
        TypeDescriptor::Class(a)
    );
}

#[test]
fn generic_base_survives_substitution() {
    let b = Builtins::new();
    let dict = TypeDescriptor::Generic(Generic::new(
        Rc::clone(&b.dict_type),
        GenericKind::Plain,
        vec![
            (
                "K".to_string(),
                TypeDescriptor::TypeParameter(TypeParameter::new("T")),
            ),
            (
                "V".to_string(),
                TypeDescriptor::TypeParameter(TypeParameter::new("U")),
            ),
        ],
    ));
    let maps = [map(&[
        ("T", instances(&b.str_type)),
        ("U", instances(&b.int_type)),
    ])];
    let TypeDescriptor::Generic(result) = substitute(Node::ROOT, &b, &dict, &maps) else {
        panic!("expected a generic");
    };
    assert!(Rc::ptr_eq(&result.base, &b.dict_type));
    assert_eq!(result.kind, GenericKind::Plain);
    assert_eq!(
        result.param("K"),
        Some(&TypeDescriptor::Class(Rc::clone(&b.str_type)))
    );
    assert_eq!(
        result.param("V"),
        Some(&TypeDescriptor::Class(Rc::clone(&b.int_type)))
    );
}

#[test]
fn signature_substitution_touches_only_parameters() {
    let b = Builtins::new();
    let mut annotations = BTreeMap::new();
    annotations.insert(
        "x".to_string(),
        TypeDescriptor::TypeParameter(TypeParameter::new("T")),
    );
    annotations.insert(
        "y".to_string(),
        TypeDescriptor::Class(Rc::clone(&b.bytes_type)),
    );
    let maps = [map(&[("T", instances(&b.float_type))])];
    let result = sub_annotations(Node::ROOT, &b, &annotations, &maps);
    assert_eq!(result["x"].to_string(), "float");
    assert_eq!(result["y"].to_string(), "bytes");
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn forward_reference_waits_for_globals() {
    let mut vm = ExprVm::new();
    let mut log = ErrorLog::new();
    let config = AnnotationConfig::default();
    let foo = ClassDef::new("Foo");
    let mut globals = Scope::new();
    globals.insert(
        "Foo",
        Variable::from_value(Node::ROOT, AbstractValue::Class(Rc::clone(&foo))),
    );
    let text = vm.builtins().str_constant("Foo");

    let mut resolver = AnnotationResolver::new(&mut vm, &mut log, &config);
    let early = resolver.process_one_annotation(&text, "x", &at(3), None);
    assert_eq!(early, Normalized::Late);
    let late = resolver.process_one_annotation(&text, "x", &at(3), Some((Node::ROOT, &globals)));
    assert_eq!(late, Normalized::Resolved(TypeDescriptor::Class(foo)));
    assert!(log.is_empty());
}

#[test]
fn none_normalizes_to_none_type() {
    let mut vm = ExprVm::new();
    let mut log = ErrorLog::new();
    let config = AnnotationConfig::default();
    let none = vm.builtins().none();
    let none_type = Rc::clone(&vm.builtins().none_type);

    let mut resolver = AnnotationResolver::new(&mut vm, &mut log, &config);
    let result = resolver.process_one_annotation(&none, "return", &at(1), None);
    assert_eq!(result, Normalized::Resolved(TypeDescriptor::Class(none_type)));
}

#[test]
fn failed_evaluation_leaves_one_diagnostic() {
    let mut vm = ExprVm::new();
    let mut log = ErrorLog::new();
    let config = AnnotationConfig::default();
    log.report(ErrorKind::NameError, &at(1), "earlier", None);
    let text = vm.builtins().str_constant("Dict[A, B]");
    let before = log.len();

    let mut resolver = AnnotationResolver::new(&mut vm, &mut log, &config);
    let result =
        resolver.process_one_annotation(&text, "x", &at(7), Some((Node::ROOT, &Scope::new())));
    assert_eq!(result, Normalized::Failed);

    assert_eq!(log.len(), before + 1);
    assert_eq!(log[0].message, "earlier");
    let reported = &log[before];
    assert_eq!(reported.kind, ErrorKind::InvalidAnnotation);
    assert_eq!(reported.location, at(7));
    assert_eq!(
        reported.details.as_deref(),
        Some("Name 'A' is not defined\nName 'B' is not defined")
    );
}

#[test]
fn method_comment_arity_mismatch_commits_nothing() {
    let mut vm = ExprVm::new();
    let mut log = ErrorLog::new();
    let config = AnnotationConfig::default();
    let mut function = Function::new(FunctionCode {
        name: "method".to_string(),
        filename: "props.py".to_string(),
        first_line: 4,
        argcount: 3,
        varnames: vec!["self".to_string(), "x".to_string(), "y".to_string()],
        ..FunctionCode::default()
    });

    let mut resolver = AnnotationResolver::new(&mut vm, &mut log, &config);
    resolver.attach_function_type_comment(
        &mut function,
        "(int, str, float, bytes) -> None",
        &at(4),
    );
    resolver.eval_late_annotations(Node::ROOT, &mut function, &Scope::new());

    // Only the return annotation resolves; no parameter is annotated.
    assert_eq!(function.signature.annotations().len(), 1);
    assert!(function.signature.has_return_annotation());
    assert!(function.signature.late_annotations().is_empty());
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].kind, ErrorKind::InvalidFunctionTypeComment);
    assert_eq!(log[0].details.as_deref(), Some("Expected 2 args, 4 given"));
}

#[test]
fn method_comment_skips_receiver() {
    let mut vm = ExprVm::new();
    let mut log = ErrorLog::new();
    let config = AnnotationConfig::default();
    let mut function = Function::new(FunctionCode {
        name: "method".to_string(),
        filename: "props.py".to_string(),
        first_line: 4,
        argcount: 3,
        varnames: vec!["self".to_string(), "x".to_string(), "y".to_string()],
        ..FunctionCode::default()
    });

    let mut resolver = AnnotationResolver::new(&mut vm, &mut log, &config);
    resolver.attach_function_type_comment(&mut function, "(int, str) -> None", &at(4));
    resolver.eval_late_annotations(Node::ROOT, &mut function, &Scope::new());

    let annotations = function.signature.annotations();
    assert!(!annotations.contains_key("self"));
    assert_eq!(annotations["x"].to_string(), "int");
    assert_eq!(annotations["y"].to_string(), "str");
    assert_eq!(annotations["return"].to_string(), "NoneType");
    assert!(log.is_empty());
}
