// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Normalizing one annotation.
//!
//! A raw annotation value is checked and rebuilt into a [`TypeDescriptor`].
//! The rules apply in order:
//!
//! 1. An unsubscripted container (`List`) is its base class.
//! 2. A bare `Union` is reported ("Needs options").
//! 3. A string constant is a forward reference. Without a scope it is
//!    [`Normalized::Late`]; with one it is evaluated and its single result
//!    normalized in turn. A string that is not a constant, or that
//!    evaluates to several values, is reported ("Must be constant").
//! 4. `None` stands for `NoneType`.
//! 5. A parameterized class normalizes every parameter.
//! 6. A union normalizes every option.
//! 7. Classes, `Any`/`nothing` and type parameters are kept as they are.
//! 8. Anything else is reported ("Not a type").
//!
//! In rules 5 and 6 the first parameter or option that does not resolve
//! decides the outcome for the whole annotation.
//!
//! A string may evaluate to another string (`X = 'X'`), so rule 3 nests at
//! most [`MAX_STRING_NESTING`] levels deep; past that the annotation is
//! reported and dropped.

use std::rc::Rc;

use tracing::debug;
use tyannot_core::types::Location;

use crate::lattice::{AbstractValue, Node, Scope, SpecialForm, TypeDescriptor};
use crate::resolver::AnnotationResolver;
use crate::vm::Interpreter;

/// How many string annotations may be evaluated inside one another.
pub const MAX_STRING_NESTING: usize = 16;

/// Outcome of normalizing one annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// The annotation resolved.
    Resolved(TypeDescriptor),
    /// The annotation is a forward reference; retry once globals are final.
    Late,
    /// The annotation is unusable. It has already been reported.
    Failed,
}

impl Normalized {
    /// The resolved descriptor, if any.
    pub fn resolved(self) -> Option<TypeDescriptor> {
        match self {
            Normalized::Resolved(t) => Some(t),
            Normalized::Late | Normalized::Failed => None,
        }
    }

    /// Whether the annotation was deferred.
    pub fn is_late(&self) -> bool {
        matches!(self, Normalized::Late)
    }
}

/// Why a nested annotation did not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unresolved {
    Late,
    Failed,
}

impl<I: Interpreter> AnnotationResolver<'_, I> {
    /// Normalize `annotation`, written for `name` at `location`.
    ///
    /// `scope` is the node and globals string annotations are evaluated in.
    /// Without it, string annotations are [`Normalized::Late`].
    pub fn process_one_annotation(
        &mut self,
        annotation: &AbstractValue,
        name: &str,
        location: &Location,
        scope: Option<(Node, &Scope)>,
    ) -> Normalized {
        match self.normalize(annotation, name, location, scope, 0) {
            Ok(t) => Normalized::Resolved(t),
            Err(Unresolved::Late) => Normalized::Late,
            Err(Unresolved::Failed) => Normalized::Failed,
        }
    }

    fn normalize(
        &mut self,
        annotation: &AbstractValue,
        name: &str,
        location: &Location,
        scope: Option<(Node, &Scope)>,
        depth: usize,
    ) -> Result<TypeDescriptor, Unresolved> {
        match annotation {
            AbstractValue::AnnotationContainer(cls) | AbstractValue::Class(cls) => {
                Ok(TypeDescriptor::Class(Rc::clone(cls)))
            }
            AbstractValue::SpecialForm(SpecialForm::Union) => {
                self.log
                    .invalid_annotation(location, annotation, Some("Needs options"), Some(name));
                Err(Unresolved::Failed)
            }
            AbstractValue::Instance(instance) if self.builtins.is_str_type(&instance.cls) => {
                self.normalize_string(annotation, name, location, scope, depth)
            }
            AbstractValue::Instance(instance) if self.builtins.is_none_type(&instance.cls) => {
                Ok(TypeDescriptor::Class(Rc::clone(&self.builtins.none_type)))
            }
            AbstractValue::Parameterized(generic) => generic
                .try_map_params(|param| self.normalize(param, name, location, scope, depth))
                .map(TypeDescriptor::Generic),
            AbstractValue::Union(union) => union
                .try_map_options(|option| self.normalize(option, name, location, scope, depth))
                .map(TypeDescriptor::Union),
            AbstractValue::Ambiguous(ambiguity) => Ok(TypeDescriptor::Ambiguous(*ambiguity)),
            AbstractValue::TypeParameter(param) => Ok(TypeDescriptor::TypeParameter(param.clone())),
            AbstractValue::SpecialForm(SpecialForm::Optional) | AbstractValue::Instance(_) => {
                self.log
                    .invalid_annotation(location, annotation, Some("Not a type"), Some(name));
                Err(Unresolved::Failed)
            }
        }
    }

    fn normalize_string(
        &mut self,
        annotation: &AbstractValue,
        name: &str,
        location: &Location,
        scope: Option<(Node, &Scope)>,
        depth: usize,
    ) -> Result<TypeDescriptor, Unresolved> {
        if let Some(text) = annotation.str_constant() {
            let Some((node, globals)) = scope else {
                debug!("deferring annotation {:?} for {}", text, name);
                return Err(Unresolved::Late);
            };
            if depth >= MAX_STRING_NESTING {
                self.log.invalid_annotation(
                    location,
                    annotation,
                    Some("Too many nested string annotations"),
                    Some(name),
                );
                return Err(Unresolved::Failed);
            }
            let var = match self.eval_expr(node, globals, text) {
                Ok(var) => var,
                Err(err) => {
                    self.log
                        .invalid_annotation(location, annotation, Some(&err.to_string()), None);
                    return Err(Unresolved::Failed);
                }
            };
            if let Ok(value) = var.atomic_value() {
                return self.normalize(value, name, location, scope, depth + 1);
            }
        }
        self.log
            .invalid_annotation(location, annotation, Some("Must be constant"), Some(name));
        Err(Unresolved::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{Ambiguity, ClassDef, Generic, GenericKind, TypeParameter, Union, Variable};
    use crate::test_helpers::{class_var, loc, Fixture};

    #[test]
    fn test_container_unwraps_to_base_class() {
        let mut fx = Fixture::new();
        let list = fx.builtins().lookup("List").unwrap();
        let list_type = Rc::clone(&fx.builtins().list_type);
        let mut resolver = fx.resolver();
        let result = resolver.process_one_annotation(&list, "x", &loc(1), None);
        assert_eq!(result, Normalized::Resolved(TypeDescriptor::Class(list_type)));
    }

    #[test]
    fn test_bare_union_needs_options() {
        let mut fx = Fixture::new();
        let union = fx.builtins().lookup("Union").unwrap();
        let mut resolver = fx.resolver();
        let result = resolver.process_one_annotation(&union, "x", &loc(2), None);
        assert_eq!(result, Normalized::Failed);
        assert_eq!(fx.log.len(), 1);
        assert_eq!(fx.log[0].message, "Invalid type annotation 'Union' for x");
        assert_eq!(fx.log[0].details.as_deref(), Some("Needs options"));
        assert_eq!(fx.log[0].location, loc(2));
    }

    #[test]
    fn test_forward_reference_is_late_without_scope() {
        let mut fx = Fixture::new();
        let foo = fx.builtins().str_constant("Foo");
        let mut resolver = fx.resolver();
        assert!(resolver
            .process_one_annotation(&foo, "x", &loc(1), None)
            .is_late());
        assert!(fx.log.is_empty());
    }

    #[test]
    fn test_forward_reference_resolves_with_scope() {
        let mut fx = Fixture::new();
        let foo_class = ClassDef::new("Foo");
        fx.globals.insert(
            "Foo",
            Variable::from_value(Node::ROOT, AbstractValue::Class(Rc::clone(&foo_class))),
        );
        let globals = fx.globals.clone();
        let foo = fx.builtins().str_constant("Foo");
        let mut resolver = fx.resolver();
        let result = resolver.process_one_annotation(&foo, "x", &loc(1), Some((Node::ROOT, &globals)));
        assert_eq!(result, Normalized::Resolved(TypeDescriptor::Class(foo_class)));
    }

    #[test]
    fn test_nested_forward_reference_inside_string() {
        let mut fx = Fixture::new();
        fx.globals.insert("Foo", class_var("Foo"));
        let globals = fx.globals.clone();
        let annotation = fx.builtins().str_constant("List['Foo']");
        let mut resolver = fx.resolver();
        let result = resolver
            .process_one_annotation(&annotation, "x", &loc(1), Some((Node::ROOT, &globals)))
            .resolved()
            .unwrap();
        assert_eq!(result.to_string(), "list[Foo]");
    }

    #[test]
    fn test_failed_string_evaluation_reports_details() {
        let mut fx = Fixture::new();
        let annotation = fx.builtins().str_constant("Missing");
        let mut resolver = fx.resolver();
        let result =
            resolver.process_one_annotation(&annotation, "x", &loc(7), Some((Node::ROOT, &Scope::new())));
        assert_eq!(result, Normalized::Failed);
        assert_eq!(fx.log.len(), 1);
        assert_eq!(fx.log[0].message, "Invalid type annotation ''Missing''");
        assert_eq!(
            fx.log[0].details.as_deref(),
            Some("Name 'Missing' is not defined")
        );
        assert_eq!(fx.log[0].location, loc(7));
    }

    #[test]
    fn test_string_with_several_values_must_be_constant() {
        let mut fx = Fixture::new();
        let mut either = class_var("A");
        either.extend(class_var("B"));
        fx.globals.insert("AorB", either);
        let globals = fx.globals.clone();
        let annotation = fx.builtins().str_constant("AorB");
        let mut resolver = fx.resolver();
        let result =
            resolver.process_one_annotation(&annotation, "y", &loc(1), Some((Node::ROOT, &globals)));
        assert_eq!(result, Normalized::Failed);
        assert_eq!(fx.log[0].details.as_deref(), Some("Must be constant"));
    }

    #[test]
    fn test_none_means_none_type() {
        let mut fx = Fixture::new();
        let none = fx.builtins().none();
        let none_type = Rc::clone(&fx.builtins().none_type);
        let mut resolver = fx.resolver();
        let result = resolver.process_one_annotation(&none, "return", &loc(1), None);
        assert_eq!(result, Normalized::Resolved(TypeDescriptor::Class(none_type)));
    }

    #[test]
    fn test_generic_with_late_parameter_is_late() {
        let mut fx = Fixture::new();
        let b = fx.builtins().clone();
        let generic = AbstractValue::Parameterized(Generic::new(
            Rc::clone(&b.list_type),
            GenericKind::Plain,
            vec![("T".to_string(), b.str_constant("Foo"))],
        ));
        let mut resolver = fx.resolver();
        assert!(resolver
            .process_one_annotation(&generic, "x", &loc(1), None)
            .is_late());
    }

    #[test]
    fn test_union_fails_on_first_bad_option() {
        let mut fx = Fixture::new();
        let b = fx.builtins().clone();
        let union = AbstractValue::Union(Union::new(vec![
            AbstractValue::Class(Rc::clone(&b.int_type)),
            b.int_constant(3),
            b.int_constant(4),
        ]));
        let mut resolver = fx.resolver();
        let result = resolver.process_one_annotation(&union, "x", &loc(1), None);
        assert_eq!(result, Normalized::Failed);
        assert_eq!(fx.log.len(), 1);
        assert_eq!(fx.log[0].message, "Invalid type annotation '3' for x");
        assert_eq!(fx.log[0].details.as_deref(), Some("Not a type"));
    }

    #[test]
    fn test_generic_fails_on_bad_parameter() {
        let mut fx = Fixture::new();
        let b = fx.builtins().clone();
        let generic = AbstractValue::Parameterized(Generic::new(
            Rc::clone(&b.dict_type),
            GenericKind::Plain,
            vec![
                ("K".to_string(), AbstractValue::Class(Rc::clone(&b.str_type))),
                ("V".to_string(), b.int_constant(3)),
            ],
        ));
        let mut resolver = fx.resolver();
        let result = resolver.process_one_annotation(&generic, "x", &loc(2), None);
        assert_eq!(result, Normalized::Failed);
        assert_eq!(fx.log.len(), 1);
        assert_eq!(fx.log[0].message, "Invalid type annotation '3' for x");
        assert_eq!(fx.log[0].details.as_deref(), Some("Not a type"));
    }

    #[test]
    fn test_bare_optional_is_not_a_type() {
        let mut fx = Fixture::new();
        let optional = fx.builtins().lookup("Optional").unwrap();
        let mut resolver = fx.resolver();
        let result = resolver.process_one_annotation(&optional, "x", &loc(3), None);
        assert_eq!(result, Normalized::Failed);
        assert_eq!(fx.log.len(), 1);
        assert_eq!(fx.log[0].message, "Invalid type annotation 'Optional' for x");
        assert_eq!(fx.log[0].details.as_deref(), Some("Not a type"));
    }

    #[test]
    fn test_self_referential_string_is_reported_once() {
        let mut fx = Fixture::new();
        let x = fx.builtins().str_constant("X");
        fx.globals
            .insert("X", Variable::from_value(Node::ROOT, x.clone()));
        let globals = fx.globals.clone();
        let mut resolver = fx.resolver();
        let result =
            resolver.process_one_annotation(&x, "return", &loc(2), Some((Node::ROOT, &globals)));
        assert_eq!(result, Normalized::Failed);
        assert_eq!(fx.log.len(), 1);
        assert_eq!(
            fx.log[0].details.as_deref(),
            Some("Too many nested string annotations")
        );
        assert_eq!(fx.log[0].location, loc(2));
    }

    #[test]
    fn test_strings_nest_up_to_the_limit() {
        let mut fx = Fixture::new();
        fx.globals.insert("Foo", class_var("Foo"));
        // S1 = 'Foo', S2 = 'S1', ... each one level deeper.
        let mut previous = "Foo".to_string();
        for level in 1..MAX_STRING_NESTING {
            let name = format!("S{}", level);
            let value = fx.builtins().str_constant(previous.clone());
            fx.globals.insert(name.clone(), Variable::from_value(Node::ROOT, value));
            previous = name;
        }
        let globals = fx.globals.clone();
        let annotation = fx.builtins().str_constant(previous);
        let mut resolver = fx.resolver();
        let result = resolver
            .process_one_annotation(&annotation, "x", &loc(1), Some((Node::ROOT, &globals)))
            .resolved()
            .unwrap();
        assert_eq!(result.to_string(), "Foo");
        assert!(fx.log.is_empty());
    }

    #[test]
    fn test_accepts_ambiguous_and_type_parameters() {
        let mut fx = Fixture::new();
        let mut resolver = fx.resolver();
        let t = TypeParameter::new("T");
        assert_eq!(
            resolver.process_one_annotation(
                &AbstractValue::TypeParameter(t.clone()),
                "x",
                &loc(1),
                None
            ),
            Normalized::Resolved(TypeDescriptor::TypeParameter(t))
        );
        assert_eq!(
            resolver
                .process_one_annotation(
                    &AbstractValue::Ambiguous(Ambiguity::Unsolvable),
                    "x",
                    &loc(1),
                    None
                )
                .resolved(),
            Some(TypeDescriptor::unsolvable())
        );
    }
}
