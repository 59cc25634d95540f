// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Analyzing a module description.
//!
//! A [`ModuleSpec`] describes a module as the ordered list of top-level
//! definitions the interpreter would execute. [`analyze_module`] walks them
//! in order, one analysis node per definition:
//!
//! - type variables and classes are bound in the module globals
//! - functions have their inline annotations evaluated and collected, and
//!   their type comment split into late annotations
//! - assignments evaluate their value and apply the type comment on their
//!   line
//!
//! Once the walk is over, the globals are final: every function's late
//! annotations are resolved, then the requested specializations are
//! computed.
//!
//! ```json
//! {
//!   "filename": "mod.py",
//!   "type_comments": { "7": "List[Foo]" },
//!   "definitions": [
//!     { "kind": "typevar", "name": "T" },
//!     { "kind": "function", "name": "first", "line": 2, "params": ["xs"],
//!       "annotations": { "xs": "List[T]", "return": "'Foo'" } },
//!     { "kind": "class", "name": "Foo" },
//!     { "kind": "assign", "target": "foos", "line": 7, "value": "None" },
//!     { "kind": "specialize", "function": "first", "maps": [ { "T": ["Foo"] } ] }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;
use tyannot_core::errorlog::{Diagnostic, ErrorLog};
use tyannot_core::output::SCHEMA_VERSION;
use tyannot_core::types::Location;

use crate::config::AnnotationConfig;
use crate::error::ModuleError;
use crate::lattice::{
    merge_classes, AbstractValue, Builtins, ClassDef, Node, Scope, TypeDescriptor, TypeParameter,
    Variable,
};
use crate::resolver::AnnotationResolver;
use crate::signature::{Function, FunctionCode};
use crate::subst::{sub_annotations, SubstitutionMap};
use crate::type_comment::TypeComments;
use crate::vm::{FrameState, Interpreter, Opcode};

// ============================================================================
// Module Description
// ============================================================================

/// A module, as the sequence of definitions its top level executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// The module's file name.
    pub filename: String,
    /// Type comment text by line.
    #[serde(default)]
    pub type_comments: BTreeMap<u32, String>,
    /// Top-level definitions, in execution order.
    #[serde(default)]
    pub definitions: Vec<Definition>,
}

/// One top-level definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Definition {
    Typevar(TypeVarDef),
    Class(ClassSpec),
    Function(FunctionDef),
    Assign(AssignDef),
    Specialize(SpecializeDef),
}

/// `T = TypeVar("T", bound=...)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeVarDef {
    pub name: String,
    /// Bound expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound: Option<String>,
}

/// `class Name(Generic[T, ...])`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name: String,
    /// Names of the class's type parameters.
    #[serde(default)]
    pub type_params: Vec<String>,
}

/// A `def` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub line: u32,
    /// Positional parameters.
    #[serde(default)]
    pub params: Vec<String>,
    /// Keyword-only parameters.
    #[serde(default)]
    pub kwonly_params: Vec<String>,
    /// Name of the `*args` parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub varargs: Option<String>,
    /// Name of the `**kwargs` parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub varkw: Option<String>,
    /// Inline annotation expressions by parameter name (and `return`).
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// The function type comment, `(args) -> return`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_comment: Option<String>,
}

/// `target = value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignDef {
    pub target: String,
    pub line: u32,
    pub value: String,
}

/// A specialization of a function: one substitution map per call site,
/// each binding type parameter names to value expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecializeDef {
    pub function: String,
    #[serde(default)]
    pub maps: Vec<BTreeMap<String, Vec<String>>>,
}

impl ModuleSpec {
    /// The type comment table, with each commented line's code.
    pub fn type_comment_table(&self) -> TypeComments {
        let mut table = TypeComments::new(self.filename.clone());
        for (line, comment) in &self.type_comments {
            let code = self
                .definitions
                .iter()
                .find_map(|definition| match definition {
                    Definition::Assign(assign) if assign.line == *line => {
                        Some(format!("{} = {}", assign.target, assign.value))
                    }
                    _ => None,
                })
                .unwrap_or_default();
            table.insert(*line, code, comment.clone());
        }
        table
    }
}

// ============================================================================
// Report
// ============================================================================

/// Result of analyzing a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReport {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// The analyzed file.
    pub file: String,
    /// Resolved function signatures, in definition order.
    pub functions: Vec<FunctionReport>,
    /// Assigned variables and their types, in assignment order.
    pub variables: Vec<VariableReport>,
    /// Specialized signatures, in request order.
    pub specializations: Vec<SpecializationReport>,
    /// Diagnostics, in report order.
    pub diagnostics: Vec<Diagnostic>,
}

/// A function's resolved annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionReport {
    pub name: String,
    pub line: u32,
    pub annotations: BTreeMap<String, String>,
}

/// The type of an assigned variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableReport {
    pub name: String,
    pub line: u32,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A function's annotations after substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecializationReport {
    pub function: String,
    pub annotations: BTreeMap<String, String>,
}

fn render_annotations(annotations: &BTreeMap<String, TypeDescriptor>) -> BTreeMap<String, String> {
    annotations
        .iter()
        .map(|(name, annotation)| (name.clone(), annotation.to_string()))
        .collect()
}

// ============================================================================
// Analysis
// ============================================================================

/// Analyze `spec` with `vm`.
///
/// Problems in the analyzed code are diagnostics in the report. An error is
/// returned only when the description itself is unusable.
pub fn analyze_module<I: Interpreter>(
    vm: &mut I,
    config: &AnnotationConfig,
    spec: &ModuleSpec,
) -> Result<ModuleReport, ModuleError> {
    let mut log = ErrorLog::new();
    let comments = spec.type_comment_table();
    let mut resolver = AnnotationResolver::new(vm, &mut log, config);
    let builtins = resolver.builtins().clone();

    let mut globals = Scope::new();
    let mut node = Node::ROOT;
    let mut functions: Vec<Function> = Vec::new();
    let mut variables = Vec::new();
    let mut requested = Vec::new();

    for definition in &spec.definitions {
        node = node.successor();
        match definition {
            Definition::Typevar(def) => {
                let param = define_typevar(&mut resolver, node, &globals, def)?;
                globals.insert(
                    def.name.clone(),
                    Variable::from_value(node, AbstractValue::TypeParameter(param)),
                );
            }
            Definition::Class(def) => {
                let cls = define_class(&globals, def);
                globals.insert(def.name.clone(), Variable::from_value(node, cls));
            }
            Definition::Function(def) => {
                let function =
                    define_function(&mut resolver, node, &globals, &spec.filename, def)?;
                functions.push(function);
            }
            Definition::Assign(def) => {
                let value = resolver
                    .run_expr(node, &globals, &def.value)
                    .map_err(|source| ModuleError::InvalidExpression {
                        context: format!("assignment to '{}'", def.target),
                        source,
                    })?;
                let state = FrameState {
                    node,
                    globals: &globals,
                };
                let op = Opcode::new(spec.filename.clone(), def.line);
                let value = resolver.apply_type_comment(&state, &op, value, &comments);
                variables.push(VariableReport {
                    name: def.target.clone(),
                    line: def.line,
                    type_name: merge_classes(&builtins, value.data()).to_string(),
                });
                globals.insert(def.target.clone(), value);
            }
            Definition::Specialize(def) => requested.push(def),
        }
    }

    // Globals are final from here on.
    node = node.successor();
    for function in &mut functions {
        resolver.eval_late_annotations(node, function, &globals);
    }

    let mut specializations = Vec::with_capacity(requested.len());
    for def in requested {
        let function = functions
            .iter()
            .rev()
            .find(|f| f.name == def.function)
            .ok_or_else(|| ModuleError::UnknownFunction {
                name: def.function.clone(),
            })?;
        let mut maps = Vec::with_capacity(def.maps.len());
        for entries in &def.maps {
            maps.push(substitution_map(&mut resolver, node, &globals, def, entries)?);
        }
        let annotations = sub_annotations(node, &builtins, function.signature.annotations(), &maps);
        specializations.push(SpecializationReport {
            function: def.function.clone(),
            annotations: render_annotations(&annotations),
        });
    }

    drop(resolver);
    info!(
        "analyzed {}: {} function(s), {} variable(s), {} diagnostic(s)",
        spec.filename,
        functions.len(),
        variables.len(),
        log.len()
    );

    Ok(ModuleReport {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        file: spec.filename.clone(),
        functions: functions
            .iter()
            .map(|f| FunctionReport {
                name: f.name.clone(),
                line: f.code.first_line,
                annotations: render_annotations(f.signature.annotations()),
            })
            .collect(),
        variables,
        specializations,
        diagnostics: log.into_diagnostics(),
    })
}

fn define_typevar<I: Interpreter>(
    resolver: &mut AnnotationResolver<'_, I>,
    node: Node,
    globals: &Scope,
    def: &TypeVarDef,
) -> Result<TypeParameter, ModuleError> {
    let Some(text) = &def.bound else {
        return Ok(TypeParameter::new(def.name.clone()));
    };
    let invalid = |reason: String| ModuleError::InvalidBound {
        name: def.name.clone(),
        reason,
    };
    let var = resolver
        .run_expr(node, globals, text)
        .map_err(|err| invalid(err.to_string()))?;
    let value = var.atomic_value().map_err(|err| invalid(err.to_string()))?;
    let bound = value
        .to_type(resolver.builtins())
        .ok_or_else(|| invalid(format!("'{}' is not a type", value)))?;
    Ok(TypeParameter::with_bound(def.name.clone(), bound))
}

fn define_class(globals: &Scope, def: &ClassSpec) -> AbstractValue {
    let template = def
        .type_params
        .iter()
        .map(|name| {
            globals
                .get(name)
                .and_then(|var| match var.atomic_value() {
                    Ok(AbstractValue::TypeParameter(param)) => Some(param.clone()),
                    _ => None,
                })
                .unwrap_or_else(|| TypeParameter::new(name.clone()))
        })
        .collect();
    AbstractValue::Class(ClassDef::generic(def.name.clone(), template))
}

fn define_function<I: Interpreter>(
    resolver: &mut AnnotationResolver<'_, I>,
    node: Node,
    globals: &Scope,
    filename: &str,
    def: &FunctionDef,
) -> Result<Function, ModuleError> {
    let builtins: Builtins = resolver.builtins().clone();
    let location = Location::new(filename, def.line);

    let mut payload = Vec::with_capacity(def.annotations.len() + 1);
    let mut names = Vec::with_capacity(def.annotations.len());
    for (name, text) in &def.annotations {
        let value = resolver
            .run_expr(node, globals, text)
            .map_err(|source| ModuleError::InvalidExpression {
                context: format!("annotation for '{}' of '{}'", name, def.name),
                source,
            })?;
        payload.push(value);
        names.push(Variable::from_value(node, builtins.str_constant(name.clone())));
    }
    if !payload.is_empty() {
        payload.push(Variable::from_value(node, builtins.tuple_constant(names)));
    }
    let collected = resolver
        .convert_function_annotations(node, &payload, &location)
        .map_err(|source| ModuleError::MalformedAnnotations {
            function: def.name.clone(),
            source,
        })?;

    let varnames = def
        .params
        .iter()
        .chain(&def.kwonly_params)
        .chain(&def.varargs)
        .chain(&def.varkw)
        .cloned()
        .collect();
    let mut function = Function::new(FunctionCode {
        name: def.name.clone(),
        filename: filename.to_string(),
        first_line: def.line,
        argcount: def.params.len(),
        kwonlyargcount: def.kwonly_params.len(),
        has_varargs: def.varargs.is_some(),
        has_varkeywords: def.varkw.is_some(),
        varnames,
    });
    collected.apply_to(&mut function.signature);
    if let Some(comment) = &def.type_comment {
        resolver.attach_function_type_comment(&mut function, comment, &location);
    }
    Ok(function)
}

fn substitution_map<I: Interpreter>(
    resolver: &mut AnnotationResolver<'_, I>,
    node: Node,
    globals: &Scope,
    def: &SpecializeDef,
    entries: &BTreeMap<String, Vec<String>>,
) -> Result<SubstitutionMap, ModuleError> {
    let builtins = resolver.builtins().clone();
    let mut map = SubstitutionMap::new();
    for (name, exprs) in entries {
        let mut binding = Variable::new();
        for text in exprs {
            let var = resolver
                .run_expr(node, globals, text)
                .map_err(|source| ModuleError::InvalidExpression {
                    context: format!("specialization of '{}'", def.function),
                    source,
                })?;
            for value in var.data() {
                match value.instantiate(node, &builtins) {
                    Some(instances) => binding.extend(instances),
                    None => binding.add_binding(node, value.clone()),
                }
            }
        }
        map.insert(name.clone(), binding);
    }
    Ok(map)
}
