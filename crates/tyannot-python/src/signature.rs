// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Function signatures and their pending annotations.

use std::collections::BTreeMap;
use std::fmt;

use tyannot_core::types::Location;

use crate::lattice::{AbstractValue, Builtins, TypeDescriptor};

/// Signature key of the return annotation.
pub const RETURN_ANNOTATION: &str = "return";

/// Signature key of a function type comment's argument list, which
/// annotates several parameters at once.
pub const MULTI_ARG_ANNOTATION: &str = "$multi_arg";

/// An annotation whose resolution waits for the module's globals.
#[derive(Debug, Clone, PartialEq)]
pub struct LateAnnotation {
    /// The raw annotation, usually a string constant.
    pub expr: AbstractValue,
    /// The parameter name, [`RETURN_ANNOTATION`] or [`MULTI_ARG_ANNOTATION`].
    pub name: String,
    /// Where the annotation was written.
    pub location: Location,
}

impl LateAnnotation {
    /// Create a late annotation for a raw value.
    pub fn new(expr: AbstractValue, name: impl Into<String>, location: Location) -> Self {
        LateAnnotation {
            expr,
            name: name.into(),
            location,
        }
    }

    /// Create a late annotation from comment text.
    pub fn from_comment(
        builtins: &Builtins,
        text: &str,
        name: impl Into<String>,
        location: Location,
    ) -> Self {
        LateAnnotation::new(builtins.str_constant(text), name, location)
    }

    /// Whether this is a function type comment's argument list.
    pub fn is_multi_arg(&self) -> bool {
        self.name == MULTI_ARG_ANNOTATION
    }

    /// The expression text, for string annotations.
    pub fn expr_text(&self) -> Option<&str> {
        self.expr.str_constant()
    }
}

impl fmt::Display for LateAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expr_text() {
            Some(text) => write!(f, "{} ({:?} at {})", self.name, text, self.location),
            None => write!(f, "{} ({} at {})", self.name, self.expr, self.location),
        }
    }
}

/// The resolved and pending annotations of a function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    annotations: BTreeMap<String, TypeDescriptor>,
    late_annotations: Vec<LateAnnotation>,
}

impl Signature {
    /// An unannotated signature.
    pub fn new() -> Self {
        Signature::default()
    }

    /// Commit a resolved annotation, replacing any previous one.
    pub fn set_annotation(&mut self, name: impl Into<String>, annotation: TypeDescriptor) {
        self.annotations.insert(name.into(), annotation);
    }

    /// The resolved annotation for `name`.
    pub fn annotation(&self, name: &str) -> Option<&TypeDescriptor> {
        self.annotations.get(name)
    }

    /// All resolved annotations, by name.
    pub fn annotations(&self) -> &BTreeMap<String, TypeDescriptor> {
        &self.annotations
    }

    /// Whether a return annotation has been resolved.
    pub fn has_return_annotation(&self) -> bool {
        self.annotations.contains_key(RETURN_ANNOTATION)
    }

    /// Queue a late annotation. A later annotation for the same name
    /// replaces the earlier one.
    pub fn add_late_annotation(&mut self, late: LateAnnotation) {
        match self
            .late_annotations
            .iter_mut()
            .find(|existing| existing.name == late.name)
        {
            Some(existing) => *existing = late,
            None => self.late_annotations.push(late),
        }
    }

    /// Pending late annotations, in the order they were queued.
    pub fn late_annotations(&self) -> &[LateAnnotation] {
        &self.late_annotations
    }

    /// Remove and return all pending late annotations.
    pub fn take_late_annotations(&mut self) -> Vec<LateAnnotation> {
        std::mem::take(&mut self.late_annotations)
    }
}

/// The parts of a function's code object annotation resolution reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionCode {
    /// The function's name.
    pub name: String,
    /// File the function is defined in.
    pub filename: String,
    /// Line of the `def`.
    pub first_line: u32,
    /// Number of positional parameters.
    pub argcount: usize,
    /// Number of keyword-only parameters.
    pub kwonlyargcount: usize,
    /// Whether the function takes `*args`.
    pub has_varargs: bool,
    /// Whether the function takes `**kwargs`.
    pub has_varkeywords: bool,
    /// Parameter names first, in declaration order, then other locals.
    pub varnames: Vec<String>,
}

impl FunctionCode {
    /// Total number of formal parameters.
    pub fn arg_count(&self) -> usize {
        self.argcount
            + self.kwonlyargcount
            + usize::from(self.has_varargs)
            + usize::from(self.has_varkeywords)
    }

    /// Location of the `def`.
    pub fn location(&self) -> Location {
        Location::new(self.filename.clone(), self.first_line)
    }
}

/// A function under analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// The function's name.
    pub name: String,
    /// The function's code object.
    pub code: FunctionCode,
    /// Annotations collected so far.
    pub signature: Signature,
}

impl Function {
    /// Create an unannotated function.
    pub fn new(code: FunctionCode) -> Self {
        Function {
            name: code.name.clone(),
            code,
            signature: Signature::new(),
        }
    }
}
