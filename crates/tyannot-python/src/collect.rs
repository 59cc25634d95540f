// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Collecting a function's annotations at definition time.
//!
//! The compiler stores `def f(i: int) -> str` annotations as one value per
//! annotated name followed by a tuple of the names:
//!
//! ```text
//! [int, str, ("i", "return")]
//! ```
//!
//! Globals are not final while the module is still executing, so forward
//! references found here become late annotations.

use std::collections::BTreeMap;

use tracing::debug;
use tyannot_core::types::Location;

use crate::lattice::{
    AbstractValue, Ambiguity, ConversionError, Node, TypeDescriptor, Union, Variable,
};
use crate::normalize::Normalized;
use crate::resolver::AnnotationResolver;
use crate::signature::{LateAnnotation, Signature};
use crate::vm::Interpreter;

/// A function's annotations, split by whether they resolved immediately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionAnnotations {
    /// Annotations that resolved, by name.
    pub annotations: BTreeMap<String, TypeDescriptor>,
    /// Forward references to resolve once globals are final.
    pub late_annotations: Vec<LateAnnotation>,
}

impl FunctionAnnotations {
    /// Whether nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty() && self.late_annotations.is_empty()
    }

    /// Record the annotations in `signature`.
    pub fn apply_to(self, signature: &mut Signature) {
        for (name, annotation) in self.annotations {
            signature.set_annotation(name, annotation);
        }
        for late in self.late_annotations {
            signature.add_late_annotation(late);
        }
    }
}

impl<I: Interpreter> AnnotationResolver<'_, I> {
    /// Convert a function's raw annotation payload.
    ///
    /// Each name must hold a single value at `node`; a name with several, or
    /// none, is reported ("Must be constant") and skipped. Annotations that fail to
    /// normalize are reported and skipped. A payload whose names tuple is
    /// malformed is an error.
    pub fn convert_function_annotations(
        &mut self,
        node: Node,
        payload: &[Variable],
        location: &Location,
    ) -> Result<FunctionAnnotations, ConversionError> {
        let Some((names, values)) = payload.split_last() else {
            return Ok(FunctionAnnotations::default());
        };
        let names = annotation_names(names)?;

        let mut collected = FunctionAnnotations::default();
        for (name, value) in names.into_iter().zip(values) {
            let visible = value.visible(node);
            let [annotation] = visible.as_slice() else {
                let merged = if visible.is_empty() {
                    AbstractValue::Ambiguous(Ambiguity::Empty)
                } else {
                    AbstractValue::Union(Union::new(visible.iter().map(|v| (*v).clone()).collect()))
                };
                self.log
                    .invalid_annotation(location, &merged, Some("Must be constant"), Some(&name));
                continue;
            };
            match self.process_one_annotation(annotation, &name, location, None) {
                Normalized::Resolved(t) => {
                    collected.annotations.insert(name, t);
                }
                Normalized::Late => {
                    debug!("annotation for {} at {} is late", name, location);
                    collected.late_annotations.push(LateAnnotation::new(
                        (*annotation).clone(),
                        name,
                        location.clone(),
                    ));
                }
                Normalized::Failed => {}
            }
        }
        Ok(collected)
    }
}

/// Read the trailing names tuple of an annotation payload.
fn annotation_names(names: &Variable) -> Result<Vec<String>, ConversionError> {
    let value = names.atomic_value()?;
    let items = value
        .tuple_constant()
        .ok_or_else(|| ConversionError::NotConstant {
            expected: "tuple",
            found: value.to_string(),
        })?;
    items
        .iter()
        .map(|item| {
            let item = item.atomic_value()?;
            item.str_constant()
                .map(str::to_string)
                .ok_or_else(|| ConversionError::NotConstant {
                    expected: "str",
                    found: item.to_string(),
                })
        })
        .collect()
}
