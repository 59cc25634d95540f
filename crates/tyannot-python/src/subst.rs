// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Substituting type parameters.
//!
//! When a generic function is specialized, each call site contributes a
//! [`SubstitutionMap`] from type parameter names to the values observed for
//! them. A type parameter is replaced only when every map binds it to
//! concrete values; otherwise it falls back to its own bound, ignoring the
//! maps for that parameter.

use std::collections::BTreeMap;

use tracing::debug;

use crate::lattice::{
    merge_classes, AbstractValue, Builtins, Node, TypeDescriptor, TypeParameter, Variable,
};

/// Type parameter name to the values bound to it at one call site.
pub type SubstitutionMap = BTreeMap<String, Variable>;

/// Replace the type parameters in `annotation` using `substs`.
///
/// An empty sequence of maps, or a sequence containing an empty map, leaves
/// the annotation unchanged.
pub fn substitute(
    node: Node,
    builtins: &Builtins,
    annotation: &TypeDescriptor,
    substs: &[SubstitutionMap],
) -> TypeDescriptor {
    if !applies(substs) {
        return annotation.clone();
    }
    sub_one_annotation(node, builtins, annotation, substs)
}

/// [`substitute`] applied to every annotation of a signature.
pub fn sub_annotations(
    node: Node,
    builtins: &Builtins,
    annotations: &BTreeMap<String, TypeDescriptor>,
    substs: &[SubstitutionMap],
) -> BTreeMap<String, TypeDescriptor> {
    if !applies(substs) {
        return annotations.clone();
    }
    annotations
        .iter()
        .map(|(name, annotation)| {
            (
                name.clone(),
                sub_one_annotation(node, builtins, annotation, substs),
            )
        })
        .collect()
}

fn applies(substs: &[SubstitutionMap]) -> bool {
    !substs.is_empty() && substs.iter().all(|subst| !subst.is_empty())
}

fn sub_one_annotation(
    node: Node,
    builtins: &Builtins,
    annotation: &TypeDescriptor,
    substs: &[SubstitutionMap],
) -> TypeDescriptor {
    match annotation {
        TypeDescriptor::TypeParameter(param) => sub_type_parameter(node, builtins, param, substs),
        TypeDescriptor::Generic(generic) => TypeDescriptor::Generic(
            generic.map_params(|param| sub_one_annotation(node, builtins, param, substs)),
        ),
        TypeDescriptor::Union(union) => TypeDescriptor::Union(
            union.map_options(|option| sub_one_annotation(node, builtins, option, substs)),
        ),
        TypeDescriptor::Class(_) | TypeDescriptor::Ambiguous(_) => annotation.clone(),
    }
}

fn sub_type_parameter(
    node: Node,
    builtins: &Builtins,
    param: &TypeParameter,
    substs: &[SubstitutionMap],
) -> TypeDescriptor {
    let bound_everywhere = substs.iter().all(|subst| {
        subst.get(&param.name).is_some_and(|binding| {
            !binding.is_empty() && !binding.data().any(AbstractValue::is_ambiguous)
        })
    });
    if bound_everywhere {
        let values = substs
            .iter()
            .filter_map(|subst| subst.get(&param.name))
            .flat_map(|binding| binding.data());
        return merge_classes(builtins, values);
    }
    debug!(
        "type parameter {} is not bound by every substitution, using its bound",
        param.name
    );
    let instances = param.instantiate(node);
    merge_classes(builtins, instances.data())
}
