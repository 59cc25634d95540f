// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Annotation resolution for Python type inference.
//!
//! This crate turns the raw annotations an abstract interpreter captures
//! (inline parameter and return annotations, string forward references and
//! type comments) into normalized type descriptors, and substitutes concrete
//! types for type parameters when a generic function is specialized.
//!
//! It includes:
//! - the class/type lattice annotation resolution works on ([`lattice`])
//! - the interpreter contract and a reference evaluator ([`vm`],
//!   [`evaluator`], [`expr`])
//! - the resolver: sandboxed evaluation, normalization, collection, late
//!   resolution and type comments ([`resolver`] and friends)
//! - generic substitution ([`subst`])
//! - a driver analyzing a JSON module description ([`module`])

pub mod collect;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod late;
pub mod lattice;
pub mod module;
pub mod normalize;
pub mod resolver;
pub mod sandbox;
pub mod signature;
pub mod subst;
pub mod type_comment;
pub mod vm;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::{AnnotationConfig, ReceiverPolicy};
pub use error::{EvaluationError, ModuleError, TypeCommentError};
pub use evaluator::ExprVm;
pub use module::{analyze_module, ModuleReport, ModuleSpec};
pub use normalize::Normalized;
pub use resolver::AnnotationResolver;
pub use subst::{sub_annotations, substitute, SubstitutionMap};
