// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Resolving late annotations.
//!
//! Forward references collected while a module executes are resolved once
//! its globals are final. A function type comment contributes two late
//! annotations: its return type, and its argument list under
//! [`MULTI_ARG_ANNOTATION`], which binds several parameters at once:
//!
//! ```text
//! def f(self, x, y):
//!     # type: (int, str) -> None
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};
use tyannot_core::types::Location;

use crate::error::TypeCommentError;
use crate::lattice::{ConversionError, Node, Scope};
use crate::normalize::Normalized;
use crate::resolver::AnnotationResolver;
use crate::signature::{Function, LateAnnotation, MULTI_ARG_ANNOTATION, RETURN_ANNOTATION};
use crate::vm::Interpreter;

/// `(args) -> return`
static FUNCTION_TYPE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\((.*)\)\s*->\s*(.*)$").unwrap());

impl<I: Interpreter> AnnotationResolver<'_, I> {
    /// Resolve `function`'s late annotations against the final `globals`.
    ///
    /// Every late annotation is consumed: it is either committed to the
    /// signature or reported.
    pub fn eval_late_annotations(
        &mut self,
        node: Node,
        function: &mut Function,
        globals: &Scope,
    ) {
        for late in function.signature.take_late_annotations() {
            if late.is_multi_arg() {
                if let Err(err) = self.eval_multi_arg_annotation(node, function, globals, &late) {
                    warn!(
                        "dropping type comment for {} at {}: {}",
                        function.name, late.location, err
                    );
                    let text = late
                        .expr_text()
                        .map(str::to_string)
                        .unwrap_or_else(|| late.expr.to_string());
                    self.log.invalid_function_type_comment(
                        &late.location,
                        &text,
                        Some(&err.to_string()),
                    );
                }
                continue;
            }
            let scope = Some((node, globals));
            match self.process_one_annotation(&late.expr, &late.name, &late.location, scope) {
                Normalized::Resolved(t) => {
                    debug!(
                        "resolved late annotation {} of {} to {}",
                        late.name, function.name, t
                    );
                    function.signature.set_annotation(late.name, t);
                }
                Normalized::Late | Normalized::Failed => {
                    debug!("dropped late annotation {} of {}", late.name, function.name);
                }
            }
        }
    }

    /// Resolve a function type comment's argument list.
    ///
    /// Either every argument is matched to a formal, or nothing is
    /// committed.
    pub fn eval_multi_arg_annotation(
        &mut self,
        node: Node,
        function: &mut Function,
        globals: &Scope,
        late: &LateAnnotation,
    ) -> Result<(), TypeCommentError> {
        let text = late.expr_text().ok_or_else(|| ConversionError::NotConstant {
            expected: "str",
            found: late.expr.to_string(),
        })?;
        let args = self.eval_expr_as_tuple(node, globals, text)?;
        let names = self.config.receiver_policy.reconcile(
            &function.code.varnames,
            function.code.arg_count(),
            args.len(),
        )?;
        for (name, arg) in names.iter().zip(&args) {
            if let Normalized::Resolved(t) =
                self.process_one_annotation(arg, name, &late.location, Some((node, globals)))
            {
                function.signature.set_annotation(name.clone(), t);
            }
        }
        Ok(())
    }

    /// Split a function type comment into late annotations on `function`.
    ///
    /// An argument list of `...` leaves the parameters alone. A comment that
    /// is not of the form `(args) -> return` is reported.
    pub fn attach_function_type_comment(
        &mut self,
        function: &mut Function,
        comment: &str,
        location: &Location,
    ) {
        let comment = comment.trim();
        let Some(caps) = FUNCTION_TYPE_COMMENT.captures(comment) else {
            self.log.invalid_function_type_comment(
                location,
                comment,
                Some("Expected a comment of the form '(args) -> return'"),
            );
            return;
        };
        let args = caps[1].trim();
        if args != "..." {
            function.signature.add_late_annotation(LateAnnotation::from_comment(
                &self.builtins,
                args,
                MULTI_ARG_ANNOTATION,
                location.clone(),
            ));
        }
        function.signature.add_late_annotation(LateAnnotation::from_comment(
            &self.builtins,
            caps[2].trim(),
            RETURN_ANNOTATION,
            location.clone(),
        ));
    }
}
