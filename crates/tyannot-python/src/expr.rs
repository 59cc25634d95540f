// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Annotation expression parser.
//!
//! Annotations are small type expressions, so the evaluator only needs a
//! small slice of Python's expression grammar.
//!
//! ## Grammar
//!
//! ```text
//! <expr>  := <item> ("," <item>)* [","]
//! <item>  := <atom> ("[" <expr> "]")*
//! <atom>  := <string> | <int> | <name> | "(" [<expr>] ")"
//! <name>  := identifier ("." identifier)*
//! ```
//!
//! A comma anywhere at the top of `<expr>` makes a tuple, as in Python:
//! `int, str` and `(int,)` are tuples, `(int)` is not.
//!
//! Brackets and chained subscripts may nest at most [`MAX_NESTING`] levels
//! deep; deeper source is rejected before parsing.

use winnow::ascii::{digit1, multispace0};
use winnow::combinator::{alt, delimited, opt, preceded, repeat, terminated};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};
use winnow::ModalResult;

use crate::vm::CompileError;

/// How deeply brackets and chained subscripts may nest.
pub const MAX_NESTING: usize = 32;

/// A parsed annotation expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A (possibly dotted) name.
    Name(String),
    /// A string literal.
    Str(String),
    /// An integer literal.
    Int(i64),
    /// A tuple display.
    Tuple(Vec<Expr>),
    /// `value[index]`; a multi-element index is a `Tuple`.
    Subscript { value: Box<Expr>, index: Box<Expr> },
}

/// Parse annotation source text.
pub fn parse_expr(source: &str) -> Result<Expr, CompileError> {
    let input = source.trim();
    if input.is_empty() {
        return Err(CompileError::new("empty expression"));
    }
    if nesting_depth(input) > MAX_NESTING {
        return Err(CompileError::new("too many nested brackets"));
    }

    terminated(parse_tuple_expr, multispace0)
        .parse(input)
        .map_err(|e| {
            CompileError::new(format!(
                "invalid syntax in '{}' at offset {}",
                input,
                e.offset()
            ))
        })
}

/// Deepest bracket nesting in `source`, counting each chained subscript
/// (`a[1][2]`) as one more level. Quoted text is skipped.
fn nesting_depth(source: &str) -> usize {
    // Subscripts chained so far, one entry per open bracket.
    let mut chains = vec![0usize];
    let mut chained = 0;
    let mut deepest = 0;
    let mut quote = None;
    let mut prev = ' ';

    for c in source.chars() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
                prev = c;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' => {
                if c == '[' && prev == ']' {
                    if let Some(level) = chains.last_mut() {
                        *level += 1;
                        chained += 1;
                    }
                }
                chains.push(0);
                deepest = deepest.max(chains.len() - 1 + chained);
            }
            ')' | ']' => {
                if chains.len() > 1 {
                    chained -= chains.pop().unwrap_or(0);
                }
            }
            ',' => {
                if let Some(level) = chains.last_mut() {
                    chained -= *level;
                    *level = 0;
                }
            }
            _ => {}
        }
        if !c.is_whitespace() {
            prev = c;
        }
    }
    deepest
}

// ============================================================================
// Parser implementation using winnow
// ============================================================================

/// Parse a comma-separated expression list.
fn parse_tuple_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = parse_item(input)?;

    let rest: Vec<Expr> = repeat(0.., preceded((multispace0, ',', multispace0), parse_item))
        .parse_next(input)?;

    let trailing_comma = opt((multispace0, ',')).parse_next(input)?.is_some();

    if rest.is_empty() && !trailing_comma {
        Ok(first)
    } else {
        let mut all = vec![first];
        all.extend(rest);
        Ok(Expr::Tuple(all))
    }
}

/// Parse an atom followed by any number of subscripts.
fn parse_item(input: &mut &str) -> ModalResult<Expr> {
    let mut value = parse_atom(input)?;

    while let Some(index) = opt(delimited(
        (multispace0, '[', multispace0),
        parse_tuple_expr,
        (multispace0, ']'),
    ))
    .parse_next(input)?
    {
        value = Expr::Subscript {
            value: Box::new(value),
            index: Box::new(index),
        };
    }

    Ok(value)
}

/// Parse a literal, a name or a parenthesized expression.
fn parse_atom(input: &mut &str) -> ModalResult<Expr> {
    let _ = multispace0.parse_next(input)?;

    alt((
        parse_parenthesized,
        parse_string.map(Expr::Str),
        parse_int.map(Expr::Int),
        parse_name.map(Expr::Name),
    ))
    .parse_next(input)
}

/// Parse `( [expr] )`; empty parentheses are the empty tuple.
fn parse_parenthesized(input: &mut &str) -> ModalResult<Expr> {
    delimited(('(', multispace0), opt(parse_tuple_expr), (multispace0, ')'))
        .map(|inner| inner.unwrap_or(Expr::Tuple(Vec::new())))
        .parse_next(input)
}

/// Parse a single- or double-quoted string (no escapes).
fn parse_string(input: &mut &str) -> ModalResult<String> {
    alt((
        delimited('"', take_till(0.., |c| c == '"'), '"'),
        delimited('\'', take_till(0.., |c| c == '\''), '\''),
    ))
    .map(|s: &str| s.to_string())
    .parse_next(input)
}

/// Parse an optionally negative integer.
fn parse_int(input: &mut &str) -> ModalResult<i64> {
    (opt('-'), digit1)
        .take()
        .try_map(|s: &str| s.parse::<i64>())
        .parse_next(input)
}

/// Parse a dotted identifier.
fn parse_name(input: &mut &str) -> ModalResult<String> {
    (
        take_while(1, |c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_' || c == '.'),
    )
        .take()
        .map(|s: &str| s.to_string())
        .parse_next(input)
}
