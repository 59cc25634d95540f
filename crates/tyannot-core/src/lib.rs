//! Core infrastructure for tyannot.
//!
//! This crate provides the language-agnostic pieces the annotation core
//! is built on:
//! - Source locations
//! - The diagnostics log with checkpoint/revert
//! - Error types and error codes
//! - JSON output types for CLI responses

pub mod error;
pub mod errorlog;
pub mod output;
pub mod types;
