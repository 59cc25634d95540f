//! tyannot: annotation resolution for Python type inference
//!
//! Resolves the annotations an abstract interpreter captures (inline
//! annotations, string forward references, type comments and function type
//! comments) into normalized type descriptors, and specializes generic
//! signatures by substituting type parameters.

// Core infrastructure - re-exported from tyannot-core
pub use tyannot_core::error;
pub use tyannot_core::errorlog;
pub use tyannot_core::output;
pub use tyannot_core::types;

// Annotation resolution - re-exported from tyannot-python
pub use tyannot_python as python;

// Front door for the command line
pub mod cli;
