//! CLI front door.
//!
//! Helpers behind `tyannot check`: load a module description, analyze it
//! with the reference expression interpreter, and render the report.
//!
//! ## Error Handling
//!
//! All functions return `Result<T, TyannotError>`. Problems in the analyzed
//! module are diagnostics inside the report, not errors; an error means the
//! description itself could not be read or used.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use tyannot_core::error::TyannotError;
use tyannot_python::config::{AnnotationConfig, ReceiverPolicy};
use tyannot_python::evaluator::ExprVm;
use tyannot_python::module::{analyze_module, ModuleReport, ModuleSpec};

/// Read and parse a module description.
pub fn load_module(path: &Path) -> Result<ModuleSpec, TyannotError> {
    let text =
        fs::read_to_string(path).map_err(|err| TyannotError::from_io(path.display().to_string(), err))?;
    let spec: ModuleSpec = serde_json::from_str(&text)?;
    debug!(
        "loaded {} with {} definitions",
        path.display(),
        spec.definitions.len()
    );
    Ok(spec)
}

/// Build the receiver policy from `--receiver` and `--no-receivers`.
///
/// With neither flag the default policy (`self`, `cls`) applies.
pub fn receiver_policy(
    receivers: &[String],
    no_receivers: bool,
) -> Result<ReceiverPolicy, TyannotError> {
    if no_receivers {
        if !receivers.is_empty() {
            return Err(TyannotError::invalid_args(
                "--receiver cannot be combined with --no-receivers",
            ));
        }
        return Ok(ReceiverPolicy::none());
    }
    if receivers.is_empty() {
        return Ok(ReceiverPolicy::default());
    }
    if let Some(bad) = receivers.iter().find(|name| !is_identifier(name)) {
        return Err(TyannotError::invalid_args(format!(
            "invalid receiver name '{}'",
            bad
        )));
    }
    Ok(ReceiverPolicy::new(receivers.iter().cloned()))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Analyze the module description at `path`.
pub fn check_module(path: &Path, config: &AnnotationConfig) -> Result<ModuleReport, TyannotError> {
    let spec = load_module(path)?;
    let mut vm = ExprVm::new();
    let report = analyze_module(&mut vm, config, &spec)?;
    info!(
        "checked {}: {} diagnostics",
        report.file,
        report.diagnostics.len()
    );
    Ok(report)
}

/// Render a report for people.
pub fn render_text(report: &ModuleReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.file);
    for function in &report.functions {
        let _ = writeln!(out, "  def {} (line {})", function.name, function.line);
        for (name, annotation) in &function.annotations {
            let _ = writeln!(out, "    {}: {}", name, annotation);
        }
    }
    for variable in &report.variables {
        let _ = writeln!(
            out,
            "  {} = {} (line {})",
            variable.name, variable.type_name, variable.line
        );
    }
    for specialization in &report.specializations {
        let _ = writeln!(out, "  specialize {}", specialization.function);
        for (name, annotation) in &specialization.annotations {
            let _ = writeln!(out, "    {}: {}", name, annotation);
        }
    }
    match report.diagnostics.len() {
        0 => out.push_str("no diagnostics\n"),
        1 => out.push_str("1 diagnostic\n"),
        n => {
            let _ = writeln!(out, "{} diagnostics", n);
        }
    }
    for diagnostic in &report.diagnostics {
        let _ = writeln!(out, "{}", diagnostic);
    }
    out
}
