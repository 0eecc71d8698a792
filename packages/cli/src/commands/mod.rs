pub mod check;
pub mod diff;
pub mod eval;
pub mod patch;

pub use check::{check, CheckArgs};
pub use diff::{diff, DiffArgs};
pub use eval::{eval, EvalArgs};
pub use patch::{patch, PatchArgs};

use crate::config::Config;
use anyhow::{Context, Result};
use colored::Colorize;
use paperclip_common::{load_modules, Diagnostic, DiagnosticLevel, RealFileSystem};
use paperclip_evaluator::{Evaluation, Evaluator, ReferenceIndex, Validator};
use paperclip_model::Module;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Patched document differs from a fresh evaluation ({ops} ops applied)")]
    VerificationFailed { ops: usize },

    #[error("{count} document(s) failed with errors")]
    DocumentErrors { count: usize },
}

/// Load the module snapshot stored in `input`
pub fn load_snapshot(config: &Config, cwd: &str, input: &str) -> Result<Vec<Module>> {
    let path = config.resolve_input(cwd, input);
    debug!(path = %path.display(), "Loading document");

    load_modules(&RealFileSystem, &path)
        .with_context(|| format!("Failed to load {}", path.display()))
}

/// Evaluate `module` against every module of the snapshot
pub fn render(config: &Config, modules: &[Module], module: &Module) -> (Evaluation, Vec<Diagnostic>) {
    let index = ReferenceIndex::new(modules);
    let mut evaluator = Evaluator::new(&index);
    let evaluation = evaluator.evaluate_module(module);

    let mut diagnostics = index.diagnostics().to_vec();
    diagnostics.extend(evaluation.diagnostics.iter().cloned());
    diagnostics.extend(Validator::new(config.validate_provenance).validate(&evaluation.document));

    (evaluation, diagnostics)
}

/// Render the first module of a snapshot
pub fn render_first(config: &Config, modules: &[Module]) -> Result<(Evaluation, Vec<Diagnostic>)> {
    let module = modules
        .first()
        .ok_or_else(|| anyhow::anyhow!("Document contains no modules"))?;
    Ok(render(config, modules, module))
}

pub fn print_json<T: Serialize>(config: &Config, value: &T) -> Result<()> {
    let json = if config.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

/// Print diagnostics to stderr, keeping stdout for JSON
pub fn report_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic.level {
            DiagnosticLevel::Warning => {
                eprintln!("  {} {}", "warning:".yellow().bold(), diagnostic.kind)
            }
            DiagnosticLevel::Error => eprintln!("  {} {}", "error:".red().bold(), diagnostic.kind),
        }
    }
}
