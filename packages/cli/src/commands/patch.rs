use super::{load_snapshot, print_json, render_first, report_diagnostics, CliError};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use paperclip_evaluator::{diff_vdocument, patch as apply_patch};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct PatchArgs {
    /// Document before the edit
    pub old: String,

    /// Document after the edit
    pub new: String,

    /// Only report whether the patch reproduces the new rendering
    #[arg(long)]
    pub verify: bool,
}

/// Diff two renderings, apply the ops to the old one and check the result
pub fn patch(args: PatchArgs, config: &Config, cwd: &str) -> Result<()> {
    let old_modules = load_snapshot(config, cwd, &args.old)?;
    let new_modules = load_snapshot(config, cwd, &args.new)?;

    let (old, mut diagnostics) = render_first(config, &old_modules)?;
    let (new, new_diagnostics) = render_first(config, &new_modules)?;
    diagnostics.extend(new_diagnostics);
    report_diagnostics(&diagnostics);

    let ops = diff_vdocument(&old.document, &new.document);
    let patched = apply_patch(&ops, &old.document)?;

    if !patched.structural_eq(&new.document) {
        warn!(ops = ops.len(), "Patched document diverged");
        return Err(CliError::VerificationFailed { ops: ops.len() }.into());
    }
    info!(ops = ops.len(), "Patch verified");

    if args.verify {
        eprintln!("{} {} op(s) applied", "✓".green(), ops.len());
        Ok(())
    } else {
        print_json(config, &patched)
    }
}
