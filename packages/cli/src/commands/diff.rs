use super::{load_snapshot, print_json, render_first, report_diagnostics};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use paperclip_evaluator::Differ;
use tracing::info;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Document before the edit
    pub old: String,

    /// Document after the edit
    pub new: String,
}

pub fn diff(args: DiffArgs, config: &Config, cwd: &str) -> Result<()> {
    let old_modules = load_snapshot(config, cwd, &args.old)?;
    let new_modules = load_snapshot(config, cwd, &args.new)?;

    let (old, mut diagnostics) = render_first(config, &old_modules)?;
    let (new, new_diagnostics) = render_first(config, &new_modules)?;
    diagnostics.extend(new_diagnostics);

    let mut differ = Differ::new();
    let ops = differ.diff(&old.document, &new.document);
    diagnostics.extend(differ.take_diagnostics());

    info!(ops = ops.len(), "Diffed {} against {}", args.new, args.old);
    report_diagnostics(&diagnostics);
    print_json(config, &ops)
}
