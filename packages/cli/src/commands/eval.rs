use super::{load_snapshot, print_json, render_first, report_diagnostics};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// JSON document holding the modules to evaluate (the first one is rendered)
    pub input: String,

    /// Write the virtual document to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

pub fn eval(args: EvalArgs, config: &Config, cwd: &str) -> Result<()> {
    let modules = load_snapshot(config, cwd, &args.input)?;
    let (evaluation, diagnostics) = render_first(config, &modules)?;

    info!(
        roots = evaluation.document.nodes.len(),
        dependencies = evaluation.dependencies.len(),
        "Evaluated {}",
        args.input
    );
    report_diagnostics(&diagnostics);

    match args.output {
        Some(output) => {
            let path = std::path::PathBuf::from(cwd).join(output);
            let json = if config.pretty {
                serde_json::to_string_pretty(&evaluation.document)?
            } else {
                serde_json::to_string(&evaluation.document)?
            };
            std::fs::write(&path, json)?;
            eprintln!("{} {}", "✓".green(), path.display());
        }
        None => print_json(config, &evaluation.document)?,
    }

    Ok(())
}
