mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, diff, eval, patch, CheckArgs, DiffArgs, EvalArgs, PatchArgs};
use config::Config;
use tracing_subscriber::EnvFilter;

/// Paperclip CLI - evaluate, diff and patch component documents
#[derive(Parser, Debug)]
#[command(name = "paperclip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a document into a virtual DOM
    Eval(EvalArgs),

    /// Print the ops turning one rendering into another
    Diff(DiffArgs),

    /// Apply the diff of two documents and verify the result
    Patch(PatchArgs),

    /// Evaluate every document under a directory and report diagnostics
    Check(CheckArgs),
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    init_tracing(&config);

    match cli.command {
        Command::Eval(args) => eval(args, &config, cwd),
        Command::Diff(args) => diff(args, &config, cwd),
        Command::Patch(args) => patch(args, &config, cwd),
        Command::Check(args) => check(args, &config, cwd),
    }
}

fn main() {
    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| run(cli, &cwd.display().to_string()));

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
