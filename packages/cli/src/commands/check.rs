use super::{render, report_diagnostics, CliError};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use paperclip_common::{load_modules, RealFileSystem};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// File or directory to check (defaults to srcDir)
    pub path: Option<String>,

    /// Treat warnings as failures
    #[arg(long)]
    pub strict: bool,
}

/// Evaluate every document and report its diagnostics
pub fn check(args: CheckArgs, config: &Config, cwd: &str) -> Result<()> {
    let root = match &args.path {
        Some(path) => config.resolve_input(cwd, path),
        None => config.get_src_dir(cwd),
    };

    if !root.exists() {
        anyhow::bail!("Path does not exist: {}", root.display());
    }

    let files = find_json_files(&root);
    println!("Checking {} document(s) in {}", files.len(), root.display());

    let mut failed = 0;
    for file in &files {
        let relative = file.strip_prefix(cwd).unwrap_or(file.as_path());

        let modules = match load_modules(&RealFileSystem, file) {
            Ok(modules) => modules,
            Err(e) => {
                println!("  {} {} {}", "✗".red(), relative.display(), e);
                failed += 1;
                continue;
            }
        };

        let mut diagnostics = Vec::new();
        for module in &modules {
            let (_, module_diagnostics) = render(config, &modules, module);
            debug!(uri = %module.uri, count = module_diagnostics.len(), "Checked module");
            for diagnostic in module_diagnostics {
                if !diagnostics.contains(&diagnostic) {
                    diagnostics.push(diagnostic);
                }
            }
        }

        let failing = diagnostics
            .iter()
            .any(|diagnostic| args.strict || diagnostic.is_error());

        if failing {
            println!("  {} {}", "✗".red(), relative.display());
            failed += 1;
        } else {
            println!("  {} {}", "✓".green(), relative.display());
        }
        report_diagnostics(&diagnostics);
    }

    if failed > 0 {
        return Err(CliError::DocumentErrors { count: failed }.into());
    }

    println!("{} {} document(s) checked", "✓".green().bold(), files.len());
    Ok(())
}

fn find_json_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}
