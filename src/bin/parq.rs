//! parq — the parameterized-query rewriter CLI
//!
//! Rewrites unsafe, dynamically-interpolated query invocations in migration
//! source files into parameterized equivalents.
//!
//! # Usage
//!
//! ```bash
//! # Rewrite every eligible file in a migrations directory
//! parq ./migrations
//!
//! # Preview without writing
//! parq ./migrations --dry-run
//!
//! # A different entry point and extension
//! parq ./migrations --call db.execute --ext mts
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use parq::locator::line_of;
use parq::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "parq")]
#[command(version)]
#[command(about = "🔒 Parameterized-query rewriter for migration files", long_about = None)]
#[command(after_help = "EXAMPLES:
    parq ./migrations
    parq ./migrations --dry-run --verbose
    parq ./migrations --call db.execute --format json
    parq explain ./migrations/1713-AddUsers.ts")]
struct Cli {
    /// Directory containing the migration source files to rewrite
    dir: Option<PathBuf>,

    /// Query-execution entry point to recognize
    #[arg(long, env = "PARQ_CALL")]
    call: Option<String>,

    /// File extension eligible for rewriting
    #[arg(long, env = "PARQ_EXT")]
    ext: Option<String>,

    /// Don't write, just report planned changes
    #[arg(short, long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every recognized call site in one file without rewriting
    Explain {
        /// The file to explain
        file: PathBuf,

        /// Query-execution entry point to recognize
        #[arg(long, env = "PARQ_CALL")]
        call: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Explain { file, call }) => explain_file(file, call.as_deref()),
        None => match cli.dir.clone() {
            Some(dir) => run(&dir, &cli),
            None => {
                println!("{}", "🔒 parq — stop interpolating, bind your data".cyan().bold());
                println!();
                println!("Usage: parq <DIR> [OPTIONS]");
                println!();
                println!("Try: parq --help");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(dir: &Path, cli: &Cli) -> Result<()> {
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }

    let mut config = Config::load(dir)?;
    if let Some(call) = &cli.call {
        config.call = call.clone();
    }
    if let Some(ext) = &cli.ext {
        config.ext = ext.clone();
    }
    config.dry_run |= cli.dry_run;

    let report = Pipeline::new(dir, config.clone()).run()?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => render_table(&report, &config, cli.verbose),
    }

    Ok(())
}

fn render_table(report: &RunReport, config: &Config, verbose: bool) {
    if config.dry_run {
        println!(
            "{} {}",
            "🔒 Rewriting dynamic queries".cyan().bold(),
            "(dry-run)".yellow()
        );
    } else {
        println!("{}", "🔒 Rewriting dynamic queries".cyan().bold());
    }
    println!("   Recognizing: {}(…)", config.call.yellow());
    println!();

    for file in &report.files {
        let name = file
            .file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.file.display().to_string());

        let stamp = if verbose {
            format!("[{}] ", chrono::Local::now().format("%H:%M:%S"))
                .dimmed()
                .to_string()
        } else {
            String::new()
        };

        match &file.error {
            Some(e) => println!("  {}{} {} — {}", stamp, "✗".red(), name, e.red()),
            None => {
                let status = if file.rewritten > 0 {
                    "✓".green()
                } else {
                    "•".dimmed()
                };
                let mut detail = format!("{} rewritten", file.rewritten);
                if !file.skipped.is_empty() {
                    detail.push_str(&format!(", {} skipped", file.skipped.len()));
                }
                if !file.changed {
                    detail.push_str(" (unchanged)");
                }
                println!("  {}{} {} — {}", stamp, status, name.cyan(), detail.dimmed());

                for skip in &file.skipped {
                    println!(
                        "      {} line {}: {} — {}",
                        "⚠".yellow(),
                        skip.line,
                        skip.kind.to_string().yellow(),
                        skip.message
                    );
                }
            }
        }
    }

    println!();
    let summary = format!(
        "✓ {} file(s) processed, {} call site(s) rewritten ({} skipped, {} failed)",
        report.processed(),
        report.rewritten(),
        report.skipped(),
        report.failed()
    );
    println!("{}", summary.green().bold());
    if config.dry_run {
        println!("{}", "No files were written (dry-run).".yellow());
    }
}

fn explain_file(path: &Path, call: Option<&str>) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut config = Config::load(dir)?;
    if let Some(call) = call {
        config.call = call.to_string();
    }

    let text = std::fs::read_to_string(path)?;
    let located = Locator::new(&config.call).locate(&text);

    println!("{}", "🔒 parq call-site breakdown".cyan().bold());
    println!();
    println!("{} {}", "File:".dimmed(), path.display().to_string().yellow());
    println!("{} {}(…)", "Callee:".dimmed(), config.call.white());
    println!();

    if located.sites.is_empty() && located.skips.is_empty() {
        println!("{}", "No candidate call sites found.".dimmed());
        return Ok(());
    }

    for site in &located.sites {
        let kind = match site.kind {
            CallKind::Interpolated => "interpolated",
            CallKind::Concatenated => "concatenated",
        };
        println!(
            "  {} line {} ({})",
            "•".cyan(),
            line_of(&text, site.start),
            kind.cyan()
        );
        println!("    {} {}", "Before:".dimmed(), text[site.start..site.end].white());
        match rewrite_site(site) {
            Ok(Some(replacement)) => {
                println!("    {} {}", "After: ".dimmed(), replacement.green())
            }
            Ok(None) => println!("    {} unchanged", "After: ".dimmed()),
            Err(e) => println!("    {} {}", "Skip:  ".yellow(), e.detail()),
        }
        println!();
    }

    for skip in &located.skips {
        println!(
            "  {} line {}: {} — {}",
            "⚠".yellow(),
            line_of(&text, skip.position),
            skip.kind.to_string().yellow(),
            skip.message
        );
    }

    Ok(())
}
