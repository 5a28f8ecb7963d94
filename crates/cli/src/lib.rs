use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use contractgen_splice::{apply_patch, is_annotated, SpliceConfig};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;

mod batch;
mod settings;

use settings::{Overrides, RunConfig};

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "contractgen")]
#[command(about = "Splice generated contract annotations into Rust sources", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch one file with one descriptor
    Apply(ApplyArgs),

    /// Report which files already carry the contract imports
    Check(CheckArgs),

    /// Run the local file pipeline over the configured files
    Batch(BatchArgs),
}

#[derive(Args)]
struct ApplyArgs {
    /// Source file to annotate
    original: PathBuf,

    /// Generated descriptor with the annotation blocks
    descriptor: PathBuf,

    /// Where to write the annotated file
    output: PathBuf,

    /// Engine settings (`[splice]` table of a TOML config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output the patch report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// Files to inspect
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Engine settings (`[splice]` table of a TOML config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct BatchArgs {
    /// TOML run configuration
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Files to annotate (replaces `files_to_annotate`)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    files: Vec<PathBuf>,

    /// Source tree root (replaces `source_dir`)
    #[arg(long)]
    source: Option<PathBuf>,

    /// Working directory for copies and generated files (replaces `target_dir`)
    #[arg(long)]
    target: Option<PathBuf>,

    /// Copy annotated files back over their sources
    #[arg(long)]
    update: bool,

    /// Output the batch summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct CheckEntry {
    file: PathBuf,
    annotated: bool,
}

pub fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // keep stdout clean for JSON parsing
    let json_output = match &cli.command {
        Commands::Apply(args) => args.json,
        Commands::Check(args) => args.json,
        Commands::Batch(args) => args.json,
    };
    if json_output {
        cli.quiet = true;
    }

    // the run config may ask for verbose output too
    let run_config = match &cli.command {
        Commands::Batch(args) => Some(RunConfig::load(
            args.config.as_deref(),
            Overrides {
                files: args.files.clone(),
                source_dir: args.source.clone(),
                target_dir: args.target.clone(),
                update_source: args.update,
            },
        )?),
        _ => None,
    };
    if run_config.as_ref().is_some_and(|c| c.verbose) {
        cli.verbose = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Apply(args) => run_apply(args)?,
        Commands::Check(args) => run_check(args)?,
        Commands::Batch(args) => {
            let config = run_config.context("batch configuration was not loaded")?;
            run_batch(args, &config)?
        }
    }

    Ok(())
}

fn load_splice_config(path: Option<&PathBuf>) -> Result<SpliceConfig> {
    let Some(path) = path else {
        return Ok(SpliceConfig::default());
    };
    let config = RunConfig::from_file(path)?;
    config
        .splice
        .validate()
        .with_context(|| format!("Invalid [splice] settings in {}", path.display()))?;
    Ok(config.splice)
}

fn run_apply(args: ApplyArgs) -> Result<()> {
    let config = load_splice_config(args.config.as_ref())?;
    let report = apply_patch(&args.original, &args.descriptor, &args.output, &config)
        .with_context(|| format!("Failed to annotate {}", args.original.display()))?;

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&report)?)?;
    } else {
        print_stdout(&format!(
            "{}: {} functions matched, {} lines inserted -> {}",
            args.original.display(),
            report.matched_functions,
            report.inserted_lines,
            args.output.display()
        ))?;
    }
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<()> {
    let config = load_splice_config(args.config.as_ref())?;
    let mut entries = Vec::with_capacity(args.files.len());
    for file in args.files {
        let text = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let annotated = is_annotated(&text, &config)?;
        entries.push(CheckEntry { file, annotated });
    }

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&entries)?)?;
    } else {
        for entry in &entries {
            let state = if entry.annotated { "annotated" } else { "not annotated" };
            print_stdout(&format!("{}: {state}", entry.file.display()))?;
        }
    }
    Ok(())
}

fn run_batch(args: BatchArgs, config: &RunConfig) -> Result<()> {
    if config.files_to_annotate.is_empty() {
        log::warn!("no files to annotate");
    }
    let summary = batch::run(config)?;

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&summary)?)?;
    } else {
        for file in &summary.files {
            let line = match (&file.report, &file.error) {
                (Some(report), _) => format!(
                    "{}: {} functions matched, {} lines inserted",
                    file.file_id, report.matched_functions, report.inserted_lines
                ),
                (None, Some(err)) => format!("{}: failed: {err}", file.file_id),
                (None, None) => format!("{}: skipped ({:?})", file.file_id, file.status),
            };
            print_stdout(&line)?;
        }
    }

    let failed = summary.failed();
    if failed > 0 {
        return Err(anyhow!("{failed} of {} files failed", summary.files.len()));
    }
    Ok(())
}
