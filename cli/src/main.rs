//! topdf CLI - flow document to paginated PDF

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use topdf::{ConversionOptions, Pipeline, PipelineStep};

#[derive(Parser)]
#[command(name = "topdf")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert flow documents to paginated PDF", long_about = None)]
struct Cli {
    /// Input document path
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Output PDF path
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Page size (A4, Letter, Legal; unknown names fall back to A4)
    #[arg(short = 'p', long, default_value = "A4")]
    page_size: String,

    /// Page orientation (Portrait, Landscape; unknown names fall back to
    /// Portrait)
    #[arg(short = 't', long, default_value = "Portrait")]
    orientation: String,

    /// Preserve original formatting
    #[arg(long)]
    preserve_formatting: bool,

    /// Optimize the produced PDF (deduplication + compressed containers)
    #[arg(long)]
    optimize: bool,

    /// Fail instead of falling back when optimization cannot run
    #[arg(long, requires = "optimize")]
    strict_optimize: bool,

    /// Print the conversion report as JSON
    #[arg(long)]
    json: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Conversion failed".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> topdf::Result<()> {
    let options = ConversionOptions::new()
        .with_page_size_name(&cli.page_size)
        .with_orientation_name(&cli.orientation)
        .preserve_formatting(cli.preserve_formatting)
        .optimize(cli.optimize)
        .require_optimization(cli.strict_optimize);

    let pb = if cli.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(PipelineStep::COUNT);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    // One tick per completed pipeline step; no fabricated progress.
    let report = Pipeline::new().convert_with_observer(
        &cli.input,
        &cli.output,
        &options,
        |step| {
            pb.set_message(step.to_string());
            pb.inc(1);
        },
    )?;
    pb.finish_and_clear();

    if cli.json {
        println!("{}", report.to_json());
        return Ok(());
    }

    println!(
        "{} {} -> {}",
        "Converted".green().bold(),
        cli.input.display(),
        cli.output.display()
    );
    println!(
        "  {} pages, {} bytes{}",
        report.page_count,
        report.output_bytes,
        if report.optimized { ", optimized" } else { "" }
    );
    if let Some(ref stats) = report.optimize {
        println!(
            "  {} {} duplicates merged, {} objects dropped",
            "Optimizer:".dimmed(),
            stats.duplicates_merged,
            stats.unreachable_dropped
        );
    }
    for warning in &report.warnings {
        println!("  {} {}", "Warning:".yellow().bold(), warning);
    }

    Ok(())
}
