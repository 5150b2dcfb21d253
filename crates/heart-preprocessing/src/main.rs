//! CLI entry point for the heart-disease preprocessing pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use heart_preprocessing::{
    Pipeline, PreprocessingError, PreprocessingOutput, RunReport, StepOutcome, io,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Heart-disease record preprocessing",
    long_about = "Cleans a heart-disease CSV into model-ready form.\n\n\
                  Rows with zero Cholesterol or RestingBP are dropped, Sex and \
                  ExerciseAngina are label-encoded, ChestPainType, RestingECG and \
                  ST_Slope are one-hot encoded, and IQR outliers are removed from \
                  RestingBP, Cholesterol, MaxHR and Oldpeak.\n\n\
                  EXAMPLES:\n  \
                  # Defaults: heart.csv -> processed_heart_data.csv\n  \
                  heart-preprocessing\n\n  \
                  # Explicit paths and a JSON report\n  \
                  heart-preprocessing -i data/heart.csv -o out/clean.csv --emit-report out/run.json\n\n  \
                  # Machine-readable summary only\n  \
                  heart-preprocessing --json | jq .summary.rows_after"
)]
struct Args {
    /// Path to the raw heart-disease CSV file
    #[arg(short, long, default_value = "heart.csv")]
    input: PathBuf,

    /// Path the cleaned CSV is written to
    #[arg(short, long, default_value = "processed_heart_data.csv")]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output the run report as JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logging so stdout only carries the JSON document.
    #[arg(long)]
    json: bool,

    /// Also write the JSON run report to this path
    #[arg(short = 'r', long, value_name = "PATH")]
    emit_report: Option<PathBuf>,

    /// Number of cleaned rows to print after the summary
    #[arg(long, default_value = "5")]
    head: usize,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let raw = match io::load_csv(&args.input) {
        Ok(df) => df,
        Err(e @ PreprocessingError::InputNotFound(_)) => {
            error!("{}", e);
            return Err(anyhow!(
                "{}. Please ensure the file exists or pass --input.",
                e
            ));
        }
        Err(e) => return Err(e.into()),
    };
    info!(
        "Original data loaded from '{}'. Shape: {:?}",
        args.input.display(),
        raw.shape()
    );

    let mut builder = Pipeline::builder();
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let pipeline = builder.build()?;

    let output = pipeline.process(&raw).map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed: {}", e)
    })?;

    io::write_csv(&output.data, &args.output)?;

    let report = RunReport::new(
        args.input.display().to_string(),
        Some(args.output.display().to_string()),
        &output,
    );

    if let Some(ref report_path) = args.emit_report {
        report.write_report(report_path)?;
    }

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    print_human_readable_summary(&output, &args);
    Ok(())
}

/// Print a human-readable summary of the run followed by the head of the
/// cleaned table.
///
/// Uses `println!` rather than tracing: this is the program's result and must
/// show regardless of log level.
fn print_human_readable_summary(output: &PreprocessingOutput, args: &Args) {
    let summary = &output.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("PREPROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        args.input.display(),
        summary.rows_before,
        summary.columns_before
    );
    println!(
        "Output: {} ({} rows x {} columns)",
        args.output.display(),
        summary.rows_after,
        summary.columns_after
    );
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} removed, {:.1}%)",
        summary.rows_before,
        summary.rows_after,
        summary.rows_removed(),
        summary.rows_removed_percentage()
    );
    println!();

    println!("Steps:");
    for step in &summary.steps {
        match &step.outcome {
            StepOutcome::Applied => println!(
                "  - {} [{}]: {} -> {} rows{}",
                step.stage.display_name(),
                step.column,
                step.rows_before,
                step.rows_after,
                step.details
                    .as_ref()
                    .map(|d| format!(" ({})", d))
                    .unwrap_or_default()
            ),
            StepOutcome::Skipped(reason) => println!(
                "  - {} [{}]: skipped, {}",
                step.stage.display_name(),
                step.column,
                reason.describe(&step.column)
            ),
        }
    }
    println!();

    if !output.encoders.is_empty() {
        println!("Label Encodings:");
        for (column, encoding) in &output.encoders {
            let pairs: Vec<String> = encoding
                .categories
                .iter()
                .enumerate()
                .map(|(code, value)| format!("{}={}", value, code))
                .collect();
            println!("  {}: {}", column, pairs.join(", "));
        }
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  - {}", warning);
        }
        println!();
    }

    if let Some(ref report_path) = args.emit_report {
        println!("Report: {}", report_path.display());
        println!();
    }

    if args.head > 0 {
        println!("--- Head of Preprocessed DataFrame ---");
        println!("{}", output.data.head(Some(args.head)));
    }
}
