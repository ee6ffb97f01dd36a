//! Batch command - extract data from multiple K-1 PDFs.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use k1_core::models::record::ExtractionReport;
use k1_core::{K1Orchestrator, PureOcrEngine};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: super::process::OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue past failing files
    #[arg(long)]
    continue_on_error: bool,

    /// Directory with OCR models
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching PDF files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let mut orchestrator = K1Orchestrator::with_config(config);
    if let Some(model_dir) = &args.model_dir {
        let engine = PureOcrEngine::from_dir(model_dir)
            .map_err(|e| anyhow::anyhow!("failed to load OCR models: {}", e))?;
        orchestrator = orchestrator.with_ocr_engine(Box::new(engine));
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut reports = Vec::with_capacity(files.len());
    for path in &files {
        let report = orchestrator.extract_path(path);

        if !report.success && !args.continue_on_error {
            pb.finish_and_clear();
            anyhow::bail!(
                "processing {} failed: {} (use --continue-on-error to skip)",
                path.display(),
                report.error.as_deref().unwrap_or("unknown error")
            );
        }
        if !report.success {
            warn!(
                "Failed to process {}: {}",
                path.display(),
                report.error.as_deref().unwrap_or("unknown error")
            );
        }

        reports.push(report);
        pb.inc(1);
    }
    pb.finish_with_message("Complete");

    // Per-file outputs
    if let Some(output_dir) = &args.output_dir {
        for report in reports.iter().filter(|r| r.success) {
            let Some(record) = &report.record else {
                continue;
            };
            let stem = PathBuf::from(&report.file_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("k1")
                .to_string();

            let (extension, content) = match args.format {
                super::process::OutputFormat::Json => {
                    ("json", serde_json::to_string_pretty(report)?)
                }
                super::process::OutputFormat::Csv => ("csv", super::process::format_csv(record)?),
                super::process::OutputFormat::Text => ("txt", super::process::format_text(record)),
            };

            let output_path = output_dir.join(format!("{}.{}", stem, extension));
            fs::write(&output_path, content)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));
        write_summary(&summary_path, &reports)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = reports.iter().filter(|r| r.success).count();
    let failed = reports.len() - successful;

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        reports.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed).red()
    );

    if failed > 0 {
        println!();
        println!("{}", style("Failed files:").red());
        for report in reports.iter().filter(|r| !r.success) {
            println!(
                "  - {}: {}",
                report.file_name,
                report.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &PathBuf, reports: &[ExtractionReport]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "form_type",
        "tax_year",
        "ein",
        "entity_name",
        "total_income",
        "capital_ending",
        "confidence",
        "processing_time_ms",
        "error",
    ])?;

    for report in reports {
        if let Some(record) = &report.record {
            wtr.write_record([
                report.file_name.clone(),
                "success".to_string(),
                record.form_type.to_string(),
                record.tax_year.clone().unwrap_or_default(),
                record.ein.clone().unwrap_or_default(),
                record.entity_name.clone().unwrap_or_default(),
                format!("{:.2}", record.total_income()),
                record
                    .capital_ending
                    .map(|v| format!("{:.2}", v))
                    .unwrap_or_default(),
                format!("{:.2}", record.confidence_score),
                report.processing_time_ms.to_string(),
                String::new(),
            ])?;
        } else {
            wtr.write_record([
                report.file_name.clone(),
                "error".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                report.processing_time_ms.to_string(),
                report.error.clone().unwrap_or_default(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
