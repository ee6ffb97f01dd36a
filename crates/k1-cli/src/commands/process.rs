//! Process command - extract data from a single K-1 PDF.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use k1_core::models::record::{ExtractionReport, K1Record};
use k1_core::{K1Orchestrator, PureOcrEngine};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input K-1 PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Directory with OCR models (det.onnx, latin_rec.onnx, latin_dict.txt)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Show extraction confidence and timing
    #[arg(long)]
    show_confidence: bool,

    /// Print validation warnings
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Full report as JSON
    Json,
    /// Key fields as CSV
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let mut orchestrator = K1Orchestrator::with_config(config);
    if let Some(model_dir) = &args.model_dir {
        let engine = PureOcrEngine::from_dir(model_dir)
            .map_err(|e| anyhow::anyhow!("failed to load OCR models: {}", e))?;
        orchestrator = orchestrator.with_ocr_engine(Box::new(engine));
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(format!("Extracting {}", args.input.display()));

    let report = orchestrator.extract_path(&args.input);
    pb.finish_and_clear();

    let Some(record) = &report.record else {
        anyhow::bail!(
            "extraction failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    };

    if args.validate && !record.warnings.is_empty() {
        eprintln!("{}", style("Validation warnings:").yellow());
        for warning in &record.warnings {
            eprintln!("  - {}", warning);
        }
    }

    let output = format_report(&report, record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        println!();
        println!(
            "{} Extraction confidence: {:.1}%",
            style("ℹ").blue(),
            record.confidence_score * 100.0
        );
        println!(
            "{} Extraction method: {:?}",
            style("ℹ").blue(),
            record.extraction_method
        );
        println!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            report.processing_time_ms
        );
    }

    debug!("Processed {} pages", report.page_count);
    Ok(())
}

fn format_report(
    report: &ExtractionReport,
    record: &K1Record,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

pub(super) fn format_csv(record: &K1Record) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "form_type",
        "tax_year",
        "ein",
        "entity_name",
        "partner_name",
        "box_1_ordinary_income",
        "total_income",
        "capital_beginning",
        "capital_ending",
        "confidence",
    ])?;

    wtr.write_record([
        record.form_type.to_string(),
        record.tax_year.clone().unwrap_or_default(),
        record.ein.clone().unwrap_or_default(),
        record.entity_name.clone().unwrap_or_default(),
        record.partner_name.clone().unwrap_or_default(),
        record
            .box_1_ordinary_income
            .map(|v| format!("{:.2}", v))
            .unwrap_or_default(),
        format!("{:.2}", record.total_income()),
        record
            .capital_beginning
            .map(|v| format!("{:.2}", v))
            .unwrap_or_default(),
        record
            .capital_ending
            .map(|v| format!("{:.2}", v))
            .unwrap_or_default(),
        format!("{:.2}", record.confidence_score),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub(super) fn format_text(record: &K1Record) -> String {
    let mut output = String::new();
    let summary = record.summary();

    output.push_str(&format!("Form:    Schedule K-1 ({})\n", record.form_type));
    output.push_str(&format!("Year:    {}\n", summary.tax_year));
    output.push_str(&format!("Entity:  {}\n", summary.entity));
    if let Some(ein) = &record.ein {
        output.push_str(&format!("EIN:     {}\n", ein));
    }
    output.push_str(&format!("Partner: {}\n", summary.partner));
    output.push('\n');

    output.push_str(&format!("Total income:  ${:.2}\n", summary.total_income));
    if let Some(beginning) = record.capital_beginning {
        output.push_str(&format!("Capital start: ${:.2}\n", beginning));
    }
    if let Some(ending) = record.capital_ending {
        output.push_str(&format!("Capital end:   ${:.2}\n", ending));
    }
    output.push_str(&format!(
        "Capital reconciles: {}\n",
        if summary.capital_reconciles { "yes" } else { "no" }
    ));
    output.push_str(&format!(
        "Confidence: {:.0}%  Completeness: {:.0}%\n",
        summary.confidence * 100.0,
        summary.completeness * 100.0
    ));

    output
}
