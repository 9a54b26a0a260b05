// src/main.rs
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use finreport::analysis::{analyze_extracted, Analysis};
use finreport::config::AnalysisConfig;
use finreport::extractors::FieldExtractor;
use finreport::report::ReportAssembler;
use finreport::source::{DocumentKind, Extracted, PdfMode, RawDocument};
use finreport::storage::{ReportFormat, ReportWriter};
use finreport::utils::{self, debug_dump, AppError};

/// Reads a financial document and writes a growth report
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input document (.pdf, .csv, .xlsx, .xls)
    input: PathBuf,

    /// Where to write the report
    output: PathBuf,

    /// Report format
    #[arg(short = 'f', long, value_enum, default_value_t = ReportFormat::Pdf)]
    report_format: ReportFormat,

    /// JSON config file; command-line options override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input kind (inferred from the extension when omitted)
    #[arg(short, long, value_enum)]
    kind: Option<DocumentKind>,

    /// How to read a .pdf input when the kind is inferred
    #[arg(long, value_enum)]
    pdf_mode: Option<PdfMode>,

    /// Ordering axis column (date or year)
    #[arg(long)]
    date_column: Option<String>,

    /// Column to analyze; repeat for several (default: every numeric column)
    #[arg(long = "numeric-column")]
    numeric_columns: Vec<String>,

    /// Label alias as SOURCE=CANONICAL, e.g. "Net Income=Profit"; repeatable
    #[arg(short, long = "label")]
    labels: Vec<String>,

    /// Debug mode - save the extracted text or raw table next to the output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    match run(&args) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<PathBuf, AppError> {
    // 3. Merge file config with command-line overrides
    let config = build_config(args)?;

    // 4. Read the document
    let kind = match args.kind {
        Some(kind) => kind,
        None => DocumentKind::from_path(&args.input, config.pdf_mode)?,
    };
    let document = RawDocument::open(&args.input, kind)?;
    let extracted = document.extract()?;

    if args.debug {
        if let Err(e) = save_debug_artifacts(&args.output, &extracted, &config) {
            tracing::warn!("Failed to save debug output: {}", e);
        }
    }

    // 5. Analyze
    let assembler =
        ReportAssembler::new().with_source(format!("{} ({})", document.name(), document.kind()));
    let analysis = analyze_extracted(extracted, &config, &assembler)?;
    match &analysis {
        Analysis::Tabular { normalized, series, .. } => tracing::info!(
            "Analyzed {} rows across {} columns ({} rows dropped)",
            normalized.table.row_count(),
            series.len(),
            normalized.dropped_rows
        ),
        Analysis::Scalar { record, skipped, .. } => {
            tracing::info!("Extracted {} fields", record.len());
            for err in skipped {
                tracing::warn!("Skipped: {}", err);
            }
        }
    }

    // 6. Write the report
    let writer = ReportWriter::new(&args.output, args.report_format)?;
    let path = writer.save_report(analysis.report())?;
    if let Err(e) = writer.save_report_metadata(analysis.report(), document.name(), document.kind().as_str()) {
        tracing::error!("Failed to save metadata: {}", e);
    }

    tracing::info!("Processing complete. Report saved to {}", path.display());
    Ok(path)
}

fn build_config(args: &Args) -> Result<AnalysisConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(date_column) = &args.date_column {
        config.date_column = Some(date_column.clone());
    }
    if !args.numeric_columns.is_empty() {
        config.numeric_columns = args.numeric_columns.clone();
    }
    if let Some(pdf_mode) = args.pdf_mode {
        config.pdf_mode = pdf_mode;
    }
    for label in &args.labels {
        let (source, canonical) = AnalysisConfig::parse_label_mapping(label)?;
        config.field_label_map.insert(source, canonical);
    }

    config.validate()?;
    tracing::debug!("Effective config: {:?}", config);
    Ok(config)
}

fn debug_path(output: &Path, suffix: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    output.with_file_name(format!("{stem}.{suffix}"))
}

fn save_debug_artifacts(output: &Path, extracted: &Extracted, config: &AnalysisConfig) -> Result<(), AppError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    match extracted {
        Extracted::Text(text) => {
            let extractor = FieldExtractor::new().with_aliases(&config.field_label_map);
            let labels: Vec<&str> = extractor.rules().iter().map(|r| r.label.as_str()).collect();
            debug_dump::save_annotated_text(debug_path(output, "debug.txt"), text, &labels)?;
        }
        Extracted::Table(raw) => {
            debug_dump::save_raw_table(debug_path(output, "raw.csv"), raw)?;
        }
    }
    Ok(())
}
