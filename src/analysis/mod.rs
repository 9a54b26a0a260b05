// src/analysis/mod.rs

//! One document in, one report out. Each call is independent: nothing is
//! cached between runs, so runs may proceed on separate threads.

use crate::config::AnalysisConfig;
use crate::extractors::fields::REVENUE;
use crate::extractors::{FieldExtractor, FieldRecord};
use crate::metrics::{scalar_growth, GrowthCalculator, GrowthSeries};
use crate::report::{ReportAssembler, ReportContent};
use crate::source::{Extracted, RawDocument};
use crate::table::{NormalizedTable, Normalizer, RawTable};
use crate::utils::error::{AppError, FieldParseError};

#[derive(Debug, Clone)]
pub enum Analysis {
    /// A table was read: growth per selected column.
    Tabular {
        normalized: NormalizedTable,
        series: Vec<GrowthSeries>,
        report: ReportContent,
    },
    /// Free text was read: labeled fields and a single growth figure.
    Scalar {
        record: FieldRecord,
        skipped: Vec<FieldParseError>,
        growth: Option<f64>,
        report: ReportContent,
    },
}

impl Analysis {
    pub fn report(&self) -> &ReportContent {
        match self {
            Analysis::Tabular { report, .. } | Analysis::Scalar { report, .. } => report,
        }
    }

    pub fn into_report(self) -> ReportContent {
        match self {
            Analysis::Tabular { report, .. } | Analysis::Scalar { report, .. } => report,
        }
    }
}

pub fn analyze(document: &RawDocument, config: &AnalysisConfig) -> Result<Analysis, AppError> {
    let assembler = ReportAssembler::new().with_source(format!("{} ({})", document.name(), document.kind()));
    analyze_with(document, config, &assembler)
}

pub fn analyze_with(
    document: &RawDocument,
    config: &AnalysisConfig,
    assembler: &ReportAssembler,
) -> Result<Analysis, AppError> {
    config.validate()?;
    analyze_extracted(document.extract()?, config, assembler)
}

/// Analysis of content that was already pulled out of its document.
pub fn analyze_extracted(
    extracted: Extracted,
    config: &AnalysisConfig,
    assembler: &ReportAssembler,
) -> Result<Analysis, AppError> {
    match extracted {
        Extracted::Text(text) => Ok(analyze_text(&text, config, assembler)),
        Extracted::Table(raw) => analyze_table(raw, config, assembler),
    }
}

/// Scalar mode. Growth is revenue growth, which a single document cannot define.
pub fn analyze_text(text: &str, config: &AnalysisConfig, assembler: &ReportAssembler) -> Analysis {
    let extractor = FieldExtractor::new().with_aliases(&config.field_label_map);
    let extraction = extractor.extract_detailed(text);

    let fields = if config.numeric_columns.is_empty() {
        extractor.fields()
    } else {
        config.numeric_columns.clone()
    };
    let growth = scalar_growth(std::slice::from_ref(&extraction.record), REVENUE);
    if growth.is_none() {
        tracing::info!("Growth not available: only one document's figures are known");
    }

    let report = assembler.scalar(&extraction.record, &fields, growth);
    Analysis::Scalar {
        record: extraction.record,
        skipped: extraction.skipped,
        growth,
        report,
    }
}

pub fn analyze_table(
    raw: RawTable,
    config: &AnalysisConfig,
    assembler: &ReportAssembler,
) -> Result<Analysis, AppError> {
    let normalizer = Normalizer::new()
        .with_label_map(config.field_label_map.clone())
        .with_axis(config.date_column.clone())
        .with_numeric_columns(config.numeric_columns.clone());
    let normalized = normalizer.normalize_raw(raw)?;

    let columns = if config.numeric_columns.is_empty() {
        normalized.numeric_columns.clone()
    } else {
        config.numeric_columns.clone()
    };
    tracing::info!("Computing growth for {} columns", columns.len());
    let series = GrowthCalculator::new().compute(&normalized.table, &columns)?;

    let report = assembler.tabular(&normalized, &series);
    Ok(Analysis::Tabular {
        normalized,
        series,
        report,
    })
}
