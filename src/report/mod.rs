// src/report/mod.rs

//! Builds the ordered section list handed to a renderer. Bodies are plain
//! text; markup and layout belong to whoever renders them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extractors::fields::{FieldRecord, YEAR};
use crate::metrics::GrowthSeries;
use crate::table::NormalizedTable;

pub const NOT_AVAILABLE: &str = "N/A";
pub const DEFAULT_TITLE: &str = "Financial Analysis Report";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportContent {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<ReportSection>,
}

impl ReportContent {
    pub fn section(&self, title: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    pub fn section_titles(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.title.as_str()).collect()
    }
}

/// Two decimals, or `N/A` when undefined.
pub fn format_percent(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}%"))
}

pub fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}"))
}

#[derive(Debug, Clone)]
pub struct ReportAssembler {
    title: String,
    source: Option<String>,
    generated_at: DateTime<Utc>,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            source: None,
            generated_at: Utc::now(),
        }
    }
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(source) = &self.source {
            lines.push(format!("Source: {source}"));
        }
        lines.push(format!("Date: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S")));
        lines
    }

    fn finish(&self, sections: Vec<ReportSection>) -> ReportContent {
        ReportContent {
            title: self.title.clone(),
            generated_at: self.generated_at,
            sections,
        }
    }

    /// Overview, one section per series in the given order, then Summary.
    pub fn tabular(&self, normalized: &NormalizedTable, series: &[GrowthSeries]) -> ReportContent {
        let table = &normalized.table;
        let mut overview = self.header_lines();
        overview.push(format!("Rows analyzed: {}", table.row_count()));

        match table.axis_name() {
            Some(axis) => {
                if normalized.dropped_rows > 0 {
                    overview.push(format!(
                        "Rows dropped (unparsable {axis}): {}",
                        normalized.dropped_rows
                    ));
                }
                let labels = table.row_labels();
                match (labels.first(), labels.last()) {
                    (Some(first), Some(last)) => {
                        overview.push(format!("Range: {axis} from {first} to {last}"))
                    }
                    _ => overview.push(format!("Range: {axis} (no rows)")),
                }
            }
            None => overview.push("Ordering: document row order".to_string()),
        }

        let analyzed: Vec<&str> = series.iter().map(|s| s.column.as_str()).collect();
        overview.push(if analyzed.is_empty() {
            "Columns analyzed: none".to_string()
        } else {
            format!("Columns analyzed: {}", analyzed.join(", "))
        });

        let mut sections = vec![ReportSection {
            title: "Overview".to_string(),
            body: overview.join("\n"),
        }];
        sections.extend(series.iter().map(series_section));
        sections.push(ReportSection {
            title: "Summary".to_string(),
            body: tabular_summary(series),
        });
        self.finish(sections)
    }

    /// Report for a single document's extracted fields.
    pub fn scalar(&self, record: &FieldRecord, fields: &[String], growth: Option<f64>) -> ReportContent {
        let found: Vec<&str> = fields
            .iter()
            .filter(|f| record.contains(f))
            .map(String::as_str)
            .collect();

        let mut overview = self.header_lines();
        overview.push(format!("Fields found: {} of {}", found.len(), fields.len()));
        if !found.is_empty() {
            overview.push(format!("Found: {}", found.join(", ")));
        }

        let mut sections = vec![ReportSection {
            title: "Overview".to_string(),
            body: overview.join("\n"),
        }];
        for field in fields {
            let body = match record.get(field) {
                Some(value) => format!("{field}: {value}"),
                None => format!("{field}: {NOT_AVAILABLE} (not found in document)"),
            };
            sections.push(ReportSection {
                title: field.clone(),
                body,
            });
        }

        let mut summary = Vec::new();
        match growth {
            Some(g) => summary.push(format!("Growth: {}", format_percent(Some(g)))),
            None => summary.push(format!(
                "Growth: {NOT_AVAILABLE} (a single document holds one year of data; growth needs at least two)"
            )),
        }
        summary.push(format!(
            "Year of Report: {}",
            record
                .get(YEAR)
                .map_or_else(|| NOT_AVAILABLE.to_string(), |y| y.to_string())
        ));
        sections.push(ReportSection {
            title: "Summary".to_string(),
            body: summary.join("\n"),
        });
        self.finish(sections)
    }
}

fn series_section(series: &GrowthSeries) -> ReportSection {
    let mut lines: Vec<String> = series
        .labels
        .iter()
        .zip(series.values.iter().zip(&series.per_row))
        .map(|(label, (value, growth))| {
            format!("{label}: {} (growth {})", format_value(*value), format_percent(*growth))
        })
        .collect();
    if lines.is_empty() {
        lines.push("No rows to analyze.".to_string());
    }
    lines.push(format!("Average growth: {}", format_percent(series.average_growth)));
    lines.push(format!("Total growth: {}", format_percent(series.total_growth)));

    ReportSection {
        title: series.column.clone(),
        body: lines.join("\n"),
    }
}

fn tabular_summary(series: &[GrowthSeries]) -> String {
    if series.is_empty() {
        return "No numeric columns were analyzed.".to_string();
    }

    let mut lines = Vec::new();
    let mut defined: Vec<(&str, f64)> = Vec::new();
    let mut unavailable: Vec<&str> = Vec::new();

    for s in series {
        match (s.total_growth, s.endpoints()) {
            (Some(total), Some(((first_label, first), (last_label, last)))) => {
                lines.push(format!(
                    "{} changed by {} from {:.2} ({}) to {:.2} ({}).",
                    s.column,
                    format_percent(Some(total)),
                    first,
                    first_label,
                    last,
                    last_label
                ));
                defined.push((s.column.as_str(), total));
            }
            _ => unavailable.push(s.column.as_str()),
        }
    }

    if defined.len() >= 2 {
        let best = defined.iter().max_by(|a, b| a.1.total_cmp(&b.1));
        let worst = defined.iter().min_by(|a, b| a.1.total_cmp(&b.1));
        if let (Some(best), Some(worst)) = (best, worst) {
            lines.push(format!("Strongest total growth: {} ({})", best.0, format_percent(Some(best.1))));
            lines.push(format!("Weakest total growth: {} ({})", worst.0, format_percent(Some(worst.1))));
        }
    }
    if !unavailable.is_empty() {
        lines.push(format!(
            "Total growth {NOT_AVAILABLE} for: {} (fewer than two values or a zero starting value)",
            unavailable.join(", ")
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::fields::{FieldValue, PROFIT, REVENUE};
    use crate::table::{Column, Table};
    use chrono::TimeZone;

    fn assembler() -> ReportAssembler {
        ReportAssembler::new()
            .with_source("q.csv")
            .with_generated_at(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap())
    }

    fn normalized(years: &[f64], revenue: &[Option<f64>], dropped: usize) -> NormalizedTable {
        let mut table = Table::new(vec![
            Column::numeric("Year", years.iter().map(|y| Some(*y)).collect()),
            Column::numeric("Revenue", revenue.to_vec()),
        ])
        .unwrap();
        table.set_axis("Year");
        NormalizedTable {
            table,
            numeric_columns: vec!["Revenue".into()],
            dropped_rows: dropped,
        }
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_percent(Some(50.0)), "50.00%");
        assert_eq!(format_percent(Some(-3.14159)), "-3.14%");
        assert_eq!(format_percent(None), "N/A");
        assert_eq!(format_value(Some(1234.5)), "1234.50");
        assert_eq!(format_value(None), "N/A");
    }

    #[test]
    fn test_tabular_section_order_and_bodies() {
        let n = normalized(&[2021.0, 2022.0], &[Some(100.0), Some(150.0)], 1);
        let labels = n.table.row_labels();
        let profit = GrowthSeries::from_values("Profit", labels.clone(), vec![Some(10.0), Some(5.0)]);
        let revenue = GrowthSeries::from_values("Revenue", labels, vec![Some(100.0), Some(150.0)]);

        let report = assembler().tabular(&n, &[revenue, profit]);
        assert_eq!(report.title, DEFAULT_TITLE);
        assert_eq!(report.section_titles(), vec!["Overview", "Revenue", "Profit", "Summary"]);

        let overview = &report.section("Overview").unwrap().body;
        assert!(overview.contains("Source: q.csv"));
        assert!(overview.contains("Date: 2024-03-01 09:30:00"));
        assert!(overview.contains("Rows dropped (unparsable Year): 1"));
        assert!(overview.contains("Range: Year from 2021 to 2022"));

        let body = &report.section("Revenue").unwrap().body;
        assert_eq!(
            body,
            "2021: 100.00 (growth N/A)\n\
             2022: 150.00 (growth 50.00%)\n\
             Average growth: 50.00%\n\
             Total growth: 50.00%"
        );

        let summary = &report.section("Summary").unwrap().body;
        assert!(summary.contains("Revenue changed by 50.00% from 100.00 (2021) to 150.00 (2022)."));
        assert!(summary.contains("Strongest total growth: Revenue (50.00%)"));
        assert!(summary.contains("Weakest total growth: Profit (-50.00%)"));
    }

    #[test]
    fn test_single_row_reports_not_available() {
        let n = normalized(&[2021.0], &[Some(100.0)], 0);
        let s = GrowthSeries::from_values("Revenue", n.table.row_labels(), vec![Some(100.0)]);
        let report = assembler().tabular(&n, &[s]);
        let body = &report.section("Revenue").unwrap().body;
        assert!(body.contains("Average growth: N/A"));
        assert!(body.contains("Total growth: N/A"));
        assert!(report.section("Summary").unwrap().body.contains("Total growth N/A for: Revenue"));
    }

    #[test]
    fn test_empty_table_report() {
        let n = normalized(&[], &[], 0);
        let s = GrowthSeries::from_values("Revenue", vec![], vec![]);
        let report = assembler().tabular(&n, &[s]);
        assert!(report.section("Overview").unwrap().body.contains("Range: Year (no rows)"));
        assert!(report.section("Revenue").unwrap().body.starts_with("No rows to analyze."));
    }

    #[test]
    fn test_scalar_report_marks_missing_fields() {
        let mut record = FieldRecord::new();
        record.insert_first(PROFIT, FieldValue::Float(500.0));
        let fields = vec![REVENUE.to_string(), PROFIT.to_string(), YEAR.to_string()];

        let report = assembler().scalar(&record, &fields, None);
        assert_eq!(report.section_titles(), vec!["Overview", "Revenue", "Profit", "Year", "Summary"]);
        assert!(report.section("Overview").unwrap().body.contains("Fields found: 1 of 3"));
        assert_eq!(report.section("Revenue").unwrap().body, "Revenue: N/A (not found in document)");
        assert_eq!(report.section("Profit").unwrap().body, "Profit: 500.00");

        let summary = &report.section("Summary").unwrap().body;
        assert!(summary.starts_with("Growth: N/A"));
        assert!(summary.contains("Year of Report: N/A"));
        assert!(!summary.contains("0.00%"));
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let report = assembler().scalar(&FieldRecord::new(), &[], Some(12.5));
        let json = serde_json::to_string(&report).unwrap();
        let back: ReportContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
        assert!(back.section("Summary").unwrap().body.contains("Growth: 12.50%"));
    }
}
