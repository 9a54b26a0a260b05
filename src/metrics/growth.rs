// src/metrics/growth.rs

//! Percentage-change metrics. Every undefined result (no prior row, zero or
//! missing base, too few points) is `None`, never zero and never infinite.

use serde::Serialize;

use crate::extractors::fields::{FieldRecord, YEAR};
use crate::table::{Column, Table};
use crate::utils::error::{ConfigError, TableError};

/// Growth metrics for one numeric column, aligned with the table's rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthSeries {
    pub column: String,
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
    /// `per_row[0]` is always `None`.
    pub per_row: Vec<Option<f64>>,
    /// Growth of each row against the first non-missing value.
    pub cumulative: Vec<Option<f64>>,
    pub average_growth: Option<f64>,
    pub total_growth: Option<f64>,
}

impl GrowthSeries {
    pub fn from_values(column: impl Into<String>, labels: Vec<String>, values: Vec<Option<f64>>) -> Self {
        let per_row = per_row_growth(&values);
        let base = values.iter().flatten().next().copied();
        let cumulative = values
            .iter()
            .map(|&v| percent_change(base, v))
            .collect();

        Self {
            column: column.into(),
            average_growth: average_growth(&per_row),
            total_growth: total_growth(&values),
            labels,
            values,
            per_row,
            cumulative,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First and last non-missing values with their labels.
    pub fn endpoints(&self) -> Option<((&str, f64), (&str, f64))> {
        let mut present = self
            .values
            .iter()
            .zip(&self.labels)
            .filter_map(|(v, label)| v.map(|v| (label.as_str(), v)));
        let first = present.next()?;
        let last = present.last()?;
        Some((first, last))
    }
}

/// `(current - previous) / previous * 100`, guarded against zero or missing operands.
pub fn percent_change(previous: Option<f64>, current: Option<f64>) -> Option<f64> {
    let (previous, current) = (previous?, current?);
    if previous == 0.0 {
        return None;
    }
    let change = (current - previous) / previous * 100.0;
    change.is_finite().then_some(change)
}

pub fn per_row_growth(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(values.windows(2).map(|pair| percent_change(pair[0], pair[1])));
    out
}

/// Mean of the defined per-row growth values.
pub fn average_growth(per_row: &[Option<f64>]) -> Option<f64> {
    let defined: Vec<f64> = per_row.iter().flatten().copied().collect();
    if defined.is_empty() {
        return None;
    }
    Some(defined.iter().sum::<f64>() / defined.len() as f64)
}

/// Growth from the first to the last non-missing value.
pub fn total_growth(values: &[Option<f64>]) -> Option<f64> {
    let mut present = values.iter().flatten().copied();
    let first = present.next()?;
    let last = present.last()?;
    percent_change(Some(first), Some(last))
}

/// Computes one series per selected column, in selection order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrowthCalculator;

impl GrowthCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, table: &Table, columns: &[String]) -> Result<Vec<GrowthSeries>, ConfigError> {
        let labels = table.row_labels();
        columns
            .iter()
            .map(|name| {
                let values = match table.numeric(name) {
                    Some(values) => values.to_vec(),
                    None if table.column(name).is_some() => {
                        return Err(ConfigError::NotNumeric(name.clone()))
                    }
                    None => return Err(ConfigError::UnknownColumn(name.clone())),
                };
                let series = GrowthSeries::from_values(name.clone(), labels.clone(), values);
                tracing::debug!(
                    "Growth for '{}': total {:?}, average {:?}",
                    name,
                    series.total_growth,
                    series.average_growth
                );
                Ok(series)
            })
            .collect()
    }
}

/// Builds a Year-axis table out of per-document field records. Records
/// without a Year are left out. Rows are sorted by year; when several records
/// share a year only the first one is kept.
pub fn records_to_table(records: &[FieldRecord], fields: &[String]) -> Result<Table, TableError> {
    let mut dated: Vec<(i64, &FieldRecord)> = records
        .iter()
        .filter_map(|r| r.get(YEAR).map(|y| (y.as_f64() as i64, r)))
        .collect();
    dated.sort_by_key(|(year, _)| *year);
    let before = dated.len();
    dated.dedup_by_key(|(year, _)| *year);
    if dated.len() < before {
        tracing::warn!("Ignored {} records for an already seen year", before - dated.len());
    }

    let mut columns = vec![Column::numeric(
        YEAR,
        dated.iter().map(|(year, _)| Some(*year as f64)).collect(),
    )];
    for field in fields.iter().filter(|f| f.as_str() != YEAR) {
        columns.push(Column::numeric(
            field.clone(),
            dated.iter().map(|(_, r)| r.get(field).map(|v| v.as_f64())).collect(),
        ));
    }

    let mut table = Table::new(columns)?;
    table.set_axis(YEAR);
    Ok(table)
}

/// Growth of one field across documents of different years.
///
/// With a single document there is no second data point, so the result is
/// `None` ("not available") rather than a computed zero.
pub fn scalar_growth(records: &[FieldRecord], field: &str) -> Option<f64> {
    let table = records_to_table(records, &[field.to_string()]).ok()?;
    let values = table.numeric(field)?;
    total_growth(values)
}
