// src/table/normalize.rs
use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;

use super::coerce::{is_missing, parse_datetime, parse_number};
use super::{Column, ColumnData, RawTable, Table};
use crate::utils::error::{AppError, ConfigError};

/// A cleaned table plus the columns classified as numeric (axis excluded).
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub table: Table,
    pub numeric_columns: Vec<String>,
    /// Rows removed because their axis value did not parse.
    pub dropped_rows: usize,
}

/// Cleans headers, infers column types and orders rows by the axis column.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    label_map: BTreeMap<String, String>,
    axis: Option<String>,
    numeric: Vec<String>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source header -> canonical column name, applied after trimming.
    pub fn with_label_map(mut self, label_map: BTreeMap<String, String>) -> Self {
        self.label_map = label_map;
        self
    }

    pub fn with_axis(mut self, axis: Option<String>) -> Self {
        self.axis = axis;
        self
    }

    /// Columns forced to numeric; unparsable cells in them become gaps.
    pub fn with_numeric_columns(mut self, numeric: Vec<String>) -> Self {
        self.numeric = numeric;
        self
    }

    pub fn normalize_raw(&self, raw: RawTable) -> Result<NormalizedTable, AppError> {
        let headers = self.clean_headers(raw.headers.iter().map(String::as_str));
        let table = Table::new(Table::text_columns(headers, &raw.rows))?;
        Ok(self.normalize_cleaned(table)?)
    }

    pub fn normalize(&self, mut table: Table) -> Result<NormalizedTable, ConfigError> {
        let cleaned = self.clean_headers(table.columns().iter().map(|c| c.name.as_str()));
        for (column, name) in table.columns_mut().iter_mut().zip(cleaned) {
            column.name = name;
        }
        self.normalize_cleaned(table)
    }

    /// Everything after header cleaning. Headers are mapped exactly once.
    fn normalize_cleaned(&self, mut table: Table) -> Result<NormalizedTable, ConfigError> {
        if let Some(axis) = &self.axis {
            if !table.set_axis(axis) {
                return Err(ConfigError::UnknownColumn(axis.clone()));
            }
        }
        let axis_idx = table.axis_index();

        for name in &self.numeric {
            let idx = table
                .position(name)
                .ok_or_else(|| ConfigError::UnknownColumn(name.clone()))?;
            if Some(idx) == axis_idx {
                continue;
            }
            let column = &mut table.columns_mut()[idx];
            coerce_numeric(column)?;
        }

        for (idx, column) in table.columns_mut().iter_mut().enumerate() {
            if Some(idx) != axis_idx {
                infer_numeric(column);
            }
        }

        let dropped_rows = match axis_idx {
            Some(idx) => order_by_axis(&mut table, idx),
            None => 0,
        };

        let numeric_columns = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(idx, c)| Some(*idx) != axis_idx && matches!(c.data, ColumnData::Numeric(_)))
            .map(|(_, c)| c.name.clone())
            .collect();

        tracing::debug!(
            "Normalized table: {} rows, {} columns, {} dropped",
            table.row_count(),
            table.column_count(),
            dropped_rows
        );
        Ok(NormalizedTable {
            table,
            numeric_columns,
            dropped_rows,
        })
    }

    /// Trims, applies the label map, then de-duplicates as `name.1`, `name.2`.
    fn clean_headers<'a>(&self, headers: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        headers
            .map(|raw| {
                let trimmed = raw.trim();
                let name = self
                    .label_map
                    .get(trimmed)
                    .cloned()
                    .unwrap_or_else(|| trimmed.to_string());
                let mut unique = name.clone();
                let mut n = 1;
                while seen.contains(&unique) {
                    unique = format!("{name}.{n}");
                    n += 1;
                }
                if unique != name {
                    tracing::warn!("Duplicate column '{}' renamed to '{}'", name, unique);
                }
                seen.insert(unique.clone());
                unique
            })
            .collect()
    }
}

fn coerce_numeric(column: &mut Column) -> Result<(), ConfigError> {
    let values = match &column.data {
        ColumnData::Numeric(_) => return Ok(()),
        ColumnData::Datetime(_) => return Err(ConfigError::NotNumeric(column.name.clone())),
        ColumnData::Text(cells) => cells
            .iter()
            .map(|cell| cell.as_deref().and_then(parse_number))
            .collect::<Vec<_>>(),
    };
    let gaps = values.iter().filter(|v| v.is_none()).count();
    if gaps > 0 {
        tracing::debug!("Column '{}': {} cells coerced to missing", column.name, gaps);
    }
    column.data = ColumnData::Numeric(values);
    Ok(())
}

/// Promotes a text column to numeric when every present cell is a number.
fn infer_numeric(column: &mut Column) {
    let ColumnData::Text(cells) = &column.data else {
        return;
    };
    let present: Vec<&str> = cells
        .iter()
        .flatten()
        .map(String::as_str)
        .filter(|cell| !is_missing(cell))
        .collect();
    if present.is_empty() || !present.iter().all(|cell| parse_number(cell).is_some()) {
        return;
    }
    let values = cells
        .iter()
        .map(|cell| cell.as_deref().and_then(parse_number))
        .collect();
    tracing::debug!("Column '{}' inferred numeric", column.name);
    column.data = ColumnData::Numeric(values);
}

/// Converts a text axis to ordinal (numeric) or datetime, whichever parses more cells.
fn parse_axis(column: &mut Column) {
    let ColumnData::Text(cells) = &column.data else {
        return;
    };
    let numbers: Vec<Option<f64>> = cells.iter().map(|c| c.as_deref().and_then(parse_number)).collect();
    let dates: Vec<Option<NaiveDateTime>> =
        cells.iter().map(|c| c.as_deref().and_then(parse_datetime)).collect();

    let number_hits = numbers.iter().flatten().count();
    let date_hits = dates.iter().flatten().count();
    column.data = if number_hits > 0 && number_hits >= date_hits {
        tracing::debug!("Axis '{}' parsed as ordinal", column.name);
        ColumnData::Numeric(numbers)
    } else {
        tracing::debug!("Axis '{}' parsed as dates", column.name);
        ColumnData::Datetime(dates)
    };
}

/// Drops rows whose axis failed to parse and stable-sorts ascending. Returns rows dropped.
fn order_by_axis(table: &mut Table, axis_idx: usize) -> usize {
    parse_axis(&mut table.columns_mut()[axis_idx]);

    let order: Vec<usize> = match &table.columns()[axis_idx].data {
        ColumnData::Numeric(keys) => {
            let mut order: Vec<usize> = (0..keys.len()).filter(|&i| keys[i].is_some()).collect();
            order.sort_by(|&a, &b| {
                let (ka, kb) = (keys[a].unwrap_or_default(), keys[b].unwrap_or_default());
                ka.total_cmp(&kb)
            });
            order
        }
        ColumnData::Datetime(keys) => {
            let mut order: Vec<usize> = (0..keys.len()).filter(|&i| keys[i].is_some()).collect();
            order.sort_by_key(|&i| keys[i]);
            order
        }
        ColumnData::Text(_) => (0..table.row_count()).collect(),
    };

    let dropped = table.row_count() - order.len();
    if dropped > 0 {
        let axis_name = &table.columns()[axis_idx].name;
        tracing::warn!("Dropped {} rows with unparsable '{}' values", dropped, axis_name);
    }
    if order.iter().enumerate().any(|(pos, &idx)| pos != idx) || dropped > 0 {
        table.select_rows(&order);
    }
    dropped
}
