// src/table/mod.rs
pub mod coerce;
pub mod normalize;

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::utils::error::TableError;

pub use normalize::{NormalizedTable, Normalizer};

/// Header row plus string cells, straight out of a reader.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Datetime,
    Text,
}

/// Cells of one column. `None` is a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Datetime(Vec<Option<NaiveDateTime>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Datetime(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Datetime(_) => ColumnKind::Datetime,
            ColumnData::Text(_) => ColumnKind::Text,
        }
    }

    /// Reorders (and possibly subsets) rows by index.
    pub(crate) fn select_rows(&self, order: &[usize]) -> ColumnData {
        fn pick<T: Clone>(v: &[T], order: &[usize]) -> Vec<T> {
            order.iter().map(|&i| v[i].clone()).collect()
        }
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(pick(v, order)),
            ColumnData::Datetime(v) => ColumnData::Datetime(pick(v, order)),
            ColumnData::Text(v) => ColumnData::Text(pick(v, order)),
        }
    }

    /// Display form of one cell; empty for missing.
    pub fn display(&self, row: usize) -> String {
        match self {
            ColumnData::Numeric(v) => v[row].map(format_number).unwrap_or_default(),
            ColumnData::Datetime(v) => v[row].map(format_datetime).unwrap_or_default(),
            ColumnData::Text(v) => v[row].clone().unwrap_or_default(),
        }
    }
}

pub fn format_number(value: f64) -> String {
    format!("{value}")
}

pub fn format_datetime(value: NaiveDateTime) -> String {
    if value.time() == chrono::NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Text(values))
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }
}

/// Named, equal-length columns with at most one ordering axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    axis: Option<usize>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }
        if let Some(first) = columns.first() {
            let expected = first.data.len();
            if let Some(bad) = columns.iter().find(|c| c.data.len() != expected) {
                return Err(TableError::LengthMismatch {
                    column: bad.name.clone(),
                    expected,
                    found: bad.data.len(),
                });
            }
        }
        Ok(Self {
            columns,
            axis: None,
        })
    }

    /// Builds all-text columns from raw reader output. Missing cells in short
    /// rows become gaps; cells beyond the header width are ignored.
    pub(crate) fn text_columns(headers: Vec<String>, rows: &[Vec<String>]) -> Vec<Column> {
        headers
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells = rows
                    .iter()
                    .map(|row| row.get(idx).cloned())
                    .collect();
                Column::text(name, cells)
            })
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|idx| &self.columns[idx])
    }

    pub fn numeric(&self, name: &str) -> Option<&[Option<f64>]> {
        match &self.column(name)?.data {
            ColumnData::Numeric(values) => Some(values),
            _ => None,
        }
    }

    pub fn axis(&self) -> Option<&Column> {
        self.axis.map(|idx| &self.columns[idx])
    }

    pub(crate) fn axis_index(&self) -> Option<usize> {
        self.axis
    }

    pub fn axis_name(&self) -> Option<&str> {
        self.axis().map(|c| c.name.as_str())
    }

    /// Designates the ordering axis. Returns false if no such column exists.
    pub fn set_axis(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.axis = Some(idx);
                true
            }
            None => false,
        }
    }

    /// Row labels for reports: axis values when an axis exists, else 1-based row numbers.
    pub fn row_labels(&self) -> Vec<String> {
        match self.axis() {
            Some(axis) => (0..self.row_count()).map(|row| axis.data.display(row)).collect(),
            None => (1..=self.row_count()).map(|row| format!("row {row}")).collect(),
        }
    }

    pub(crate) fn select_rows(&mut self, order: &[usize]) {
        for column in &mut self.columns {
            column.data = column.data.select_rows(order);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let err = Table::new(vec![
            Column::numeric("Revenue", vec![Some(1.0)]),
            Column::numeric("Revenue", vec![Some(2.0)]),
        ])
        .unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("Revenue".into()));
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let err = Table::new(vec![
            Column::numeric("A", vec![Some(1.0), Some(2.0)]),
            Column::numeric("B", vec![Some(1.0)]),
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_text_columns_pad_short_rows() {
        let rows = vec![vec!["a".to_string()], vec!["b".to_string(), "c".to_string(), "x".to_string()]];
        let columns = Table::text_columns(vec!["H1".into(), "H2".into()], &rows);
        assert_eq!(columns[0].data, ColumnData::Text(vec![Some("a".into()), Some("b".into())]));
        assert_eq!(columns[1].data, ColumnData::Text(vec![None, Some("c".into())]));
    }

    #[test]
    fn test_row_labels_follow_axis() {
        let mut table = Table::new(vec![
            Column::new("Date", ColumnData::Datetime(vec![Some(date(2021, 1, 1)), None])),
            Column::numeric("Revenue", vec![Some(100.0), Some(150.5)]),
        ])
        .unwrap();
        assert_eq!(table.row_labels(), vec!["row 1", "row 2"]);
        assert!(table.set_axis("Date"));
        assert!(!table.set_axis("Missing"));
        assert_eq!(table.row_labels(), vec!["2021-01-01", ""]);
        assert_eq!(table.column("Revenue").unwrap().data.display(1), "150.5");
    }

    #[test]
    fn test_select_rows_reorders_every_column() {
        let mut table = Table::new(vec![
            Column::numeric("A", vec![Some(1.0), Some(2.0), Some(3.0)]),
            Column::text("B", vec![Some("x".into()), None, Some("z".into())]),
        ])
        .unwrap();
        table.select_rows(&[2, 0]);
        assert_eq!(table.numeric("A").unwrap(), &[Some(3.0), Some(1.0)]);
        assert_eq!(table.row_count(), 2);
    }
}
