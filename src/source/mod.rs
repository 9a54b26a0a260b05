// src/source/mod.rs
pub mod pdf;
pub mod tabular;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::table::RawTable;
use crate::utils::error::SourceError;

/// Declared format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    PdfText,
    PdfTable,
    Csv,
    Spreadsheet,
}

/// How a `.pdf` file should be read when the kind is inferred from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PdfMode {
    #[default]
    Text,
    Table,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::PdfText => "pdf-text",
            DocumentKind::PdfTable => "pdf-table",
            DocumentKind::Csv => "csv",
            DocumentKind::Spreadsheet => "spreadsheet",
        }
    }

    /// Infers the kind from a file extension.
    pub fn from_path(path: &Path, pdf_mode: PdfMode) -> Result<Self, SourceError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| {
                SourceError::UnsupportedFormat(format!("{} has no file extension", path.display()))
            })?;

        match ext.as_str() {
            "pdf" => Ok(match pdf_mode {
                PdfMode::Text => DocumentKind::PdfText,
                PdfMode::Table => DocumentKind::PdfTable,
            }),
            "csv" => Ok(DocumentKind::Csv),
            "xlsx" | "xlsm" | "xls" => Ok(DocumentKind::Spreadsheet),
            other => Err(SourceError::UnsupportedFormat(format!(".{other}"))),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf-text" => Ok(DocumentKind::PdfText),
            "pdf-table" => Ok(DocumentKind::PdfTable),
            "csv" => Ok(DocumentKind::Csv),
            "spreadsheet" => Ok(DocumentKind::Spreadsheet),
            other => Err(SourceError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Opaque source bytes plus their declared kind.
#[derive(Debug, Clone)]
pub struct RawDocument {
    kind: DocumentKind,
    name: String,
    bytes: Vec<u8>,
}

/// What a reader produced: free text or a header + rows table.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Text(String),
    Table(RawTable),
}

impl RawDocument {
    pub fn from_bytes(kind: DocumentKind, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            name: name.into(),
            bytes,
        }
    }

    /// Reads the whole file once; the handle is closed before returning.
    pub fn open<P: AsRef<Path>>(path: P, kind: DocumentKind) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Self::from_bytes(kind, path.display().to_string(), bytes))
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Dispatches to the reader for this document's kind.
    pub fn extract(&self) -> Result<Extracted, SourceError> {
        tracing::info!("Extracting {} ({}, {} bytes)", self.name, self.kind, self.bytes.len());
        match self.kind {
            DocumentKind::PdfText => pdf::extract_text(&self.bytes).map(Extracted::Text),
            DocumentKind::PdfTable => pdf::extract_first_table(&self.bytes).map(Extracted::Table),
            DocumentKind::Csv => tabular::read_csv(&self.bytes).map(Extracted::Table),
            DocumentKind::Spreadsheet => tabular::read_spreadsheet(&self.bytes).map(Extracted::Table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_kind_from_extension() {
        let pdf = PathBuf::from("report.PDF");
        assert_eq!(DocumentKind::from_path(&pdf, PdfMode::Text).unwrap(), DocumentKind::PdfText);
        assert_eq!(DocumentKind::from_path(&pdf, PdfMode::Table).unwrap(), DocumentKind::PdfTable);
        assert_eq!(
            DocumentKind::from_path(Path::new("q.xlsx"), PdfMode::Text).unwrap(),
            DocumentKind::Spreadsheet
        );
        assert!(matches!(
            DocumentKind::from_path(Path::new("notes.docx"), PdfMode::Text),
            Err(SourceError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            DocumentKind::from_path(Path::new("README"), PdfMode::Text),
            Err(SourceError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("pdf-table".parse::<DocumentKind>().unwrap(), DocumentKind::PdfTable);
        assert_eq!(" CSV ".parse::<DocumentKind>().unwrap(), DocumentKind::Csv);
        assert!("docx".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn test_open_reads_file_and_extracts_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "Date,Revenue\n2021-01-01,100\n").unwrap();

        let doc = RawDocument::open(file.path(), DocumentKind::Csv).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Csv);
        match doc.extract().unwrap() {
            Extracted::Table(raw) => {
                assert_eq!(raw.headers, vec!["Date", "Revenue"]);
                assert_eq!(raw.rows.len(), 1);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let err = RawDocument::open("/definitely/not/here.csv", DocumentKind::Csv).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
