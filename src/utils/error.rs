// src/utils/error.rs
use thiserror::Error;

// Source-level failures: fatal, abort the run
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Could not read source document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("No table found in PDF ({pages} pages scanned)")]
    NoTableFound { pages: usize },

    #[error("Unparsable {kind} content: {reason}")]
    Format { kind: &'static str, reason: String },

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
}

/// One malformed label/value pair. Recoverable: the line is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line_no}: could not parse {label} value '{raw}': {reason}")]
pub struct FieldParseError {
    pub line_no: usize,
    pub label: String,
    pub raw: String,
    pub reason: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Column '{0}' does not exist in the table")]
    UnknownColumn(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("Invalid label mapping '{0}'")]
    InvalidLabelMapping(String),

    #[error("Could not read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Could not parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("PDF rendering error: {0}")]
    RenderError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
