// src/source/pdf.rs

//! PDF readers built on the document's text layer.
//!
//! There is no positional layout available from `lopdf` text extraction, so
//! table detection works on whitespace alignment: tabs or runs of two or more
//! spaces are treated as column boundaries.

use lopdf::Document;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::table::RawTable;
use crate::utils::error::SourceError;

// Column boundary inside a text line
static CELL_SPLIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\t+|\s{2,}").expect("Failed to compile CELL_SPLIT_RE")
});

const MIN_TABLE_LINES: usize = 2;
const MIN_TABLE_COLUMNS: usize = 2;

fn load(bytes: &[u8]) -> Result<Document, SourceError> {
    Document::load_mem(bytes)
        .map_err(|e| SourceError::Extraction(format!("failed to load PDF: {e}")))
}

/// Text of each page, in page order. Pages that fail to decode come back empty.
fn page_texts(document: &Document) -> Vec<String> {
    document
        .get_pages()
        .keys()
        .map(|&page_number| match document.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Could not extract text from page {}: {}", page_number, e);
                String::new()
            }
        })
        .collect()
}

/// Concatenates the text of every page, page N before page N+1.
pub fn extract_text(bytes: &[u8]) -> Result<String, SourceError> {
    let document = load(bytes)?;
    let pages = page_texts(&document);
    tracing::debug!("Extracted text layer from {} pages", pages.len());

    let combined = pages.join("\n");
    if combined.trim().is_empty() {
        return Err(SourceError::Extraction(
            "document has no extractable text layer".to_string(),
        ));
    }
    Ok(combined)
}

/// Scans pages in order and returns the first table found.
pub fn extract_first_table(bytes: &[u8]) -> Result<RawTable, SourceError> {
    let document = load(bytes)?;
    let pages = page_texts(&document);

    for (idx, text) in pages.iter().enumerate() {
        if let Some(table) = detect_table(text) {
            tracing::info!(
                "Found table on page {} ({} columns, {} data rows)",
                idx + 1,
                table.headers.len(),
                table.rows.len()
            );
            return Ok(table);
        }
        tracing::debug!("No table on page {}", idx + 1);
    }

    Err(SourceError::NoTableFound { pages: pages.len() })
}

pub(crate) fn split_cells(line: &str) -> Vec<String> {
    CELL_SPLIT_RE
        .split(line.trim())
        .map(|cell| cell.trim().to_string())
        .filter(|cell| !cell.is_empty())
        .collect()
}

/// Finds the first run of aligned lines sharing a column count. The first
/// line of the run becomes the header row.
pub(crate) fn detect_table(text: &str) -> Option<RawTable> {
    let mut run: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        let cells = split_cells(line);
        let continues = cells.len() >= MIN_TABLE_COLUMNS
            && run.first().map_or(true, |first| first.len() == cells.len());

        if continues {
            run.push(cells);
            continue;
        }

        if run.len() >= MIN_TABLE_LINES {
            break;
        }
        run.clear();
        if cells.len() >= MIN_TABLE_COLUMNS {
            run.push(cells);
        }
    }

    if run.len() < MIN_TABLE_LINES {
        return None;
    }
    let mut rows = run.into_iter();
    let headers = rows.next()?;
    Some(RawTable {
        headers,
        rows: rows.collect(),
    })
}
