// src/utils/debug_dump.rs
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::table::RawTable;
use crate::utils::error::StorageError;

const MARKER: &str = ">> ";
const PLAIN: &str = "   ";

/// Annotates extracted text: every line that contains one of `labels` is
/// marked and tagged with the labels it matched. Line numbers match the ones
/// reported for skipped fields.
pub fn annotate_text(text: &str, labels: &[&str]) -> Result<String, StorageError> {
    let mut escaped: Vec<String> = labels.iter().filter(|l| !l.is_empty()).map(|l| regex::escape(l)).collect();
    // Longest first so "Net Revenue" wins over "Revenue" at the same position
    escaped.sort_by_key(|l| std::cmp::Reverse(l.len()));
    let re = if escaped.is_empty() {
        None
    } else {
        Some(
            Regex::new(&escaped.join("|"))
                .map_err(|e| StorageError::RenderError(format!("Invalid label pattern: {}", e)))?,
        )
    };

    let mut out = String::new();
    let mut marked = 0;
    for (idx, line) in text.lines().enumerate() {
        let hits: Vec<&str> = re
            .as_ref()
            .map(|re| re.find_iter(line).map(|m| m.as_str()).collect())
            .unwrap_or_default();
        if hits.is_empty() {
            out.push_str(&format!("{}{:>4} | {}\n", PLAIN, idx + 1, line));
        } else {
            marked += 1;
            out.push_str(&format!("{}{:>4} | {}    [{}]\n", MARKER, idx + 1, line, hits.join(", ")));
        }
    }
    tracing::debug!("Annotated {} matching lines", marked);
    Ok(out)
}

/// Saves annotated text for a debugging session
pub fn save_annotated_text<P: AsRef<Path>>(path: P, text: &str, labels: &[&str]) -> Result<(), StorageError> {
    let path = path.as_ref();
    let annotated = annotate_text(text, labels)?;
    fs::write(path, annotated)?;
    tracing::info!("Saved annotated text to {}", path.display());
    Ok(())
}

/// Dumps a table exactly as the reader produced it, before normalization.
pub fn save_raw_table<P: AsRef<Path>>(path: P, table: &RawTable) -> Result<(), StorageError> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    writer
        .write_record(&table.headers)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    }
    writer.flush()?;
    tracing::info!("Saved raw table ({} rows) to {}", table.rows.len(), path.display());
    Ok(())
}
