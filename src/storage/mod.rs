// src/storage/mod.rs
pub mod pdf;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::report::ReportContent;
use crate::utils::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Text,
    Json,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
        }
    }
}

/// Plain-text rendering: underlined title, then each section under an underlined heading.
pub fn render_text(report: &ReportContent) -> String {
    let mut out = String::new();
    out.push_str(&report.title);
    out.push('\n');
    out.push_str(&"=".repeat(report.title.chars().count()));
    out.push_str("\n\n");
    for section in &report.sections {
        out.push_str(&section.title);
        out.push('\n');
        out.push_str(&"-".repeat(section.title.chars().count()));
        out.push('\n');
        out.push_str(&section.body);
        out.push_str("\n\n");
    }
    out
}

/// Writes rendered reports and their metadata next to each other.
pub struct ReportWriter {
    output: PathBuf,
    format: ReportFormat,
}

impl ReportWriter {
    /// Creates the output's parent directory if it doesn't exist
    pub fn new<P: AsRef<Path>>(output: P, format: ReportFormat) -> Result<Self, StorageError> {
        let output = output.as_ref().to_path_buf();
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(StorageError::IoError)?;
            }
        }
        Ok(Self { output, format })
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Renders the report in the configured format and writes it to the output path
    pub fn save_report(&self, report: &ReportContent) -> Result<PathBuf, StorageError> {
        let bytes = match self.format {
            ReportFormat::Text => render_text(report).into_bytes(),
            ReportFormat::Pdf => pdf::render_pdf(report)?,
            ReportFormat::Json => serde_json::to_vec_pretty(report)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?,
        };
        fs::write(&self.output, bytes).map_err(StorageError::IoError)?;

        tracing::info!("Saved {} report to {}", self.format.as_str(), self.output.display());
        Ok(self.output.clone())
    }

    /// Saves metadata about the report in JSON format as `<output>.meta.json`
    pub fn save_report_metadata(
        &self,
        report: &ReportContent,
        source: &str,
        kind: &str,
    ) -> Result<PathBuf, StorageError> {
        let mut file_name = self
            .output
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        file_name.push(".meta.json");
        let file_path = self.output.with_file_name(file_name);

        let metadata = serde_json::json!({
            "source": source,
            "source_kind": kind,
            "report_format": self.format.as_str(),
            "report_path": self.output.display().to_string(),
            "title": report.title,
            "sections": report.section_titles(),
            "generated_at": report.generated_at.to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportAssembler, ReportSection};

    fn sample() -> ReportContent {
        ReportContent {
            title: "Financial Analysis Report".into(),
            generated_at: chrono::Utc::now(),
            sections: vec![
                ReportSection { title: "Overview".into(), body: "Rows analyzed: 2".into() },
                ReportSection { title: "Summary".into(), body: "Revenue changed by 50.00%".into() },
            ],
        }
    }

    #[test]
    fn test_render_text_layout() {
        let text = render_text(&sample());
        assert!(text.starts_with("Financial Analysis Report\n=========================\n\n"));
        assert!(text.contains("Overview\n--------\nRows analyzed: 2\n\n"));
        assert!(text.find("Overview").unwrap() < text.find("Summary").unwrap());

        // The generation timestamp travels inside the Overview body
        let assembled = ReportAssembler::new().scalar(&Default::default(), &[], None);
        let text = render_text(&assembled);
        assert!(text.contains("Overview\n--------\nDate: "));
    }

    #[test]
    fn test_save_text_report_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("report.txt");
        let writer = ReportWriter::new(&output, ReportFormat::Text).unwrap();

        let report = sample();
        let path = writer.save_report(&report).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), render_text(&report));

        let meta_path = writer.save_report_metadata(&report, "q.csv", "csv").unwrap();
        assert!(meta_path.ends_with("report.txt.meta.json"));
        let meta: serde_json::Value = serde_json::from_str(&fs::read_to_string(meta_path).unwrap()).unwrap();
        assert_eq!(meta["source_kind"], "csv");
        assert_eq!(meta["report_format"], "text");
        assert_eq!(meta["sections"], serde_json::json!(["Overview", "Summary"]));
    }

    #[test]
    fn test_save_json_and_pdf_reports() {
        let dir = tempfile::tempdir().unwrap();
        let report = ReportAssembler::new().scalar(&Default::default(), &[], None);

        let json_path = ReportWriter::new(dir.path().join("r.json"), ReportFormat::Json)
            .unwrap()
            .save_report(&report)
            .unwrap();
        let back: ReportContent = serde_json::from_slice(&fs::read(json_path).unwrap()).unwrap();
        assert_eq!(back, report);

        let pdf_path = ReportWriter::new(dir.path().join("r.pdf"), ReportFormat::Pdf)
            .unwrap()
            .save_report(&report)
            .unwrap();
        assert!(fs::read(pdf_path).unwrap().starts_with(b"%PDF"));
    }
}
