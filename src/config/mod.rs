// src/config/mod.rs
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::source::PdfMode;
use crate::utils::error::ConfigError;

/// Caller-supplied analysis options. Every field is optional in the JSON form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Ordering axis column (date or other monotonic key).
    pub date_column: Option<String>,
    /// Columns to analyze, in report order. Empty means every numeric column.
    pub numeric_columns: Vec<String>,
    /// Source label -> canonical name, for text fields and table headers alike.
    pub field_label_map: BTreeMap<String, String>,
    pub pdf_mode: PdfMode,
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded config from {}", path.display());
        Self::from_json_str(&json)
    }

    /// Parses `SOURCE=CANONICAL` into a label mapping entry.
    pub fn parse_label_mapping(mapping: &str) -> Result<(String, String), ConfigError> {
        let (source, canonical) = mapping
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidLabelMapping(mapping.to_string()))?;
        let (source, canonical) = (source.trim(), canonical.trim());
        if source.is_empty() || canonical.is_empty() {
            return Err(ConfigError::InvalidLabelMapping(mapping.to_string()));
        }
        Ok((source.to_string(), canonical.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (source, canonical) in &self.field_label_map {
            if source.trim().is_empty() || canonical.trim().is_empty() {
                return Err(ConfigError::InvalidLabelMapping(format!("{source}={canonical}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_fields_omitted() {
        let config = AnalysisConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.pdf_mode, PdfMode::Text);
    }

    #[test]
    fn test_full_config() {
        let config = AnalysisConfig::from_json_str(
            r#"{
                "date_column": "Date",
                "numeric_columns": ["Revenue", "Profit"],
                "field_label_map": {"Net Income": "Profit"},
                "pdf_mode": "table"
            }"#,
        )
        .unwrap();
        assert_eq!(config.date_column.as_deref(), Some("Date"));
        assert_eq!(config.numeric_columns, vec!["Revenue", "Profit"]);
        assert_eq!(config.field_label_map["Net Income"], "Profit");
        assert_eq!(config.pdf_mode, PdfMode::Table);
    }

    #[test]
    fn test_rejects_unknown_keys_and_blank_mappings() {
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{"date_col": "Date"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{"field_label_map": {" ": "Profit"}}"#),
            Err(ConfigError::InvalidLabelMapping(_))
        ));
    }

    #[test]
    fn test_parse_label_mapping() {
        assert_eq!(
            AnalysisConfig::parse_label_mapping(" Total Sales = Revenue ").unwrap(),
            ("Total Sales".to_string(), "Revenue".to_string())
        );
        assert!(AnalysisConfig::parse_label_mapping("Revenue").is_err());
        assert!(AnalysisConfig::parse_label_mapping("=Revenue").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"date_column": "Year"}}"#).unwrap();
        let config = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(config.date_column.as_deref(), Some("Year"));

        assert!(matches!(
            AnalysisConfig::load("/no/such/config.json"),
            Err(ConfigError::Read(_))
        ));
    }
}
