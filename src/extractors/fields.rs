// src/extractors/fields.rs

// --- Imports ---
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::error::FieldParseError;

// --- Canonical field names ---
pub const REVENUE: &str = "Revenue";
pub const PROFIT: &str = "Profit";
pub const YEAR: &str = "Year";

// --- Data Structures ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Integer(v) => *v as f64,
            FieldValue::Float(v) => *v,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v:.2}"),
        }
    }
}

/// Scalar fields found in one document. Absent fields are simply not present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<FieldValue> {
        self.fields.get(field).copied()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Inserts unless the field is already set. Returns whether it was inserted.
    pub fn insert_first(&mut self, field: &str, value: FieldValue) -> bool {
        if self.fields.contains_key(field) {
            return false;
        }
        self.fields.insert(field.to_string(), value);
        true
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// One entry of the label vocabulary: where a label appears, which field it fills.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub label: String,
    pub field: String,
    pub kind: FieldKind,
}

impl FieldRule {
    pub fn new(label: &str, field: &str, kind: FieldKind) -> Self {
        Self {
            label: label.to_string(),
            field: field.to_string(),
            kind,
        }
    }

    fn coerce(&self, raw: &str) -> Result<FieldValue, String> {
        let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Err("empty value".to_string());
        }
        match self.kind {
            FieldKind::Integer => cleaned
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|e| e.to_string()),
            FieldKind::Float => match cleaned.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(FieldValue::Float(v)),
                Ok(_) => Err("value is not finite".to_string()),
                Err(e) => Err(e.to_string()),
            },
        }
    }
}

/// Result of a scan: the record plus every line that was skipped.
#[derive(Debug, Clone, Default)]
pub struct FieldExtraction {
    pub record: FieldRecord,
    pub skipped: Vec<FieldParseError>,
}

// --- Main Extractor Structure ---
/// Pulls labeled scalar figures out of free text using a table of rules.
/// Every rule is checked against every line; the first parsed value per field wins.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    rules: Vec<FieldRule>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self {
            rules: vec![
                FieldRule::new(REVENUE, REVENUE, FieldKind::Float),
                FieldRule::new(PROFIT, PROFIT, FieldKind::Float),
                FieldRule::new(YEAR, YEAR, FieldKind::Integer),
            ],
        }
    }
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds alias rules (`"Net Income" -> "Profit"`). An alias parses like its
    /// canonical field; unknown canonical fields parse as floats.
    pub fn with_aliases(mut self, aliases: &BTreeMap<String, String>) -> Self {
        for (label, field) in aliases {
            let kind = self
                .rules
                .iter()
                .find(|r| &r.field == field)
                .map_or(FieldKind::Float, |r| r.kind);
            self.rules.push(FieldRule::new(label, field, kind));
        }
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Canonical fields in rule order, without repeats.
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for rule in &self.rules {
            if !fields.contains(&rule.field) {
                fields.push(rule.field.clone());
            }
        }
        fields
    }

    pub fn extract(&self, text: &str) -> FieldRecord {
        self.extract_detailed(text).record
    }

    pub fn extract_detailed(&self, text: &str) -> FieldExtraction {
        let mut out = FieldExtraction::default();

        for (idx, line) in text.lines().enumerate() {
            for rule in &self.rules {
                if !line.contains(rule.label.as_str()) || out.record.contains(&rule.field) {
                    continue;
                }
                let parsed = match line.split_once(':') {
                    Some((_, rhs)) => rule.coerce(rhs.trim()),
                    None => Err("missing ':' separator".to_string()),
                };
                match parsed {
                    Ok(value) => {
                        tracing::debug!("Line {}: {} = {}", idx + 1, rule.field, value);
                        out.record.insert_first(&rule.field, value);
                    }
                    Err(reason) => {
                        let err = FieldParseError {
                            line_no: idx + 1,
                            label: rule.label.clone(),
                            raw: line.split_once(':').map_or(line, |(_, rhs)| rhs).trim().to_string(),
                            reason,
                        };
                        tracing::warn!("Skipping field line: {}", err);
                        out.skipped.push(err);
                    }
                }
            }
        }

        tracing::info!(
            "Extracted {} fields ({} lines skipped)",
            out.record.len(),
            out.skipped.len()
        );
        out
    }
}
