//! Provider schema definition
//!
//! A provider schema declares how one data provider's exports map onto the
//! canonical dataset: column synonyms, row filters, calculated fields,
//! constants, and metadata pulled from the text above the header row.
//!
//! Schemas are read from JSON or YAML with PascalCase keys. Unknown keys are
//! ignored and every list is optional.

pub mod catalog;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{SchemaError, SchemaResult};
use crate::transform::cleanup::{CleanupStep, SplitMode};

pub use catalog::ProviderCatalog;

/// Alternate names containing one of these markers describe derived fields,
/// not literal column labels, and never take part in header detection.
const NON_LITERAL_MARKERS: [&str; 4] = ["calculated", "regex", "concat", "hardcoded"];

/// Complete declarative configuration for one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProviderSchema {
    /// Case-insensitive unique key
    pub provider_name: String,

    /// Column renames; earlier entries win ties
    #[serde(default)]
    pub synonyms: Vec<Synonym>,

    /// Filter expressions such as `[amount] <> 0`, applied in order
    #[serde(default)]
    pub filter_table: Vec<String>,

    /// Derived columns, evaluated in order
    #[serde(default)]
    pub calculations: Vec<Calculation>,

    /// Constant columns
    #[serde(default)]
    pub hardcoded_fields: Vec<HardcodedField>,

    /// Rules extracting metadata from the pre-header text
    #[serde(default)]
    pub header_extraction: Vec<ExtractionRule>,
}

/// Maps raw provider labels onto one logical field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Synonym {
    #[serde(default)]
    pub logical_field: String,

    #[serde(default)]
    pub alternate_names: Vec<String>,
}

/// A derived column: `NewField = Expression`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Calculation {
    #[serde(default)]
    pub new_field: String,

    #[serde(default)]
    pub expression: String,
}

/// A constant column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HardcodedField {
    #[serde(default)]
    pub field_name: String,

    #[serde(default)]
    pub value: Value,
}

/// Extraction of one scalar from the pre-header text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExtractionRule {
    #[serde(default)]
    pub field_name: String,

    /// Text after the first occurrence is kept (whole text if absent)
    #[serde(default)]
    pub start_delim: String,

    /// Value is truncated at the first occurrence
    #[serde(default)]
    pub end_delim: String,

    /// Optional second start marker applied after `start_delim`
    #[serde(default)]
    pub sub_start_delim: Option<String>,

    /// Value is a `<start> to <end>` range
    #[serde(default)]
    pub is_date_range: bool,

    /// `"start"` or `"end"` for date ranges
    #[serde(default)]
    pub return_part: Option<String>,

    #[serde(default)]
    pub cleanup_steps: Vec<CleanupStep>,
}

impl ProviderSchema {
    /// Create an empty schema
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            synonyms: Vec::new(),
            filter_table: Vec::new(),
            calculations: Vec::new(),
            hardcoded_fields: Vec::new(),
            header_extraction: Vec::new(),
        }
    }

    /// Parse a schema from JSON string
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a schema from YAML string
    pub fn from_yaml(yaml: &str) -> SchemaResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a schema file, choosing the format from its extension
    pub fn from_path(path: &Path) -> SchemaResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let content = std::fs::read_to_string(path)?;

        match ext.as_str() {
            "json" => Self::from_json(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            _ => Err(SchemaError::UnsupportedFile(path.display().to_string())),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> SchemaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Lower-cased literal column labels used to recognise the header row.
    pub fn expected_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();

        for name in self.synonyms.iter().flat_map(|s| &s.alternate_names) {
            let token = name.trim().to_lowercase();
            if token.is_empty() || NON_LITERAL_MARKERS.iter().any(|m| token.contains(m)) {
                continue;
            }
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }

        tokens
    }

    pub fn with_synonym(mut self, logical_field: &str, alternate_names: &[&str]) -> Self {
        self.synonyms.push(Synonym {
            logical_field: logical_field.to_string(),
            alternate_names: alternate_names.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter_table.push(filter.to_string());
        self
    }

    pub fn with_calculation(mut self, new_field: &str, expression: &str) -> Self {
        self.calculations.push(Calculation {
            new_field: new_field.to_string(),
            expression: expression.to_string(),
        });
        self
    }

    pub fn with_hardcoded(mut self, field_name: &str, value: Value) -> Self {
        self.hardcoded_fields.push(HardcodedField {
            field_name: field_name.to_string(),
            value,
        });
        self
    }

    pub fn with_extraction(mut self, rule: ExtractionRule) -> Self {
        self.header_extraction.push(rule);
        self
    }
}

impl ExtractionRule {
    pub fn new(field_name: &str, start_delim: &str, end_delim: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            start_delim: start_delim.to_string(),
            end_delim: end_delim.to_string(),
            ..Self::default()
        }
    }

    pub fn with_step(mut self, step: CleanupStep) -> Self {
        self.cleanup_steps.push(step);
        self
    }
}

/// Template schema handed out to new providers.
pub fn example_schema(name: &str) -> ProviderSchema {
    ProviderSchema::new(name)
        .with_synonym("date", &["Date", "Transaction Date", "Invoice Date"])
        .with_synonym("amount", &["Amount", "Total", "Invoice Amount"])
        .with_synonym("description", &["Description", "Details", "Line Item"])
        .with_synonym("reference", &["Reference", "Ref", "Invoice Number"])
        .with_filter("[amount] <> 0")
        .with_filter("[description] <> null")
        .with_calculation("gst_amt", "([amount] * 0.15)")
        .with_calculation("excl_gst", "([amount] - [gst_amt])")
        .with_hardcoded("provider", Value::String(name.to_string()))
        .with_extraction(
            ExtractionRule::new("invoice_period", "Period:", "Invoice").with_step(CleanupStep::Trim),
        )
        .with_extraction(
            ExtractionRule::new("account_name", "Account:", "Period:")
                .with_step(CleanupStep::Split {
                    delimiter: ",".to_string(),
                    mode: SplitMode::All,
                })
                .with_step(CleanupStep::Pick { part: 1 }),
        )
}
