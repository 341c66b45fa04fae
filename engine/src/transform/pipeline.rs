//! Per-file processing pipeline.
//!
//! Runs every stage in order against one file and returns the pre-header
//! text, the transformed dataset and the ordered log:
//!
//! ```text
//! ingest ─▶ synonyms ─▶ filters ─▶ calculations ─▶ hardcoded ─▶ extraction
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use harmonizer::{process_file, IngestOptions, ProviderCatalog};
//! use std::path::Path;
//!
//! let catalog = ProviderCatalog::with_dir("providers");
//! let schema = catalog.get("ACME")?;
//! let result = process_file(Path::new("acme_march.xlsx"), schema, &IngestOptions::default());
//! println!("{} rows, {} log entries", result.data.row_count(), result.log.len());
//! ```

use serde::Serialize;
use std::path::Path;

use super::calculate::apply_calculations;
use super::extract::apply_extractions;
use super::filter::apply_filters;
use super::hardcoded::apply_hardcoded_fields;
use super::synonyms::apply_synonyms;
use crate::config::IngestOptions;
use crate::ingest::{ingest_bytes, ingest_file, IngestOutput};
use crate::logs::{LogEntry, LogSink};
use crate::models::Dataset;
use crate::schema::ProviderSchema;

/// Result of processing one file
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessResult {
    /// Text found above the header row
    pub pre_header_text: String,
    /// Transformed dataset
    pub data: Dataset,
    /// Every log entry of the run, in order
    pub log: Vec<LogEntry>,
}

/// Run the transformation stages on an ingested table.
pub fn run_stages(input: IngestOutput, schema: &ProviderSchema, log: &mut LogSink) -> Dataset {
    let data = apply_synonyms(input.data, &schema.synonyms, log);
    let data = apply_filters(data, &schema.filter_table, log);
    let data = apply_calculations(data, &schema.calculations, log);
    let data = apply_hardcoded_fields(data, &schema.hardcoded_fields, log);
    apply_extractions(data, &input.pre_header_text, &schema.header_extraction, log)
}

/// Process a file on disk with a provider schema.
pub fn process_file(path: &Path, schema: &ProviderSchema, options: &IngestOptions) -> ProcessResult {
    let mut log = LogSink::new();
    let tokens = schema.expected_tokens();
    let input = ingest_file(path, &tokens, options, &mut log);
    finish(input, schema, log)
}

/// Process an in-memory upload; `file_name` supplies the extension.
pub fn process_bytes(
    bytes: &[u8],
    file_name: &str,
    schema: &ProviderSchema,
    options: &IngestOptions,
) -> ProcessResult {
    let mut log = LogSink::new();
    let tokens = schema.expected_tokens();
    let input = ingest_bytes(bytes, file_name, &tokens, options, &mut log);
    finish(input, schema, log)
}

fn finish(input: IngestOutput, schema: &ProviderSchema, mut log: LogSink) -> ProcessResult {
    let pre_header_text = input.pre_header_text.clone();
    let data = run_stages(input, schema, &mut log);

    ProcessResult {
        pre_header_text,
        data,
        log: log.into_entries(),
    }
}
