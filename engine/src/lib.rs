//! # Harmonizer - header detection and declarative normalization engine
//!
//! Harmonizer turns semi-structured spreadsheet and CSV exports from many
//! financial data providers into one canonical tabular dataset, driven by a
//! per-provider schema (synonyms, filters, calculations, constants and
//! pre-header extraction rules).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//! │ CSV / XLSX  │──▶│   Parser    │──▶│   Ingest    │──▶│  Transform  │──▶│ Harmonizer  │
//! │   (file)    │   │  (grids)    │   │  (header)   │   │  (schema)   │   │  (master)   │
//! └─────────────┘   └─────────────┘   └─────────────┘   └─────────────┘   └─────────────┘
//!                                              every stage appends to ──▶ LogSink
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use harmonizer::{Harmonizer, HarmonizerConfig};
//! use std::path::Path;
//!
//! let mut harmonizer = Harmonizer::from_config(&HarmonizerConfig::from_env());
//! harmonizer.process_file(Path::new("acme_march.xlsx"), "ACME")?;
//! println!("{} rows", harmonizer.master_data().row_count());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per concern
//! - [`models`] - Cell values, grids and datasets
//! - [`logs`] - Ordered processing log
//! - [`config`] - Ingest options and environment configuration
//! - [`logging`] - Console `tracing` setup
//! - [`schema`] - Provider schemas and the provider catalog
//! - [`parser`] - CSV and workbook reading
//! - [`ingest`] - Header detection and column cleanup
//! - [`transform`] - Synonyms, filters, calculations, constants, extraction
//! - [`harmonizer`] - Batch orchestration and the master dataset

// Core modules
pub mod config;
pub mod error;
pub mod logging;
pub mod logs;
pub mod models;

// Provider schemas
pub mod schema;

// Reading
pub mod ingest;
pub mod parser;

// Transformation
pub mod transform;

// Orchestration
pub mod harmonizer;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ExpressionError,
    ExpressionResult,
    HarmonizeError,
    HarmonizeResult,
    IngestError,
    IngestResult,
    SchemaError,
    SchemaResult,
};

// =============================================================================
// Re-exports - Models & Logs
// =============================================================================

pub use models::{format_number, parse_decimal, CellValue, Dataset, Grid};
pub use logs::{LogEntry, LogLevel, LogSink};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{HarmonizerConfig, IngestOptions};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{
    example_schema,
    Calculation,
    ExtractionRule,
    HardcodedField,
    ProviderCatalog,
    ProviderSchema,
    Synonym,
};

// =============================================================================
// Re-exports - Parsing & Ingestion
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    read_grids,
    read_grids_from_bytes,
    FileKind,
};
pub use ingest::{ingest_bytes, ingest_file, locate_header, IngestOutput, LocatedTable};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    apply_calculations,
    apply_extractions,
    apply_filters,
    apply_hardcoded_fields,
    apply_synonyms,
    process_bytes,
    process_file,
    run_cleanup,
    run_stages,
    CleanupStep,
    Expression,
    FilterExpr,
    ProcessResult,
    SplitMode,
};

// =============================================================================
// Re-exports - Orchestrator
// =============================================================================

pub use harmonizer::{
    BatchSummary,
    FileFailure,
    FileJob,
    FileRecord,
    Harmonizer,
    HarmonizerSummary,
    ProviderMapping,
};
