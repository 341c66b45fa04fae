//! Transformation module.
//!
//! Declarative per-provider stages applied after ingestion:
//! - Synonyms: rename columns to logical fields
//! - Filter: drop rows failing `[field] <op> value` expressions
//! - Expr / Calculate: derived columns from arithmetic or text expressions
//! - Hardcoded: constant columns
//! - Extract / Cleanup: metadata pulled from the pre-header text
//! - Pipeline: all of the above, in order, for one file

pub mod calculate;
pub mod cleanup;
pub mod expr;
pub mod extract;
pub mod filter;
pub mod hardcoded;
pub mod pipeline;
pub mod synonyms;

pub use calculate::apply_calculations;
pub use cleanup::{run_cleanup, CleanupStep, SplitMode};
pub use expr::Expression;
pub use extract::apply_extractions;
pub use filter::{apply_filters, CompareOp, FilterExpr, FilterValue};
pub use hardcoded::apply_hardcoded_fields;
pub use pipeline::{process_bytes, process_file, run_stages, ProcessResult};
pub use synonyms::apply_synonyms;
