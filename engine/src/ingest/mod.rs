//! File ingestion: grid reading, header detection and column cleanup.
//!
//! [`ingest_file`] never fails. Unsupported files, unreadable files and
//! empty workbooks are logged and produce an empty dataset.

pub mod columns;
pub mod header;

use std::path::Path;

use crate::config::IngestOptions;
use crate::error::IngestResult;
use crate::logs::LogSink;
use crate::models::{Dataset, Grid};
use crate::parser::{self, FileKind};

pub use header::{locate_header, LocatedTable};

const STEP: &str = "Process File";
const SOURCE: &str = "GridIngestor";

/// Pre-header text and tabular body of one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutput {
    pub pre_header_text: String,
    pub data: Dataset,
}

/// Read a file and locate its table.
pub fn ingest_file(path: &Path, tokens: &[String], options: &IngestOptions, log: &mut LogSink) -> IngestOutput {
    let extension = parser::file_extension(path);
    let label = path.display().to_string();
    ingest_with(&extension, &label, tokens, options, log, || {
        parser::read_grids(path, options)
    })
}

/// Same as [`ingest_file`] for an in-memory upload.
pub fn ingest_bytes(
    bytes: &[u8],
    file_name: &str,
    tokens: &[String],
    options: &IngestOptions,
    log: &mut LogSink,
) -> IngestOutput {
    let extension = parser::file_extension(Path::new(file_name));
    ingest_with(&extension, file_name, tokens, options, log, || {
        parser::read_grids_from_bytes(bytes, &extension, file_name, options)
    })
}

fn ingest_with<F>(
    extension: &str,
    label: &str,
    tokens: &[String],
    options: &IngestOptions,
    log: &mut LogSink,
    read: F,
) -> IngestOutput
where
    F: FnOnce() -> IngestResult<Vec<Grid>>,
{
    let kind = match FileKind::from_extension(extension) {
        Ok(kind) => kind,
        Err(_) => {
            log.error(STEP, SOURCE, extension, "Unsupported file type");
            return IngestOutput::default();
        }
    };
    let step = match kind {
        FileKind::Csv => "Process CSV",
        FileKind::Workbook => "Process Workbook",
    };

    let grids = match read() {
        Ok(grids) => grids,
        Err(err) => {
            log.error(step, SOURCE, label, err.to_string());
            return IngestOutput::default();
        }
    };

    let Some(table) = header::locate_header(&grids, tokens, options, log) else {
        return IngestOutput::default();
    };

    let mut data = table.data;
    columns::drop_empty_columns(&mut data, log);

    let message = match kind {
        FileKind::Csv => "Successfully processed CSV".to_string(),
        FileKind::Workbook => format!("Successfully processed sheet '{}'", table.sheet_name),
    };
    log.success(step, SOURCE, label, message);

    IngestOutput {
        pre_header_text: table.pre_header_text,
        data,
    }
}
