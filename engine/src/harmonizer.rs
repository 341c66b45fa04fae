//! Orchestrator: runs provider pipelines over files and accumulates the
//! master dataset.
//!
//! Files are independent, so batches run their pipelines in parallel with
//! `rayon`. Results are appended to the master dataset afterwards, one at a
//! time and in input order, so exports are reproducible.

use chrono::{SecondsFormat, Utc};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::{HarmonizerConfig, IngestOptions};
use crate::error::{HarmonizeError, HarmonizeResult};
use crate::logs::LogEntry;
use crate::models::{CellValue, Dataset};
use crate::schema::ProviderCatalog;
use crate::transform::pipeline::{process_file, ProcessResult};

/// Extensions picked up by directory discovery.
const DISCOVERED_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];

/// One file to process with a named provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    pub path: PathBuf,
    pub provider: String,
}

impl FileJob {
    pub fn new(path: impl Into<PathBuf>, provider: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            provider: provider.into(),
        }
    }
}

/// A file that made it into the master dataset.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub file_path: String,
    pub provider_name: String,
    pub row_count: usize,
}

/// A file that failed and was left out of the master dataset.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub file_path: String,
    pub provider_name: String,
    pub error: String,
}

/// Counts for one batch or directory run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub errors: usize,
    pub skipped: usize,
    pub total_files: usize,
}

/// Statistics over everything processed so far.
#[derive(Debug, Clone, Serialize)]
pub struct HarmonizerSummary {
    pub files_processed: usize,
    pub errors: usize,
    pub total_rows: usize,
    pub processed_files: Vec<FileRecord>,
    pub error_files: Vec<FileFailure>,
    pub log_entries: usize,
}

/// File-name pattern to provider mapping.
///
/// The first pattern contained in a file name decides its provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderMapping {
    entries: Vec<(String, String)>,
}

impl ProviderMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pattern: &str, provider: &str) -> Self {
        self.entries.push((pattern.to_string(), provider.to_string()));
        self
    }

    /// Parse a JSON object of `"pattern": "provider"` pairs, keeping file order.
    pub fn from_json(json: &str) -> HarmonizeResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        let object = value
            .as_object()
            .ok_or_else(|| HarmonizeError::Mapping("expected a JSON object".to_string()))?;

        let mut mapping = Self::new();
        for (pattern, provider) in object {
            let provider = provider.as_str().ok_or_else(|| {
                HarmonizeError::Mapping(format!("provider for pattern '{}' must be a string", pattern))
            })?;
            mapping = mapping.with(pattern, provider);
        }
        Ok(mapping)
    }

    pub fn from_path(path: &Path) -> HarmonizeResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HarmonizeError::Mapping(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn resolve(&self, file_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(pattern, _)| file_name.contains(pattern.as_str()))
            .map(|(_, provider)| provider.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs per-file pipelines and owns the master dataset and log.
#[derive(Debug, Default)]
pub struct Harmonizer {
    catalog: ProviderCatalog,
    options: IngestOptions,
    master: Dataset,
    master_log: Vec<LogEntry>,
    processed: Vec<FileRecord>,
    failures: Vec<FileFailure>,
}

impl Harmonizer {
    pub fn new(catalog: ProviderCatalog, options: IngestOptions) -> Self {
        Self {
            catalog,
            options,
            ..Self::default()
        }
    }

    /// Load provider schemas from the configured directory.
    pub fn from_config(config: &HarmonizerConfig) -> Self {
        Self::new(ProviderCatalog::with_dir(&config.providers_dir), config.ingest.clone())
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut ProviderCatalog {
        &mut self.catalog
    }

    /// Run one file through its provider's pipeline without recording it.
    ///
    /// The returned dataset carries the `provider_name`, `file_name` and
    /// `processed_date` columns.
    pub fn run_file(&self, path: &Path, provider: &str) -> HarmonizeResult<ProcessResult> {
        let schema = self.catalog.get(provider)?;
        let mut result = process_file(path, schema, &self.options);

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let processed_date = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        result.data.fill_column("provider_name", CellValue::Text(provider.to_string()));
        result.data.fill_column("file_name", CellValue::Text(file_name));
        result.data.fill_column("processed_date", CellValue::Text(processed_date));

        Ok(result)
    }

    /// Process one file and append it to the master dataset.
    pub fn process_file(&mut self, path: &Path, provider: &str) -> HarmonizeResult<FileRecord> {
        tracing::info!(file = %path.display(), provider, "processing file");
        let outcome = self.run_file(path, provider);
        self.record(path, provider, outcome)
    }

    /// Process files in parallel; results are recorded in input order.
    pub fn process_batch(&mut self, jobs: &[FileJob]) -> BatchSummary {
        let outcomes: Vec<HarmonizeResult<ProcessResult>> = {
            let this = &*self;
            jobs.par_iter()
                .map(|job| this.run_file(&job.path, &job.provider))
                .collect()
        };

        let mut summary = BatchSummary {
            total_files: jobs.len(),
            ..BatchSummary::default()
        };
        for (job, outcome) in jobs.iter().zip(outcomes) {
            match self.record(&job.path, &job.provider, outcome) {
                Ok(_) => summary.processed += 1,
                Err(_) => summary.errors += 1,
            }
        }
        summary
    }

    /// Process every spreadsheet and CSV file under `dir`.
    ///
    /// Files whose name matches no mapping pattern are skipped.
    pub fn process_directory(&mut self, dir: &Path, mapping: &ProviderMapping) -> HarmonizeResult<BatchSummary> {
        if !dir.is_dir() {
            return Err(HarmonizeError::NotADirectory(dir.display().to_string()));
        }

        let files = discover_files(dir)?;
        if files.is_empty() {
            tracing::warn!(dir = %dir.display(), "no compatible files found");
        }

        let mut jobs = Vec::new();
        for path in &files {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match mapping.resolve(&file_name) {
                Some(provider) => jobs.push(FileJob::new(path.clone(), provider)),
                None => tracing::warn!(file = %file_name, "skipping file - no provider mapping found"),
            }
        }

        let mut summary = self.process_batch(&jobs);
        summary.total_files = files.len();
        summary.skipped = files.len() - jobs.len();
        Ok(summary)
    }

    fn record(
        &mut self,
        path: &Path,
        provider: &str,
        outcome: HarmonizeResult<ProcessResult>,
    ) -> HarmonizeResult<FileRecord> {
        match outcome {
            Ok(result) => {
                let record = FileRecord {
                    file_path: path.display().to_string(),
                    provider_name: provider.to_string(),
                    row_count: result.data.row_count(),
                };
                self.master.append(result.data);
                self.master_log.extend(result.log);
                self.processed.push(record.clone());
                Ok(record)
            }
            Err(err) => {
                let message = format!("Error processing file {}: {}", path.display(), err);
                tracing::error!("{}", message);
                self.failures.push(FileFailure {
                    file_path: path.display().to_string(),
                    provider_name: provider.to_string(),
                    error: message,
                });
                Err(err)
            }
        }
    }

    pub fn master_data(&self) -> &Dataset {
        &self.master
    }

    pub fn master_log(&self) -> &[LogEntry] {
        &self.master_log
    }

    pub fn failures(&self) -> &[FileFailure] {
        &self.failures
    }

    pub fn summary(&self) -> HarmonizerSummary {
        HarmonizerSummary {
            files_processed: self.processed.len(),
            errors: self.failures.len(),
            total_rows: self.master.row_count(),
            processed_files: self.processed.clone(),
            error_files: self.failures.clone(),
            log_entries: self.master_log.len(),
        }
    }

    /// Master log as an ordered JSON array.
    pub fn log_json(&self) -> HarmonizeResult<String> {
        Ok(serde_json::to_string_pretty(&self.master_log)?)
    }

    /// Master dataset as a JSON array of row objects.
    pub fn data_json(&self) -> HarmonizeResult<String> {
        if self.master.row_count() == 0 {
            return Err(HarmonizeError::NoData);
        }
        Ok(serde_json::to_string_pretty(&self.master.to_records())?)
    }
}

/// Spreadsheet and CSV files under `dir`, recursively, sorted.
pub fn discover_files(dir: &Path) -> HarmonizeResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for ext in DISCOVERED_EXTENSIONS {
        let pattern = dir.join("**").join(format!("*.{}", ext));
        let pattern = pattern.to_string_lossy();
        files.extend(glob::glob(&pattern)?.flatten().filter(|p| p.is_file()));
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ProviderSchema;
    use std::fs;
    use tempfile::tempdir;

    const ACME_CSV: &str = "Acme statement\nDate,Invoice #,Amount\n2024-01-01,INV1,0\n2024-01-02,INV2,100\n";
    const BETA_CSV: &str = "Posted,Ref,Value,Memo\n2024-02-01,B1,5,x\n";

    fn harmonizer() -> Harmonizer {
        let mut catalog = ProviderCatalog::new();
        catalog.insert(
            ProviderSchema::new("Acme")
                .with_synonym("date", &["Date"])
                .with_synonym("reference", &["Invoice #"])
                .with_synonym("amount", &["Amount"])
                .with_filter("[amount] <> 0"),
        );
        catalog.insert(
            ProviderSchema::new("Beta")
                .with_synonym("date", &["Posted"])
                .with_synonym("reference", &["Ref"])
                .with_synonym("amount", &["Value"]),
        );
        Harmonizer::new(catalog, IngestOptions::default())
    }

    #[test]
    fn test_process_file_adds_metadata_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acme_jan.csv");
        fs::write(&path, ACME_CSV).unwrap();

        let mut h = harmonizer();
        let record = h.process_file(&path, "ACME").unwrap();
        assert_eq!(record.row_count, 1);

        let master = h.master_data();
        assert_eq!(master.cell(0, "provider_name"), Some(&CellValue::Text("ACME".into())));
        assert_eq!(master.cell(0, "file_name"), Some(&CellValue::Text("acme_jan.csv".into())));
        assert!(master.cell(0, "processed_date").is_some());
        assert!(!h.master_log().is_empty());
    }

    #[test]
    fn test_unknown_provider_is_recorded_and_excluded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acme.csv");
        fs::write(&path, ACME_CSV).unwrap();

        let mut h = harmonizer();
        let err = h.process_file(&path, "Nobody").unwrap_err();
        assert!(matches!(err, HarmonizeError::Schema(_)));

        let summary = h.summary();
        assert_eq!(summary.files_processed, 0);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.total_rows, 0);
        assert!(summary.error_files[0].error.contains("No matching provider found"));
        assert!(matches!(h.data_json(), Err(HarmonizeError::NoData)));
    }

    #[test]
    fn test_batch_appends_in_input_order() {
        let dir = tempdir().unwrap();
        let acme = dir.path().join("acme.csv");
        let beta = dir.path().join("beta.csv");
        fs::write(&acme, ACME_CSV).unwrap();
        fs::write(&beta, BETA_CSV).unwrap();

        let mut h = harmonizer();
        let jobs = vec![FileJob::new(&beta, "beta"), FileJob::new(&acme, "acme"), FileJob::new(&acme, "")];
        let summary = h.process_batch(&jobs);

        assert_eq!(summary, BatchSummary { processed: 2, errors: 1, skipped: 0, total_files: 3 });
        let master = h.master_data();
        assert_eq!(master.row_count(), 2);
        assert_eq!(master.cell(0, "reference"), Some(&CellValue::Text("B1".into())));
        assert_eq!(master.cell(1, "reference"), Some(&CellValue::Text("INV2".into())));
        // Memo only exists in the first file
        assert_eq!(master.cell(0, "Memo"), Some(&CellValue::Text("x".into())));
        assert_eq!(master.cell(1, "Memo"), Some(&CellValue::Null));
    }

    #[test]
    fn test_process_directory_with_mapping() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("acme_jan.csv"), ACME_CSV).unwrap();
        fs::write(dir.path().join("nested").join("beta_feb.csv"), BETA_CSV).unwrap();
        fs::write(dir.path().join("unknown.csv"), BETA_CSV).unwrap();
        fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

        let mapping = ProviderMapping::from_json(r#"{"acme": "Acme", "beta": "Beta"}"#).unwrap();
        let mut h = harmonizer();
        let summary = h.process_directory(dir.path(), &mapping).unwrap();

        assert_eq!(summary, BatchSummary { processed: 2, errors: 0, skipped: 1, total_files: 3 });
        assert_eq!(h.summary().total_rows, 2);
        assert!(h.log_json().unwrap().starts_with('['));
    }

    #[test]
    fn test_process_directory_rejects_missing_dir() {
        let mut h = harmonizer();
        let result = h.process_directory(Path::new("/no/such/dir"), &ProviderMapping::new());
        assert!(matches!(result, Err(HarmonizeError::NotADirectory(_))));
    }

    #[test]
    fn test_mapping_resolution() {
        let mapping = ProviderMapping::new().with("acme", "Acme").with("ac", "Other");
        assert_eq!(mapping.resolve("acme_2024.xlsx"), Some("Acme"));
        assert_eq!(mapping.resolve("zeta.csv"), None);
        assert!(ProviderMapping::from_json("[1, 2]").is_err());
        assert!(ProviderMapping::from_json(r#"{"a": 1}"#).is_err());
    }

    #[test]
    fn test_mapping_patterns_keep_file_order() {
        let mapping = ProviderMapping::from_json(r#"{"acme_special": "Special", "acme": "Acme"}"#).unwrap();
        assert_eq!(mapping.resolve("acme_special_jan.csv"), Some("Special"));
        assert_eq!(mapping.resolve("acme_jan.csv"), Some("Acme"));

        let reversed = ProviderMapping::from_json(r#"{"acme": "Acme", "acme_special": "Special"}"#).unwrap();
        assert_eq!(reversed.resolve("acme_special_jan.csv"), Some("Acme"));
    }
}
