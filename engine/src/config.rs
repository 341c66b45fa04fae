//! Engine options and environment-driven configuration.

use std::path::PathBuf;

/// Environment variable naming the provider schema directory.
pub const PROVIDERS_DIR_ENV: &str = "HARMONIZER_PROVIDERS_DIR";

/// Directory used when the environment does not name one.
pub const DEFAULT_PROVIDERS_DIR: &str = "providers";

/// Knobs for the grid ingestor and header locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Text cells that must match an expected token for a row to be the header
    pub min_header_matches: usize,

    /// Non-empty lines inspected when guessing the CSV delimiter
    pub max_delimiter_scan_lines: usize,

    /// Drop body rows whose every cell is blank
    pub skip_blank_rows: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            min_header_matches: 3,
            max_delimiter_scan_lines: 20,
            skip_blank_rows: true,
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct HarmonizerConfig {
    /// Directory holding `*.json` / `*.yaml` provider schemas
    pub providers_dir: PathBuf,
    pub ingest: IngestOptions,
}

impl HarmonizerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        let providers_dir = std::env::var(PROVIDERS_DIR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDERS_DIR.to_string());

        Self {
            providers_dir: PathBuf::from(providers_dir),
            ingest: IngestOptions::default(),
        }
    }

    pub fn with_providers_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.providers_dir = dir.into();
        self
    }
}

impl Default for HarmonizerConfig {
    fn default() -> Self {
        Self {
            providers_dir: PathBuf::from(DEFAULT_PROVIDERS_DIR),
            ingest: IngestOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = IngestOptions::default();
        assert_eq!(opts.min_header_matches, 3);
        assert!(opts.skip_blank_rows);
    }

    #[test]
    fn test_with_providers_dir() {
        let config = HarmonizerConfig::default().with_providers_dir("/tmp/schemas");
        assert_eq!(config.providers_dir, PathBuf::from("/tmp/schemas"));
    }
}
