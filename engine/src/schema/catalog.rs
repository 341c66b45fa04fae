//! Provider Catalog - look up provider schemas by name
//!
//! Loads every schema file from a directory and indexes it by upper-cased
//! `ProviderName`, so lookups are case-insensitive.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::ProviderSchema;
use crate::error::{SchemaError, SchemaResult};

/// Schemas indexed by provider name
#[derive(Debug, Clone, Default)]
pub struct ProviderCatalog {
    /// Directory schemas are loaded from, if any
    dir: Option<PathBuf>,
    /// Upper-cased provider name -> schema
    schemas: HashMap<String, ProviderSchema>,
}

impl ProviderCatalog {
    /// Create an empty in-memory catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog backed by a directory, loading existing schemas
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let mut catalog = Self {
            dir: Some(dir.as_ref().to_path_buf()),
            schemas: HashMap::new(),
        };
        catalog.load_all();
        catalog
    }

    /// Load all schemas from the backing directory
    fn load_all(&mut self) {
        let Some(dir) = self.dir.clone() else {
            return;
        };

        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(err) => {
                tracing::debug!(dir = %dir.display(), "provider directory unreadable: {}", err);
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| matches!(e.to_lowercase().as_str(), "json" | "yaml" | "yml"))
            })
            .collect();
        paths.sort();

        for path in paths {
            match ProviderSchema::from_path(&path) {
                Ok(schema) => self.insert(schema),
                Err(err) => {
                    tracing::warn!(path = %path.display(), "Error loading provider config: {}", err);
                }
            }
        }
    }

    /// Reload schemas from disk
    ///
    /// The catalog ends up mirroring the directory: schemas whose files were
    /// removed disappear, and in-memory `insert`s are discarded. Catalogs
    /// without a directory are left untouched.
    pub fn refresh(&mut self) {
        if self.dir.is_none() {
            return;
        }
        self.schemas.clear();
        self.load_all();
    }

    /// Register or replace a schema
    pub fn insert(&mut self, schema: ProviderSchema) {
        let key = schema.provider_name.trim().to_uppercase();
        self.schemas.insert(key, schema);
    }

    /// Get a schema by provider name (case-insensitive)
    pub fn get(&self, provider_name: &str) -> SchemaResult<&ProviderSchema> {
        let key = provider_name.trim().to_uppercase();
        if key.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        self.schemas
            .get(&key)
            .ok_or_else(|| SchemaError::NotFound(key))
    }

    /// All schemas, sorted by provider name
    pub fn list(&self) -> Vec<&ProviderSchema> {
        let mut schemas: Vec<&ProviderSchema> = self.schemas.values().collect();
        schemas.sort_by(|a, b| a.provider_name.cmp(&b.provider_name));
        schemas
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
