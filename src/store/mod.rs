//! File-backed document store.
//!
//! Each configuration is one pretty-printed JSON file under `documents/`.
//! The reserved name `define` routes to the staging slot, which lives in its
//! own directory and is never listed, evicted, or deleted through the store.
use crate::error::{Result, ShiftError};
use crate::model::ConfigDocument;
use crate::staging::write_json_atomic;
use std::fs;
use std::path::Path;
use std::time::Duration;

mod paths;
pub(crate) mod retention;

pub use paths::{DataPaths, STAGING_NAME};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_documents: usize,
    /// Zero disables age-based cleanup.
    pub max_document_age_days: u64,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_documents: 30,
            max_document_age_days: 90,
        }
    }
}

impl StoreLimits {
    fn policy(&self) -> retention::Policy {
        retention::Policy {
            max_count: self.max_documents,
            max_age: (self.max_document_age_days > 0)
                .then(|| Duration::from_secs(self.max_document_age_days * SECS_PER_DAY)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    paths: DataPaths,
    limits: StoreLimits,
}

impl DocumentStore {
    pub fn new(paths: DataPaths, limits: StoreLimits) -> Self {
        Self { paths, limits }
    }

    /// Create the data directory layout if it is missing.
    pub fn init(&self) -> Result<()> {
        for dir in [
            self.paths.documents_dir(),
            self.paths.staging_dir(),
            self.paths.bundles_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|err| ShiftError::io("create", dir.clone(), err))?;
        }
        Ok(())
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Names of stored documents, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.scan()?.into_iter().map(|entry| entry.name).collect();
        names.sort();
        Ok(names)
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path_for(name)?.is_file())
    }

    pub fn load(&self, name: &str) -> Result<ConfigDocument> {
        let path = self.path_for(name)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ShiftError::not_found("document", name));
            }
            Err(err) => return Err(ShiftError::io("read", path, err)),
        };
        ConfigDocument::from_json_slice(&bytes)
    }

    /// Overwrite (or create) `name`, then apply retention to ordinary documents.
    pub fn save(&self, name: &str, doc: &ConfigDocument) -> Result<()> {
        let path = self.path_for(name)?;
        write_json_atomic(&path, doc)?;
        tracing::debug!(name, path = %self.paths.rel_path(&path), "saved document");
        if name != STAGING_NAME {
            self.enforce_retention(Some(name));
        }
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        if name == STAGING_NAME {
            return Err(ShiftError::InvalidName {
                name: name.to_string(),
                reason: "the staging slot cannot be deleted",
            });
        }
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(name, "deleted document");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ShiftError::not_found("document", name))
            }
            Err(err) => Err(ShiftError::io("remove", path, err)),
        }
    }

    /// Evict documents beyond the count or age limits. Failures are logged,
    /// never returned; the returned names are the documents removed.
    pub fn enforce_retention(&self, keep: Option<&str>) -> Vec<String> {
        match self.scan() {
            Ok(entries) => retention::enforce("document", &entries, self.limits.policy(), keep),
            Err(err) => {
                tracing::warn!(error = %err, "document retention scan failed");
                Vec::new()
            }
        }
    }

    fn scan(&self) -> Result<Vec<retention::Entry>> {
        retention::scan(&self.paths.documents_dir(), document_name)
    }

    fn path_for(&self, name: &str) -> Result<std::path::PathBuf> {
        if name == STAGING_NAME {
            return Ok(self.paths.staging_path());
        }
        validate_name(name)?;
        Ok(self.paths.document_path(name))
    }
}

/// Reject names that are blank or could escape the documents directory.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("must not be blank")
    } else if name.contains(['/', '\\', '\0']) {
        Some("must not contain path separators")
    } else if name.starts_with('.') {
        Some("must not start with a dot")
    } else if name.contains("..") {
        Some("must not contain \"..\"")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ShiftError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn document_name(path: &Path) -> Option<String> {
    if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("json") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    (!stem.starts_with('.')).then(|| stem.to_string())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
