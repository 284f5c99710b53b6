//! Typed paths into the data directory.
//!
//! ```text
//! <data_dir>/
//!   documents/<name>.json     stored configurations
//!   staging/define.json       the document queued for generation
//!   bundles/shift_<name>_<YYYYMMDD>/   engine output
//! ```
use std::path::{Path, PathBuf};

/// Reserved document name that addresses the staging slot.
pub const STAGING_NAME: &str = "define";

#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `documents/` directory path.
    pub fn documents_dir(&self) -> PathBuf {
        self.root.join("documents")
    }

    /// Return the `documents/<name>.json` path; the name must already be validated.
    pub fn document_path(&self, name: &str) -> PathBuf {
        self.documents_dir().join(format!("{name}.json"))
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    /// Return the `staging/define.json` path.
    pub fn staging_path(&self) -> PathBuf {
        self.staging_dir().join(format!("{STAGING_NAME}.json"))
    }

    pub fn bundles_dir(&self) -> PathBuf {
        self.root.join("bundles")
    }

    pub fn bundle_dir(&self, bundle_id: &str) -> PathBuf {
        self.bundles_dir().join(bundle_id)
    }

    /// Convert an absolute path into a data-dir relative string for display.
    pub fn rel_path(&self, path: &Path) -> String {
        crate::util::display_path(path, Some(&self.root))
    }
}
