//! Output bundle naming, listing, and archiving.
use crate::error::{Result, ShiftError};
use crate::store::retention;
use crate::store::{validate_name, DataPaths};
use chrono::{DateTime, NaiveDate, Utc};
use flate2::{write::GzEncoder, Compression};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn bundle_regex() -> &'static Regex {
    static BUNDLE: OnceLock<Regex> = OnceLock::new();
    BUNDLE.get_or_init(|| Regex::new(r"^shift_.+_\d{8}$").expect("regex for bundle ids"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleInfo {
    pub bundle_id: String,
    pub created_at: DateTime<Utc>,
}

/// `shift_<source>_<YYYYMMDD>` for a run on `date`.
pub fn bundle_name(source: &str, date: NaiveDate) -> String {
    format!("shift_{source}_{}", date.format("%Y%m%d"))
}

pub fn is_bundle_id(id: &str) -> bool {
    bundle_regex().is_match(id)
}

pub fn check_bundle_id(id: &str) -> Result<()> {
    validate_name(id)?;
    if !is_bundle_id(id) {
        return Err(ShiftError::InvalidName {
            name: id.to_string(),
            reason: "bundle ids look like shift_<name>_<YYYYMMDD>",
        });
    }
    Ok(())
}

pub(crate) fn scan(paths: &DataPaths) -> Result<Vec<retention::Entry>> {
    retention::scan(&paths.bundles_dir(), |path| {
        if !path.is_dir() {
            return None;
        }
        let name = path.file_name()?.to_str()?;
        is_bundle_id(name).then(|| name.to_string())
    })
}

/// Bundles newest first, at most `limit` of them.
pub fn list(paths: &DataPaths, limit: usize) -> Result<Vec<BundleInfo>> {
    let mut entries = scan(paths)?;
    entries.reverse();
    Ok(entries
        .into_iter()
        .take(limit)
        .map(|entry| BundleInfo {
            bundle_id: entry.name,
            created_at: DateTime::<Utc>::from(entry.modified),
        })
        .collect())
}

/// Evict bundles beyond `max_bundles`, never the one just produced.
pub fn enforce_retention(paths: &DataPaths, max_bundles: usize, keep: &str) -> Vec<String> {
    let policy = retention::Policy {
        max_count: max_bundles,
        max_age: None,
    };
    match scan(paths) {
        Ok(entries) => retention::enforce("bundle", &entries, policy, Some(keep)),
        Err(err) => {
            tracing::warn!(error = %err, "bundle retention scan failed");
            Vec::new()
        }
    }
}

/// Gzip-compressed tar of the bundle directory, rooted at `<bundle_id>/`.
pub fn archive(paths: &DataPaths, bundle_id: &str) -> Result<Vec<u8>> {
    check_bundle_id(bundle_id)?;
    let root = paths.bundle_dir(bundle_id);
    if !root.is_dir() {
        return Err(ShiftError::not_found("bundle", bundle_id));
    }
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for file in collect_files_recursive(&root)? {
        let rel = file.strip_prefix(&root).unwrap_or(&file);
        let name = Path::new(bundle_id).join(rel);
        let bytes = fs::read(&file).map_err(|err| ShiftError::io("read", &file, err))?;
        let mut header = tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_cksum();
        builder
            .append_data(&mut header, &name, bytes.as_slice())
            .map_err(|err| ShiftError::io("archive", &file, err))?;
    }
    let encoder = builder
        .into_inner()
        .map_err(|err| ShiftError::io("archive", &root, err))?;
    encoder
        .finish()
        .map_err(|err| ShiftError::io("compress", &root, err))
}

fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let read = fs::read_dir(root).map_err(|err| ShiftError::io("read", root, err))?;
    for entry in read {
        let entry = entry.map_err(|err| ShiftError::io("read", root, err))?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_files_recursive(&path)?);
        } else if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
