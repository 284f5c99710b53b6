//! Count- and age-based eviction shared by documents and bundles.
use crate::error::{Result, ShiftError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Policy {
    pub max_count: usize,
    /// `None` disables the age check.
    pub max_age: Option<Duration>,
}

/// Collect entries of `dir` accepted by `name_of`, oldest first (ties by name).
pub(crate) fn scan(dir: &Path, name_of: impl Fn(&Path) -> Option<String>) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
        Err(err) => return Err(ShiftError::io("read", dir, err)),
    };
    for entry in read {
        let entry = entry.map_err(|err| ShiftError::io("read", dir, err))?;
        let path = entry.path();
        let Some(name) = name_of(&path) else {
            continue;
        };
        let modified = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .map_err(|err| ShiftError::io("stat", &path, err))?;
        entries.push(Entry {
            name,
            path,
            modified,
        });
    }
    entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

/// Pick the entries to evict: the oldest beyond `max_count`, plus any older
/// than `max_age`. `keep` is never selected.
pub(crate) fn select_evictions<'a>(
    entries: &'a [Entry],
    policy: Policy,
    now: SystemTime,
    keep: Option<&str>,
) -> Vec<&'a Entry> {
    let candidates: Vec<&Entry> = entries
        .iter()
        .filter(|entry| Some(entry.name.as_str()) != keep)
        .collect();
    let excess = entries.len().saturating_sub(policy.max_count);
    candidates
        .into_iter()
        .enumerate()
        .filter(|(index, entry)| {
            *index < excess
                || policy.max_age.is_some_and(|max_age| {
                    now.duration_since(entry.modified)
                        .map(|age| age > max_age)
                        .unwrap_or(false)
                })
        })
        .map(|(_, entry)| entry)
        .collect()
}

/// Evict per `policy`, logging and skipping failures. Returns removed names.
pub(crate) fn enforce(
    what: &'static str,
    entries: &[Entry],
    policy: Policy,
    keep: Option<&str>,
) -> Vec<String> {
    let mut removed = Vec::new();
    for entry in select_evictions(entries, policy, SystemTime::now(), keep) {
        let result = if entry.path.is_dir() {
            fs::remove_dir_all(&entry.path)
        } else {
            fs::remove_file(&entry.path)
        };
        match result {
            Ok(()) => {
                tracing::info!(what, name = %entry.name, "evicted by retention");
                removed.push(entry.name.clone());
            }
            Err(err) => {
                tracing::warn!(what, name = %entry.name, error = %err, "retention cleanup failed");
            }
        }
    }
    removed
}
