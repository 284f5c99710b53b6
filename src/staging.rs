//! Atomic publication of files and byte snapshots of the staging slot.
use crate::error::{Result, ShiftError};
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Write `bytes` to `dest` through a sibling temp file and a rename, so
/// readers see either the old or the new content.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|err| ShiftError::io("create", parent, err))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".publish-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|err| ShiftError::io("create temp file in", parent, err))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|err| ShiftError::io("write", tmp.path().to_path_buf(), err))?;
    tmp.persist(dest)
        .map_err(|err| ShiftError::io("publish", dest, err.error))?;
    Ok(())
}

pub fn write_json_atomic<T: Serialize>(dest: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_atomic(dest, &bytes)
}

/// Exact bytes of a file (or its absence) captured before an engine run.
#[derive(Debug)]
pub struct SlotSnapshot {
    path: PathBuf,
    contents: Option<Vec<u8>>,
}

impl SlotSnapshot {
    pub fn capture(path: &Path) -> Result<Self> {
        let contents = match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(ShiftError::io("read", path, err)),
        };
        Ok(Self {
            path: path.to_path_buf(),
            contents,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_unchanged(&self) -> Result<bool> {
        Ok(Self::capture(&self.path)?.contents == self.contents)
    }

    /// Put the captured bytes back. Returns `true` when the file had drifted.
    pub fn restore(&self) -> Result<bool> {
        if self.is_unchanged()? {
            return Ok(false);
        }
        match &self.contents {
            Some(bytes) => write_atomic(&self.path, bytes)?,
            None => fs::remove_file(&self.path)
                .or_else(|err| match err.kind() {
                    ErrorKind::NotFound => Ok(()),
                    _ => Err(err),
                })
                .map_err(|err| ShiftError::io("remove", &self.path, err))?,
        }
        Ok(true)
    }
}
