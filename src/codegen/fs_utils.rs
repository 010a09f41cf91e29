//! Filesystem utilities for code generation

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{CodegenError, Result};

/// Write content to a file, creating parent directories if needed
pub fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CodegenError::io(parent, e))?;
        }
    }

    fs::write(path, contents).map_err(|e| CodegenError::io(path, e))
}

/// Write `after` unless it equals `before`. Returns whether the file changed.
pub fn write_if_changed<P: AsRef<Path>>(path: P, before: &str, after: &str) -> Result<bool> {
    if before == after {
        tracing::debug!("{} unchanged", path.as_ref().display());
        return Ok(false);
    }
    write_file(path, after)?;
    Ok(true)
}

/// Read a file, mapping "not found" to `Ok(None)`
pub fn read_if_exists<P: AsRef<Path>>(path: P) -> Result<Option<String>> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CodegenError::io(path, e)),
    }
}

/// Remove a file. Returns `false` when there was nothing to remove.
pub fn remove_file_if_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CodegenError::io(path, e)),
    }
}
