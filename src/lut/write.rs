//! Atomic artifact output.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{LutError, Result};

/// Write `bytes` to `path` through a temporary file in the same directory,
/// renamed into place once fully written. A crash mid-write leaves either the
/// old file or none, never a truncated one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| LutError::io(dir, e))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| LutError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| LutError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| LutError::io(path, e))?;
    tmp.persist(path).map_err(|e| LutError::io(path, e.error))?;
    Ok(())
}
