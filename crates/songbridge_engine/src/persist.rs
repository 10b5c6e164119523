use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use thiserror::Error;

use songbridge_core::Library;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serde(String),
}

/// Ensure the file's parent directory exists; create it if missing.
pub fn ensure_parent_dir(path: &Path) -> Result<(), PersistError> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write `content` to `path` by writing a temp file then renaming.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), PersistError> {
    ensure_parent_dir(path)?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;

    // Replace existing file if present to keep determinism.
    if path.exists() {
        fs::remove_file(path)?;
    }
    tmp.persist(path).map_err(|e| PersistError::Io(e.error))?;
    Ok(())
}

/// Writes the whole output aggregate as pretty JSON.
pub fn save_library(path: &Path, library: &Library) -> Result<(), PersistError> {
    let json = serde_json::to_string_pretty(library)
        .map_err(|err| PersistError::Serde(err.to_string()))?;
    write_atomic(path, &json)
}

/// Reads the whole output aggregate back.
pub fn load_library(path: &Path) -> Result<Library, PersistError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|err| PersistError::Serde(err.to_string()))
}
