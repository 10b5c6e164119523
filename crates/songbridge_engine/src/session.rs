use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use flow_logging::flow_debug;

use crate::page::{Cookie, PageEngine};
use crate::persist::{self, PersistError};

/// Failures of the persisted-session store. A missing or malformed file is an
/// expected condition callers check for, not a defect.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no saved session at {0}")]
    NotFound(PathBuf),
    #[error("session file malformed: {0}")]
    Malformed(String),
    #[error("session directory missing or not writable: {0}")]
    SessionDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<PersistError> for SessionError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::OutputDir(msg) => SessionError::SessionDir(msg),
            PersistError::Io(err) => SessionError::Io(err),
            PersistError::Serde(msg) => SessionError::Malformed(msg),
        }
    }
}

/// What `clear_session` found at the keyed location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Removed,
    NotFound,
}

/// Persists the credential bundle wholesale, creating missing parent
/// directories and overwriting any prior record.
pub fn save_session(path: &Path, cookies: &[Cookie]) -> Result<(), SessionError> {
    let json = serde_json::to_string_pretty(cookies)
        .map_err(|err| SessionError::Malformed(err.to_string()))?;
    persist::write_atomic(path, &json)?;
    flow_debug!("saved {} cookies to {:?}", cookies.len(), path);
    Ok(())
}

/// Reads the credential bundle back wholesale.
pub fn load_session(path: &Path) -> Result<Vec<Cookie>, SessionError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(SessionError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(SessionError::Io(err)),
    };
    serde_json::from_str(&content).map_err(|err| SessionError::Malformed(err.to_string()))
}

/// Deletes the persisted record, reporting whether one existed.
pub fn clear_session(path: &Path) -> Result<ClearOutcome, SessionError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(ClearOutcome::Removed),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(ClearOutcome::NotFound),
        Err(err) => Err(SessionError::Io(err)),
    }
}

/// Delegated validity probe: true only when the probe selector matches at
/// least one element. Any engine failure reads as invalid — absence of
/// evidence is treated as invalidity.
pub async fn is_session_valid(engine: &dyn PageEngine, probe_selector: &str) -> bool {
    match engine.count(probe_selector).await {
        Ok(count) => count > 0,
        Err(err) => {
            flow_debug!("session probe failed, treating as invalid: {err}");
            false
        }
    }
}
