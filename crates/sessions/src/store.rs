//! Persistent store: one JSON document per session.
//!
//! Documents live at `<base_dir>/.session-<name>.json`.  Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so a reader sees either the previous or the new document and
//! never a partial one.  The store takes no locks.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use cu_domain::error::{Error, Result};

use crate::model::SessionDocument;

pub const SESSION_FILE_PREFIX: &str = ".session-";
pub const SESSION_FILE_SUFFIX: &str = ".json";
const LOCK_FILE_SUFFIX: &str = ".lock";

/// A session document found on disk by [`SessionStore::list`].
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub name: String,
    pub path: PathBuf,
    pub modified: Option<DateTime<Utc>>,
}

/// File-backed store rooted at an installation base directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    base_dir: PathBuf,
}

impl SessionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the document backing `session`.
    pub fn path_for(&self, session: &str) -> Result<PathBuf> {
        validate_session_name(session)?;
        Ok(self
            .base_dir
            .join(format!("{SESSION_FILE_PREFIX}{session}{SESSION_FILE_SUFFIX}")))
    }

    /// Path of the advisory lock file guarding `session`.
    pub fn lock_path_for(&self, session: &str) -> Result<PathBuf> {
        validate_session_name(session)?;
        Ok(self
            .base_dir
            .join(format!("{SESSION_FILE_PREFIX}{session}{LOCK_FILE_SUFFIX}")))
    }

    /// Read the whole document, `None` when the session has no record.
    pub fn read(&self, session: &str) -> Result<Option<SessionDocument>> {
        let path = self.path_for(session)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::storage(path, e)),
        };
        let doc = serde_json::from_str(&raw).map_err(|source| Error::Corrupt {
            path: path.clone(),
            source,
        })?;
        Ok(Some(doc))
    }

    /// Replace the whole document, creating the base directory if needed.
    pub fn write(&self, session: &str, doc: &SessionDocument) -> Result<PathBuf> {
        let path = self.path_for(session)?;
        fs::create_dir_all(&self.base_dir).map_err(|e| Error::storage(&self.base_dir, e))?;

        let json = serde_json::to_string_pretty(doc).map_err(|source| Error::Encode {
            path: path.clone(),
            source,
        })?;

        let mut tmp = tempfile::Builder::new()
            .prefix(SESSION_FILE_PREFIX)
            .suffix(".tmp")
            .tempfile_in(&self.base_dir)
            .map_err(|e| Error::storage(&self.base_dir, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| Error::storage(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| Error::storage(&path, e.error))?;

        tracing::debug!(session, path = %path.display(), "session document written");
        Ok(path)
    }

    /// Delete the document.  Returns whether a file was removed.
    pub fn delete(&self, session: &str) -> Result<bool> {
        let path = self.path_for(session)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(session, path = %path.display(), "session document deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(path, e)),
        }
    }

    /// All session documents under the base directory, sorted by name.
    pub fn list(&self) -> Result<Vec<StoredSession>> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::storage(&self.base_dir, e)),
        };

        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::storage(&self.base_dir, e))?;
            let file_name = entry.file_name();
            let Some(name) = file_name
                .to_str()
                .and_then(|f| f.strip_prefix(SESSION_FILE_PREFIX))
                .and_then(|f| f.strip_suffix(SESSION_FILE_SUFFIX))
            else {
                continue;
            };
            if validate_session_name(name).is_err() {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from);
            sessions.push(StoredSession {
                name: name.to_owned(),
                path: entry.path(),
                modified,
            });
        }
        sessions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sessions)
    }
}

/// Session names become part of a file name: they must be non-empty and
/// free of path separators.
pub fn validate_session_name(session: &str) -> Result<()> {
    if session.is_empty() {
        return Err(Error::InvalidArgument(
            "session name must not be empty".into(),
        ));
    }
    if session.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidArgument(format!(
            "session name '{session}' must not contain path separators"
        )));
    }
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
