//! Session store — `sessions.json` with a sibling backup.
//!
//! Every save first copies the current file to `sessions_backup.json`,
//! then writes the full session list to a temp file and renames it into
//! place. A malformed primary file is replaced from the backup once
//! before giving up.
//!
//! Single-record operations load everything, mutate in memory, and save
//! everything. Session counts are small, so there is no partial update
//! path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::session::{Session, SessionFile};

const DATA_FILE: &str = "sessions.json";
const BACKUP_FILE: &str = "sessions_backup.json";

/// Session store error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed sessions file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode sessions: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("no backup file at {}", .0.display())]
    NoBackup(PathBuf),
}

/// Durable JSON store for all sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    primary: PathBuf,
    backup: PathBuf,
}

impl SessionStore {
    /// Open the store rooted at `data_dir`, creating the directory if
    /// needed. Creation failure is logged; writes will report it again.
    pub fn open(data_dir: &Path) -> Self {
        if let Err(e) = fs::create_dir_all(data_dir) {
            tracing::error!(
                dir = %data_dir.display(),
                error = %e,
                "failed to create data directory"
            );
        }
        Self {
            primary: data_dir.join(DATA_FILE),
            backup: data_dir.join(BACKUP_FILE),
        }
    }

    pub fn data_file_path(&self) -> &Path {
        &self.primary
    }

    pub fn backup_file_path(&self) -> &Path {
        &self.backup
    }

    /// Load all sessions. Never fails: unreadable or unrecoverable files
    /// degrade to an empty list after logging.
    pub fn load(&self) -> Vec<Session> {
        match self.load_recovering() {
            Ok(sessions) => {
                tracing::debug!(count = sessions.len(), "loaded sessions");
                sessions
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load sessions");
                Vec::new()
            }
        }
    }

    /// Replace the stored session list.
    pub fn save(&self, sessions: &[Session]) -> Result<(), StoreError> {
        if let Err(e) = self.backup() {
            tracing::warn!(error = %e, "backup before write failed, writing anyway");
        }

        let file = SessionFile::new(sessions.to_vec());
        let json = serde_json::to_string_pretty(&file).map_err(StoreError::Encode)?;
        self.write_primary(json.as_bytes())?;

        tracing::info!(count = sessions.len(), path = %self.primary.display(), "saved sessions");
        Ok(())
    }

    /// Copy the primary file over the backup. A missing primary is not an
    /// error: there is nothing to protect yet.
    pub fn backup(&self) -> Result<(), StoreError> {
        if !self.primary.exists() {
            return Ok(());
        }
        fs::copy(&self.primary, &self.backup).map_err(|source| StoreError::Io {
            path: self.backup.clone(),
            source,
        })?;
        tracing::debug!(path = %self.backup.display(), "backed up sessions file");
        Ok(())
    }

    /// Copy the backup over the primary file.
    pub fn restore_from_backup(&self) -> Result<(), StoreError> {
        if !self.backup.exists() {
            return Err(StoreError::NoBackup(self.backup.clone()));
        }
        let bytes = fs::read(&self.backup).map_err(|source| StoreError::Io {
            path: self.backup.clone(),
            source,
        })?;
        self.write_primary(&bytes)?;
        tracing::info!(path = %self.primary.display(), "restored sessions file from backup");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.load().into_iter().find(|s| s.id == id)
    }

    /// Insert `session`, or replace the stored session with the same id.
    pub fn upsert(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self.load_for_update()?;
        match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session.clone(),
            None => sessions.push(session.clone()),
        }
        self.save(&sessions)
    }

    /// Remove the session with `id` and return it.
    pub fn delete(&self, id: &str) -> Result<Session, StoreError> {
        let mut sessions = self.load_for_update()?;
        let index = sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let removed = sessions.remove(index);
        self.save(&sessions)?;
        Ok(removed)
    }

    /// Read the primary file, restoring from backup once if it is malformed.
    fn load_recovering(&self) -> Result<Vec<Session>, StoreError> {
        match self.read_primary() {
            Err(StoreError::Parse { source, .. }) => {
                tracing::warn!(error = %source, "sessions file is malformed, trying backup");
                self.restore_from_backup()?;
                self.read_primary()
            }
            other => other,
        }
    }

    /// Load for a read-modify-write cycle.
    ///
    /// I/O failures abort the mutation so a transient read error cannot
    /// overwrite the stored sessions. An unrecoverable malformed file is
    /// treated as empty, as `load` does.
    fn load_for_update(&self) -> Result<Vec<Session>, StoreError> {
        match self.load_recovering() {
            Ok(sessions) => Ok(sessions),
            Err(e @ StoreError::Io { .. }) => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "starting from an empty session list");
                Ok(Vec::new())
            }
        }
    }

    fn read_primary(&self) -> Result<Vec<Session>, StoreError> {
        let bytes = match fs::read(&self.primary) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.primary.clone(),
                    source,
                });
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            tracing::warn!(path = %self.primary.display(), "sessions file is empty");
            return Ok(Vec::new());
        }

        let file: SessionFile = serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            path: self.primary.clone(),
            source,
        })?;
        Ok(file.sessions)
    }

    /// Write to a `.tmp` sibling, then rename into place.
    fn write_primary(&self, contents: &[u8]) -> Result<(), StoreError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };

        if let Some(parent) = self.primary.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let tmp = self.primary.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &self.primary).map_err(io_err(&self.primary))?;
        Ok(())
    }
}
