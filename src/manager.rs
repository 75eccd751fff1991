//! Session manager — save, restore, and curate folder sessions.
//!
//! Coordinates discovery, the session store, and the folder opener.
//! Window enumeration and file I/O run on the blocking pool; folders are
//! opened one at a time with a short pause after each, so the desktop
//! shell is not flooded during a restore.
//!
//! Callers must not run overlapping save/restore operations; nothing here
//! serializes them.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::discovery::FolderDiscovery;
use crate::folder::FolderRecord;
use crate::resolver::FolderOpener;
use crate::session::{Session, SessionUpdate};
use crate::store::{SessionStore, StoreError};

/// Pause after each successful folder open.
pub const DEFAULT_OPEN_DELAY: Duration = Duration::from_millis(200);

/// Session operation error.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session name must not be empty")]
    EmptyName,

    #[error("a session needs at least one folder")]
    NoFolders,

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("session '{0}' has no accessible folders")]
    NoAccessibleFolders(String),

    #[error("none of the folders in session '{0}' could be opened")]
    OpenFailed(String),

    #[error(transparent)]
    Store(StoreError),

    #[error("background task failed: {0}")]
    Worker(String),
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Folders of a session split by current accessibility.
#[derive(Debug, Clone, Default)]
pub struct FolderSplit {
    pub accessible: Vec<FolderRecord>,
    pub inaccessible: Vec<FolderRecord>,
}

/// Outcome of a successful restore.
#[derive(Debug, Clone)]
pub struct RestoreReport {
    /// The session as it stands after the restore.
    pub session: Session,
    pub opened: Vec<FolderRecord>,
    /// Accessible folders the opener rejected.
    pub failed: Vec<FolderRecord>,
    /// Folders skipped because they are missing or unreadable.
    pub inaccessible: Vec<FolderRecord>,
}

/// Entry point for every user-facing session operation.
pub struct SessionManager {
    discovery: FolderDiscovery,
    store: Arc<SessionStore>,
    opener: Arc<dyn FolderOpener>,
    open_delay: Duration,
}

impl SessionManager {
    pub fn new(
        discovery: FolderDiscovery,
        store: SessionStore,
        opener: Arc<dyn FolderOpener>,
    ) -> Self {
        Self {
            discovery,
            store: Arc::new(store),
            opener,
            open_delay: DEFAULT_OPEN_DELAY,
        }
    }

    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Folders currently open in file-manager windows.
    pub async fn current_folders(&self) -> Vec<FolderRecord> {
        let discovery = self.discovery.clone();
        blocking(move || discovery.open_folders())
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "folder discovery failed");
                Vec::new()
            })
    }

    /// Save the currently open folders as a new session.
    pub async fn save_current(
        &self,
        name: &str,
        description: Option<String>,
        tags: Vec<String>,
    ) -> Result<Session, SessionError> {
        if name.trim().is_empty() {
            tracing::warn!("cannot save session: name is empty");
            return Err(SessionError::EmptyName);
        }
        let folders = self.current_folders().await;
        self.save_session(name, folders, description, tags).await
    }

    /// Save `folders` as a new session named `name`.
    ///
    /// Folders are deduplicated by identity and re-probed before saving.
    pub async fn save_session(
        &self,
        name: &str,
        folders: Vec<FolderRecord>,
        description: Option<String>,
        tags: Vec<String>,
    ) -> Result<Session, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            tracing::warn!("cannot save session: name is empty");
            return Err(SessionError::EmptyName);
        }
        if folders.is_empty() {
            tracing::warn!(session = name, "cannot save session: no folders");
            return Err(SessionError::NoFolders);
        }

        let session = Session::new(name, unique_folders(folders))
            .with_description(description)
            .with_tags(tags);

        let store = Arc::clone(&self.store);
        let session = blocking(move || {
            let mut session = session;
            session.refresh_folder_statuses();
            store.upsert(&session).map(|()| session)
        })
        .await??;

        tracing::info!(
            id = %session.id,
            name = %session.name,
            folders = session.folders.len(),
            "saved session"
        );
        Ok(session)
    }

    pub async fn all_sessions(&self) -> Vec<Session> {
        let store = Arc::clone(&self.store);
        blocking(move || store.load()).await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "loading sessions failed");
            Vec::new()
        })
    }

    pub async fn session(&self, id: &str) -> Option<Session> {
        if id.trim().is_empty() {
            return None;
        }
        self.all_sessions().await.into_iter().find(|s| s.id == id)
    }

    pub async fn favorites(&self) -> Vec<Session> {
        let favorites: Vec<Session> = self
            .all_sessions()
            .await
            .into_iter()
            .filter(|s| s.is_favorite)
            .collect();
        tracing::debug!(count = favorites.len(), "favorite sessions");
        favorites
    }

    /// Case-insensitive substring search over name, description, tags and
    /// folder paths. A blank query returns every session.
    pub async fn search(&self, text: &str) -> Vec<Session> {
        let sessions = self.all_sessions().await;
        if text.trim().is_empty() {
            return sessions;
        }
        let query = text.to_lowercase();
        let results: Vec<Session> = sessions
            .into_iter()
            .filter(|s| s.matches_query(&query))
            .collect();
        tracing::info!(query = text, count = results.len(), "searched sessions");
        results
    }

    /// The session restored most recently, if any has been restored.
    pub async fn last_used(&self) -> Option<Session> {
        self.all_sessions()
            .await
            .into_iter()
            .filter(|s| s.last_used_at.is_some())
            .max_by_key(|s| s.last_used_at)
    }

    /// Apply `update` to the stored session. Replacement folders are
    /// deduplicated and re-probed the same way `save_session` does.
    pub async fn update_session(
        &self,
        id: &str,
        update: SessionUpdate,
    ) -> Result<Session, SessionError> {
        if update.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
            return Err(SessionError::EmptyName);
        }
        if update.folders.as_ref().is_some_and(Vec::is_empty) {
            return Err(SessionError::NoFolders);
        }

        let replaces_folders = update.folders.is_some();
        let update = SessionUpdate {
            folders: update.folders.map(unique_folders),
            ..update
        };

        let mut session = self.require(id).await?;
        session.apply(update);
        if replaces_folders {
            session = refreshed(session).await?;
        }
        let session = self.persist(session).await?;
        tracing::info!(id = %session.id, name = %session.name, "updated session");
        Ok(session)
    }

    /// Flip the favorite flag and return its new value.
    pub async fn toggle_favorite(&self, id: &str) -> Result<bool, SessionError> {
        let mut session = self.require(id).await?;
        let favorite = session.toggle_favorite();
        self.persist(session).await?;
        tracing::info!(id, favorite, "toggled favorite");
        Ok(favorite)
    }

    pub async fn delete_session(&self, id: &str) -> Result<Session, SessionError> {
        let store = Arc::clone(&self.store);
        let owned = id.to_string();
        let removed = blocking(move || store.delete(&owned)).await??;
        tracing::info!(id, name = %removed.name, "deleted session");
        Ok(removed)
    }

    /// Re-probe a session's folders without opening anything, so a caller
    /// can ask the user before restoring a partially available session.
    pub async fn check_session(&self, id: &str) -> Result<FolderSplit, SessionError> {
        let session = self.require(id).await?;
        let session = refreshed(session).await?;
        Ok(FolderSplit {
            accessible: session.accessible_folders(),
            inaccessible: session.inaccessible_folders(),
        })
    }

    pub async fn restore_session(&self, id: &str) -> Result<RestoreReport, SessionError> {
        let session = self.require(id).await?;
        self.restore(session).await
    }

    /// Open every accessible folder of `session`.
    ///
    /// Inaccessible folders are skipped and reported. Fails when nothing
    /// is accessible or nothing could be opened; only a successful restore
    /// records `last_used_at`.
    pub async fn restore(&self, session: Session) -> Result<RestoreReport, SessionError> {
        let mut session = refreshed(session).await?;
        let accessible = session.accessible_folders();
        let inaccessible = session.inaccessible_folders();

        if !inaccessible.is_empty() {
            tracing::warn!(
                name = %session.name,
                count = inaccessible.len(),
                "session has inaccessible folders"
            );
        }
        if accessible.is_empty() {
            tracing::warn!(name = %session.name, "session has no accessible folders");
            return Err(SessionError::NoAccessibleFolders(session.name));
        }

        let (opened, failed) = self.open_all(accessible).await;
        if opened.is_empty() {
            return Err(SessionError::OpenFailed(session.name));
        }

        let store = Arc::clone(&self.store);
        let id = session.id.clone();
        let recorded = blocking(move || -> Result<Option<Session>, StoreError> {
            let Some(mut stored) = store.get(&id) else {
                return Ok(None);
            };
            stored.mark_used();
            store.upsert(&stored)?;
            Ok(Some(stored))
        })
        .await?;

        match recorded {
            Ok(Some(stored)) => session = stored,
            Ok(None) => {
                tracing::debug!(
                    id = %session.id,
                    "restored session is not stored, usage not recorded"
                );
                session.mark_used();
            }
            Err(e) => {
                tracing::error!(id = %session.id, error = %e, "failed to record session usage");
                session.mark_used();
            }
        }

        tracing::info!(
            name = %session.name,
            opened = opened.len(),
            failed = failed.len(),
            skipped = inaccessible.len(),
            "restored session"
        );
        Ok(RestoreReport {
            session,
            opened,
            failed,
            inaccessible,
        })
    }

    pub async fn backup(&self) -> Result<(), SessionError> {
        let store = Arc::clone(&self.store);
        Ok(blocking(move || store.backup()).await??)
    }

    pub async fn restore_from_backup(&self) -> Result<(), SessionError> {
        let store = Arc::clone(&self.store);
        Ok(blocking(move || store.restore_from_backup()).await??)
    }

    async fn open_all(&self, folders: Vec<FolderRecord>) -> (Vec<FolderRecord>, Vec<FolderRecord>) {
        let mut opened = Vec::new();
        let mut failed = Vec::new();
        let total = folders.len();

        for (index, folder) in folders.into_iter().enumerate() {
            match self.opener.open(Path::new(&folder.path)).await {
                Ok(()) => {
                    tracing::debug!(path = %folder.path, "opened folder");
                    opened.push(folder);
                    if index + 1 < total && !self.open_delay.is_zero() {
                        tokio::time::sleep(self.open_delay).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %folder.path, error = %e, "failed to open folder");
                    failed.push(folder);
                }
            }
        }

        (opened, failed)
    }

    async fn require(&self, id: &str) -> Result<Session, SessionError> {
        self.session(id)
            .await
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    async fn persist(&self, session: Session) -> Result<Session, SessionError> {
        let store = Arc::clone(&self.store);
        Ok(blocking(move || store.upsert(&session).map(|()| session)).await??)
    }
}

/// Drop folders whose identity was already seen, keeping the first.
fn unique_folders(folders: Vec<FolderRecord>) -> Vec<FolderRecord> {
    let mut seen = HashSet::new();
    folders.into_iter().filter(|f| seen.insert(f.key())).collect()
}

async fn refreshed(session: Session) -> Result<Session, SessionError> {
    blocking(move || {
        let mut session = session;
        session.refresh_folder_statuses();
        session
    })
    .await
}

/// Run `f` on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, SessionError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SessionError::Worker(e.to_string()))
}
