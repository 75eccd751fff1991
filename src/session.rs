//! Session model — a named, persisted set of folders.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::folder::FolderRecord;

/// Version written into every sessions file.
pub const FILE_VERSION: &str = "1.0.0";

/// A saved set of folders plus user metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Generated once at creation; never changes.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub folders: Vec<FolderRecord>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Unset until the first successful restore.
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(name: impl Into<String>, folders: Vec<FolderRecord>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            folders,
            tags: BTreeSet::new(),
            is_favorite: false,
            created_at: now,
            updated_at: now,
            last_used_at: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = clean_tags(tags);
        self
    }

    /// Advance `updated_at`. Strictly increases even if the clock has not
    /// moved since the previous mutation.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + TimeDelta::microseconds(1)
        };
    }

    /// Record a successful restore.
    pub fn mark_used(&mut self) {
        self.last_used_at = Some(Utc::now());
        self.touch();
    }

    pub fn toggle_favorite(&mut self) -> bool {
        self.is_favorite = !self.is_favorite;
        self.touch();
        self.is_favorite
    }

    /// Re-probe every folder. A read-side recompute: does not touch.
    pub fn refresh_folder_statuses(&mut self) {
        for folder in &mut self.folders {
            folder.refresh_status();
        }
    }

    pub fn accessible_folders(&self) -> Vec<FolderRecord> {
        self.folders.iter().filter(|f| f.is_accessible).cloned().collect()
    }

    pub fn inaccessible_folders(&self) -> Vec<FolderRecord> {
        self.folders.iter().filter(|f| !f.is_accessible).cloned().collect()
    }

    /// Case-insensitive substring match on name, description, tags and
    /// folder paths. `query` must already be lower-cased.
    pub fn matches_query(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
            || self
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(query))
            || self.tags.iter().any(|t| t.to_lowercase().contains(query))
            || self.folders.iter().any(|f| f.path.to_lowercase().contains(query))
    }

    /// Apply a partial update. Validation is the caller's job.
    pub fn apply(&mut self, update: SessionUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description.filter(|d| !d.trim().is_empty());
        }
        if let Some(tags) = update.tags {
            self.tags = clean_tags(tags);
        }
        if let Some(folders) = update.folders {
            self.folders = folders;
        }
        self.touch();
    }
}

/// Fields to change on an existing session; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub folders: Option<Vec<FolderRecord>>,
}

impl SessionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn folders(mut self, folders: Vec<FolderRecord>) -> Self {
        self.folders = Some(folders);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.folders.is_none()
    }
}

/// On-disk aggregate written by the session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    pub version: String,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl SessionFile {
    pub fn new(sessions: Vec<Session>) -> Self {
        Self {
            version: FILE_VERSION.to_string(),
            last_modified: Utc::now(),
            sessions,
        }
    }
}

fn clean_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tags.into_iter()
        .map(|t| t.into().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Session {
        Session::new("Work", vec![FolderRecord::new("/home/me/Projects/Alpha")])
            .with_description(Some("Quarterly Reports".into()))
            .with_tags(["Client", " billing ", ""])
    }

    #[test]
    fn new_session_has_unique_id() {
        let a = Session::new("a", Vec::new());
        let b = Session::new("a", Vec::new());
        assert_ne!(a.id, b.id);
        assert!(a.last_used_at.is_none());
        assert_eq!(a.created_at, a.updated_at);
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let session = sample().with_tags(["x", "x ", "y"]);
        assert_eq!(session.tags.len(), 2);
        assert!(sample().tags.contains("billing"));
    }

    #[test]
    fn touch_strictly_advances() {
        let mut session = sample();
        let mut previous = session.updated_at;
        for _ in 0..100 {
            session.touch();
            assert!(session.updated_at > previous);
            previous = session.updated_at;
        }
    }

    #[test]
    fn mark_used_sets_last_used() {
        let mut session = sample();
        let before = session.updated_at;
        session.mark_used();
        assert!(session.last_used_at.is_some());
        assert!(session.updated_at > before);
    }

    #[test]
    fn refresh_does_not_touch() {
        let mut session = sample();
        let before = session.updated_at;
        session.refresh_folder_statuses();
        assert_eq!(session.updated_at, before);
    }

    #[test]
    fn query_matches_every_field() {
        let session = sample();
        assert!(session.matches_query("work"));
        assert!(session.matches_query("quarterly"));
        assert!(session.matches_query("client"));
        assert!(session.matches_query("projects/alpha"));
        assert!(!session.matches_query("beta"));
    }

    #[test]
    fn apply_update_changes_only_given_fields() {
        let mut session = sample();
        let before = session.updated_at;
        session.apply(SessionUpdate::new().name("  Home  ").description(None));

        assert_eq!(session.name, "Home");
        assert!(session.description.is_none());
        assert!(session.tags.contains("Client"));
        assert_eq!(session.folders.len(), 1);
        assert!(session.updated_at > before);
    }

    #[test]
    fn nullable_fields_serialize_as_null() {
        let session = Session::new("Work", Vec::new());
        let json = serde_json::to_value(&session).unwrap();
        assert!(json["description"].is_null());
        assert!(json["lastUsedAt"].is_null());
        assert_eq!(json["isFavorite"], false);
        assert!(json["tags"].is_array());
    }
}
