//! Folder discovery — which folders are open in file-manager windows.

use std::collections::HashSet;
use std::sync::Arc;

use crate::folder::FolderRecord;
use crate::resolver::WindowSource;
use crate::resolver::title::resolve_title;

/// Turns open file-manager windows into folder records.
#[derive(Clone)]
pub struct FolderDiscovery {
    windows: Arc<dyn WindowSource>,
}

impl FolderDiscovery {
    pub fn new(windows: Arc<dyn WindowSource>) -> Self {
        Self { windows }
    }

    /// Folders currently open, in window enumeration order.
    ///
    /// Titles that do not resolve are dropped; duplicates (compared
    /// case-insensitively) keep the first occurrence. Each surviving
    /// record has fresh status. A failed enumeration yields an empty list.
    pub fn open_folders(&self) -> Vec<FolderRecord> {
        let handles = match self.windows.file_manager_windows() {
            Ok(handles) => handles,
            Err(e) => {
                tracing::error!(error = %e, "failed to enumerate file-manager windows");
                return Vec::new();
            }
        };
        tracing::info!(windows = handles.len(), "found file-manager windows");

        let mut seen = HashSet::new();
        let mut folders = Vec::new();

        for handle in handles {
            let title = match self.windows.window_title(handle) {
                Ok(title) => title,
                Err(e) => {
                    tracing::debug!(window = %handle, error = %e, "skipping window without title");
                    continue;
                }
            };

            let Some(path) = resolve_title(&title) else {
                tracing::debug!(window = %handle, %title, "title did not resolve to a folder");
                continue;
            };

            let mut folder = FolderRecord::new(&path);
            if !seen.insert(folder.key()) {
                continue;
            }
            folder.refresh_status();
            tracing::debug!(window = %handle, path = %folder.path, "discovered folder");
            folders.push(folder);
        }

        tracing::info!(count = folders.len(), "discovered unique open folders");
        folders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::testing::FakeWindowSource;

    fn discovery(source: FakeWindowSource) -> FolderDiscovery {
        FolderDiscovery::new(Arc::new(source))
    }

    #[test]
    fn resolves_and_refreshes_folders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap().to_string();

        let source = FakeWindowSource::with_titles([path.clone()]);
        let folders = discovery(source).open_folders();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].path, path);
        assert!(folders[0].exists);
        assert!(folders[0].is_accessible);
    }

    #[test]
    fn deduplicates_preserving_first_seen() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("Alpha");
        let b = dir.path().join("Beta");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        let a = a.to_str().unwrap().to_string();
        let b = b.to_str().unwrap().to_string();

        let source = FakeWindowSource::with_titles([
            a.clone(),
            format!("Files - {b}"),
            format!("{a}/"),
            b.clone(),
        ]);
        let folders = discovery(source).open_folders();

        let paths: Vec<_> = folders.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec![a.as_str(), b.as_str()]);
        assert_eq!(folders[0].display_name, "Alpha");
    }

    #[test]
    fn drops_unresolved_and_unqueryable_windows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap().to_string();

        let source = FakeWindowSource {
            windows: vec![
                None,
                Some("Trash".into()),
                Some(String::new()),
                Some(path.clone()),
            ],
            fail_enumeration: false,
        };
        let folders = discovery(source).open_folders();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].path, path);
    }

    #[test]
    fn enumeration_failure_is_empty() {
        let source = FakeWindowSource {
            windows: vec![Some("/".into())],
            fail_enumeration: true,
        };
        assert!(discovery(source).open_folders().is_empty());
    }
}
