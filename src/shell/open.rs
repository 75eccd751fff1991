//! Folder opening through the desktop's opener command.
//!
//! Spawns the configured command (`xdg-open` by default) with the folder
//! path and waits for it to exit. `xdg-open` hands the folder to the
//! user's file manager and returns immediately.

use std::path::Path;
use std::process::Stdio;

use futures::future::BoxFuture;
use tokio::process::Command;

use crate::resolver::{FolderOpener, ResolverError};

/// Opens folders by running an external command.
#[derive(Debug, Clone)]
pub struct ShellFolderOpener {
    command: String,
}

impl ShellFolderOpener {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    async fn run(&self, path: &Path) -> Result<(), ResolverError> {
        if !path.is_dir() {
            return Err(ResolverError::NotADirectory(path.display().to_string()));
        }

        let status = Command::new(&self.command)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| ResolverError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ResolverError::Exit {
                command: self.command.clone(),
                status,
            })
        }
    }
}

impl Default for ShellFolderOpener {
    fn default() -> Self {
        Self::new("xdg-open")
    }
}

impl FolderOpener for ShellFolderOpener {
    fn open<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<(), ResolverError>> {
        Box::pin(self.run(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_success() {
        let dir = tempfile::tempdir().unwrap();
        let opener = ShellFolderOpener::new("true");
        opener.open(dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn open_missing_folder() {
        let opener = ShellFolderOpener::new("true");
        let result = opener.open(Path::new("/nonexistent/dir")).await;
        assert!(matches!(result, Err(ResolverError::NotADirectory(_))));
    }

    #[tokio::test]
    async fn open_command_failure() {
        let dir = tempfile::tempdir().unwrap();
        let opener = ShellFolderOpener::new("false");
        let result = opener.open(dir.path()).await;
        assert!(matches!(result, Err(ResolverError::Exit { .. })));
    }

    #[tokio::test]
    async fn open_command_missing() {
        let dir = tempfile::tempdir().unwrap();
        let opener = ShellFolderOpener::new("foldersess-no-such-opener");
        let result = opener.open(dir.path()).await;
        assert!(matches!(result, Err(ResolverError::Spawn { .. })));
    }
}
