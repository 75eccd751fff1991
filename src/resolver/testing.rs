//! In-memory fakes for the platform traits.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use futures::future::BoxFuture;

use super::{FolderOpener, ResolverError, WindowHandle, WindowSource};

/// Window source backed by a fixed list of titles.
///
/// A `None` title simulates a window that vanished between enumeration
/// and the title query.
#[derive(Default)]
pub struct FakeWindowSource {
    pub windows: Vec<Option<String>>,
    pub fail_enumeration: bool,
}

impl FakeWindowSource {
    pub fn with_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            windows: titles.into_iter().map(|t| Some(t.into())).collect(),
            fail_enumeration: false,
        }
    }
}

impl WindowSource for FakeWindowSource {
    fn file_manager_windows(&self) -> Result<Vec<WindowHandle>, ResolverError> {
        if self.fail_enumeration {
            return Err(ResolverError::X11("connection lost".into()));
        }
        Ok((0..self.windows.len() as u32).map(WindowHandle).collect())
    }

    fn window_title(&self, window: WindowHandle) -> Result<String, ResolverError> {
        self.windows
            .get(window.0 as usize)
            .cloned()
            .flatten()
            .ok_or_else(|| ResolverError::Window {
                window,
                reason: "stale handle".into(),
            })
    }
}

/// Opener that records every request and fails for selected paths.
#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<PathBuf>>,
    pub failing: HashSet<PathBuf>,
}

impl RecordingOpener {
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

impl FolderOpener for RecordingOpener {
    fn open<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<(), ResolverError>> {
        Box::pin(async move {
            if self.failing.contains(path) {
                return Err(ResolverError::NotADirectory(path.display().to_string()));
            }
            self.opened.lock().unwrap().push(path.to_path_buf());
            Ok(())
        })
    }
}
