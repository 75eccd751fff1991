//! Asking the desktop shell to show a folder.

use std::path::Path;

use futures::future::BoxFuture;

use super::ResolverError;

/// Opens a folder in the host's file manager.
///
/// Returns a boxed future so the trait stays object-safe and the session
/// manager can hold an `Arc<dyn FolderOpener>`.
pub trait FolderOpener: Send + Sync {
    /// Open `path`. Resolves once the shell has accepted the request.
    fn open<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<(), ResolverError>>;
}
