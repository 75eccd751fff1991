//! Platform abstractions: window discovery, folder opening and title parsing.
//!
//! The discovery and session layers only talk to the desktop through the
//! traits defined here. `shell::x11` and `shell::open` provide the Linux
//! adapters; tests substitute the in-memory fakes from [`testing`].

pub mod opener;
pub mod title;
pub mod windows;

#[cfg(test)]
pub mod testing;

pub use opener::FolderOpener;
pub use windows::{NullWindowSource, WindowHandle, WindowSource};

/// Errors raised by platform adapters.
///
/// None of these are fatal: discovery skips the affected window and
/// restore counts the affected folder as failed.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// Connection-level or protocol failure talking to the X server.
    #[error("X11: {0}")]
    X11(String),

    /// A single window could not be queried (destroyed, bad handle).
    #[error("window {window} unavailable: {reason}")]
    Window { window: WindowHandle, reason: String },

    /// The folder to open is not an existing directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// The opener command could not be started.
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The opener command ran but reported failure.
    #[error("`{command}` exited with {status}")]
    Exit {
        command: String,
        status: std::process::ExitStatus,
    },
}
