//! Enumerating file-manager windows and reading their titles.

use std::fmt;

use super::ResolverError;

/// Opaque handle of a top-level window (an X11 window id on Linux).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u32);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Lists the file-manager windows currently on screen.
///
/// Implementations filter to windows that are visible, have no owner
/// window, and whose class identifies a file manager. A window that
/// cannot be inspected is skipped by the implementation; only a failure
/// of the enumeration as a whole is returned as `Err`.
pub trait WindowSource: Send + Sync {
    /// Return handles of matching windows in stacking/enumeration order.
    fn file_manager_windows(&self) -> Result<Vec<WindowHandle>, ResolverError>;

    /// Read the full title of `window`.
    ///
    /// Must never silently truncate: downstream path recovery relies on
    /// seeing the whole string.
    fn window_title(&self, window: WindowHandle) -> Result<String, ResolverError>;
}

/// Window source for hosts without a reachable display.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullWindowSource;

impl WindowSource for NullWindowSource {
    fn file_manager_windows(&self) -> Result<Vec<WindowHandle>, ResolverError> {
        Ok(Vec::new())
    }

    fn window_title(&self, window: WindowHandle) -> Result<String, ResolverError> {
        Err(ResolverError::Window {
            window,
            reason: "no display".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_source_reports_no_windows() {
        let source = NullWindowSource;
        assert!(source.file_manager_windows().unwrap().is_empty());
        assert!(source.window_title(WindowHandle(1)).is_err());
    }

    #[test]
    fn handle_displays_as_hex() {
        assert_eq!(WindowHandle(0x3a00007).to_string(), "0x3a00007");
    }
}
