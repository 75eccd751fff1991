//! X11 integration — top-level window enumeration and title reads.
//!
//! Wraps `x11rb::rust_connection::RustConnection`. Windows come from the
//! window manager's `_NET_CLIENT_LIST`; if the WM does not publish one we
//! fall back to the root window's direct children.

use std::collections::HashSet;

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{self, Atom, AtomEnum, MapState, Window};
use x11rb::rust_connection::RustConnection;

use crate::resolver::{ResolverError, WindowHandle, WindowSource};

/// Title reads request this many 32-bit units per round trip (32 KiB).
///
/// Reads continue until the server reports nothing left, so this only
/// bounds the size of one request, not the title length.
const TITLE_CHUNK_WORDS: u32 = 8192;

/// Upper bound on property reads for list-valued properties.
const LIST_MAX_WORDS: u32 = 1 << 16;

/// Pre-interned X11 atoms for property queries.
struct Atoms {
    net_client_list: Atom,
    net_wm_name: Atom,
    utf8_string: Atom,
}

/// File-manager window source backed by a live X11 connection.
pub struct X11WindowSource {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
    classes: HashSet<String>,
}

impl X11WindowSource {
    /// Connect to the default display and intern required atoms.
    ///
    /// `classes` lists the `WM_CLASS` values that identify file-manager
    /// windows; matching is ASCII case-insensitive.
    pub fn connect(classes: &[String]) -> Result<Self, ResolverError> {
        let (conn, screen_num) = RustConnection::connect(None)
            .map_err(|e| ResolverError::X11(format!("connect failed: {e}")))?;

        let root = conn.setup().roots[screen_num].root;

        let net_client_list = intern(&conn, b"_NET_CLIENT_LIST")?;
        let net_wm_name = intern(&conn, b"_NET_WM_NAME")?;
        let utf8_string = intern(&conn, b"UTF8_STRING")?;

        tracing::debug!(screen = screen_num, root, "connected to X11 display");

        Ok(Self {
            conn,
            root,
            atoms: Atoms {
                net_client_list,
                net_wm_name,
                utf8_string,
            },
            classes: classes.iter().map(|c| c.to_ascii_lowercase()).collect(),
        })
    }

    /// Candidate top-level windows, in the WM's client-list order.
    fn top_level_windows(&self) -> Result<Vec<Window>, ResolverError> {
        let reply = xproto::get_property(
            &self.conn,
            false,
            self.root,
            self.atoms.net_client_list,
            AtomEnum::WINDOW,
            0,
            LIST_MAX_WORDS,
        )
        .map_err(|e| ResolverError::X11(format!("get_property _NET_CLIENT_LIST: {e}")))?
        .reply()
        .map_err(|e| ResolverError::X11(format!("get_property reply: {e}")))?;

        if let Some(windows) = reply.value32() {
            let windows: Vec<Window> = windows.collect();
            if !windows.is_empty() {
                return Ok(windows);
            }
        }

        tracing::debug!("_NET_CLIENT_LIST unavailable, querying root children");
        let tree = xproto::query_tree(&self.conn, self.root)
            .map_err(|e| ResolverError::X11(format!("query_tree: {e}")))?
            .reply()
            .map_err(|e| ResolverError::X11(format!("query_tree reply: {e}")))?;
        Ok(tree.children)
    }

    /// Whether `window` is a visible, ownerless file-manager window.
    fn is_file_manager(&self, window: Window) -> Result<bool, ResolverError> {
        let attrs = xproto::get_window_attributes(&self.conn, window)
            .map_err(|e| window_error(window, e))?
            .reply()
            .map_err(|e| window_error(window, e))?;
        if attrs.map_state != MapState::VIEWABLE {
            return Ok(false);
        }

        let transient = self.read_property(
            window,
            AtomEnum::WM_TRANSIENT_FOR.into(),
            AtomEnum::WINDOW.into(),
        )?;
        if !transient.is_empty() {
            return Ok(false);
        }

        let class =
            self.read_property(window, AtomEnum::WM_CLASS.into(), AtomEnum::STRING.into())?;
        // WM_CLASS is "instance\0class\0".
        Ok(class
            .split(|&b| b == 0)
            .filter(|part| !part.is_empty())
            .any(|part| {
                let part = String::from_utf8_lossy(part).to_ascii_lowercase();
                self.classes.contains(&part)
            }))
    }

    /// Read a whole property value, following `bytes_after` until done.
    fn read_property(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
    ) -> Result<Vec<u8>, ResolverError> {
        let mut value = Vec::new();
        let mut offset = 0u32;

        loop {
            let reply = xproto::get_property(
                &self.conn,
                false,
                window,
                property,
                type_,
                offset,
                TITLE_CHUNK_WORDS,
            )
            .map_err(|e| window_error(window, e))?
                .reply()
                .map_err(|e| window_error(window, e))?;

            value.extend_from_slice(&reply.value);

            let advanced = reply.value.len() as u32 / 4;
            if reply.bytes_after == 0 || advanced == 0 {
                break;
            }
            offset += advanced;
        }

        Ok(value)
    }
}

impl WindowSource for X11WindowSource {
    fn file_manager_windows(&self) -> Result<Vec<WindowHandle>, ResolverError> {
        let candidates = self.top_level_windows()?;
        let mut matched = Vec::new();

        for window in candidates {
            match self.is_file_manager(window) {
                Ok(true) => matched.push(WindowHandle(window)),
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(
                        window,
                        error = %e,
                        "skipping window that could not be queried"
                    );
                }
            }
        }

        tracing::debug!(count = matched.len(), "file-manager windows found");
        Ok(matched)
    }

    fn window_title(&self, window: WindowHandle) -> Result<String, ResolverError> {
        let utf8 = self.read_property(
            window.0,
            self.atoms.net_wm_name,
            self.atoms.utf8_string,
        )?;
        if !utf8.is_empty() {
            return Ok(String::from_utf8_lossy(&utf8).into_owned());
        }

        // Legacy WM_NAME may be STRING or COMPOUND_TEXT; accept any type.
        let legacy = self.read_property(window.0, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into())?;
        Ok(String::from_utf8_lossy(&legacy).into_owned())
    }
}

fn intern(conn: &RustConnection, name: &[u8]) -> Result<Atom, ResolverError> {
    Ok(xproto::intern_atom(conn, false, name)
        .map_err(|e| ResolverError::X11(format!("intern_atom: {e}")))?
        .reply()
        .map_err(|e| ResolverError::X11(format!("intern_atom reply: {e}")))?
        .atom)
}

fn window_error(window: Window, e: impl std::fmt::Display) -> ResolverError {
    ResolverError::Window {
        window: WindowHandle(window),
        reason: e.to_string(),
    }
}
