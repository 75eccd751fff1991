//! Linux desktop adapters for the `resolver` traits.

pub mod open;
pub mod x11;

pub use open::ShellFolderOpener;
pub use x11::X11WindowSource;
