//! Folder records: a path plus cached existence, accessibility and kind.
//!
//! Identity is the lower-cased path: two records naming the same folder
//! with different casing are the same folder.

use std::fs;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

static DRIVE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:").expect("valid drive regex"));

const PATH_SEPARATORS: [char; 2] = ['\\', '/'];

/// GVfs mount names for network backends.
const GVFS_NETWORK: &[&str] = &[
    "/gvfs/smb-share:",
    "/gvfs/sftp:",
    "/gvfs/dav:",
    "/gvfs/davs:",
    "/gvfs/ftp:",
];

/// Folder names used as roots by desktop cloud-sync clients.
const CLOUD_ROOTS: &[&str] = &[
    "Dropbox",
    "OneDrive",
    "Google Drive",
    "pCloudDrive",
    "Nextcloud",
    "MEGA",
];

const REMOVABLE_PREFIXES: &[&str] = &["/media/", "/run/media/"];

// statfs(2) f_type values, see linux/magic.h.
const NFS_SUPER_MAGIC: u64 = 0x6969;
const SMB_SUPER_MAGIC: u64 = 0x517b;
const CIFS_MAGIC_NUMBER: u64 = 0xff53_4d42;
const SMB2_MAGIC_NUMBER: u64 = 0xfe53_4d42;
const AFS_SUPER_MAGIC: u64 = 0x5346_414f;
const CODA_SUPER_MAGIC: u64 = 0x7375_7245;
const NCP_SUPER_MAGIC: u64 = 0x564c;
const ISOFS_SUPER_MAGIC: u64 = 0x9660;
const UDF_SUPER_MAGIC: u64 = 0x1501_3346;

/// Where a folder lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FolderKind {
    Local,
    Network,
    Removable,
    Cloud,
    #[default]
    Unknown,
}

impl FolderKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Network => "network",
            Self::Removable => "removable",
            Self::Cloud => "cloud",
            Self::Unknown => "unknown",
        }
    }
}

/// A folder as stored inside a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRecord {
    pub path: String,
    pub display_name: String,
    #[serde(default)]
    pub exists: bool,
    /// Only meaningful when `exists` is true.
    #[serde(default)]
    pub is_accessible: bool,
    #[serde(default = "Utc::now")]
    pub last_accessed: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub kind: FolderKind,
}

impl FolderRecord {
    /// Build a record for `path` without probing existence.
    pub fn new(path: &str) -> Self {
        let path = normalize_path(path);
        Self {
            display_name: display_name(&path),
            kind: classify(&path),
            path,
            exists: false,
            is_accessible: false,
            last_accessed: Utc::now(),
        }
    }

    /// Case-insensitive identity key.
    pub fn key(&self) -> String {
        self.path.to_lowercase()
    }

    /// Re-probe the filesystem. Probe failures read as "missing" or
    /// "inaccessible", never as errors.
    pub fn refresh_status(&mut self) {
        self.exists = fs::metadata(&self.path).map(|m| m.is_dir()).unwrap_or(false);
        self.is_accessible = self.exists && fs::read_dir(&self.path).is_ok();
        self.kind = classify(&self.path);
        self.last_accessed = Utc::now();
    }

    pub fn status_label(&self) -> &'static str {
        match (self.exists, self.is_accessible) {
            (true, true) => "available",
            (true, false) => "access denied",
            (false, _) => "missing",
        }
    }
}

impl PartialEq for FolderRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for FolderRecord {}

impl Hash for FolderRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Trim whitespace and trailing separators; drive-letter paths use `\`.
pub fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut path = if DRIVE_PATH.is_match(trimmed) {
        trimmed.replace('/', "\\")
    } else {
        trimmed.to_string()
    };

    while path.ends_with(PATH_SEPARATORS) && !is_root(&path) {
        path.pop();
    }
    path
}

fn is_root(path: &str) -> bool {
    match path.len() {
        1 => path.ends_with(PATH_SEPARATORS),
        3 => DRIVE_PATH.is_match(path) && path.ends_with(PATH_SEPARATORS),
        _ => false,
    }
}

/// Last path component, or the whole path when there is none.
pub fn display_name(path: &str) -> String {
    path.rsplit(PATH_SEPARATORS)
        .find(|part| !part.is_empty())
        .unwrap_or(path)
        .to_string()
}

/// Classify where `path` lives, from its shape first and `statfs` second.
pub fn classify(path: &str) -> FolderKind {
    if path.starts_with(r"\\")
        || path.starts_with("//")
        || GVFS_NETWORK.iter().any(|m| path.contains(m))
    {
        return FolderKind::Network;
    }

    if path
        .split(PATH_SEPARATORS)
        .any(|part| CLOUD_ROOTS.iter().any(|root| part.eq_ignore_ascii_case(root)))
    {
        return FolderKind::Cloud;
    }

    if REMOVABLE_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return FolderKind::Removable;
    }

    match nix::sys::statfs::statfs(path) {
        Ok(fs) => kind_for_magic(fs.filesystem_type().0 as u64 & 0xffff_ffff),
        Err(_) if path.starts_with('/') || DRIVE_PATH.is_match(path) => FolderKind::Local,
        Err(_) => FolderKind::Unknown,
    }
}

fn kind_for_magic(magic: u64) -> FolderKind {
    match magic {
        NFS_SUPER_MAGIC | SMB_SUPER_MAGIC | CIFS_MAGIC_NUMBER | SMB2_MAGIC_NUMBER | AFS_SUPER_MAGIC
        | CODA_SUPER_MAGIC | NCP_SUPER_MAGIC => FolderKind::Network,
        ISOFS_SUPER_MAGIC | UDF_SUPER_MAGIC => FolderKind::Removable,
        _ => FolderKind::Local,
    }
}
