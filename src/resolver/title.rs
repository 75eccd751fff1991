//! Window title → folder path recovery.
//!
//! File-manager titles are human-facing strings: sometimes a full path,
//! sometimes `"<something> - <path>"`, sometimes a path the window manager
//! cut short. Strategies run in order and the first hit wins:
//!
//! 1. Drive-letter title (`X:\…` or `X:/…`): normalize separators and
//!    accept if it names a directory.
//! 2. Text after the last `" - "` names a directory.
//! 3. The whole title names a directory.
//! 4. Progressive truncation: drop trailing components until a directory
//!    (the anchor) exists, then prefer the anchor's child whose name is the
//!    longest substring of the original title.
//!
//! Every returned candidate is rooted (absolute, drive-letter or UNC) and
//! has been checked to exist. Relative candidates are never probed since
//! they would resolve against the working directory. Failing to recover a
//! path is acceptable; returning a wrong one is not.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// `X:\` or `X:/` at the start of a title.
static DRIVE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:[\\/]").expect("valid drive regex"));

/// A bare drive designator such as `C:`.
static BARE_DRIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:$").expect("valid drive regex"));

const TITLE_SEPARATOR: &str = " - ";
const PATH_SEPARATORS: [char; 2] = ['\\', '/'];

/// Recover a folder path from a window title.
///
/// Returns `None` for blank titles and whenever no strategy yields an
/// existing rooted directory.
pub fn resolve_title(title: &str) -> Option<String> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }

    let working = if DRIVE_PREFIX.is_match(title) {
        let normalized = title.replace('/', "\\");
        if is_dir(&normalized) {
            return Some(normalized);
        }
        normalized
    } else {
        title.to_string()
    };

    if let Some(idx) = working.rfind(TITLE_SEPARATOR) {
        let tail = &working[idx + TITLE_SEPARATOR.len()..];
        if idx > 0 && is_dir(tail) {
            return Some(tail.to_string());
        }
    }

    if is_dir(&working) {
        return Some(working);
    }

    truncation_search(&working)
}

/// Walk back one separator at a time until an existing directory appears.
fn truncation_search(title: &str) -> Option<String> {
    let mut candidate = title;

    while let Some(sep) = candidate.rfind(PATH_SEPARATORS) {
        if sep == 0 {
            break;
        }
        candidate = &candidate[..sep];
        if BARE_DRIVE.is_match(candidate) {
            break;
        }
        if is_dir(candidate) {
            tracing::debug!(anchor = candidate, "title truncation found anchor");
            return longest_child_match(candidate, title);
        }
    }

    None
}

/// Pick the child of `anchor` whose name is the longest substring of the
/// title text after the anchor, falling back to the anchor itself.
///
/// `anchor` is always a prefix of `title`. Only the remainder is searched,
/// so a short child like `Doc` cannot match the anchor's own `Documents`.
///
/// An anchor that cannot be listed yields `None` rather than the anchor:
/// without its children the match cannot be trusted.
fn longest_child_match(anchor: &str, title: &str) -> Option<String> {
    let entries = match fs::read_dir(anchor) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(anchor, error = %e, "cannot list anchor directory");
            return None;
        }
    };

    let rest = title.get(anchor.len()..).unwrap_or_default();
    let mut best: Option<String> = None;
    for entry in entries.flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.is_empty() || !rest.contains(name) {
            continue;
        }
        if best.as_ref().is_none_or(|b| name.len() > b.len()) {
            best = Some(name.to_string());
        }
    }

    Some(match best {
        Some(child) => join_child(anchor, &child),
        None => anchor.to_string(),
    })
}

/// Append `child` using the separator style already present in `anchor`.
fn join_child(anchor: &str, child: &str) -> String {
    let backslashed = anchor.contains('\\') && !anchor.contains('/');
    let sep = if DRIVE_PREFIX.is_match(anchor) || backslashed {
        '\\'
    } else {
        '/'
    };
    format!("{anchor}{sep}{child}")
}

/// Absolute, drive-letter or UNC.
fn is_rooted(candidate: &str) -> bool {
    Path::new(candidate).is_absolute()
        || DRIVE_PREFIX.is_match(candidate)
        || candidate.starts_with(r"\\")
}

/// Existence probe for rooted candidates. Permission and I/O errors count
/// as "not a directory".
fn is_dir(candidate: &str) -> bool {
    if !is_rooted(candidate) {
        return false;
    }
    fs::metadata(Path::new(candidate))
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_str(p: &Path) -> String {
        p.to_str().unwrap().to_string()
    }

    #[test]
    fn blank_titles_resolve_to_none() {
        assert_eq!(resolve_title(""), None);
        assert_eq!(resolve_title("   \t "), None);
    }

    #[test]
    fn whole_title_naming_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let title = path_str(dir.path());
        assert_eq!(resolve_title(&title), Some(title));
    }

    #[test]
    fn text_after_last_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = path_str(dir.path());
        let title = format!("Files - Home - {path}");
        assert_eq!(resolve_title(&title), Some(path));
    }

    #[test]
    fn decorated_title_without_path_is_unresolved() {
        assert_eq!(resolve_title("Downloads - File Manager"), None);
    }

    #[test]
    fn truncation_recovers_longest_contained_child() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("Documents");
        fs::create_dir_all(docs.join("ProjectAlpha")).unwrap();
        fs::create_dir_all(docs.join("Project")).unwrap();
        fs::create_dir_all(docs.join("Other")).unwrap();

        let title = format!("{}/ProjectAlpha (archived)/notes", path_str(&docs));
        let expected = path_str(&docs.join("ProjectAlpha"));
        assert_eq!(resolve_title(&title), Some(expected));
    }

    #[test]
    fn truncation_falls_back_to_anchor_when_no_child_matches() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("Documents");
        fs::create_dir_all(docs.join("ProjectAlpha")).unwrap();

        // The child's own name was cut short, so no child is contained.
        let title = format!("{}/Proj", path_str(&docs));
        assert_eq!(resolve_title(&title), Some(path_str(&docs)));
    }

    #[test]
    fn children_named_inside_the_anchor_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("Documents");
        fs::create_dir_all(docs.join("ProjectAlpha")).unwrap();
        fs::create_dir_all(docs.join("Doc")).unwrap();

        let title = format!("{}/Proj", path_str(&docs));
        assert_eq!(resolve_title(&title), Some(path_str(&docs)));
    }

    #[test]
    fn relative_titles_are_unresolved() {
        let dir = tempfile::tempdir_in(".").unwrap();
        fs::create_dir_all(dir.path().join("AC")).unwrap();
        let name = dir.path().file_name().unwrap().to_str().unwrap();
        assert!(Path::new(name).is_dir());

        assert_eq!(resolve_title(name), None);
        assert_eq!(resolve_title(&format!("Files - {name}")), None);
        assert_eq!(resolve_title(&format!("{name}/AC/DC - Music")), None);
    }

    #[test]
    fn rooted_forms() {
        assert!(is_rooted("/home"));
        assert!(is_rooted(r"C:\Users"));
        assert!(is_rooted(r"\\server\share"));
        assert!(!is_rooted("src"));
        assert!(!is_rooted("Files - src"));
    }

    #[test]
    fn files_are_not_accepted_as_children() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("report"), b"x").unwrap();

        let title = format!("{}/report-draft", path_str(dir.path()));
        assert_eq!(resolve_title(&title), Some(path_str(dir.path())));
    }

    #[test]
    fn missing_drive_path_is_unresolved() {
        assert_eq!(resolve_title("Q:/definitely/not/here"), None);
        assert_eq!(resolve_title(r"Q:\definitely\not\here"), None);
    }

    #[test]
    fn nonexistent_absolute_path_is_unresolved() {
        assert_eq!(resolve_title("/no-such-root-dir/a/b/c"), None);
    }

    #[test]
    fn resolution_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Alpha")).unwrap();
        let title = format!("{}/Alpha and more", path_str(dir.path()));

        let first = resolve_title(&title);
        let second = resolve_title(&title);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn join_child_keeps_separator_style() {
        assert_eq!(join_child(r"C:\Users\me", "Docs"), r"C:\Users\me\Docs");
        assert_eq!(join_child("/home/me", "Docs"), "/home/me/Docs");
    }
}
