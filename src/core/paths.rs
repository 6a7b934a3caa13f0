//! Path <-> file identity conversion
//!
//! File identities are `/`-separated paths relative to the workspace root.
//! Anything outside the root keeps its absolute (normalized) path.

use std::path::{Component, Path, PathBuf};

use crate::core::location::FileId;

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path relative to the root directory
pub fn make_relative(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(normalize_path)
}

/// File identity for a path given on the command line or by a tool
pub fn file_id_for(root: &Path, path: &Path) -> FileId {
    if path.is_absolute() {
        return FileId::new(make_relative(path, root).unwrap_or_else(|| normalize_path(path)));
    }
    let cleaned: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    FileId::new(normalize_path(&cleaned))
}

/// Filesystem path of a file identity
pub fn resolve(root: &Path, file: &FileId) -> PathBuf {
    let relative = Path::new(file.as_str());
    if relative.is_absolute() {
        return relative.to_path_buf();
    }
    root.join(file.as_str().replace('/', std::path::MAIN_SEPARATOR_STR))
}

/// Validate that a path is within the root directory (prevent path traversal)
pub fn is_within_root(path: &Path, root: &Path) -> bool {
    path.canonicalize()
        .ok()
        .and_then(|p| root.canonicalize().ok().map(|r| p.starts_with(r)))
        .unwrap_or(false)
}
