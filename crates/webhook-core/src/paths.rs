//! File-name safety for the capture store and local template store: no
//! entry may resolve outside the directory it claims to live in.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathSafetyError {
    #[error("file name must not contain a path separator")]
    ContainsSeparator,
    #[error("file name must not be '.' or '..'")]
    ContainsParentRef,
    #[error("file name is empty")]
    Empty,
    #[error("resolved path escapes the root directory")]
    EscapesRoot,
}

/// Validates a single path *segment* — no `/`, no `\`, not `.`/`..` —
/// and resolves it against `root`, rejecting anything whose cleaned
/// path does not have `root` as a prefix.
///
/// Used for capture file names, which are always a single segment.
pub fn safe_join(root: &Path, name: &str) -> Result<PathBuf, PathSafetyError> {
    if name.is_empty() {
        return Err(PathSafetyError::Empty);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(PathSafetyError::ContainsSeparator);
    }
    if name == ".." || name == "." {
        return Err(PathSafetyError::ContainsParentRef);
    }
    let joined = root.join(name);
    ensure_within_root(root, &joined)?;
    Ok(joined)
}

/// Validates a `/`-separated relative path (one or more safe segments,
/// no `..`, no empty segments) and resolves it against `root`.
///
/// Used for template file paths, which nest one directory deep by
/// provider (`<provider>/<id>.jsonc`).
pub fn safe_join_relative(root: &Path, relative: &str) -> Result<PathBuf, PathSafetyError> {
    if relative.is_empty() {
        return Err(PathSafetyError::Empty);
    }
    let mut joined = root.to_path_buf();
    let mut segments = 0;
    for segment in relative.split('/') {
        if segment.is_empty() {
            return Err(PathSafetyError::ContainsSeparator);
        }
        if segment == "." {
            continue;
        }
        if segment == ".." {
            return Err(PathSafetyError::ContainsParentRef);
        }
        joined.push(segment);
        segments += 1;
    }
    if segments == 0 {
        return Err(PathSafetyError::Empty);
    }
    ensure_within_root(root, &joined)?;
    Ok(joined)
}

fn ensure_within_root(root: &Path, candidate: &Path) -> Result<(), PathSafetyError> {
    let cleaned_candidate = clean(candidate);
    let cleaned_root = clean(root);
    if cleaned_candidate.starts_with(&cleaned_root) {
        Ok(())
    } else {
        Err(PathSafetyError::EscapesRoot)
    }
}

/// Lexically collapses `.`/`..` components without touching the
/// filesystem (the candidate file may not exist yet).
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_separators_and_traversal() {
        let root = Path::new("/data/captures");
        assert_eq!(
            safe_join(root, "../escape.jsonc").unwrap_err(),
            PathSafetyError::ContainsSeparator
        );
        assert_eq!(
            safe_join(root, "..").unwrap_err(),
            PathSafetyError::ContainsParentRef
        );
        assert_eq!(
            safe_join(root, "sub/escape.jsonc").unwrap_err(),
            PathSafetyError::ContainsSeparator
        );
        assert_eq!(safe_join(root, "").unwrap_err(), PathSafetyError::Empty);
    }

    #[test]
    fn accepts_plain_file_name() {
        let root = Path::new("/data/captures");
        let path = safe_join(root, "2026-02-22T12-00-00Z_beadfeed.jsonc").unwrap();
        assert_eq!(path, root.join("2026-02-22T12-00-00Z_beadfeed.jsonc"));
    }

    #[test]
    fn relative_template_path_allows_one_nested_directory() {
        let root = Path::new("/data/templates");
        let path = safe_join_relative(root, "github/github-push.jsonc").unwrap();
        assert_eq!(path, root.join("github").join("github-push.jsonc"));
    }

    #[test]
    fn relative_template_path_rejects_traversal() {
        let root = Path::new("/data/templates");
        assert_eq!(
            safe_join_relative(root, "github/../../etc/passwd").unwrap_err(),
            PathSafetyError::ContainsParentRef
        );
    }
}
