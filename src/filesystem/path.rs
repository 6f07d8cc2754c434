//! Lexical path normalization for sandbox paths.
//!
//! Paths name files inside the remote sandbox, so nothing here touches the
//! local filesystem. Sandbox paths are always POSIX.

use crate::error::FilesystemError;

/// Clean a POSIX path lexically.
///
/// Collapses repeated separators, drops `.` components and resolves `..`
/// against the preceding component. `..` never climbs above `/`; in a
/// relative path leading `..` components are kept. An empty result is `.`.
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Normalize a request path.
///
/// An empty `path` takes `default_path` when one is given. The result is
/// cleaned with [`clean`]; with `require_abs` a relative result is rejected.
pub fn format_path(
    path: &str,
    default_path: &str,
    require_abs: bool,
) -> Result<String, FilesystemError> {
    let path = if path.is_empty() && !default_path.is_empty() {
        default_path
    } else {
        path
    };

    let cleaned = clean(path);
    if require_abs && !cleaned.starts_with('/') {
        return Err(FilesystemError::InvalidPath(cleaned));
    }
    Ok(cleaned)
}
