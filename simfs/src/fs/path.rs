//! Path utilities.
//!
//! Paths are plain strings. Everything user-facing is simplified first:
//! absolute, no redundant slashes, `.` and `..` resolved lexically.
//! Mount-point matching happens only at path-component boundaries, so a
//! mount at `/data` never claims `/database/x`.

use crate::error::{FsError, FsResult};

/// Simplify an absolute path string.
///
/// Collapses repeated slashes, resolves `.` and `..` lexically (clamping
/// `..` at the root) and removes any trailing slash. Fails with
/// [`FsError::InvalidPath`] if the path is not absolute.
pub fn simplify_path_string(path: &str) -> FsResult<String> {
    if !path.starts_with('/') {
        return Err(FsError::InvalidPath(path.to_string()));
    }

    let mut components: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }

    if components.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(format!("/{}", components.join("/")))
    }
}

/// Split a simplified path into its directory and file-name parts.
///
/// `/a/b/c.txt` becomes `("/a/b", "c.txt")`; a file directly under the
/// root becomes `("/", name)`. The root itself yields an empty name.
pub fn split_path(path: &str) -> (String, String) {
    match path.rfind('/') {
        Some(0) => ("/".to_string(), path[1..].to_string()),
        Some(idx) => (path[..idx].to_string(), path[idx + 1..].to_string()),
        None => ("/".to_string(), path.to_string()),
    }
}

/// Whether a simplified absolute path falls under a mount point.
///
/// Matches only at component boundaries: `/data` covers `/data` and
/// `/data/x` but not `/database/x`.
pub fn is_at_mount_point(simplified_absolute_path: &str, mount_point: &str) -> bool {
    if mount_point == "/" {
        return simplified_absolute_path.starts_with('/');
    }
    match simplified_absolute_path.strip_prefix(mount_point) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// The partition-relative remainder of a path under a mount point.
///
/// The remainder always starts with `/`; the mount point itself maps to
/// `/`. Fails with [`FsError::InvalidPath`] if the path is not at that
/// mount point.
pub fn path_at_mount_point(simplified_absolute_path: &str, mount_point: &str) -> FsResult<String> {
    if !is_at_mount_point(simplified_absolute_path, mount_point) {
        return Err(FsError::InvalidPath(simplified_absolute_path.to_string()));
    }
    if mount_point == "/" {
        return Ok(simplified_absolute_path.to_string());
    }
    let rest = &simplified_absolute_path[mount_point.len()..];
    if rest.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(rest.to_string())
    }
}
