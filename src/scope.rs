//! Path validation, key joining and scope partitioning.
//!
//! Callers address entries with slash-separated *paths* relative to the
//! filesystem root (`.` is the root itself). The engine turns a path into a
//! remote *key* by appending it to the configured root prefix.
//!
//! A root prefix is scoped either [`Rooted`](ScopeMode::Rooted) (every key
//! begins with `/`) or [`Opaque`](ScopeMode::Opaque) (no key begins with `/`).
//! Keys from the other partition are invisible to opens and listings.

use crate::FsError;

/// Which half of the key space a filesystem sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScopeMode {
    /// Keys begin with `/`.
    Rooted,
    /// Keys do not begin with `/`.
    #[default]
    Opaque,
}

impl ScopeMode {
    /// Returns `true` if `key` belongs to this partition.
    #[inline]
    pub fn admits(self, key: &str) -> bool {
        match self {
            ScopeMode::Rooted => key.starts_with('/'),
            ScopeMode::Opaque => !key.starts_with('/'),
        }
    }
}

/// Validate a caller path.
///
/// `.` names the root. Any other path must be non-empty, must not begin or
/// end with `/`, and must not contain empty, `.` or `..` elements.
///
/// # Errors
///
/// - [`FsError::InvalidArgument`] for anything else
pub fn validate_path(path: &str) -> Result<(), FsError> {
    if path == "." {
        return Ok(());
    }
    if path.is_empty() {
        return Err(FsError::invalid(path, "empty path"));
    }
    for element in path.split('/') {
        match element {
            "" => return Err(FsError::invalid(path, "empty path element")),
            "." | ".." => {
                return Err(FsError::invalid(path, "relative path element"));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Normalize a root prefix: empty stays empty, anything else ends with `/`.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

/// Join a normalized prefix and a validated path into a key.
///
/// `.` maps to the prefix itself.
pub fn join_key(prefix: &str, path: &str) -> String {
    if path == "." {
        return prefix.to_string();
    }
    format!("{prefix}{path}")
}

/// The listing prefix for the directory at `key`.
pub fn dir_prefix(key: &str) -> String {
    normalize_prefix(key)
}
