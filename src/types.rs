//! Core types for the keyspace filesystem projection.

use std::fmt;
use std::time::SystemTime;

/// Type of a projected entry.
///
/// Flat key spaces have no links, so there are only two kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileType {
    /// A key with a value.
    File,
    /// A synthesized directory (some keys share this prefix).
    Directory,
}

/// Metadata for a projected entry.
///
/// Directories carry zero size and a zero (`UNIX_EPOCH`) modification time,
/// since no remote object backs them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Leaf display name.
    pub name: String,
    /// Type of the entry.
    pub file_type: FileType,
    /// Size in bytes.
    pub size: u64,
    /// Read-only permissions.
    pub permissions: Permissions,
    /// Last modification time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub modified: SystemTime,
    /// Content type, when the backend reports one.
    pub content_type: Option<String>,
}

impl Metadata {
    /// Returns `true` if this is a file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Metadata for a synthesized directory.
    pub fn directory(name: impl Into<String>, permissions: Permissions) -> Self {
        Self {
            name: name.into(),
            file_type: FileType::Directory,
            size: 0,
            permissions,
            modified: SystemTime::UNIX_EPOCH,
            content_type: None,
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            file_type: FileType::File,
            size: 0,
            permissions: Permissions::default_file(),
            modified: SystemTime::UNIX_EPOCH,
            content_type: None,
        }
    }
}

/// A directory entry returned from `read_dir`, with its metadata resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntry {
    /// Name of the entry (leaf only).
    pub name: String,
    /// Full remote key of the entry.
    pub key: String,
    /// Resolved metadata.
    pub metadata: Metadata,
}

impl DirEntry {
    /// Type of the entry.
    #[inline]
    pub fn file_type(&self) -> FileType {
        self.metadata.file_type
    }

    /// Returns `true` if this entry is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }
}

/// One deduplicated, classified child of a synthesized directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChildEntry {
    /// Child name (one path segment).
    pub name: String,
    /// Whether any contributing key continued past this segment.
    pub is_dir: bool,
}

impl ChildEntry {
    /// A file child.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    /// A directory child.
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Unix-style permissions stored as a mode bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permissions(u32);

impl Permissions {
    /// Create permissions from a Unix mode (e.g., 0o444).
    #[inline]
    pub const fn from_mode(mode: u32) -> Self {
        Self(mode & 0o7777)
    }

    /// Get the raw mode value.
    #[inline]
    pub const fn mode(&self) -> u32 {
        self.0
    }

    /// Returns `true` if these permissions deny writing.
    #[inline]
    pub const fn readonly(&self) -> bool {
        (self.0 & 0o222) == 0
    }

    /// Default permissions for a projected file (0o444 = r--r--r--).
    #[inline]
    pub const fn default_file() -> Self {
        Self(0o444)
    }

    /// Default permissions for a projected directory (0o555 = r-xr-xr-x).
    #[inline]
    pub const fn default_dir() -> Self {
        Self(0o555)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::default_file()
    }
}

/// A full value fetched by [`ValueSource::get`](crate::ValueSource::get).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteValue {
    /// The value's bytes.
    pub data: Vec<u8>,
    /// Size reported by the backend, if it differs from `data.len()` or is
    /// known without the body.
    pub size: Option<u64>,
    /// Modification time, if the backend tracks one.
    pub modified: Option<SystemTime>,
    /// Content type, if the backend tracks one.
    pub content_type: Option<String>,
}

impl RemoteValue {
    /// A value with no metadata beyond its bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    /// Set the modification time.
    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Size in bytes, preferring the backend-reported size.
    pub fn len(&self) -> u64 {
        self.size.unwrap_or(self.data.len() as u64)
    }

    /// Returns `true` if the value is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Opaque continuation token for paginated listings.
///
/// Only the backend that issued it may interpret it. Some backends encode
/// numeric offsets here, others opaque cursors; the engine passes it back
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageToken(String);

impl PageToken {
    /// Wrap a backend-issued token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One List call's parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// Key prefix to list beneath (usually ends with `/`).
    pub prefix: String,
    /// Continuation token from the previous page, if any.
    pub token: Option<PageToken>,
    /// Maximum keys per page, when the caller wants to bound it.
    pub limit: Option<usize>,
}

impl ListRequest {
    /// First page of a listing under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            token: None,
            limit: None,
        }
    }

    /// Bound the page size.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Continue from a previous page.
    pub fn with_token(mut self, token: Option<PageToken>) -> Self {
        self.token = token;
        self
    }
}

/// One page of keys returned by a List call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Full keys (or names) beneath the prefix.
    pub keys: Vec<String>,
    /// Present when more pages remain.
    pub next: Option<PageToken>,
}

impl ListPage {
    /// A final page.
    pub fn last(keys: Vec<String>) -> Self {
        Self { keys, next: None }
    }
}

/// A remote credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wrap a credential string.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The secret value, for attaching to requests.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Serde support for SystemTime (when serde feature is enabled).
#[cfg(feature = "serde")]
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        (duration.as_secs(), duration.subsec_nanos()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos): (u64, u32) = Deserialize::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::new(secs, nanos))
    }
}
