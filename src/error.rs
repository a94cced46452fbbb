//! Error types for the keyspace filesystem projection.
//!
//! Two layers live here:
//!
//! - [`FsError`] is what callers of the filesystem see. It never carries a
//!   backend-specific type.
//! - [`RemoteError`] is what capability implementations (Get, List, Login,
//!   Logout) return. It is built at the narrowest point, right after the
//!   backend call returns, by classifying the native error through
//!   [`Classify`].

use std::fmt;

/// Filesystem error type returned by every engine operation.
///
/// All variants carry the key or operation that failed. Uses
/// `#[non_exhaustive]` for forward compatibility.
///
/// # Examples
///
/// ```rust
/// use keyspace_fs::FsError;
///
/// let err = FsError::NotFound { path: "secret/missing".into() };
/// assert_eq!(err.to_string(), "not found: secret/missing");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Key is absent, or is a directory with zero synthesized children.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: String,
    },

    /// Authentication or authorization failure from the remote store.
    #[error("{operation}: permission denied: {path} ({details})")]
    PermissionDenied {
        /// The path where permission was denied.
        path: String,
        /// The operation that was denied.
        operation: &'static str,
        /// Remote detail, safe for display.
        details: String,
    },

    /// Malformed path or backend parameter, or traversal above the root.
    #[error("invalid argument: {path} ({details})")]
    InvalidArgument {
        /// The offending path.
        path: String,
        /// What was wrong with it.
        details: String,
    },

    /// Remote service or transport failure. Not retried at this layer.
    #[error("internal error: {path} ({details})")]
    Internal {
        /// The path being accessed.
        path: String,
        /// Remote detail, safe for display.
        details: String,
    },

    /// Attempted to read bytes from a resolved directory.
    #[error("is a directory: {path}")]
    IsADirectory {
        /// The directory path.
        path: String,
    },

    /// Attempted to list a resolved file.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The file path.
        path: String,
    },

    /// The handle was already closed.
    #[error("file already closed: {path}")]
    Closed {
        /// The path of the closed handle.
        path: String,
    },

    /// The caller's context was cancelled.
    #[error("{operation}: cancelled")]
    Cancelled {
        /// The operation that observed the cancellation.
        operation: &'static str,
    },

    /// The caller's deadline elapsed.
    #[error("{operation}: deadline exceeded")]
    DeadlineExceeded {
        /// The operation that observed the deadline.
        operation: &'static str,
    },
}

/// Coarse classification of an [`FsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Key absent or empty directory.
    NotExist,
    /// Authentication/authorization failure.
    Permission,
    /// Malformed input.
    Invalid,
    /// Remote or internal failure.
    Internal,
    /// Read on a directory.
    IsDirectory,
    /// Listing on a file.
    NotDirectory,
    /// Use after close, or double close.
    Closed,
    /// Cancelled or deadline exceeded.
    Cancelled,
}

impl FsError {
    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotFound { .. } => ErrorKind::NotExist,
            FsError::PermissionDenied { .. } => ErrorKind::Permission,
            FsError::InvalidArgument { .. } => ErrorKind::Invalid,
            FsError::Internal { .. } => ErrorKind::Internal,
            FsError::IsADirectory { .. } => ErrorKind::IsDirectory,
            FsError::NotADirectory { .. } => ErrorKind::NotDirectory,
            FsError::Closed { .. } => ErrorKind::Closed,
            FsError::Cancelled { .. } | FsError::DeadlineExceeded { .. } => ErrorKind::Cancelled,
        }
    }

    /// Returns `true` if this is a not-found error.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotExist
    }

    pub(crate) fn invalid(path: impl Into<String>, details: impl Into<String>) -> Self {
        FsError::InvalidArgument {
            path: path.into(),
            details: details.into(),
        }
    }
}

impl From<std::io::Error> for FsError {
    fn from(error: std::io::Error) -> Self {
        RemoteError::classify(error).into_fs_error("", "io")
    }
}

impl From<FsError> for std::io::Error {
    fn from(error: FsError) -> Self {
        use std::io::ErrorKind as Io;
        let kind = match error.kind() {
            ErrorKind::NotExist => Io::NotFound,
            ErrorKind::Permission => Io::PermissionDenied,
            ErrorKind::Invalid => Io::InvalidInput,
            ErrorKind::IsDirectory => Io::IsADirectory,
            ErrorKind::NotDirectory => Io::NotADirectory,
            ErrorKind::Cancelled => Io::Interrupted,
            ErrorKind::Internal | ErrorKind::Closed => Io::Other,
        };
        std::io::Error::new(kind, error)
    }
}

// ============================================================================
// Remote errors
// ============================================================================

/// Universal class a backend error is translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The key does not exist.
    NotFound,
    /// The credential was rejected or lacks access.
    Permission,
    /// The request was malformed.
    Invalid,
    /// Anything else: service errors, timeouts, 5xx.
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorClass::NotFound => "not found",
            ErrorClass::Permission => "permission denied",
            ErrorClass::Invalid => "invalid",
            ErrorClass::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Translates a backend-native error condition into an [`ErrorClass`].
///
/// Implement this for each backend's native error type, then hand the error
/// to [`RemoteError::classify`] as soon as the remote call returns.
pub trait Classify {
    /// The universal class of this error.
    fn class(&self) -> ErrorClass;
}

impl Classify for std::io::Error {
    fn class(&self) -> ErrorClass {
        use std::io::ErrorKind as Io;
        match self.kind() {
            Io::NotFound => ErrorClass::NotFound,
            Io::PermissionDenied => ErrorClass::Permission,
            Io::InvalidInput | Io::InvalidData => ErrorClass::Invalid,
            _ => ErrorClass::Internal,
        }
    }
}

/// An HTTP status code returned by a REST-style backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatus(pub u16);

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP status {}", self.0)
    }
}

impl std::error::Error for HttpStatus {}

impl Classify for HttpStatus {
    fn class(&self) -> ErrorClass {
        match self.0 {
            404 | 410 => ErrorClass::NotFound,
            401 | 403 => ErrorClass::Permission,
            400 | 405 | 422 => ErrorClass::Invalid,
            _ => ErrorClass::Internal,
        }
    }
}

/// Error returned by capability implementations.
///
/// Carries only a universal [`ErrorClass`] and a display-safe message; the
/// native error is kept as an opaque `source` for diagnostics.
#[derive(Debug, thiserror::Error)]
#[error("{class}: {message}")]
pub struct RemoteError {
    class: ErrorClass,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl RemoteError {
    /// Create an error of the given class with a message.
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for [`ErrorClass::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::NotFound, message)
    }

    /// Shorthand for [`ErrorClass::Permission`].
    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Permission, message)
    }

    /// Shorthand for [`ErrorClass::Invalid`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Invalid, message)
    }

    /// Shorthand for [`ErrorClass::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, message)
    }

    /// Translate a native backend error, keeping it as the source.
    pub fn classify<E>(error: E) -> Self
    where
        E: Classify + std::error::Error + Send + Sync + 'static,
    {
        Self {
            class: error.class(),
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }

    /// The universal class.
    pub fn class(&self) -> ErrorClass {
        self.class
    }

    /// The display-safe message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the key was absent.
    pub fn is_not_found(&self) -> bool {
        self.class == ErrorClass::NotFound
    }

    /// Convert into the caller-facing error, attaching path context.
    pub fn into_fs_error(self, path: &str, operation: &'static str) -> FsError {
        let path = path.to_string();
        match self.class {
            ErrorClass::NotFound => FsError::NotFound { path },
            ErrorClass::Permission => FsError::PermissionDenied {
                path,
                operation,
                details: self.message,
            },
            ErrorClass::Invalid => FsError::InvalidArgument {
                path,
                details: self.message,
            },
            ErrorClass::Internal => FsError::Internal {
                path,
                details: self.message,
            },
        }
    }
}
