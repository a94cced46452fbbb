//! # Extension Traits
//!
//! Convenience methods for any [`ReadOnlyFs`].
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`exists`](FsExt::exists) | Path resolves to a value or a directory |
//! | [`is_file`](FsExt::is_file) | Path resolves to a value |
//! | [`is_dir`](FsExt::is_dir) | Path resolves to a directory |
//! | [`file_size`](FsExt::file_size) | Size of the value at a path |
//!
//! With the `serde` feature, [`FsExtJson::read_json`] deserializes a value.

use crate::{Context, FsError, ReadOnlyFs};

/// Extension methods for any read-only filesystem.
///
/// # Example
///
/// ```rust
/// use keyspace_fs::{Context, FsError, FsExt, ReadOnlyFs};
///
/// fn has_credentials<F: ReadOnlyFs>(fs: &F) -> Result<bool, FsError> {
///     fs.is_file(&Context::background(), "app/credentials")
/// }
/// ```
pub trait FsExt: ReadOnlyFs {
    /// Returns `Ok(false)` for a missing path; other errors are surfaced.
    fn exists(&self, ctx: &Context, path: &str) -> Result<bool, FsError> {
        match self.stat(ctx, path) {
            Ok(_) => Ok(true),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path resolves to a value.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    fn is_file(&self, ctx: &Context, path: &str) -> Result<bool, FsError> {
        match self.stat(ctx, path) {
            Ok(m) => Ok(m.is_file()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path resolves to a directory.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    fn is_dir(&self, ctx: &Context, path: &str) -> Result<bool, FsError> {
        match self.stat(ctx, path) {
            Ok(m) => Ok(m.is_dir()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Size in bytes; 0 for directories.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path doesn't exist
    fn file_size(&self, ctx: &Context, path: &str) -> Result<u64, FsError> {
        Ok(self.stat(ctx, path)?.size)
    }
}

impl<F: ReadOnlyFs + ?Sized> FsExt for F {}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::de::DeserializeOwned;

    /// JSON extension methods, available with the `serde` feature.
    pub trait FsExtJson: ReadOnlyFs {
        /// Read a value and deserialize it as JSON.
        ///
        /// # Errors
        ///
        /// - [`FsError::InvalidArgument`] if the value is not valid JSON for `T`
        /// - the errors of [`ReadOnlyFs::read_file`]
        fn read_json<T: DeserializeOwned>(&self, ctx: &Context, path: &str) -> Result<T, FsError> {
            let data = self.read_file(ctx, path)?;
            serde_json::from_slice(&data).map_err(|e| FsError::invalid(path, e.to_string()))
        }
    }

    impl<F: ReadOnlyFs + ?Sized> FsExtJson for F {}
}

#[cfg(feature = "serde")]
pub use json::FsExtJson;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryStore;
    use crate::{ErrorClass, ProjectedFs};
    use std::sync::Arc;

    fn fs() -> ProjectedFs {
        let store = Arc::new(MemoryStore::new());
        store.insert("f", "12345");
        store.insert("d/x", "1");
        store.fail_key("locked", ErrorClass::Permission);
        ProjectedFs::builder(store).build().unwrap()
    }

    #[test]
    fn exists_and_kind() {
        let fs = fs();
        let ctx = Context::background();
        assert!(fs.exists(&ctx, "f").unwrap());
        assert!(fs.is_file(&ctx, "f").unwrap());
        assert!(!fs.is_dir(&ctx, "f").unwrap());
        assert!(fs.is_dir(&ctx, "d").unwrap());
        assert!(!fs.exists(&ctx, "missing").unwrap());
        assert!(!fs.is_file(&ctx, "missing").unwrap());
    }

    #[test]
    fn non_not_found_errors_are_surfaced() {
        let fs = fs();
        let ctx = Context::background();
        assert!(matches!(
            fs.exists(&ctx, "locked"),
            Err(FsError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn file_size_reads_metadata() {
        let fs = fs();
        let ctx = Context::background();
        assert_eq!(fs.file_size(&ctx, "f").unwrap(), 5);
        assert!(fs.file_size(&ctx, "missing").is_err());
    }

    #[test]
    fn works_through_dyn() {
        let fs = fs();
        let dyn_fs: &dyn ReadOnlyFs = &fs;
        assert!(dyn_fs.is_file(&Context::background(), "f").unwrap());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn read_json_deserializes() {
        let store = Arc::new(MemoryStore::new());
        store.insert("cfg", r#"{"port": 8200}"#);
        store.insert("bad", "{");
        let fs = ProjectedFs::builder(store).build().unwrap();
        let ctx = Context::background();

        let v: serde_json::Value = fs.read_json(&ctx, "cfg").unwrap();
        assert_eq!(v["port"], 8200);
        let err = fs.read_json::<serde_json::Value>(&ctx, "bad");
        assert!(matches!(err, Err(FsError::InvalidArgument { .. })));
    }
}
