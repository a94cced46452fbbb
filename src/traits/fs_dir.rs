//! Whole-directory listings.

use crate::{DirEntry, FsError};

/// Iterator over directory entries.
///
/// Wraps a boxed iterator for flexibility across filesystem handles.
///
/// - Outer `Result` (from [`ReadOnlyFs::read_dir`](crate::ReadOnlyFs::read_dir)) = "can I list this directory?"
/// - Inner `Result` (per item) = "can I read this entry?"
///
/// Entries are always in ascending byte-wise name order.
///
/// # Example
///
/// ```rust
/// use keyspace_fs::{Context, FsError, ReadOnlyFs};
///
/// fn list_names<F: ReadOnlyFs>(fs: &F) -> Result<Vec<String>, FsError> {
///     let ctx = Context::background();
///     let mut names = Vec::new();
///     for entry in fs.read_dir(&ctx, ".")? {
///         names.push(entry?.name);
///     }
///     Ok(names)
/// }
/// ```
pub struct ReadDirIter(Box<dyn Iterator<Item = Result<DirEntry, FsError>> + Send + 'static>);

impl ReadDirIter {
    /// Create from any compatible iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<DirEntry, FsError>> + Send + 'static,
    {
        Self(Box::new(iter))
    }

    /// Create from an already materialized listing.
    pub fn from_entries(entries: Vec<DirEntry>) -> Self {
        Self(Box::new(entries.into_iter().map(Ok)))
    }

    /// Collect all entries, short-circuiting on first error.
    pub fn collect_all(self) -> Result<Vec<DirEntry>, FsError> {
        self.collect()
    }
}

impl Iterator for ReadDirIter {
    type Item = Result<DirEntry, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl std::fmt::Debug for ReadDirIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadDirIter").finish_non_exhaustive()
    }
}
