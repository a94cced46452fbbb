//! Read-only filesystem operations.

use crate::{Context, FsError, Metadata, Node, ReadDirIter};

/// Read-only filesystem over a projected key space.
///
/// Only [`open`](Self::open) is required. The path-based helpers open a
/// fresh [`Node`], perform one operation and close it again. A close failure
/// (for example a failed session logout) is reported even when the
/// operation itself succeeded.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; opening nodes concurrently is safe.
/// Each returned [`Node`] is owned by one caller.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn ReadOnlyFs`.
pub trait ReadOnlyFs: Send + Sync {
    /// Open a path. No remote call is made until the node is used.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if the path is malformed
    fn open(&self, path: &str) -> Result<Node, FsError>;

    /// Metadata for a path.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if neither a value nor any child key exists
    fn stat(&self, ctx: &Context, path: &str) -> Result<Metadata, FsError> {
        with_node(self.open(path)?, ctx, |node| node.stat(ctx))
    }

    /// Entire value at a path.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::IsADirectory`] if the path is a directory
    fn read_file(&self, ctx: &Context, path: &str) -> Result<Vec<u8>, FsError> {
        with_node(self.open(path)?, ctx, |node| node.read_to_end(ctx))
    }

    /// All entries of a directory, sorted by name.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the directory has no children
    /// - [`FsError::NotADirectory`] if the path is a file
    fn read_dir(&self, ctx: &Context, path: &str) -> Result<ReadDirIter, FsError> {
        with_node(self.open(path)?, ctx, |node| {
            let entries = node.read_dir(ctx, 0)?.into_entries();
            Ok(ReadDirIter::from_entries(entries))
        })
    }
}

fn with_node<T>(
    mut node: Node,
    ctx: &Context,
    op: impl FnOnce(&mut Node) -> Result<T, FsError>,
) -> Result<T, FsError> {
    let result = op(&mut node);
    let closed = node.close(ctx);
    let value = result?;
    closed?;
    Ok(value)
}
