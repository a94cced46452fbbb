//! # Lazy Node
//!
//! One opened path. Nothing is fetched until the node is used:
//!
//! ```text
//! Unresolved ──stat/read──▶ File        (Get succeeded; body cached)
//!     │                 └─▶ Directory   (Get not-found, probe found children)
//!     │                 └─▶ NotFound    (Get not-found, probe found nothing)
//!     └──read_dir────────▶ Directory   (full listing cached in a cursor)
//! ```
//!
//! Once resolved, the node never contacts the store again for metadata or
//! content, and lists at most once. A node is owned by one caller at a time;
//! open another node for concurrent use.
//!
//! Errors other than not-found (permission, internal, cancellation) leave the
//! node unresolved so a later call may retry.

use std::io;
use std::sync::Arc;

use crate::cursor::{DirCursor, DirPage};
use crate::projection::Engine;
use crate::scope;
use crate::synth;
use crate::{Context, DirEntry, FileType, FsError, Metadata, Request, Token};

enum State {
    Unresolved,
    NotFound,
    File {
        metadata: Metadata,
        body: Vec<u8>,
        offset: usize,
    },
    Directory {
        metadata: Metadata,
        cursor: Option<DirCursor>,
    },
}

/// An opened path in a [`ProjectedFs`](crate::ProjectedFs).
///
/// Close nodes with [`close`](Self::close) so the shared session can be
/// released. Closing twice is an error. A node dropped without closing
/// releases its session reference and logs a warning.
pub struct Node {
    name: String,
    root: String,
    key: String,
    is_root: bool,
    engine: Arc<Engine>,
    state: State,
    holds_session: bool,
    closed: bool,
}

impl Node {
    pub(crate) fn new(engine: Arc<Engine>, key: String, is_root: bool) -> Self {
        let (root, name) = if is_root {
            (key.clone(), ".".to_string())
        } else {
            match key.rsplit_once('/') {
                Some((parent, leaf)) => (format!("{parent}/"), leaf.to_string()),
                None => (String::new(), key.clone()),
            }
        };
        let holds_session = match &engine.session {
            Some(session) => {
                session.add_ref();
                true
            }
            None => false,
        };
        Self {
            name,
            root,
            key,
            is_root,
            engine,
            state: State::Unresolved,
            holds_session,
            closed: false,
        }
    }

    /// Leaf display name (`.` for the filesystem root).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent key prefix.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Full remote key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Metadata, resolving the node on first use.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if there is neither a value nor any child
    /// - [`FsError::Closed`] after [`close`](Self::close)
    /// - any other translated remote error, without a directory fallback
    pub fn stat(&mut self, ctx: &Context) -> Result<Metadata, FsError> {
        self.ensure_open()?;
        self.resolve(ctx)?;
        match &self.state {
            State::File { metadata, .. } | State::Directory { metadata, .. } => {
                Ok(metadata.clone())
            }
            State::Unresolved | State::NotFound => Err(self.not_found()),
        }
    }

    /// Read from the cached body at the current position. Returns 0 at end.
    ///
    /// # Errors
    ///
    /// - [`FsError::IsADirectory`] if the node is a directory
    /// - the same errors as [`stat`](Self::stat)
    pub fn read(&mut self, ctx: &Context, buf: &mut [u8]) -> Result<usize, FsError> {
        let remaining = self.file_body(ctx)?;
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.advance(n);
        Ok(n)
    }

    /// Read everything from the current position to the end.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub fn read_to_end(&mut self, ctx: &Context) -> Result<Vec<u8>, FsError> {
        let data = self.file_body(ctx)?.to_vec();
        self.advance(data.len());
        Ok(data)
    }

    /// Read everything remaining as UTF-8.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if the value is not UTF-8
    /// - the errors of [`read`](Self::read)
    pub fn read_to_string(&mut self, ctx: &Context) -> Result<String, FsError> {
        let bytes = self.read_to_end(ctx)?;
        String::from_utf8(bytes).map_err(|_| FsError::invalid(self.key.clone(), "not valid UTF-8"))
    }

    /// A [`std::io::Read`] adapter bound to `ctx`.
    pub fn reader<'a>(&'a mut self, ctx: &'a Context) -> NodeReader<'a> {
        NodeReader { node: self, ctx }
    }

    /// Read directory entries.
    ///
    /// The first call lists the directory once, in full, and stats each file
    /// child; later calls are served from that listing. With `n > 0` up to
    /// `n` entries are returned and [`DirPage::EndOfStream`] once nothing
    /// remains. With `n == 0` all remaining entries are returned, which may
    /// be none.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the listing is empty (there are no empty
    ///   directories in a flat store); the filesystem root is exempt
    /// - [`FsError::NotADirectory`] if the node is a file
    /// - any listing error; nothing is cached and the next call starts over
    pub fn read_dir(&mut self, ctx: &Context, n: usize) -> Result<DirPage, FsError> {
        self.ensure_open()?;
        match &mut self.state {
            State::Directory {
                cursor: Some(cursor),
                ..
            } => {
                tracing::trace!(key = %self.key, remaining = cursor.remaining(), "read_dir served from cache");
                return Ok(cursor.next_page(n));
            }
            State::File { .. } => {
                return Err(FsError::NotADirectory {
                    path: self.key.clone(),
                });
            }
            State::NotFound => {
                return Err(FsError::NotFound {
                    path: self.key.clone(),
                });
            }
            State::Unresolved | State::Directory { cursor: None, .. } => {}
        }

        let entries = self.load_children(ctx)?;
        if entries.is_empty() && !self.is_root && !self.engine.probe.is_known_directory(&self.key)
        {
            // the empty listing already rules out a directory; only Get remains
            if matches!(self.state, State::Unresolved) {
                self.fetch(ctx, false)?;
                if matches!(self.state, State::File { .. }) {
                    return Err(FsError::NotADirectory {
                        path: self.key.clone(),
                    });
                }
            }
            self.state = State::NotFound;
            return Err(self.not_found());
        }

        let mut cursor = DirCursor::new(entries);
        let page = cursor.next_page(n);
        let metadata = match std::mem::replace(&mut self.state, State::Unresolved) {
            State::Directory { metadata, .. } => metadata,
            _ => self.directory_metadata(),
        };
        self.state = State::Directory {
            metadata,
            cursor: Some(cursor),
        };
        Ok(page)
    }

    /// Release the node and its session reference.
    ///
    /// # Errors
    ///
    /// - [`FsError::Closed`] if already closed
    /// - the logout error if this was the session's last reference (the
    ///   node is closed regardless)
    pub fn close(&mut self, ctx: &Context) -> Result<(), FsError> {
        if self.closed {
            return Err(FsError::Closed {
                path: self.key.clone(),
            });
        }
        self.closed = true;
        self.state = State::Unresolved;
        self.release_session(ctx)
    }

    /// Returns `true` once closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    fn resolve(&mut self, ctx: &Context) -> Result<(), FsError> {
        self.fetch(ctx, true)
    }

    /// Resolve with a Get. A not-found answer asks whether the key is a
    /// directory only when `check_directory` is set.
    fn fetch(&mut self, ctx: &Context, check_directory: bool) -> Result<(), FsError> {
        match self.state {
            State::Unresolved => {}
            State::NotFound => return Err(self.not_found()),
            State::File { .. } | State::Directory { .. } => {
                tracing::trace!(key = %self.key, "stat served from cache");
                return Ok(());
            }
        }

        if self.is_root || self.engine.probe.is_known_directory(&self.key) {
            self.state = State::Directory {
                metadata: self.directory_metadata(),
                cursor: None,
            };
            return Ok(());
        }

        ctx.check("stat")?;
        let token = self.credential(ctx)?;
        let req = Request::new(ctx).with_credential(token.as_ref());
        let engine = Arc::clone(&self.engine);

        match engine.store.get(&req, &self.key) {
            Ok(value) => {
                tracing::debug!(key = %self.key, size = value.len(), "fetched value");
                let metadata = Metadata {
                    name: self.name.clone(),
                    file_type: FileType::File,
                    size: value.len(),
                    permissions: engine.config.file_mode(),
                    modified: value.modified.unwrap_or_else(|| engine.clock.now()),
                    content_type: value.content_type,
                };
                self.state = State::File {
                    metadata,
                    body: value.data,
                    offset: 0,
                };
                Ok(())
            }
            Err(e) if e.is_not_found() && !check_directory => {
                self.state = State::NotFound;
                Err(self.not_found())
            }
            Err(e) if e.is_not_found() => {
                ctx.check("stat")?;
                let prefix = scope::dir_prefix(&self.key);
                let scope = engine.config.scope();
                if engine.probe.probe(engine.store.as_ref(), &req, &prefix, scope)? {
                    tracing::debug!(key = %self.key, "resolved as directory");
                    self.state = State::Directory {
                        metadata: self.directory_metadata(),
                        cursor: None,
                    };
                    Ok(())
                } else {
                    self.state = State::NotFound;
                    Err(self.not_found())
                }
            }
            Err(e) => Err(e.into_fs_error(&self.key, "stat")),
        }
    }

    fn load_children(&mut self, ctx: &Context) -> Result<Vec<DirEntry>, FsError> {
        let prefix = if self.is_root {
            self.key.clone()
        } else {
            scope::dir_prefix(&self.key)
        };
        let token = self.credential(ctx)?;
        let req = Request::new(ctx).with_credential(token.as_ref());
        let engine = Arc::clone(&self.engine);

        let keys = synth::list_all(
            engine.store.as_ref(),
            &req,
            &prefix,
            engine.config.list_page_size(),
        )?;
        let children = synth::synthesize(&prefix, &keys, engine.config.scope());
        tracing::debug!(prefix = %prefix, raw = keys.len(), children = children.len(), "synthesized directory");

        let mut entries = Vec::with_capacity(children.len());
        for child in children {
            ctx.check("read_dir")?;
            let key = format!("{prefix}{}", child.name);
            if child.is_dir {
                entries.push(DirEntry {
                    metadata: Metadata::directory(child.name.clone(), engine.config.dir_mode()),
                    name: child.name,
                    key,
                });
                continue;
            }

            let mut node = Node::new(Arc::clone(&engine), key.clone(), false);
            let stat = node.stat(ctx);
            let closed = node.close(ctx);
            match stat {
                Ok(metadata) => entries.push(DirEntry {
                    name: child.name,
                    key,
                    metadata,
                }),
                // listed, then removed before we could fetch it
                Err(FsError::NotFound { .. }) => {
                    tracing::debug!(key = %key, "listed key vanished");
                }
                Err(e) => return Err(e),
            }
            closed?;
        }
        Ok(entries)
    }

    fn file_body(&mut self, ctx: &Context) -> Result<&[u8], FsError> {
        self.ensure_open()?;
        self.resolve(ctx)?;
        match &self.state {
            State::File { body, offset, .. } => Ok(&body[*offset..]),
            State::Directory { .. } => Err(FsError::IsADirectory {
                path: self.key.clone(),
            }),
            State::Unresolved | State::NotFound => Err(self.not_found()),
        }
    }

    fn advance(&mut self, n: usize) {
        if let State::File { offset, .. } = &mut self.state {
            *offset += n;
        }
    }

    fn credential(&self, ctx: &Context) -> Result<Option<Token>, FsError> {
        match &self.engine.session {
            Some(session) => session.token(ctx).map(Some),
            None => Ok(None),
        }
    }

    fn directory_metadata(&self) -> Metadata {
        Metadata::directory(self.name.clone(), self.engine.config.dir_mode())
    }

    fn ensure_open(&self) -> Result<(), FsError> {
        if self.closed {
            return Err(FsError::Closed {
                path: self.key.clone(),
            });
        }
        Ok(())
    }

    fn not_found(&self) -> FsError {
        FsError::NotFound {
            path: self.key.clone(),
        }
    }

    fn release_session(&mut self, ctx: &Context) -> Result<(), FsError> {
        if !self.holds_session {
            return Ok(());
        }
        self.holds_session = false;
        match &self.engine.session {
            Some(session) => session.remove_ref(ctx),
            None => Ok(()),
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if self.holds_session {
            tracing::warn!(key = %self.key, "node dropped without close; releasing session");
            if let Err(e) = self.release_session(&Context::background()) {
                tracing::warn!(key = %self.key, error = %e, "release on drop failed");
            }
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            State::Unresolved => "unresolved",
            State::NotFound => "not-found",
            State::File { .. } => "file",
            State::Directory { .. } => "directory",
        };
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("state", &state)
            .field("closed", &self.closed)
            .finish()
    }
}

/// [`std::io::Read`] over a node, returned by [`Node::reader`].
pub struct NodeReader<'a> {
    node: &'a mut Node,
    ctx: &'a Context,
}

impl io::Read for NodeReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.node.read(self.ctx, buf).map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryStore;
    use crate::{ErrorClass, FixedClock, ProjectedFs, ProjectionConfig, ReadOnlyFs};
    use std::io::Read;
    use std::time::{Duration, SystemTime};

    fn fs_over(store: &Arc<MemoryStore>) -> ProjectedFs {
        ProjectedFs::builder(Arc::clone(store))
            .config(ProjectionConfig::new("kv"))
            .clock(FixedClock(SystemTime::UNIX_EPOCH + Duration::from_secs(42)))
            .build()
            .unwrap()
    }

    #[test]
    fn open_is_lazy() {
        let store = Arc::new(MemoryStore::new());
        let fs = fs_over(&store);
        let mut node = fs.open("a").unwrap();
        assert_eq!(node.key(), "kv/a");
        assert_eq!(node.root(), "kv/");
        assert_eq!(node.name(), "a");
        assert_eq!(store.stats().get_calls, 0);
        node.close(&Context::background()).unwrap();
    }

    #[test]
    fn stat_file_uses_clock_when_backend_has_no_mtime() {
        let store = Arc::new(MemoryStore::new());
        store.insert("kv/a", "hello");
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("a").unwrap();

        let md = node.stat(&ctx).unwrap();
        assert!(md.is_file());
        assert_eq!(md.size, 5);
        assert_eq!(md.name, "a");
        assert_eq!(md.modified, SystemTime::UNIX_EPOCH + Duration::from_secs(42));
        assert!(md.permissions.readonly());
        node.close(&ctx).unwrap();
    }

    #[test]
    fn stat_then_read_fetches_once() {
        let store = Arc::new(MemoryStore::new());
        store.insert("kv/a", "hello");
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("a").unwrap();

        node.stat(&ctx).unwrap();
        node.stat(&ctx).unwrap();
        assert_eq!(node.read_to_end(&ctx).unwrap(), b"hello");
        assert_eq!(store.stats().get_calls, 1);
        assert_eq!(store.stats().list_calls, 0);
        node.close(&ctx).unwrap();
    }

    #[test]
    fn partial_reads_advance() {
        let store = Arc::new(MemoryStore::new());
        store.insert("kv/a", "hello");
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("a").unwrap();

        let mut buf = [0u8; 3];
        assert_eq!(node.read(&ctx, &mut buf).unwrap(), 3);
        assert_eq!(&buf, b"hel");
        assert_eq!(node.read(&ctx, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"lo");
        assert_eq!(node.read(&ctx, &mut buf).unwrap(), 0);
        node.close(&ctx).unwrap();
    }

    #[test]
    fn io_reader_adapter() {
        let store = Arc::new(MemoryStore::new());
        store.insert("kv/a", "hello");
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("a").unwrap();
        let mut s = String::new();
        node.reader(&ctx).read_to_string(&mut s).unwrap();
        assert_eq!(s, "hello");
        node.close(&ctx).unwrap();
    }

    #[test]
    fn directory_by_probe() {
        let store = Arc::new(MemoryStore::new());
        store.insert("kv/dir/a", "1");
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("dir").unwrap();

        let md = node.stat(&ctx).unwrap();
        assert!(md.is_dir());
        assert_eq!(md.size, 0);
        assert_eq!(md.modified, SystemTime::UNIX_EPOCH);
        assert!(matches!(
            node.read(&ctx, &mut [0u8; 4]),
            Err(FsError::IsADirectory { .. })
        ));
        node.close(&ctx).unwrap();
    }

    #[test]
    fn missing_is_not_found_and_cached() {
        let store = Arc::new(MemoryStore::new());
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("missing").unwrap();

        assert!(matches!(node.stat(&ctx), Err(FsError::NotFound { .. })));
        assert!(matches!(node.stat(&ctx), Err(FsError::NotFound { .. })));
        assert_eq!(store.stats().get_calls, 1);
        assert_eq!(store.stats().list_calls, 1);
        node.close(&ctx).unwrap();
    }

    #[test]
    fn non_not_found_errors_skip_the_probe() {
        let store = Arc::new(MemoryStore::new());
        store.fail_key("kv/locked", ErrorClass::Permission);
        store.insert("kv/locked/child", "x");
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("locked").unwrap();

        assert!(matches!(
            node.stat(&ctx),
            Err(FsError::PermissionDenied { .. })
        ));
        assert_eq!(store.stats().list_calls, 0);
        node.close(&ctx).unwrap();
    }

    #[test]
    fn transient_error_leaves_node_unresolved() {
        let store = Arc::new(MemoryStore::new());
        store.insert("kv/a", "v");
        store.fail_key("kv/a", ErrorClass::Internal);
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("a").unwrap();

        assert!(matches!(node.stat(&ctx), Err(FsError::Internal { .. })));
        store.clear_failures();
        assert!(node.stat(&ctx).unwrap().is_file());
        node.close(&ctx).unwrap();
    }

    #[test]
    fn read_dir_on_file_is_not_a_directory() {
        let store = Arc::new(MemoryStore::new());
        store.insert("kv/a", "v");
        let fs = fs_over(&store);
        let ctx = Context::background();

        let mut node = fs.open("a").unwrap();
        assert!(matches!(
            node.read_dir(&ctx, 0),
            Err(FsError::NotADirectory { .. })
        ));
        node.close(&ctx).unwrap();

        let mut node = fs.open("a").unwrap();
        node.stat(&ctx).unwrap();
        assert!(matches!(
            node.read_dir(&ctx, 0),
            Err(FsError::NotADirectory { .. })
        ));
        node.close(&ctx).unwrap();
    }

    #[test]
    fn read_dir_on_missing_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("nothing").unwrap();
        assert!(matches!(
            node.read_dir(&ctx, 1),
            Err(FsError::NotFound { .. })
        ));
        node.close(&ctx).unwrap();
    }

    #[test]
    fn read_dir_on_missing_lists_once_and_gets_once() {
        let store = Arc::new(MemoryStore::new());
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("nothing").unwrap();

        assert!(matches!(
            node.read_dir(&ctx, 0),
            Err(FsError::NotFound { .. })
        ));
        assert_eq!(store.stats().list_calls, 1);
        assert_eq!(store.stats().get_calls, 1);

        assert!(matches!(node.stat(&ctx), Err(FsError::NotFound { .. })));
        assert_eq!(store.stats().list_calls, 1);
        assert_eq!(store.stats().get_calls, 1);
        node.close(&ctx).unwrap();
    }

    #[test]
    fn directory_emptied_before_listing_becomes_not_found() {
        let store = Arc::new(MemoryStore::new());
        store.insert("kv/d/a", "1");
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("d").unwrap();

        assert!(node.stat(&ctx).unwrap().is_dir());
        assert!(store.remove("kv/d/a"));
        assert!(!store.remove("kv/d/a"));

        assert!(matches!(
            node.read_dir(&ctx, 0),
            Err(FsError::NotFound { .. })
        ));
        assert!(matches!(node.stat(&ctx), Err(FsError::NotFound { .. })));
        assert!(matches!(
            node.read_dir(&ctx, 0),
            Err(FsError::NotFound { .. })
        ));
        node.close(&ctx).unwrap();
    }

    #[test]
    fn empty_root_lists_nothing() {
        let store = Arc::new(MemoryStore::new());
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut root = fs.open(".").unwrap();
        assert!(root.stat(&ctx).unwrap().is_dir());
        assert!(root.read_dir(&ctx, 1).unwrap().is_end());
        root.close(&ctx).unwrap();
    }

    #[test]
    fn vanished_file_child_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        store.insert("kv/d/a", "1");
        store.insert("kv/d/b", "2");
        store.fail_key("kv/d/b", ErrorClass::NotFound);
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("d").unwrap();
        let names: Vec<_> = node
            .read_dir(&ctx, 0)
            .unwrap()
            .into_entries()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["a"]);
        node.close(&ctx).unwrap();
    }

    #[test]
    fn cancelled_context_stops_before_remote_call() {
        let store = Arc::new(MemoryStore::new());
        store.insert("kv/a", "v");
        let fs = fs_over(&store);
        let ctx = Context::background();
        ctx.cancel_handle().cancel();
        let mut node = fs.open("a").unwrap();
        assert!(matches!(node.stat(&ctx), Err(FsError::Cancelled { .. })));
        assert_eq!(store.stats().get_calls, 0);
        node.close(&ctx).unwrap();
    }

    #[test]
    fn double_close_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let fs = fs_over(&store);
        let ctx = Context::background();
        let mut node = fs.open("a").unwrap();
        node.close(&ctx).unwrap();
        assert!(matches!(node.close(&ctx), Err(FsError::Closed { .. })));
        assert!(matches!(node.stat(&ctx), Err(FsError::Closed { .. })));
    }
}
