//! # Projected Filesystem
//!
//! The entry point: wraps a [`RemoteStore`] and serves it as a read-only
//! tree of [`Node`]s.
//!
//! ```rust
//! use std::sync::Arc;
//! use keyspace_fs::backends::memory::MemoryStore;
//! use keyspace_fs::{Context, ProjectedFs, ProjectionConfig, ReadOnlyFs};
//!
//! let store = Arc::new(MemoryStore::new());
//! store.insert("secret/app/db", "hunter2");
//!
//! let fs = ProjectedFs::builder(store)
//!     .config(ProjectionConfig::new("secret"))
//!     .build()
//!     .unwrap();
//!
//! let ctx = Context::background();
//! assert_eq!(fs.read_file(&ctx, "app/db").unwrap(), b"hunter2");
//! assert!(fs.stat(&ctx, "app").unwrap().is_dir());
//! ```

use std::sync::Arc;

use crate::probe::{DirectoryProbe, ListProbe};
use crate::scope;
use crate::{
    Authenticator, Clock, Context, FsError, Node, ProjectionConfig, ReadOnlyFs, RemoteStore,
    Session, SystemClock,
};

/// Everything nodes of one filesystem share.
pub(crate) struct Engine {
    pub(crate) store: Arc<dyn RemoteStore>,
    pub(crate) probe: Arc<dyn DirectoryProbe>,
    pub(crate) session: Option<Arc<Session>>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: ProjectionConfig,
}

/// Read-only filesystem over a remote key space.
///
/// Cheap to clone; clones and [`sub`](Self::sub) views share the store and
/// the session.
#[derive(Clone)]
pub struct ProjectedFs {
    engine: Arc<Engine>,
    prefix: String,
    is_top: bool,
}

impl ProjectedFs {
    /// Start building a filesystem over `store`.
    pub fn builder(store: impl RemoteStore + 'static) -> ProjectedFsBuilder {
        ProjectedFsBuilder {
            store: Arc::new(store),
            config: ProjectionConfig::default(),
            probe: None,
            authenticator: None,
            clock: None,
        }
    }

    /// A view rooted at directory `dir`.
    ///
    /// The directory is not checked; opening paths under a missing directory
    /// reports not-found as usual.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if `dir` is malformed
    pub fn sub(&self, dir: &str) -> Result<ProjectedFs, FsError> {
        scope::validate_path(dir)?;
        if dir == "." {
            return Ok(self.clone());
        }
        Ok(ProjectedFs {
            engine: Arc::clone(&self.engine),
            prefix: scope::dir_prefix(&scope::join_key(&self.prefix, dir)),
            is_top: false,
        })
    }

    /// Entire value at `path` as UTF-8.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if the value is not UTF-8
    /// - the errors of [`ReadOnlyFs::read_file`]
    pub fn read_to_string(&self, ctx: &Context, path: &str) -> Result<String, FsError> {
        let bytes = self.read_file(ctx, path)?;
        String::from_utf8(bytes).map_err(|_| FsError::invalid(path, "not valid UTF-8"))
    }

    /// The key prefix this view lists under.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The shared session, if the store needs a credential.
    pub fn session(&self) -> Option<&Session> {
        self.engine.session.as_deref()
    }

    /// The configuration this filesystem was built with.
    pub fn config(&self) -> &ProjectionConfig {
        &self.engine.config
    }
}

impl ReadOnlyFs for ProjectedFs {
    fn open(&self, path: &str) -> Result<Node, FsError> {
        scope::validate_path(path)?;
        let node = if path == "." && self.is_top {
            Node::new(Arc::clone(&self.engine), self.prefix.clone(), true)
        } else if path == "." {
            let key = self.prefix.trim_end_matches('/').to_string();
            Node::new(Arc::clone(&self.engine), key, false)
        } else {
            let key = scope::join_key(&self.prefix, path);
            Node::new(Arc::clone(&self.engine), key, false)
        };
        tracing::trace!(path, key = %node.key(), "opened node");
        Ok(node)
    }
}

impl std::fmt::Debug for ProjectedFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectedFs")
            .field("prefix", &self.prefix)
            .field("config", &self.engine.config)
            .field("session", &self.engine.session)
            .finish()
    }
}

/// Builder for [`ProjectedFs`].
pub struct ProjectedFsBuilder {
    store: Arc<dyn RemoteStore>,
    config: ProjectionConfig,
    probe: Option<Arc<dyn DirectoryProbe>>,
    authenticator: Option<Arc<dyn Authenticator>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ProjectedFsBuilder {
    /// Root, scope, page sizes and modes. Defaults to the empty opaque root.
    pub fn config(mut self, config: ProjectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Directory probe. Defaults to a [`ListProbe`] using the configured
    /// probe page size.
    pub fn probe(mut self, probe: impl DirectoryProbe + 'static) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    /// Share one credential across nodes, logging in through
    /// `authenticator`. Without one, requests carry no credential.
    pub fn authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// Clock for file modification times the backend does not report.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Validate the configuration and build.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] from [`ProjectionConfig::validate`]
    pub fn build(self) -> Result<ProjectedFs, FsError> {
        self.config.validate()?;
        let probe = self
            .probe
            .unwrap_or_else(|| Arc::new(ListProbe::new(self.config.probe_page_size())));
        let session = self.authenticator.map(|a| Arc::new(Session::new(a)));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let prefix = self.config.root().to_string();
        tracing::debug!(root = %prefix, scope = ?self.config.scope(), "projected filesystem built");
        Ok(ProjectedFs {
            engine: Arc::new(Engine {
                store: self.store,
                probe,
                session,
                clock,
                config: self.config,
            }),
            prefix,
            is_top: true,
        })
    }
}
