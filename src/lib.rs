//! # keyspace-fs
//!
//! A read-only filesystem projection of flat, paginated remote key/value
//! stores: secret managers, KV services, instance metadata endpoints, blob
//! listings.
//!
//! Such stores only know keys and values. This crate adds the tree: slashes
//! in keys become directories, a directory exists exactly when at least one
//! key lives beneath it, and every path is resolved lazily and fetched at
//! most once per opened node.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use keyspace_fs::backends::memory::MemoryStore;
//! use keyspace_fs::{Context, FsError, ProjectedFs, ProjectionConfig, ReadOnlyFs};
//!
//! fn main() -> Result<(), FsError> {
//!     let store = Arc::new(MemoryStore::new());
//!     store.insert("secret/app/db/password", "hunter2");
//!     store.insert("secret/app/api-key", "k-123");
//!
//!     let fs = ProjectedFs::builder(store)
//!         .config(ProjectionConfig::new("secret"))
//!         .build()?;
//!
//!     let ctx = Context::background();
//!     let entries = fs.read_dir(&ctx, "app")?.collect_all()?;
//!     let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
//!     assert_eq!(names, ["api-key", "db"]);
//!     assert_eq!(fs.read_to_string(&ctx, "app/db/password")?, "hunter2");
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ProjectedFs`] | The filesystem; opens [`Node`]s |
//! | [`Node`] | One lazily resolved path (stat, read, paged read_dir, close) |
//! | [`RemoteStore`] | What a backend implements: [`ValueSource`] + [`ListingSource`] |
//! | [`Authenticator`] | Optional login/logout for token-based backends |
//! | [`DirectoryProbe`] | How a not-found key is tested for being a directory |
//! | [`FsError`] | Caller-facing error with path context |
//! | [`RemoteError`] | Backend error already translated to an [`ErrorClass`] |
//!
//! ---
//!
//! ## Architecture
//!
//! ```text
//! caller ──▶ ProjectedFs::open ──▶ Node ──stat/read──▶ ValueSource::get
//!                                   │                  └─▶ DirectoryProbe (on not-found)
//!                                   └──read_dir──────▶ ListingSource::list (all pages)
//!                                                      └─▶ synthesize (dedup + sort)
//!                     Session (shared credential, refcounted by live nodes)
//! ```
//!
//! ---
//!
//! ## Error Handling
//!
//! Backends translate native failures into a [`RemoteError`] through
//! [`Classify`]; the engine turns that into an [`FsError`] with the key it
//! was working on:
//!
//! ```rust
//! use keyspace_fs::{ErrorKind, HttpStatus, RemoteError};
//!
//! let err = RemoteError::classify(HttpStatus(403)).into_fs_error("secret/db", "stat");
//! assert_eq!(err.kind(), ErrorKind::Permission);
//! ```
//!
//! Only a not-found Get triggers the directory fallback. Permission and
//! service errors are surfaced as they are.
//!
//! ---
//!
//! ## Thread Safety
//!
//! [`ProjectedFs`] and every capability trait are `Send + Sync`; open nodes
//! from as many threads as needed. A [`Node`] is used by one caller at a
//! time.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`Metadata`], [`DirEntry`], [`ProjectionConfig`]; [`ProjectionConfig::from_json`]; `FsExtJson` |

// Private modules
mod clock;
mod config;
mod context;
mod cursor;
mod error;
mod ext;
mod layer;
mod node;
mod probe;
mod projection;
mod scope;
mod session;
mod synth;
mod traits;
mod types;

pub mod backends;

// Public re-exports - errors
pub use error::{Classify, ErrorClass, ErrorKind, FsError, HttpStatus, RemoteError};

// Public re-exports - core types
pub use types::{
    ChildEntry, DirEntry, FileType, ListPage, ListRequest, Metadata, PageToken, Permissions,
    RemoteValue, Token,
};

// Public re-exports - capability traits
pub use traits::{
    Authenticator, ListingSource, ReadDirIter, ReadOnlyFs, RemoteStore, ValueSource,
};

// Public re-exports - engine
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ProjectionConfig;
pub use context::{CancelHandle, Context, Request};
pub use cursor::DirPage;
pub use node::{Node, NodeReader};
pub use probe::{DirectoryProbe, ListProbe, StaticProbe};
pub use projection::{ProjectedFs, ProjectedFsBuilder};
pub use scope::{ScopeMode, validate_path};
pub use session::Session;
pub use synth::{list_all, relative_child, synthesize};

// Public re-exports - infrastructure
pub use ext::FsExt;
pub use layer::{Layer, StoreExt, Traced, TracingLayer};

// Conditional re-exports
#[cfg(feature = "serde")]
pub use ext::FsExtJson;
