//! # Capability Traits
//!
//! The only contact points between the engine and a backend.
//!
//! ```text
//! Backend side:   ValueSource + ListingSource = RemoteStore    (+ Authenticator)
//!                                  ↓
//! Caller side:    ReadOnlyFs  (implemented by ProjectedFs)
//! ```
//!
//! ## Quick Reference
//!
//! | Trait | Operation | Implemented by |
//! |-------|-----------|----------------|
//! | [`ValueSource`] | `get(key)` | every backend |
//! | [`ListingSource`] | `list(prefix, token)` | every backend |
//! | [`RemoteStore`] | both of the above | blanket |
//! | [`Authenticator`] | `login` / `logout` | token-based backends |
//! | [`ReadOnlyFs`] | `open`, `stat`, `read_file`, `read_dir` | [`ProjectedFs`](crate::ProjectedFs) |
//!
//! ## Blanket Implementations
//!
//! Implement [`ValueSource`] and [`ListingSource`] and the type is a
//! [`RemoteStore`]:
//!
//! ```rust
//! use keyspace_fs::{
//!     ListPage, ListRequest, ListingSource, RemoteError, RemoteStore, RemoteValue, Request,
//!     ValueSource,
//! };
//!
//! struct Empty;
//!
//! impl ValueSource for Empty {
//!     fn get(&self, _: &Request<'_>, key: &str) -> Result<RemoteValue, RemoteError> {
//!         Err(RemoteError::not_found(key))
//!     }
//! }
//!
//! impl ListingSource for Empty {
//!     fn list(&self, _: &Request<'_>, _: &ListRequest) -> Result<ListPage, RemoteError> {
//!         Ok(ListPage::default())
//!     }
//! }
//!
//! fn takes_store(_: &dyn RemoteStore) {}
//! takes_store(&Empty);
//! ```
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. Backends use interior
//! mutability for any state they keep.

mod fs_dir;
mod fs_read;
mod remote_auth;
mod remote_get;
mod remote_list;

pub use fs_dir::ReadDirIter;
pub use fs_read::ReadOnlyFs;
pub use remote_auth::Authenticator;
pub use remote_get::ValueSource;
pub use remote_list::ListingSource;

/// A complete remote store: values plus listings.
///
/// Blanket-implemented for every `ValueSource + ListingSource`.
pub trait RemoteStore: ValueSource + ListingSource {}

impl<T: ValueSource + ListingSource + ?Sized> RemoteStore for T {}
