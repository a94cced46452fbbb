//! Paginated key listings.

use std::sync::Arc;

use crate::{ListPage, ListRequest, RemoteError, Request};

/// Lists keys beneath a prefix, one page at a time.
///
/// # Contract
///
/// - `keys` are *full* keys, including the requested prefix. Bindings for
///   APIs that return names relative to the prefix must prepend it.
/// - Keys may be returned in any order and may repeat; the directory
///   synthesizer sorts and deduplicates.
/// - The listing may include the prefix's own key or keys outside the
///   caller's scope; both are filtered by the engine.
/// - `next` is present exactly when another page follows. The token is
///   opaque to the engine and is passed back verbatim, so a backend may
///   encode an offset or a cursor as it sees fit.
/// - `limit`, when set, bounds the page size. Implementations may return
///   fewer keys but never more.
/// - An empty prefix listing is an empty page, not an error.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn ListingSource`.
pub trait ListingSource: Send + Sync {
    /// Fetch one page.
    fn list(&self, req: &Request<'_>, list: &ListRequest) -> Result<ListPage, RemoteError>;
}

impl<T: ListingSource + ?Sized> ListingSource for Arc<T> {
    fn list(&self, req: &Request<'_>, list: &ListRequest) -> Result<ListPage, RemoteError> {
        (**self).list(req, list)
    }
}

impl<T: ListingSource + ?Sized> ListingSource for Box<T> {
    fn list(&self, req: &Request<'_>, list: &ListRequest) -> Result<ListPage, RemoteError> {
        (**self).list(req, list)
    }
}
