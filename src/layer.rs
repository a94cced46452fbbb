//! # Layer Trait
//!
//! Tower-style middleware composition for remote stores.
//!
//! ```text
//! Store ──▶ Layer::layer() ──▶ Wrapped Store ──▶ ProjectedFs::builder()
//! ```
//!
//! Each middleware provides a wrapper that implements the capability traits
//! and a [`Layer`] that builds it. [`StoreExt::layer`] chains them fluently:
//!
//! ```rust
//! use keyspace_fs::backends::memory::MemoryStore;
//! use keyspace_fs::{ProjectedFs, StoreExt, TracingLayer};
//!
//! let store = MemoryStore::new().layer(TracingLayer::new("vault"));
//! let fs = ProjectedFs::builder(store).build().unwrap();
//! # let _ = fs;
//! ```

use std::time::Instant;

use crate::{ListPage, ListRequest, ListingSource, RemoteError, RemoteValue, Request, ValueSource};

/// A layer that wraps a store to add functionality.
///
/// # Design Notes
///
/// - `layer(self, store)` consumes both the layer and the store
/// - The resulting `Store` should implement the same capability traits as `S`
pub trait Layer<S> {
    /// The wrapped store type.
    type Store;

    /// Wrap `store`.
    fn layer(self, store: S) -> Self::Store;
}

/// Fluent `.layer()` on any [`ValueSource`] (and so any store).
pub trait StoreExt: ValueSource + Sized {
    /// Apply a layer to this store.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Store {
        layer.layer(self)
    }
}

impl<S: ValueSource> StoreExt for S {}

// ============================================================================
// Tracing
// ============================================================================

/// Logs every remote call with its key, outcome and latency.
#[derive(Debug, Clone)]
pub struct TracingLayer {
    label: &'static str,
}

impl TracingLayer {
    /// A layer whose events carry `label` as the `store` field.
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl Default for TracingLayer {
    fn default() -> Self {
        Self::new("remote")
    }
}

impl<S> Layer<S> for TracingLayer {
    type Store = Traced<S>;

    fn layer(self, store: S) -> Traced<S> {
        Traced {
            inner: store,
            label: self.label,
        }
    }
}

/// Store wrapped by [`TracingLayer`].
#[derive(Debug)]
pub struct Traced<S> {
    inner: S,
    label: &'static str,
}

impl<S> Traced<S> {
    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ValueSource> ValueSource for Traced<S> {
    fn get(&self, req: &Request<'_>, key: &str) -> Result<RemoteValue, RemoteError> {
        let span = tracing::debug_span!("remote.get", store = self.label, key);
        let _enter = span.enter();
        let start = Instant::now();
        let result = self.inner.get(req, key);
        let elapsed_us = start.elapsed().as_micros() as u64;
        match &result {
            Ok(value) => tracing::debug!(size = value.len(), elapsed_us, "get ok"),
            Err(e) => tracing::debug!(class = %e.class(), elapsed_us, "get failed"),
        }
        result
    }
}

impl<S: ListingSource> ListingSource for Traced<S> {
    fn list(&self, req: &Request<'_>, list: &ListRequest) -> Result<ListPage, RemoteError> {
        let span = tracing::debug_span!(
            "remote.list",
            store = self.label,
            prefix = %list.prefix,
            continued = list.token.is_some(),
        );
        let _enter = span.enter();
        let start = Instant::now();
        let result = self.inner.list(req, list);
        let elapsed_us = start.elapsed().as_micros() as u64;
        match &result {
            Ok(page) => tracing::debug!(
                keys = page.keys.len(),
                more = page.next.is_some(),
                elapsed_us,
                "list ok"
            ),
            Err(e) => tracing::debug!(class = %e.class(), elapsed_us, "list failed"),
        }
        result
    }
}
