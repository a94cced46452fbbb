//! Directory existence strategies.
//!
//! When a Get on a key reports not-found, the node asks its
//! [`DirectoryProbe`] whether the key is a directory instead. Backends pick
//! the strategy that matches their layout:
//!
//! - [`ListProbe`] lists `key/` with a small page size and looks for any
//!   child in scope. Works for any flat store.
//! - [`StaticProbe`] knows the structural directories of a fixed tree (for
//!   example an instance metadata service) and answers without a remote call,
//!   optionally deferring to another probe for unknown keys.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::scope::ScopeMode;
use crate::synth::relative_child;
use crate::{FsError, ListRequest, RemoteStore, Request};

/// Decides whether a key is a directory.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn DirectoryProbe`.
pub trait DirectoryProbe: Send + Sync {
    /// Directories known without contacting the store. Checked before Get.
    fn is_known_directory(&self, _key: &str) -> bool {
        false
    }

    /// Called after Get on `key` reported not-found. `prefix` is the
    /// listing prefix for `key` (it ends with `/`).
    ///
    /// # Errors
    ///
    /// Any translated remote error. An empty result is `Ok(false)`, not an error.
    /// A backend that hands back the token it was just given is
    /// [`FsError::Internal`].
    fn probe(
        &self,
        store: &dyn RemoteStore,
        req: &Request<'_>,
        prefix: &str,
        scope: ScopeMode,
    ) -> Result<bool, FsError>;
}

/// Existence probe by listing.
#[derive(Debug, Clone, Copy)]
pub struct ListProbe {
    page_size: usize,
}

impl ListProbe {
    /// Probe with pages of `page_size` keys (at least 1).
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }
}

impl Default for ListProbe {
    fn default() -> Self {
        Self::new(1)
    }
}

impl DirectoryProbe for ListProbe {
    fn probe(
        &self,
        store: &dyn RemoteStore,
        req: &Request<'_>,
        prefix: &str,
        scope: ScopeMode,
    ) -> Result<bool, FsError> {
        let mut list = ListRequest::new(prefix).with_limit(Some(self.page_size));
        loop {
            req.context().check("probe")?;
            let page = store
                .list(req, &list)
                .map_err(|e| e.into_fs_error(prefix, "probe"))?;
            // the first page may hold only the prefix's own marker key
            if page
                .keys
                .iter()
                .any(|k| relative_child(prefix, k, scope).is_some())
            {
                return Ok(true);
            }
            match page.next {
                None => return Ok(false),
                Some(next) if list.token.as_ref() == Some(&next) => {
                    return Err(FsError::Internal {
                        path: prefix.to_string(),
                        details: format!("listing repeated continuation token {:?}", next.as_str()),
                    });
                }
                Some(next) => list.token = Some(next),
            }
        }
    }
}

/// Probe over a fixed set of structural directories.
#[derive(Clone, Default)]
pub struct StaticProbe {
    directories: BTreeSet<String>,
    fallback: Option<Arc<dyn DirectoryProbe>>,
}

impl StaticProbe {
    /// Probe that treats exactly `directories` (full keys) as directories.
    pub fn new<I, S>(directories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            directories: directories
                .into_iter()
                .map(|d| d.into().trim_end_matches('/').to_string())
                .collect(),
            fallback: None,
        }
    }

    /// Consult `fallback` for keys not in the table.
    pub fn with_fallback(mut self, fallback: impl DirectoryProbe + 'static) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }
}

impl std::fmt::Debug for StaticProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticProbe")
            .field("directories", &self.directories)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl DirectoryProbe for StaticProbe {
    fn is_known_directory(&self, key: &str) -> bool {
        self.directories.contains(key.trim_end_matches('/'))
            || self
                .fallback
                .as_ref()
                .is_some_and(|f| f.is_known_directory(key))
    }

    fn probe(
        &self,
        store: &dyn RemoteStore,
        req: &Request<'_>,
        prefix: &str,
        scope: ScopeMode,
    ) -> Result<bool, FsError> {
        if self.is_known_directory(prefix) {
            return Ok(true);
        }
        match &self.fallback {
            Some(fallback) => fallback.probe(store, req, prefix, scope),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryStore;
    use crate::{Context, ListPage, PageToken, RemoteError, RemoteValue};

    #[test]
    fn list_probe_finds_children_with_page_size_one() {
        let store = MemoryStore::new();
        store.insert("kv/dir/a", "1");
        store.insert("kv/dir/b", "2");
        let ctx = Context::background();
        let req = Request::new(&ctx);

        let probe = ListProbe::default();
        assert!(probe.probe(&store, &req, "kv/dir/", ScopeMode::Opaque).unwrap());
        assert!(!probe.probe(&store, &req, "kv/nope/", ScopeMode::Opaque).unwrap());
        assert_eq!(store.stats().list_calls, 2);
    }

    #[test]
    fn list_probe_skips_marker_only_page() {
        let store = MemoryStore::new().with_page_size(1);
        store.insert("dir/", "");
        store.insert("dir/x", "1");
        let ctx = Context::background();
        let req = Request::new(&ctx);
        assert!(ListProbe::default()
            .probe(&store, &req, "dir/", ScopeMode::Opaque)
            .unwrap());
    }

    #[test]
    fn list_probe_marker_alone_is_not_a_directory() {
        let store = MemoryStore::new();
        store.insert("dir/", "");
        let ctx = Context::background();
        let req = Request::new(&ctx);
        assert!(!ListProbe::default()
            .probe(&store, &req, "dir/", ScopeMode::Opaque)
            .unwrap());
    }

    /// Returns the prefix's marker key and the same token on every page.
    struct StuckListing;

    impl crate::ValueSource for StuckListing {
        fn get(&self, _req: &Request<'_>, key: &str) -> Result<RemoteValue, RemoteError> {
            Err(RemoteError::not_found(key))
        }
    }

    impl crate::ListingSource for StuckListing {
        fn list(&self, _req: &Request<'_>, list: &ListRequest) -> Result<ListPage, RemoteError> {
            Ok(ListPage {
                keys: vec![list.prefix.clone()],
                next: Some(PageToken::new("same")),
            })
        }
    }

    #[test]
    fn repeated_token_is_an_internal_error() {
        let ctx = Context::background();
        let req = Request::new(&ctx);
        let err = ListProbe::default()
            .probe(&StuckListing, &req, "d/", ScopeMode::Opaque)
            .unwrap_err();
        match err {
            FsError::Internal { path, details } => {
                assert_eq!(path, "d/");
                assert!(details.contains("\"same\""), "{details}");
            }
            other => panic!("expected Internal, got {other:?}"),
        }
    }

    #[test]
    fn static_probe_answers_without_remote_calls() {
        let store = MemoryStore::new();
        let probe = StaticProbe::new(["meta-data", "meta-data/iam/"]);
        let ctx = Context::background();
        let req = Request::new(&ctx);

        assert!(probe.is_known_directory("meta-data"));
        assert!(probe.is_known_directory("meta-data/iam"));
        assert!(probe.probe(&store, &req, "meta-data/", ScopeMode::Opaque).unwrap());
        assert!(!probe.probe(&store, &req, "user-data/", ScopeMode::Opaque).unwrap());
        assert_eq!(store.stats().list_calls, 0);
    }

    #[test]
    fn static_probe_falls_back() {
        let store = MemoryStore::new();
        store.insert("dynamic/x", "1");
        let probe = StaticProbe::new(["meta-data"]).with_fallback(ListProbe::default());
        let ctx = Context::background();
        let req = Request::new(&ctx);
        assert!(probe.probe(&store, &req, "dynamic/", ScopeMode::Opaque).unwrap());
    }

    #[test]
    fn probe_is_object_safe() {
        fn _check(_: &dyn DirectoryProbe) {}
    }
}
