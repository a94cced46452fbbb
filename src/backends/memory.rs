//! # In-Memory Store
//!
//! A [`RemoteStore`](crate::RemoteStore) over a sorted map, with the knobs a
//! real service has: page sizes, token or offset pagination, unordered
//! listings, required credentials and injectable failures. Every call is
//! counted so callers can check how often the store was contacted.
//!
//! ```rust
//! use keyspace_fs::backends::memory::{MemoryStore, Pagination};
//! use keyspace_fs::{Context, ListRequest, ListingSource, Request};
//!
//! let store = MemoryStore::new()
//!     .with_page_size(2)
//!     .with_pagination(Pagination::Offset);
//! for key in ["kv/a", "kv/b", "kv/c"] {
//!     store.insert(key, "v");
//! }
//!
//! let ctx = Context::background();
//! let page = store.list(&Request::new(&ctx), &ListRequest::new("kv/")).unwrap();
//! assert_eq!(page.keys, ["kv/a", "kv/b"]);
//! assert_eq!(page.next.unwrap().as_str(), "2");
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::{
    Authenticator, Context, ErrorClass, HttpStatus, ListPage, ListRequest, ListingSource,
    PageToken, RemoteError, RemoteValue, Request, Token, ValueSource,
};

/// How continuation tokens are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pagination {
    /// The last key returned, like cursor-based services.
    #[default]
    Token,
    /// A numeric offset, like `?start=` style services.
    Offset,
}

/// Order keys appear in across a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Ascending byte order.
    #[default]
    Sorted,
    /// Descending byte order.
    Reversed,
}

/// Call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of [`ValueSource::get`] calls.
    pub get_calls: u64,
    /// Number of [`ListingSource::list`] calls.
    pub list_calls: u64,
}

struct ListFailure {
    remaining: u64,
    class: ErrorClass,
}

/// In-memory key/value store.
pub struct MemoryStore {
    values: RwLock<BTreeMap<String, RemoteValue>>,
    failures: RwLock<BTreeMap<String, ErrorClass>>,
    list_failure: Mutex<Option<ListFailure>>,
    page_size: Option<usize>,
    pagination: Pagination,
    order: ListOrder,
    authenticator: Option<Arc<MemoryAuthenticator>>,
    get_calls: AtomicU64,
    list_calls: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store that returns every listing in one page.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            failures: RwLock::new(BTreeMap::new()),
            list_failure: Mutex::new(None),
            page_size: None,
            pagination: Pagination::default(),
            order: ListOrder::default(),
            authenticator: None,
            get_calls: AtomicU64::new(0),
            list_calls: AtomicU64::new(0),
        }
    }

    /// Cap every page at `size` keys (at least 1), whatever the caller asks.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size.max(1));
        self
    }

    /// Continuation token encoding.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Listing order.
    pub fn with_order(mut self, order: ListOrder) -> Self {
        self.order = order;
        self
    }

    /// Require an active credential from `authenticator` on every call.
    pub fn with_authenticator(mut self, authenticator: Arc<MemoryAuthenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Store `data` at `key`.
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.insert_value(key, RemoteValue::new(data));
    }

    /// Store a value with metadata at `key`.
    pub fn insert_value(&self, key: impl Into<String>, value: RemoteValue) {
        write(&self.values).insert(key.into(), value);
    }

    /// Delete `key`. Returns `true` if it existed.
    pub fn remove(&self, key: &str) -> bool {
        write(&self.values).remove(key).is_some()
    }

    /// Make every Get of `key` fail with `class`.
    pub fn fail_key(&self, key: impl Into<String>, class: ErrorClass) {
        write(&self.failures).insert(key.into(), class);
    }

    /// Let the next `pages` List calls succeed, then fail every later one
    /// with `class`.
    pub fn fail_lists_after(&self, pages: u64, class: ErrorClass) {
        *lock(&self.list_failure) = Some(ListFailure {
            remaining: pages,
            class,
        });
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        write(&self.failures).clear();
        *lock(&self.list_failure) = None;
    }

    /// Call counters so far.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            get_calls: self.get_calls.load(Ordering::Relaxed),
            list_calls: self.list_calls.load(Ordering::Relaxed),
        }
    }

    /// Zero the call counters.
    pub fn reset_stats(&self) {
        self.get_calls.store(0, Ordering::Relaxed);
        self.list_calls.store(0, Ordering::Relaxed);
    }

    fn authorize(&self, req: &Request<'_>) -> Result<(), RemoteError> {
        let Some(auth) = &self.authenticator else {
            return Ok(());
        };
        match req.credential() {
            Some(token) if auth.is_active(token) => Ok(()),
            _ => Err(RemoteError::classify(HttpStatus(403))),
        }
    }

    fn next_list_failure(&self) -> Option<ErrorClass> {
        let mut guard = lock(&self.list_failure);
        let failure = guard.as_mut()?;
        if failure.remaining == 0 {
            return Some(failure.class);
        }
        failure.remaining -= 1;
        None
    }

    fn start_index(&self, keys: &[String], token: Option<&PageToken>) -> Result<usize, RemoteError> {
        let Some(token) = token else {
            return Ok(0);
        };
        match self.pagination {
            Pagination::Offset => token
                .as_str()
                .parse::<usize>()
                .map_err(|_| RemoteError::invalid(format!("bad offset token {:?}", token.as_str()))),
            Pagination::Token => keys
                .iter()
                .position(|k| k == token.as_str())
                .map(|i| i + 1)
                .ok_or_else(|| RemoteError::invalid("unknown continuation token")),
        }
    }
}

impl ValueSource for MemoryStore {
    fn get(&self, req: &Request<'_>, key: &str) -> Result<RemoteValue, RemoteError> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        self.authorize(req)?;
        if let Some(class) = read(&self.failures).get(key) {
            return Err(RemoteError::new(*class, format!("injected failure for {key}")));
        }
        read(&self.values)
            .get(key)
            .cloned()
            .ok_or_else(|| RemoteError::classify(HttpStatus(404)))
    }
}

impl ListingSource for MemoryStore {
    fn list(&self, req: &Request<'_>, list: &ListRequest) -> Result<ListPage, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        self.authorize(req)?;
        if let Some(class) = self.next_list_failure() {
            return Err(RemoteError::new(class, "injected listing failure"));
        }

        let mut keys: Vec<String> = read(&self.values)
            .range(list.prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&list.prefix))
            .map(|(k, _)| k.clone())
            .collect();
        if self.order == ListOrder::Reversed {
            keys.reverse();
        }

        let start = self.start_index(&keys, list.token.as_ref())?.min(keys.len());
        let limit = match (list.limit, self.page_size) {
            (Some(a), Some(b)) => a.min(b),
            (Some(n), None) | (None, Some(n)) => n,
            (None, None) => keys.len(),
        }
        .max(1);
        let end = start.saturating_add(limit).min(keys.len());
        let page: Vec<String> = keys[start..end].to_vec();

        if end == keys.len() {
            return Ok(ListPage::last(page));
        }
        let next = match self.pagination {
            Pagination::Offset => PageToken::new(end.to_string()),
            Pagination::Token => PageToken::new(keys[end - 1].clone()),
        };
        Ok(ListPage {
            keys: page,
            next: Some(next),
        })
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys", &read(&self.values).len())
            .field("page_size", &self.page_size)
            .field("pagination", &self.pagination)
            .field("order", &self.order)
            .field("stats", &self.stats())
            .finish()
    }
}

// ============================================================================
// Authenticator
// ============================================================================

/// Issues numbered tokens and tracks which are still active.
#[derive(Debug, Default)]
pub struct MemoryAuthenticator {
    active: Mutex<HashSet<String>>,
    issued: AtomicU64,
    logins: AtomicU64,
    logouts: AtomicU64,
    fail_logins: AtomicBool,
    fail_logouts: AtomicBool,
}

impl MemoryAuthenticator {
    /// An authenticator with no active tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful logins so far.
    pub fn logins(&self) -> u64 {
        self.logins.load(Ordering::Acquire)
    }

    /// Successful logouts so far.
    pub fn logouts(&self) -> u64 {
        self.logouts.load(Ordering::Acquire)
    }

    /// Number of tokens not yet revoked.
    pub fn active_tokens(&self) -> usize {
        lock(&self.active).len()
    }

    /// Returns `true` if `token` was issued and not revoked.
    pub fn is_active(&self, token: &Token) -> bool {
        lock(&self.active).contains(token.secret())
    }

    /// Reject every login while `fail` is set.
    pub fn fail_logins(&self, fail: bool) {
        self.fail_logins.store(fail, Ordering::Release);
    }

    /// Fail every logout while `fail` is set. Failed logouts leave the
    /// token active.
    pub fn fail_logouts(&self, fail: bool) {
        self.fail_logouts.store(fail, Ordering::Release);
    }
}

impl Authenticator for MemoryAuthenticator {
    fn login(&self, _ctx: &Context) -> Result<Token, RemoteError> {
        if self.fail_logins.load(Ordering::Acquire) {
            return Err(RemoteError::classify(HttpStatus(401)));
        }
        let n = self.issued.fetch_add(1, Ordering::AcqRel) + 1;
        let secret = format!("mem-token-{n}");
        lock(&self.active).insert(secret.clone());
        self.logins.fetch_add(1, Ordering::AcqRel);
        Ok(Token::new(secret))
    }

    fn logout(&self, _ctx: &Context, token: &Token) -> Result<(), RemoteError> {
        if self.fail_logouts.load(Ordering::Acquire) {
            return Err(RemoteError::classify(HttpStatus(503)));
        }
        if !lock(&self.active).remove(token.secret()) {
            return Err(RemoteError::invalid("token is not active"));
        }
        self.logouts.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
