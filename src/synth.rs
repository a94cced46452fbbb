//! # Directory Synthesizer
//!
//! Turns a flat listing into one directory level.
//!
//! ```text
//! prefix "dir/"   raw ["dir/b", "dir/sub/c", "dir/a", "dir/", "dir/sub/d"]
//!                          ↓ strip prefix, drop self-reference
//!                 ["b", "sub/c", "a", "sub/d"]
//!                          ↓ split on first '/', dedup, sort
//!                 [a (file), b (file), sub (dir)]
//! ```
//!
//! Flat stores cannot hold both a value and a directory at one name, so a
//! child seen once with further segments stays a directory even if the bare
//! name also appears.

use std::collections::BTreeMap;

use crate::scope::ScopeMode;
use crate::{ChildEntry, Context, FsError, ListRequest, RemoteStore, Request};

/// Classify one raw key relative to `prefix`.
///
/// Returns `None` for keys outside the scope partition, keys that do not
/// start with `prefix`, and the prefix's own key.
pub fn relative_child(prefix: &str, key: &str, scope: ScopeMode) -> Option<ChildEntry> {
    if !scope.admits(key) {
        return None;
    }
    let rest = key.strip_prefix(prefix)?;
    match rest.split_once('/') {
        Some(("", _)) => None,
        Some((name, _)) => Some(ChildEntry::dir(name)),
        None if rest.is_empty() => None,
        None => Some(ChildEntry::file(rest)),
    }
}

/// Build the sorted, deduplicated children of the directory at `prefix`.
pub fn synthesize<I, S>(prefix: &str, keys: I, scope: ScopeMode) -> Vec<ChildEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: BTreeMap<String, bool> = BTreeMap::new();
    for key in keys {
        if let Some(child) = relative_child(prefix, key.as_ref(), scope) {
            let is_dir = seen.entry(child.name).or_insert(false);
            *is_dir |= child.is_dir;
        }
    }
    seen.into_iter()
        .map(|(name, is_dir)| ChildEntry { name, is_dir })
        .collect()
}

/// Fetch every page of a listing, sequentially.
///
/// The result is only returned once the final page arrives. A failure or
/// cancellation on any page discards the pages already fetched.
///
/// # Errors
///
/// - [`FsError::Cancelled`] / [`FsError::DeadlineExceeded`] between pages
/// - any translated remote error
/// - [`FsError::Internal`] if the backend repeats a continuation token
pub fn list_all(
    store: &dyn RemoteStore,
    req: &Request<'_>,
    prefix: &str,
    page_size: Option<usize>,
) -> Result<Vec<String>, FsError> {
    let ctx: &Context = req.context();
    let mut keys = Vec::new();
    let mut list = ListRequest::new(prefix).with_limit(page_size);
    let mut pages = 0usize;
    loop {
        ctx.check("list")?;
        let page = store
            .list(req, &list)
            .map_err(|e| e.into_fs_error(prefix, "list"))?;
        pages += 1;
        tracing::debug!(prefix, page = pages, keys = page.keys.len(), "listed page");
        keys.extend(page.keys);
        match page.next {
            Some(next) if list.token.as_ref() == Some(&next) => {
                return Err(FsError::Internal {
                    path: prefix.to_string(),
                    details: format!("listing repeated continuation token {:?}", next.as_str()),
                });
            }
            Some(next) => list.token = Some(next),
            None => return Ok(keys),
        }
    }
}
