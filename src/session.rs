//! # Shared Session
//!
//! One credential shared by every node opened from the same filesystem.
//!
//! ```text
//! NoToken ──(first token())──▶ Active ──(refcount 1 → 0)──▶ NoToken
//!             login once                  logout once
//! ```
//!
//! Nodes call [`Session::add_ref`] when created and
//! [`Session::remove_ref`] when closed. Opening a node does not log in; the
//! first remote call that needs the credential does. The counter is
//! lock-free; the login/logout transitions happen under a mutex so only one
//! thread ever performs them. Decrements also take the mutex, so a node
//! opened while the last one is closing never receives a token that is
//! about to be revoked.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Authenticator, Context, FsError, Token};

/// Reference-counted session credential.
pub struct Session {
    authenticator: Arc<dyn Authenticator>,
    refs: AtomicUsize,
    token: Mutex<Option<Token>>,
}

impl Session {
    /// A session with no token that logs in through `authenticator`.
    pub fn new(authenticator: impl Authenticator + 'static) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
            refs: AtomicUsize::new(0),
            token: Mutex::new(None),
        }
    }

    /// Register one more user of the session. Never logs in.
    pub fn add_ref(&self) {
        let refs = self.refs.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(refs, "session reference added");
    }

    /// Release one user. The release that brings the count to zero revokes
    /// the token.
    ///
    /// The local token is always cleared, even if the remote logout fails.
    ///
    /// # Errors
    ///
    /// - the translated logout error, after local cleanup
    ///
    /// # Panics
    ///
    /// If called more times than [`add_ref`](Self::add_ref). That is a
    /// lifecycle bug in the caller and is never clamped.
    pub fn remove_ref(&self, ctx: &Context) -> Result<(), FsError> {
        let mut token = self.lock();
        let previous = self.refs.fetch_sub(1, Ordering::AcqRel);
        assert!(previous > 0, "session reference count decremented below zero");
        if previous > 1 {
            tracing::trace!(refs = previous - 1, "session reference released");
            return Ok(());
        }

        let Some(held) = token.take() else {
            return Ok(());
        };
        tracing::debug!("last session reference released, logging out");
        self.authenticator.logout(ctx, &held).map_err(|e| {
            tracing::warn!(error = %e, "session logout failed; token dropped locally");
            e.into_fs_error("", "logout")
        })
    }

    /// The current credential, logging in first if none is held.
    ///
    /// # Errors
    ///
    /// - the translated login error; the reference count is untouched
    pub fn token(&self, ctx: &Context) -> Result<Token, FsError> {
        let mut token = self.lock();
        if let Some(held) = token.as_ref() {
            return Ok(held.clone());
        }
        ctx.check("login")?;
        tracing::debug!("logging in");
        let fresh = self
            .authenticator
            .login(ctx)
            .map_err(|e| e.into_fs_error("", "login"))?;
        *token = Some(fresh.clone());
        Ok(fresh)
    }

    /// Number of live references.
    pub fn refcount(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }

    /// Returns `true` while a token is held.
    pub fn is_logged_in(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Token>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("refs", &self.refcount())
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}
