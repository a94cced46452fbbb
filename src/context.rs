//! Cancellation and deadlines for blocking remote calls.
//!
//! Every remote call takes a [`Request`], which bundles the caller's
//! [`Context`] with the session credential (if any). The engine calls
//! [`Context::check`] before each call and between listing pages, so a
//! cancelled listing is abandoned whole instead of being half-cached.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::{FsError, Token};

/// Cancellation flag plus optional deadline.
///
/// Clones share the cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context with a deadline `timeout` from now.
    ///
    /// The derived context shares cancellation with `self`. An earlier
    /// existing deadline is kept. A timeout too large to represent adds no
    /// deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Derive a context with an absolute deadline.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(deadline),
        }
    }

    /// A handle that cancels this context and all its clones.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail if the context is cancelled or its deadline has passed.
    pub fn check(&self, operation: &'static str) -> Result<(), FsError> {
        if self.is_cancelled() {
            return Err(FsError::Cancelled { operation });
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(FsError::DeadlineExceeded { operation });
            }
        }
        Ok(())
    }
}

/// Cancels the [`Context`] it came from.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Cancel. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// What a capability implementation receives on every call.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    ctx: &'a Context,
    credential: Option<&'a Token>,
}

impl<'a> Request<'a> {
    /// A request without a credential.
    pub fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
            credential: None,
        }
    }

    /// Attach a session credential.
    pub fn with_credential(mut self, credential: Option<&'a Token>) -> Self {
        self.credential = credential;
        self
    }

    /// The caller's context. Long-running implementations should poll it.
    pub fn context(&self) -> &'a Context {
        self.ctx
    }

    /// The session credential, when the filesystem has an authenticator.
    pub fn credential(&self) -> Option<&'a Token> {
        self.credential
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_never_fails() {
        assert!(Context::background().check("get").is_ok());
    }

    #[test]
    fn cancel_is_shared_by_clones() {
        let ctx = Context::background();
        let child = ctx.with_timeout(Duration::from_secs(60));
        ctx.cancel_handle().cancel();
        assert!(matches!(
            child.check("list"),
            Err(FsError::Cancelled { operation: "list" })
        ));
    }

    #[test]
    fn elapsed_deadline_fails() {
        let ctx = Context::background().with_deadline(Instant::now());
        assert!(matches!(
            ctx.check("get"),
            Err(FsError::DeadlineExceeded { .. })
        ));
    }

    #[test]
    fn earlier_deadline_wins() {
        let near = Instant::now() + Duration::from_secs(1);
        let ctx = Context::background()
            .with_deadline(near)
            .with_timeout(Duration::from_secs(3600));
        assert_eq!(ctx.deadline(), Some(near));
    }

    #[test]
    fn unrepresentable_timeout_adds_no_deadline() {
        let ctx = Context::background().with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert!(ctx.check("get").is_ok());

        let near = Instant::now() + Duration::from_secs(60);
        let ctx = Context::background()
            .with_deadline(near)
            .with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), Some(near));
    }

    #[test]
    fn request_carries_credential() {
        let ctx = Context::background();
        let token = Token::new("t");
        let req = Request::new(&ctx).with_credential(Some(&token));
        assert_eq!(req.credential().map(Token::secret), Some("t"));
    }
}
