//! Stateful credentials.

use std::sync::Arc;

use crate::{Context, RemoteError, Token};

/// Acquires and revokes a session credential.
///
/// The engine never calls these directly from a node; it goes through the
/// shared [`Session`](crate::Session), which guarantees a single login per
/// session lifetime and a single logout when the last node closes.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn Authenticator`.
pub trait Authenticator: Send + Sync {
    /// Obtain a fresh credential.
    fn login(&self, ctx: &Context) -> Result<Token, RemoteError>;

    /// Revoke a credential previously returned by [`login`](Self::login).
    fn logout(&self, ctx: &Context, token: &Token) -> Result<(), RemoteError>;
}

impl<T: Authenticator + ?Sized> Authenticator for Arc<T> {
    fn login(&self, ctx: &Context) -> Result<Token, RemoteError> {
        (**self).login(ctx)
    }

    fn logout(&self, ctx: &Context, token: &Token) -> Result<(), RemoteError> {
        (**self).logout(ctx, token)
    }
}
