//! Fetching single values from a remote store.

use std::sync::Arc;

use crate::{RemoteError, RemoteValue, Request};

/// Fetches one full value by key.
///
/// # Contract
///
/// - A missing key is reported as [`ErrorClass::NotFound`](crate::ErrorClass::NotFound).
///   The engine relies on this to fall back to a directory probe; any other
///   class is surfaced to the caller unchanged.
/// - Native errors must be translated with [`RemoteError::classify`] before
///   returning. No backend type crosses this boundary.
/// - Implementations block for the duration of the call and should honor
///   [`Request::context`] where the transport allows it.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn ValueSource`.
pub trait ValueSource: Send + Sync {
    /// Fetch the value stored at `key`.
    fn get(&self, req: &Request<'_>, key: &str) -> Result<RemoteValue, RemoteError>;
}

impl<T: ValueSource + ?Sized> ValueSource for Arc<T> {
    fn get(&self, req: &Request<'_>, key: &str) -> Result<RemoteValue, RemoteError> {
        (**self).get(req, key)
    }
}

impl<T: ValueSource + ?Sized> ValueSource for Box<T> {
    fn get(&self, req: &Request<'_>, key: &str) -> Result<RemoteValue, RemoteError> {
        (**self).get(req, key)
    }
}
