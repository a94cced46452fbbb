//! Injected time source.
//!
//! Many backends (secret stores, metadata services) report no modification
//! time. Nodes then use the filesystem's [`Clock`], which tests replace with
//! a [`FixedClock`] to get deterministic metadata.

use std::time::SystemTime;

/// Source of "now" for entries without a remote modification time.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> SystemTime;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub SystemTime);

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}
