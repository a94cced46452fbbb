//! Reference backends.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`memory::MemoryStore`] | tests, fixtures, local development |
//! | [`memory::MemoryAuthenticator`] | token issue/revoke bookkeeping for the above |

pub mod memory;
