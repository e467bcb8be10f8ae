//! Core Service Layer
//!
//! Shared infrastructure for the Circle server: caller identity, the
//! request context and the error type every component reports through.

pub mod auth;
pub mod ctx;
pub mod error;

// Re-exports for convenience
pub use auth::IdentityProvider;
pub use ctx::Ctx;
pub use error::{Error, Result};
