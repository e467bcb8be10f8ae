//! Caller identity
//!
//! Credential checks live outside this server. What arrives here is a
//! bearer token that some upstream collaborator already issued; we only
//! resolve it to a user id and hand that id to every handler as a [`Ctx`].
//!
//! [`Ctx`]: crate::core::ctx::Ctx

pub mod middleware;

use async_trait::async_trait;

use crate::core::error::Result;

/// Resolves an issued bearer token to the user id it was issued for.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the token is unknown or expired.
    async fn resolve(&self, token: &str) -> Result<Option<String>>;
}

pub use middleware::mw_require_auth;
