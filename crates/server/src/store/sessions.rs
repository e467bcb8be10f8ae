//! Issued session tokens
//!
//! Tokens are minted by whoever authenticated the user; this table only
//! lets the transport layer map a bearer token back to a user id.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{now_micros, users::user_exists, Store};
use crate::core::auth::IdentityProvider;
use crate::core::error::{Error, Result};
use crate::models::from_micros;

/// Session token for authenticated requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Store {
    /// Record a new 30-day session for an existing user.
    pub async fn create_session(&self, user_id: &str) -> Result<Session> {
        if !user_exists(&self.pool, user_id).await? {
            return Err(Error::not_found(format!("user {}", user_id)));
        }

        let created_at = from_micros(now_micros());
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at,
            expires_at: created_at + Duration::days(30),
        };

        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
            .bind(&session.token)
            .bind(&session.user_id)
            .bind(session.created_at.timestamp_micros())
            .bind(session.expires_at.timestamp_micros())
            .execute(&self.pool)
            .await?;

        Ok(session)
    }

    /// User id behind a live session token.
    pub async fn session_user(&self, token: &str) -> Result<Option<String>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT user_id, expires_at FROM sessions WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row
            .filter(|(_, expires_at)| *expires_at > now_micros())
            .map(|(user_id, _)| user_id))
    }

    pub async fn revoke_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for Store {
    async fn resolve(&self, token: &str) -> Result<Option<String>> {
        self.session_user(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{temp_store, user};

    #[tokio::test]
    async fn test_session_roundtrip() {
        let (_dir, store) = temp_store().await;
        let alice = user(&store, "alice").await;

        let session = store.create_session(&alice.id).await.unwrap();
        assert_eq!(
            store.resolve(&session.token).await.unwrap().as_deref(),
            Some(alice.id.as_str())
        );

        store.revoke_session(&session.token).await.unwrap();
        assert!(store.resolve(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_for_unknown_user() {
        let (_dir, store) = temp_store().await;
        let err = store.create_session("ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
