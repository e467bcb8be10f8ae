//! Graph Resolver
//!
//! Computes a user's relationship sets from the follow graph and the
//! pairwise connection status. Pure reads; every other component asks here
//! first.

use std::collections::BTreeSet;

use sqlx::SqliteConnection;
use tracing::debug;

use crate::core::error::{Error, Result};
use crate::models::{ConnectionStatus, Relationships};
use crate::store::relations::{
    edge_exists, follower_ids, following_ids, request_between, requested_ids, requester_ids,
};
use crate::store::users::user_exists;
use crate::store::Store;

#[derive(Clone, Debug)]
pub struct GraphResolver {
    store: Store,
}

impl GraphResolver {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Followers, followings, mutuals and pending requests in both
    /// directions. `NotFound` only when the user itself is unknown.
    pub async fn relationships(&self, user_id: &str) -> Result<Relationships> {
        let mut tx = self.store.begin().await?;
        let relationships = Self::relationships_with(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(relationships)
    }

    /// Same as [`relationships`](Self::relationships) on a caller-held
    /// transaction, so other reads can share its snapshot.
    pub async fn relationships_with(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> Result<Relationships> {
        if !user_exists(&mut *conn, user_id).await? {
            return Err(Error::not_found(format!("user {}", user_id)));
        }

        let followers: BTreeSet<String> =
            follower_ids(&mut *conn, user_id).await?.into_iter().collect();
        let followings: BTreeSet<String> =
            following_ids(&mut *conn, user_id).await?.into_iter().collect();
        let mutuals = followers.intersection(&followings).cloned().collect();
        let pending_outgoing = requested_ids(&mut *conn, user_id).await?.into_iter().collect();
        let pending_incoming = requester_ids(&mut *conn, user_id).await?.into_iter().collect();

        debug!(
            "[Graph] {}: {} followers, {} followings",
            user_id,
            followers.len(),
            followings.len()
        );

        Ok(Relationships {
            follower_ids: followers,
            following_ids: followings,
            mutual_ids: mutuals,
            pending_outgoing,
            pending_incoming,
        })
    }

    /// How `a` relates to `b`.
    pub async fn connection_status(&self, a: &str, b: &str) -> Result<ConnectionStatus> {
        let mut tx = self.store.begin().await?;
        let status = Self::status_with(&mut tx, a, b).await?;
        tx.commit().await?;
        Ok(status)
    }

    /// Edges are checked before requests; an edge in either direction
    /// always wins over a pending request.
    pub async fn status_with(
        conn: &mut SqliteConnection,
        a: &str,
        b: &str,
    ) -> Result<ConnectionStatus> {
        let a_follows_b = edge_exists(&mut *conn, a, b).await?;
        let b_follows_a = edge_exists(&mut *conn, b, a).await?;
        if a_follows_b || b_follows_a {
            return Ok(ConnectionStatus::from_parts(a_follows_b, b_follows_a, false, false));
        }

        let a_requested_b = request_between(&mut *conn, a, b).await?.is_some();
        let b_requested_a = request_between(&mut *conn, b, a).await?.is_some();
        Ok(ConnectionStatus::from_parts(false, false, a_requested_b, b_requested_a))
    }
}
