//! Connection Workflow
//!
//! Follow-request state machine per ordered pair `(a, b)`:
//! `NONE -> REQUESTED -> CONNECTED`, `REQUESTED -> NONE` on decline or
//! cancel, and `CONNECTED -> NONE` on unfollow. Each transition runs in a
//! single transaction. Accept deletes the request row conditionally before
//! inserting the edge, so of two racing accept/decline calls on one request
//! only the first sees the row; the other gets `NotFound`.

use tracing::info;

use crate::core::error::{Error, Result};
use crate::graph::GraphResolver;
use crate::models::{FollowEdge, FollowRequest, PendingRequest};
use crate::store::relations::{
    delete_edge, delete_request, edge_exists, insert_edge, insert_request, request_between,
    request_by_id,
};
use crate::store::users::user_exists;
use crate::store::Store;

/// Which side of a request is allowed to act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Party {
    Requester,
    Requestee,
}

#[derive(Clone, Debug)]
pub struct ConnectionManager {
    store: Store,
    graph: GraphResolver,
}

impl ConnectionManager {
    pub fn new(store: Store, graph: GraphResolver) -> Self {
        Self { store, graph }
    }

    /// `actor` asks to follow `target`.
    pub async fn request(&self, actor: &str, target: &str) -> Result<FollowRequest> {
        if actor == target {
            return Err(Error::validation("cannot request to follow yourself"));
        }

        let mut tx = self.store.begin_write().await?;

        if !user_exists(&mut *tx, actor).await? {
            return Err(Error::not_found(format!("user {}", actor)));
        }
        if !user_exists(&mut *tx, target).await? {
            return Err(Error::not_found(format!("user {}", target)));
        }
        if edge_exists(&mut *tx, actor, target).await?
            || edge_exists(&mut *tx, target, actor).await?
        {
            return Err(Error::conflict("already connected"));
        }
        if request_between(&mut *tx, actor, target).await?.is_some() {
            return Err(Error::conflict("follow request already pending"));
        }

        let request = insert_request(&mut *tx, actor, target).await?;
        tx.commit().await?;

        info!("[Connections] Request {} sent: {} -> {}", request.id, actor, target);
        Ok(request)
    }

    /// Requestee accepts: the request row becomes the edge requester -> requestee.
    pub async fn accept(&self, actor: &str, request_id: i64) -> Result<FollowEdge> {
        let mut tx = self.store.begin_write().await?;

        let request = Self::authorized_request(&mut tx, actor, request_id, Party::Requestee).await?;
        if !delete_request(&mut *tx, request.id).await? {
            return Err(Error::not_found(format!("follow request {}", request_id)));
        }
        let edge = insert_edge(&mut *tx, &request.requester_id, &request.requestee_id).await?;

        tx.commit().await?;

        info!(
            "[Connections] Request {} accepted, {} now follows {}",
            request_id, edge.follower_id, edge.followee_id
        );
        Ok(edge)
    }

    /// Requestee declines. No edge is created.
    pub async fn decline(&self, actor: &str, request_id: i64) -> Result<()> {
        self.withdraw(actor, request_id, Party::Requestee).await?;
        info!("[Connections] Request {} declined by {}", request_id, actor);
        Ok(())
    }

    /// Requester withdraws their own request.
    pub async fn cancel(&self, actor: &str, request_id: i64) -> Result<()> {
        self.withdraw(actor, request_id, Party::Requester).await?;
        info!("[Connections] Request {} cancelled by {}", request_id, actor);
        Ok(())
    }

    /// Requester withdraws the pending request they sent to `target`.
    pub async fn cancel_to(&self, actor: &str, target: &str) -> Result<()> {
        let mut tx = self.store.begin_write().await?;

        let request = request_between(&mut *tx, actor, target)
            .await?
            .ok_or_else(|| Error::not_found(format!("follow request to {}", target)))?;
        if !delete_request(&mut *tx, request.id).await? {
            return Err(Error::not_found(format!("follow request {}", request.id)));
        }

        tx.commit().await?;
        info!("[Connections] Request {} cancelled by {}", request.id, actor);
        Ok(())
    }

    /// `actor` stops following `followee`. The reverse edge, if any, stays.
    pub async fn unfollow(&self, actor: &str, followee: &str) -> Result<()> {
        let mut tx = self.store.begin_write().await?;

        if !delete_edge(&mut *tx, actor, followee).await? {
            return Err(Error::not_found(format!("{} does not follow {}", actor, followee)));
        }

        tx.commit().await?;
        info!("[Connections] {} unfollowed {}", actor, followee);
        Ok(())
    }

    pub async fn incoming(&self, user_id: &str) -> Result<Vec<PendingRequest>> {
        self.graph.relationships(user_id).await?;
        self.store.incoming_requests(user_id).await
    }

    pub async fn outgoing(&self, user_id: &str) -> Result<Vec<PendingRequest>> {
        self.graph.relationships(user_id).await?;
        self.store.outgoing_requests(user_id).await
    }

    async fn withdraw(&self, actor: &str, request_id: i64, party: Party) -> Result<()> {
        let mut tx = self.store.begin_write().await?;

        let request = Self::authorized_request(&mut tx, actor, request_id, party).await?;
        if !delete_request(&mut *tx, request.id).await? {
            return Err(Error::not_found(format!("follow request {}", request_id)));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Load a request and check `actor` is the party allowed to act on it.
    async fn authorized_request(
        tx: &mut sqlx::SqliteConnection,
        actor: &str,
        request_id: i64,
        party: Party,
    ) -> Result<FollowRequest> {
        let request = request_by_id(&mut *tx, request_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("follow request {}", request_id)))?;

        let allowed = match party {
            Party::Requester => request.requester_id == actor,
            Party::Requestee => request.requestee_id == actor,
        };
        if !allowed {
            return Err(Error::forbidden(format!(
                "follow request {} does not belong to {}",
                request_id, actor
            )));
        }

        Ok(request)
    }
}
