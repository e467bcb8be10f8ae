//! Follow edges and follow requests
//!
//! One directed-edge vocabulary shared by the graph resolver, the feed and
//! the connection workflow: an edge row `(follower_id, followee_id)` means
//! follower follows followee; a request row `(requester_id, requestee_id)`
//! means requester asked to follow requestee.

use sqlx::SqliteExecutor;

use super::{now_micros, Store};
use crate::core::error::Result;
use crate::models::{from_micros, FollowEdge, FollowRequest, PendingRequest, PublicProfile};

pub async fn edge_exists<'e, E: SqliteExecutor<'e>>(
    exec: E,
    follower_id: &str,
    followee_id: &str,
) -> Result<bool> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM follow_edges WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .fetch_optional(exec)
            .await?;
    Ok(row.is_some())
}

pub async fn insert_edge<'e, E: SqliteExecutor<'e>>(
    exec: E,
    follower_id: &str,
    followee_id: &str,
) -> Result<FollowEdge> {
    let created_at = now_micros();
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO follow_edges (follower_id, followee_id, created_at)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(follower_id)
    .bind(followee_id)
    .bind(created_at)
    .fetch_one(exec)
    .await?;

    Ok(FollowEdge {
        id,
        follower_id: follower_id.to_string(),
        followee_id: followee_id.to_string(),
        created_at: from_micros(created_at),
    })
}

/// Returns whether an edge was removed.
pub async fn delete_edge<'e, E: SqliteExecutor<'e>>(
    exec: E,
    follower_id: &str,
    followee_id: &str,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM follow_edges WHERE follower_id = ? AND followee_id = ?")
        .bind(follower_id)
        .bind(followee_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

type RequestRow = (i64, String, String, i64);

fn request_from_row((id, requester_id, requestee_id, created_at): RequestRow) -> FollowRequest {
    FollowRequest {
        id,
        requester_id,
        requestee_id,
        created_at: from_micros(created_at),
    }
}

pub async fn request_by_id<'e, E: SqliteExecutor<'e>>(
    exec: E,
    request_id: i64,
) -> Result<Option<FollowRequest>> {
    let row: Option<RequestRow> = sqlx::query_as(
        "SELECT id, requester_id, requestee_id, created_at FROM follow_requests WHERE id = ?",
    )
    .bind(request_id)
    .fetch_optional(exec)
    .await?;
    Ok(row.map(request_from_row))
}

pub async fn request_between<'e, E: SqliteExecutor<'e>>(
    exec: E,
    requester_id: &str,
    requestee_id: &str,
) -> Result<Option<FollowRequest>> {
    let row: Option<RequestRow> = sqlx::query_as(
        "SELECT id, requester_id, requestee_id, created_at FROM follow_requests
         WHERE requester_id = ? AND requestee_id = ?",
    )
    .bind(requester_id)
    .bind(requestee_id)
    .fetch_optional(exec)
    .await?;
    Ok(row.map(request_from_row))
}

/// A duplicate pending request surfaces as `Conflict` via the unique constraint.
pub async fn insert_request<'e, E: SqliteExecutor<'e>>(
    exec: E,
    requester_id: &str,
    requestee_id: &str,
) -> Result<FollowRequest> {
    let created_at = now_micros();
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO follow_requests (requester_id, requestee_id, created_at)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(requester_id)
    .bind(requestee_id)
    .bind(created_at)
    .fetch_one(exec)
    .await?;

    Ok(FollowRequest {
        id,
        requester_id: requester_id.to_string(),
        requestee_id: requestee_id.to_string(),
        created_at: from_micros(created_at),
    })
}

/// Conditional delete: false means someone else already consumed the row.
pub async fn delete_request<'e, E: SqliteExecutor<'e>>(exec: E, request_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM follow_requests WHERE id = ?")
        .bind(request_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn id_column<'e, E: SqliteExecutor<'e>>(
    exec: E,
    sql: &str,
    user_id: &str,
) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(sql).bind(user_id).fetch_all(exec).await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// `{ x : edge(x, user) }`
pub async fn follower_ids<'e, E: SqliteExecutor<'e>>(
    exec: E,
    user_id: &str,
) -> Result<Vec<String>> {
    let sql = "SELECT follower_id FROM follow_edges WHERE followee_id = ?";
    id_column(exec, sql, user_id).await
}

/// `{ x : edge(user, x) }`
pub async fn following_ids<'e, E: SqliteExecutor<'e>>(
    exec: E,
    user_id: &str,
) -> Result<Vec<String>> {
    let sql = "SELECT followee_id FROM follow_edges WHERE follower_id = ?";
    id_column(exec, sql, user_id).await
}

/// `{ x : request(user, x) }`
pub async fn requested_ids<'e, E: SqliteExecutor<'e>>(
    exec: E,
    user_id: &str,
) -> Result<Vec<String>> {
    let sql = "SELECT requestee_id FROM follow_requests WHERE requester_id = ?";
    id_column(exec, sql, user_id).await
}

/// `{ x : request(x, user) }`
pub async fn requester_ids<'e, E: SqliteExecutor<'e>>(
    exec: E,
    user_id: &str,
) -> Result<Vec<String>> {
    let sql = "SELECT requester_id FROM follow_requests WHERE requestee_id = ?";
    id_column(exec, sql, user_id).await
}

#[derive(sqlx::FromRow)]
struct PendingRow {
    request_id: i64,
    requested_at: i64,
    #[sqlx(flatten)]
    user: PublicProfile,
}

impl From<PendingRow> for PendingRequest {
    fn from(row: PendingRow) -> Self {
        PendingRequest {
            id: row.request_id,
            user: row.user,
            created_at: from_micros(row.requested_at),
        }
    }
}

impl Store {
    /// Requests addressed to `user_id`, with the requester's profile, newest first.
    pub async fn incoming_requests(&self, user_id: &str) -> Result<Vec<PendingRequest>> {
        let rows = sqlx::query_as::<_, PendingRow>(
            r#"
            SELECT r.id AS request_id, r.created_at AS requested_at,
                u.id, u.name, u.username, u.avatar_url
            FROM follow_requests r
            JOIN users u ON u.id = r.requester_id
            WHERE r.requestee_id = ?
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PendingRequest::from).collect())
    }

    /// Requests sent by `user_id`, with the requestee's profile, newest first.
    pub async fn outgoing_requests(&self, user_id: &str) -> Result<Vec<PendingRequest>> {
        let rows = sqlx::query_as::<_, PendingRow>(
            r#"
            SELECT r.id AS request_id, r.created_at AS requested_at,
                u.id, u.name, u.username, u.avatar_url
            FROM follow_requests r
            JOIN users u ON u.id = r.requestee_id
            WHERE r.requester_id = ?
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PendingRequest::from).collect())
    }

    /// Insert an edge directly, bypassing the request handshake. Used for
    /// imports and seeding; the workflow never calls it.
    pub async fn insert_follow_edge(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<FollowEdge> {
        insert_edge(&self.pool, follower_id, followee_id).await
    }
}
