//! Follow request and follow graph handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::config::AppState;
use crate::core::{Ctx, Result};
use crate::models::{
    ConnectionStatus, Connections, FollowEdge, FollowRequest, PendingRequest, Relationships,
};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: ConnectionStatus,
}

/// POST /follow-requests/{user_id}
pub async fn send_follow_request(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(user_id): Path<String>,
) -> Result<Json<FollowRequest>> {
    info!("POST /follow-requests/{} - from {}", user_id, ctx.user_id());
    Ok(Json(state.connections.request(ctx.user_id(), &user_id).await?))
}

/// DELETE /follow-requests/{user_id}
pub async fn cancel_request_to(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    state.connections.cancel_to(ctx.user_id(), &user_id).await?;
    Ok(StatusCode::OK)
}

/// GET /follow-requests/incoming
pub async fn list_incoming_requests(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<Vec<PendingRequest>>> {
    Ok(Json(state.connections.incoming(ctx.user_id()).await?))
}

/// GET /follow-requests/outgoing
pub async fn list_outgoing_requests(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<Vec<PendingRequest>>> {
    Ok(Json(state.connections.outgoing(ctx.user_id()).await?))
}

/// POST /follow-requests/{request_id}/accept
pub async fn accept_request(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(request_id): Path<i64>,
) -> Result<Json<FollowEdge>> {
    info!("POST /follow-requests/{}/accept - {}", request_id, ctx.user_id());
    Ok(Json(state.connections.accept(ctx.user_id(), request_id).await?))
}

/// POST /follow-requests/{request_id}/decline
pub async fn decline_request(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(request_id): Path<i64>,
) -> Result<StatusCode> {
    state.connections.decline(ctx.user_id(), request_id).await?;
    Ok(StatusCode::OK)
}

/// POST /follow-requests/{request_id}/cancel
pub async fn cancel_request(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(request_id): Path<i64>,
) -> Result<StatusCode> {
    state.connections.cancel(ctx.user_id(), request_id).await?;
    Ok(StatusCode::OK)
}

/// DELETE /following/{user_id}
pub async fn unfollow(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    state.connections.unfollow(ctx.user_id(), &user_id).await?;
    Ok(StatusCode::OK)
}

/// GET /connections
pub async fn list_connections(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<Connections>> {
    Ok(Json(state.profiles.connections(ctx.user_id()).await?))
}

/// GET /relationships
pub async fn relationships(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<Relationships>> {
    Ok(Json(state.graph.relationships(ctx.user_id()).await?))
}

/// GET /connections/status/{user_id}
pub async fn connection_status(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(user_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    let status = state.graph.connection_status(ctx.user_id(), &user_id).await?;
    Ok(Json(StatusResponse { status }))
}
