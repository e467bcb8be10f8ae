//! Direct message handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::config::AppState;
use crate::core::{Ctx, Result};
use crate::models::{Message, PublicProfile, Thread};

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    pub content: String,
}

/// GET /conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<Vec<PublicProfile>>> {
    Ok(Json(state.messages.conversations(ctx.user_id()).await?))
}

/// GET /messages/{partner_id}
pub async fn get_thread(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(partner_id): Path<String>,
) -> Result<Json<Thread>> {
    Ok(Json(state.messages.thread(ctx.user_id(), &partner_id).await?))
}

/// POST /messages/{partner_id}
pub async fn send_message(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(partner_id): Path<String>,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<Message>> {
    let message = state
        .messages
        .send_message(ctx.user_id(), &partner_id, &body.content)
        .await?;
    Ok(Json(message))
}
