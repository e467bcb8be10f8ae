//! Registration and profile handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AppState;
use crate::core::{Ctx, Result};
use crate::models::{NewUser, ProfileDetail, ProfileUpdate, ProfileView, PublicProfile, User};

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub id: String,
    #[serde(flatten)]
    pub update: ProfileUpdate,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAvatarRequest {
    pub avatar_url: String,
}

/// POST /users
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> Result<Json<RegisterResponse>> {
    info!("POST /users - {}", req.username);

    let user = state.profiles.register(req).await?;
    let session = state.store.create_session(&user.id).await?;

    Ok(Json(RegisterResponse {
        user,
        token: session.token,
    }))
}

/// POST /logout
pub async fn logout(State(state): State<AppState>, ctx: Ctx) -> Result<StatusCode> {
    state.store.revoke_session(ctx.token()).await?;
    info!("POST /logout - {}", ctx.user_id());
    Ok(StatusCode::OK)
}

/// GET /me
pub async fn me(State(state): State<AppState>, ctx: Ctx) -> Result<Json<ProfileDetail>> {
    Ok(Json(state.profiles.me(ctx.user_id()).await?))
}

/// PUT /me
pub async fn update_me(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileDetail>> {
    let detail = state
        .profiles
        .update_profile(ctx.user_id(), &req.id, req.update)
        .await?;
    Ok(Json(detail))
}

/// PUT /me/avatar
pub async fn update_avatar(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(req): Json<UpdateAvatarRequest>,
) -> Result<Json<ProfileDetail>> {
    let detail = state
        .profiles
        .update_avatar(ctx.user_id(), &req.avatar_url)
        .await?;
    Ok(Json(detail))
}

/// GET /people
pub async fn discover_people(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<Vec<PublicProfile>>> {
    Ok(Json(state.discovery.discoverable(ctx.user_id()).await?))
}

/// GET /people/{user_id}
pub async fn view_profile(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileView>> {
    Ok(Json(state.profiles.view(ctx.user_id(), &user_id).await?))
}
