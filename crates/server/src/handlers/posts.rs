//! Feed, post, like and comment handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::config::AppState;
use crate::core::{Ctx, Result};
use crate::models::{Comment, CommentView, FeedPost, Post, PostDetail};

#[derive(Debug, Deserialize)]
pub struct PostBody {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct LikeState {
    pub liked: bool,
}

#[derive(Debug, Serialize)]
pub struct LikeCount {
    pub count: i64,
}

/// GET /feed
pub async fn get_feed(State(state): State<AppState>, ctx: Ctx) -> Result<Json<Vec<FeedPost>>> {
    Ok(Json(state.feed.feed(ctx.user_id()).await?))
}

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(body): Json<PostBody>,
) -> Result<Json<Post>> {
    let post = state
        .posts
        .create_post(ctx.user_id(), &body.content, body.media_url.as_deref())
        .await?;
    Ok(Json(post))
}

/// GET /posts/{post_id}
pub async fn get_post(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(post_id): Path<i64>,
) -> Result<Json<PostDetail>> {
    Ok(Json(state.feed.post_detail(ctx.user_id(), post_id).await?))
}

/// PUT /posts/{post_id}
pub async fn update_post(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(post_id): Path<i64>,
    Json(body): Json<PostBody>,
) -> Result<Json<Post>> {
    let post = state
        .posts
        .update_post(ctx.user_id(), post_id, &body.content, body.media_url.as_deref())
        .await?;
    Ok(Json(post))
}

/// DELETE /posts/{post_id}
pub async fn delete_post(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(post_id): Path<i64>,
) -> Result<StatusCode> {
    state.posts.delete_post(ctx.user_id(), post_id).await?;
    Ok(StatusCode::OK)
}

/// POST /posts/{post_id}/like
pub async fn like_post(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(post_id): Path<i64>,
) -> Result<Json<LikeState>> {
    state.posts.like(ctx.user_id(), post_id).await?;
    Ok(Json(LikeState { liked: true }))
}

/// DELETE /posts/{post_id}/like
pub async fn unlike_post(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(post_id): Path<i64>,
) -> Result<Json<LikeState>> {
    state.posts.unlike(ctx.user_id(), post_id).await?;
    Ok(Json(LikeState { liked: false }))
}

/// GET /posts/{post_id}/like
pub async fn like_count(
    State(state): State<AppState>,
    _ctx: Ctx,
    Path(post_id): Path<i64>,
) -> Result<Json<LikeCount>> {
    let count = state.posts.like_count(post_id).await?;
    Ok(Json(LikeCount { count }))
}

/// GET /posts/{post_id}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    _ctx: Ctx,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<CommentView>>> {
    Ok(Json(state.posts.comments(post_id).await?))
}

/// POST /posts/{post_id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(post_id): Path<i64>,
    Json(body): Json<CommentBody>,
) -> Result<Json<Comment>> {
    let comment = state
        .posts
        .add_comment(ctx.user_id(), post_id, &body.content)
        .await?;
    Ok(Json(comment))
}

/// PUT /comments/{comment_id}
pub async fn update_comment(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(comment_id): Path<i64>,
    Json(body): Json<CommentBody>,
) -> Result<Json<Comment>> {
    let comment = state
        .posts
        .update_comment(ctx.user_id(), comment_id, &body.content)
        .await?;
    Ok(Json(comment))
}

/// DELETE /comments/{comment_id}
pub async fn delete_comment(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(comment_id): Path<i64>,
) -> Result<StatusCode> {
    state.posts.delete_comment(ctx.user_id(), comment_id).await?;
    Ok(StatusCode::OK)
}
