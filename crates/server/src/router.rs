//! HTTP router
//!
//! `/health` and registration are public; everything else sits behind
//! [`mw_require_auth`].

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::config::AppState;
use crate::core::auth::mw_require_auth;
use crate::handlers::*;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        // Session and profile
        .route("/logout", post(logout))
        .route("/me", get(me).put(update_me))
        .route("/me/avatar", put(update_avatar))
        .route("/people", get(discover_people))
        .route("/people/{user_id}", get(view_profile))
        // Graph
        .route("/connections", get(list_connections))
        .route("/connections/status/{user_id}", get(connection_status))
        .route("/relationships", get(relationships))
        // Posts
        .route("/feed", get(get_feed))
        .route("/posts", post(create_post))
        .route(
            "/posts/{post_id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route(
            "/posts/{post_id}/like",
            get(like_count).post(like_post).delete(unlike_post),
        )
        .route(
            "/posts/{post_id}/comments",
            get(list_comments).post(add_comment),
        )
        .route(
            "/comments/{comment_id}",
            put(update_comment).delete(delete_comment),
        )
        // Follow requests; `{id}` is a user id on the bare path and a
        // request id under the action paths.
        .route("/follow-requests/incoming", get(list_incoming_requests))
        .route("/follow-requests/outgoing", get(list_outgoing_requests))
        .route(
            "/follow-requests/{id}",
            post(send_follow_request).delete(cancel_request_to),
        )
        .route("/follow-requests/{id}/accept", post(accept_request))
        .route("/follow-requests/{id}/decline", post(decline_request))
        .route("/follow-requests/{id}/cancel", post(cancel_request))
        .route("/following/{user_id}", delete(unfollow))
        // Messaging
        .route("/conversations", get(list_conversations))
        .route(
            "/messages/{partner_id}",
            get(get_thread).post(send_message),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            mw_require_auth,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(register))
        .merge(protected)
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK - Circle Server"
}
