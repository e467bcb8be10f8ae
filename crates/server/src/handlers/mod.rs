//! HTTP handlers
//!
//! Thin transport over the components: every protected handler takes the
//! caller's [`Ctx`](crate::core::Ctx) and delegates.

pub mod connections;
pub mod messages;
pub mod posts;
pub mod users;

// Re-export AppState from config
pub use crate::config::AppState;

pub use connections::{
    accept_request, cancel_request, cancel_request_to, connection_status, decline_request,
    list_connections, list_incoming_requests, list_outgoing_requests, relationships,
    send_follow_request, unfollow,
};
pub use messages::{get_thread, list_conversations, send_message};
pub use posts::{
    add_comment, create_post, delete_comment, delete_post, get_feed, get_post, like_count,
    like_post, list_comments, unlike_post, update_comment, update_post,
};
pub use users::{discover_people, logout, me, register, update_avatar, update_me, view_profile};
