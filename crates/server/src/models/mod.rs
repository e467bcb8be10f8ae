//! Domain records and the read projections handed back to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Convert stored Unix microseconds back to a timestamp.
pub(crate) fn from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

/// User record stored in database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing)]
    pub credential_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Registration payload. The credential hash is produced by the auth
/// collaborator and stored as-is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub credential_hash: Option<String>,
}

/// Author fields shown on feed entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Public user info (no sensitive data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PublicProfile {
    pub id: String,
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Full profile with relationship counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDetail {
    pub id: String,
    pub name: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub follower_count: i64,
    pub following_count: i64,
}

/// Editable profile fields
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Someone else's profile as seen by a viewer. `posts` is only present
/// when the two are connected.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub profile: ProfileDetail,
    pub status: ConnectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<FeedPost>>,
}

/// Followers and followings of a user
#[derive(Debug, Clone, Default, Serialize)]
pub struct Connections {
    pub followers: Vec<PublicProfile>,
    pub followings: Vec<PublicProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: String,
    pub content: String,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A post annotated for a particular viewer
#[derive(Debug, Clone, Serialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorSummary,
    pub like_count: i64,
    pub comment_count: i64,
    pub is_liked_by_viewer: bool,
}

/// Single post with its author (id included) and every comment, newest first
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author: PublicProfile,
    pub like_count: i64,
    pub comment_count: i64,
    pub is_liked_by_viewer: bool,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author_id: String,
    pub post_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: PublicProfile,
}

/// Accepted, directed relationship: `follower_id` follows `followee_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEdge {
    pub id: i64,
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: DateTime<Utc>,
}

/// Pending, directed relationship awaiting the requestee's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowRequest {
    pub id: i64,
    pub requester_id: String,
    pub requestee_id: String,
    pub created_at: DateTime<Utc>,
}

/// Pending request as listed for one side of it. `user` is the other party.
#[derive(Debug, Clone, Serialize)]
pub struct PendingRequest {
    pub id: i64,
    pub user: PublicProfile,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Messages between the caller and one partner, oldest first
#[derive(Debug, Clone, Serialize)]
pub struct Thread {
    pub partner: PublicProfile,
    pub messages: Vec<Message>,
}

/// Relationship sets of one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Relationships {
    pub follower_ids: BTreeSet<String>,
    pub following_ids: BTreeSet<String>,
    pub mutual_ids: BTreeSet<String>,
    pub pending_outgoing: BTreeSet<String>,
    pub pending_incoming: BTreeSet<String>,
}

/// How user A relates to user B. Edges always outrank pending requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Mutual,
    AFollowsB,
    BFollowsA,
    RequestedByA,
    RequestedByB,
    None,
}

impl ConnectionStatus {
    /// Resolve from the four structural facts about an ordered pair.
    pub fn from_parts(
        a_follows_b: bool,
        b_follows_a: bool,
        a_requested_b: bool,
        b_requested_a: bool,
    ) -> Self {
        match (a_follows_b, b_follows_a) {
            (true, true) => ConnectionStatus::Mutual,
            (true, false) => ConnectionStatus::AFollowsB,
            (false, true) => ConnectionStatus::BFollowsA,
            (false, false) if a_requested_b => ConnectionStatus::RequestedByA,
            (false, false) if b_requested_a => ConnectionStatus::RequestedByB,
            (false, false) => ConnectionStatus::None,
        }
    }

    /// At least one follow edge exists, in either direction.
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            ConnectionStatus::Mutual | ConnectionStatus::AFollowsB | ConnectionStatus::BFollowsA
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_outrank_requests() {
        assert_eq!(
            ConnectionStatus::from_parts(true, false, true, true),
            ConnectionStatus::AFollowsB
        );
        assert_eq!(
            ConnectionStatus::from_parts(false, true, true, false),
            ConnectionStatus::BFollowsA
        );
        assert_eq!(
            ConnectionStatus::from_parts(true, true, false, true),
            ConnectionStatus::Mutual
        );
    }

    #[test]
    fn test_request_precedence() {
        assert_eq!(
            ConnectionStatus::from_parts(false, false, true, true),
            ConnectionStatus::RequestedByA
        );
        assert_eq!(
            ConnectionStatus::from_parts(false, false, false, true),
            ConnectionStatus::RequestedByB
        );
        assert_eq!(
            ConnectionStatus::from_parts(false, false, false, false),
            ConnectionStatus::None
        );
    }

    #[test]
    fn test_is_connected() {
        assert!(ConnectionStatus::Mutual.is_connected());
        assert!(ConnectionStatus::BFollowsA.is_connected());
        assert!(!ConnectionStatus::RequestedByA.is_connected());
        assert!(!ConnectionStatus::None.is_connected());
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&ConnectionStatus::AFollowsB).unwrap();
        assert_eq!(json, "\"A_FOLLOWS_B\"");
    }
}
