//! Posts, likes and comments

use std::collections::BTreeSet;

use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

use super::{now_micros, Store};
use crate::core::error::Result;
use crate::models::{
    from_micros, AuthorSummary, Comment, CommentView, FeedPost, Post, PublicProfile,
};

/// Shared projection: post, author, counts and the viewer's like. The first
/// bind is the viewer id.
const ANNOTATED_POST_SELECT: &str = r#"
    SELECT p.id, p.author_id, p.content, p.media_url, p.created_at,
        u.name AS author_name, u.username AS author_username, u.avatar_url AS author_avatar,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
        EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.author_id = "#;

const ANNOTATED_POST_FROM: &str = ") AS liked FROM posts p JOIN users u ON u.id = p.author_id";

/// Newest first; equal timestamps fall back to the later insert first.
const NEWEST_FIRST: &str = " ORDER BY p.created_at DESC, p.id DESC";

#[derive(sqlx::FromRow)]
pub(crate) struct AnnotatedPostRow {
    pub(crate) id: i64,
    pub(crate) author_id: String,
    pub(crate) content: String,
    pub(crate) media_url: Option<String>,
    pub(crate) created_at: i64,
    pub(crate) author_name: String,
    pub(crate) author_username: String,
    pub(crate) author_avatar: Option<String>,
    pub(crate) like_count: i64,
    pub(crate) comment_count: i64,
    pub(crate) liked: bool,
}

impl AnnotatedPostRow {
    pub(crate) fn post(&self) -> Post {
        Post {
            id: self.id,
            author_id: self.author_id.clone(),
            content: self.content.clone(),
            media_url: self.media_url.clone(),
            created_at: from_micros(self.created_at),
        }
    }

    /// Author with id, as shown on the single-post view.
    pub(crate) fn author_profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.author_id.clone(),
            name: self.author_name.clone(),
            username: self.author_username.clone(),
            avatar_url: self.author_avatar.clone(),
        }
    }
}

impl From<AnnotatedPostRow> for FeedPost {
    fn from(row: AnnotatedPostRow) -> Self {
        FeedPost {
            post: row.post(),
            author: AuthorSummary {
                name: row.author_name,
                username: row.author_username,
                avatar_url: row.author_avatar,
            },
            like_count: row.like_count,
            comment_count: row.comment_count,
            is_liked_by_viewer: row.liked,
        }
    }
}

type CommentRow = (i64, String, i64, String, i64);

fn comment_from_row((id, author_id, post_id, content, created_at): CommentRow) -> Comment {
    Comment {
        id,
        author_id,
        post_id,
        content,
        created_at: from_micros(created_at),
    }
}

#[derive(sqlx::FromRow)]
struct CommentViewRow {
    comment_id: i64,
    post_id: i64,
    content: String,
    created_at: i64,
    #[sqlx(flatten)]
    author: PublicProfile,
}

/// [`Store::annotated_posts_by`] on any executor, so the feed can read
/// the follow graph and the posts from one snapshot.
pub(crate) async fn annotated_posts<'e, E: SqliteExecutor<'e>>(
    exec: E,
    viewer_id: &str,
    author_ids: &BTreeSet<String>,
) -> Result<Vec<FeedPost>> {
    if author_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(ANNOTATED_POST_SELECT);
    qb.push_bind(viewer_id);
    qb.push(ANNOTATED_POST_FROM);
    qb.push(" WHERE p.author_id IN (");
    let mut separated = qb.separated(", ");
    for id in author_ids {
        separated.push_bind(id.as_str());
    }
    separated.push_unseparated(")");
    qb.push(NEWEST_FIRST);

    let rows = qb
        .build_query_as::<AnnotatedPostRow>()
        .fetch_all(exec)
        .await?;
    Ok(rows.into_iter().map(FeedPost::from).collect())
}

impl Store {
    pub async fn insert_post(
        &self,
        author_id: &str,
        content: &str,
        media_url: Option<&str>,
    ) -> Result<Post> {
        let created_at = now_micros();
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO posts (author_id, content, media_url, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(author_id)
        .bind(content)
        .bind(media_url)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Post {
            id,
            author_id: author_id.to_string(),
            content: content.to_string(),
            media_url: media_url.map(str::to_string),
            created_at: from_micros(created_at),
        })
    }

    pub async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        let row: Option<(i64, String, String, Option<String>, i64)> = sqlx::query_as(
            "SELECT id, author_id, content, media_url, created_at FROM posts WHERE id = ?",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, author_id, content, media_url, created_at)| Post {
            id,
            author_id,
            content,
            media_url,
            created_at: from_micros(created_at),
        }))
    }

    /// Replace the content; media is only replaced when a new one is given.
    pub async fn update_post(
        &self,
        post_id: i64,
        content: &str,
        media_url: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts SET content = ?, media_url = COALESCE(?, media_url) WHERE id = ?",
        )
        .bind(content)
        .bind(media_url)
        .bind(post_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Likes and comments go with the post (ON DELETE CASCADE).
    pub async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Every post by any of `author_ids`, annotated for `viewer_id`, newest first.
    pub async fn annotated_posts_by(
        &self,
        viewer_id: &str,
        author_ids: &BTreeSet<String>,
    ) -> Result<Vec<FeedPost>> {
        annotated_posts(&self.pool, viewer_id, author_ids).await
    }

    pub(crate) async fn annotated_post(
        &self,
        viewer_id: &str,
        post_id: i64,
    ) -> Result<Option<AnnotatedPostRow>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(ANNOTATED_POST_SELECT);
        qb.push_bind(viewer_id);
        qb.push(ANNOTATED_POST_FROM);
        qb.push(" WHERE p.id = ");
        qb.push_bind(post_id);

        let row = qb
            .build_query_as::<AnnotatedPostRow>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Insert-if-absent. Returns whether a new like row was written.
    pub async fn like_post(&self, author_id: &str, post_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO likes (author_id, post_id, created_at) VALUES (?, ?, ?)
             ON CONFLICT(author_id, post_id) DO NOTHING",
        )
        .bind(author_id)
        .bind(post_id)
        .bind(now_micros())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete-if-present. Returns whether a like row was removed.
    pub async fn unlike_post(&self, author_id: &str, post_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE author_id = ? AND post_id = ?")
            .bind(author_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn like_count(&self, post_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn insert_comment(
        &self,
        author_id: &str,
        post_id: i64,
        content: &str,
    ) -> Result<Comment> {
        let created_at = now_micros();
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO comments (author_id, post_id, content, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(author_id)
        .bind(post_id)
        .bind(content)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Comment {
            id,
            author_id: author_id.to_string(),
            post_id,
            content: content.to_string(),
            created_at: from_micros(created_at),
        })
    }

    pub async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        let row: Option<CommentRow> = sqlx::query_as(
            "SELECT id, author_id, post_id, content, created_at FROM comments WHERE id = ?",
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(comment_from_row))
    }

    pub async fn update_comment(&self, comment_id: i64, content: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE comments SET content = ? WHERE id = ?")
            .bind(content)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Comments on a post with their authors, newest first.
    pub async fn comments_for_post(&self, post_id: i64) -> Result<Vec<CommentView>> {
        let rows = sqlx::query_as::<_, CommentViewRow>(
            r#"
            SELECT c.id AS comment_id, c.post_id, c.content, c.created_at,
                u.id, u.name, u.username, u.avatar_url
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = ?
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CommentView {
                comment: Comment {
                    id: row.comment_id,
                    author_id: row.author.id.clone(),
                    post_id: row.post_id,
                    content: row.content,
                    created_at: from_micros(row.created_at),
                },
                author: row.author,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{temp_store, user};

    #[tokio::test]
    async fn test_like_is_idempotent() {
        let (_dir, store) = temp_store().await;
        let alice = user(&store, "alice").await;
        let post = store.insert_post(&alice.id, "hello", None).await.unwrap();

        assert!(store.like_post(&alice.id, post.id).await.unwrap());
        assert!(!store.like_post(&alice.id, post.id).await.unwrap());
        assert_eq!(store.like_count(post.id).await.unwrap(), 1);

        assert!(store.unlike_post(&alice.id, post.id).await.unwrap());
        assert!(!store.unlike_post(&alice.id, post.id).await.unwrap());
        assert_eq!(store.like_count(post.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_post_cascades() {
        let (_dir, store) = temp_store().await;
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let post = store.insert_post(&alice.id, "hello", None).await.unwrap();
        store.like_post(&bob.id, post.id).await.unwrap();
        let comment = store.insert_comment(&bob.id, post.id, "nice").await.unwrap();

        assert!(store.delete_post(post.id).await.unwrap());
        assert_eq!(store.like_count(post.id).await.unwrap(), 0);
        assert!(store.get_comment(comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_post_keeps_media_when_absent() {
        let (_dir, store) = temp_store().await;
        let alice = user(&store, "alice").await;
        let post = store
            .insert_post(&alice.id, "hello", Some("https://cdn/x.png"))
            .await
            .unwrap();

        store.update_post(post.id, "edited", None).await.unwrap();
        let loaded = store.get_post(post.id).await.unwrap().unwrap();
        assert_eq!(loaded.content, "edited");
        assert_eq!(loaded.media_url.as_deref(), Some("https://cdn/x.png"));
    }

    #[tokio::test]
    async fn test_annotated_post_counts() {
        let (_dir, store) = temp_store().await;
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let post = store.insert_post(&alice.id, "hello", None).await.unwrap();
        store.like_post(&bob.id, post.id).await.unwrap();
        store.insert_comment(&bob.id, post.id, "one").await.unwrap();
        store.insert_comment(&alice.id, post.id, "two").await.unwrap();

        let row = store.annotated_post(&bob.id, post.id).await.unwrap().unwrap();
        assert_eq!(row.like_count, 1);
        assert_eq!(row.comment_count, 2);
        assert!(row.liked);
        assert_eq!(row.author_profile().id, alice.id);

        let row = store.annotated_post(&alice.id, post.id).await.unwrap().unwrap();
        assert!(!row.liked);
    }
}
