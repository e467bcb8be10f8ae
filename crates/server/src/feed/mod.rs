//! Feed Assembler
//!
//! Builds the annotated, newest-first timeline a viewer sees: their own
//! posts plus those of everyone they follow. Recomputed on every call.

use std::collections::BTreeSet;

use tracing::debug;

use crate::core::error::{Error, Result};
use crate::graph::GraphResolver;
use crate::models::{FeedPost, PostDetail};
use crate::store::posts::annotated_posts;
use crate::store::Store;

#[derive(Clone, Debug)]
pub struct FeedAssembler {
    store: Store,
}

impl FeedAssembler {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Posts authored by `viewer_id` or anyone they follow.
    pub async fn feed(&self, viewer_id: &str) -> Result<Vec<FeedPost>> {
        let mut tx = self.store.begin().await?;
        let relationships = GraphResolver::relationships_with(&mut tx, viewer_id).await?;

        let mut authors = relationships.following_ids;
        authors.insert(viewer_id.to_string());

        let posts = annotated_posts(&mut *tx, viewer_id, &authors).await?;
        tx.commit().await?;
        debug!(
            "[Feed] {} posts from {} authors for {}",
            posts.len(),
            authors.len(),
            viewer_id
        );
        Ok(posts)
    }

    /// Posts by a single author, annotated for the viewer. No visibility
    /// check happens here.
    pub async fn posts_by(&self, viewer_id: &str, author_id: &str) -> Result<Vec<FeedPost>> {
        let authors = BTreeSet::from([author_id.to_string()]);
        self.store.annotated_posts_by(viewer_id, &authors).await
    }

    /// One post with the author's public profile and all comments.
    pub async fn post_detail(&self, viewer_id: &str, post_id: i64) -> Result<PostDetail> {
        let row = self
            .store
            .annotated_post(viewer_id, post_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("post {}", post_id)))?;
        let comments = self.store.comments_for_post(post_id).await?;

        Ok(PostDetail {
            post: row.post(),
            author: row.author_profile(),
            like_count: row.like_count,
            comment_count: row.comment_count,
            is_liked_by_viewer: row.liked,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{temp_store, user};

    #[tokio::test]
    async fn test_feed_only_self_and_followed() {
        let (_dir, store) = temp_store().await;
        let feed = FeedAssembler::new(store.clone());
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        let c = user(&store, "c").await;
        let d = user(&store, "d").await;

        store.insert_follow_edge(&a.id, &b.id).await.unwrap();
        // c follows a, which does not put c in a's feed
        store.insert_follow_edge(&c.id, &a.id).await.unwrap();

        store.insert_post(&a.id, "mine", None).await.unwrap();
        store.insert_post(&b.id, "followed", None).await.unwrap();
        store.insert_post(&c.id, "follower", None).await.unwrap();
        store.insert_post(&d.id, "stranger", None).await.unwrap();

        let posts = feed.feed(&a.id).await.unwrap();
        let authors: BTreeSet<&str> = posts.iter().map(|p| p.post.author_id.as_str()).collect();
        assert_eq!(authors, BTreeSet::from([a.id.as_str(), b.id.as_str()]));
    }

    #[tokio::test]
    async fn test_feed_newest_first() {
        let (_dir, store) = temp_store().await;
        let feed = FeedAssembler::new(store.clone());
        let a = user(&store, "a").await;

        let first = store.insert_post(&a.id, "1", None).await.unwrap();
        let second = store.insert_post(&a.id, "2", None).await.unwrap();
        let third = store.insert_post(&a.id, "3", None).await.unwrap();

        let posts = feed.feed(&a.id).await.unwrap();
        let ids: Vec<i64> = posts.iter().map(|p| p.post.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
        assert!(posts
            .windows(2)
            .all(|w| w[0].post.created_at >= w[1].post.created_at));
    }

    #[tokio::test]
    async fn test_feed_annotations() {
        let (_dir, store) = temp_store().await;
        let feed = FeedAssembler::new(store.clone());
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        store.insert_follow_edge(&a.id, &b.id).await.unwrap();

        let post = store.insert_post(&b.id, "hello", None).await.unwrap();
        store.like_post(&a.id, post.id).await.unwrap();
        store.like_post(&a.id, post.id).await.unwrap();
        store.insert_comment(&b.id, post.id, "first").await.unwrap();

        let posts = feed.feed(&a.id).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].like_count, 1);
        assert_eq!(posts[0].comment_count, 1);
        assert!(posts[0].is_liked_by_viewer);
        assert_eq!(posts[0].author.username, "b");

        let posts = feed.feed(&b.id).await.unwrap();
        assert!(!posts[0].is_liked_by_viewer);
    }

    #[tokio::test]
    async fn test_empty_feed_is_ok() {
        let (_dir, store) = temp_store().await;
        let feed = FeedAssembler::new(store.clone());
        let a = user(&store, "a").await;
        assert!(feed.feed(&a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_detail() {
        let (_dir, store) = temp_store().await;
        let feed = FeedAssembler::new(store.clone());
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        let post = store.insert_post(&a.id, "hello", None).await.unwrap();
        let older = store.insert_comment(&b.id, post.id, "older").await.unwrap();
        let newer = store.insert_comment(&a.id, post.id, "newer").await.unwrap();

        let detail = feed.post_detail(&b.id, post.id).await.unwrap();
        assert_eq!(detail.author.id, a.id);
        assert_eq!(detail.comment_count, 2);
        let ids: Vec<i64> = detail.comments.iter().map(|c| c.comment.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert_eq!(detail.comments[1].author.id, b.id);

        let err = feed.post_detail(&b.id, 9999).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
