//! Posts, likes and comments
//!
//! Authors own their posts and comments; every edit or delete checks that
//! the caller is the author. Likes are idempotent in both directions.

use tracing::info;

use crate::core::error::{Error, Result};
use crate::models::{Comment, CommentView, Post};
use crate::store::Store;

#[derive(Clone, Debug)]
pub struct PostManager {
    store: Store,
}

fn clean_media(media_url: Option<&str>) -> Option<&str> {
    media_url.map(str::trim).filter(|m| !m.is_empty())
}

impl PostManager {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// A post needs text, an image, or both.
    pub async fn create_post(
        &self,
        actor: &str,
        content: &str,
        media_url: Option<&str>,
    ) -> Result<Post> {
        let media_url = clean_media(media_url);
        if content.trim().is_empty() && media_url.is_none() {
            return Err(Error::validation("post needs content or media"));
        }

        let post = self.store.insert_post(actor, content, media_url).await?;
        info!("[Posts] {} created post {}", actor, post.id);
        Ok(post)
    }

    /// Media is kept unless a new reference is supplied.
    pub async fn update_post(
        &self,
        actor: &str,
        post_id: i64,
        content: &str,
        media_url: Option<&str>,
    ) -> Result<Post> {
        let post = self.owned_post(actor, post_id).await?;
        let media_url = clean_media(media_url);
        if content.trim().is_empty() && media_url.is_none() && post.media_url.is_none() {
            return Err(Error::validation("post needs content or media"));
        }

        self.store.update_post(post_id, content, media_url).await?;
        self.require_post(post_id).await
    }

    pub async fn delete_post(&self, actor: &str, post_id: i64) -> Result<()> {
        self.owned_post(actor, post_id).await?;
        self.store.delete_post(post_id).await?;
        info!("[Posts] {} deleted post {}", actor, post_id);
        Ok(())
    }

    /// Liking twice is a no-op, not an error.
    pub async fn like(&self, actor: &str, post_id: i64) -> Result<()> {
        self.require_post(post_id).await?;
        self.store.like_post(actor, post_id).await?;
        Ok(())
    }

    pub async fn unlike(&self, actor: &str, post_id: i64) -> Result<()> {
        self.require_post(post_id).await?;
        self.store.unlike_post(actor, post_id).await?;
        Ok(())
    }

    pub async fn like_count(&self, post_id: i64) -> Result<i64> {
        self.require_post(post_id).await?;
        self.store.like_count(post_id).await
    }

    pub async fn comments(&self, post_id: i64) -> Result<Vec<CommentView>> {
        self.require_post(post_id).await?;
        self.store.comments_for_post(post_id).await
    }

    pub async fn add_comment(&self, actor: &str, post_id: i64, content: &str) -> Result<Comment> {
        if content.trim().is_empty() {
            return Err(Error::validation("comment text is required"));
        }
        self.require_post(post_id).await?;
        self.store.insert_comment(actor, post_id, content).await
    }

    pub async fn update_comment(
        &self,
        actor: &str,
        comment_id: i64,
        content: &str,
    ) -> Result<Comment> {
        if content.trim().is_empty() {
            return Err(Error::validation("comment text is required"));
        }
        let comment = self.owned_comment(actor, comment_id).await?;
        self.store.update_comment(comment_id, content).await?;
        Ok(Comment {
            content: content.to_string(),
            ..comment
        })
    }

    pub async fn delete_comment(&self, actor: &str, comment_id: i64) -> Result<()> {
        self.owned_comment(actor, comment_id).await?;
        self.store.delete_comment(comment_id).await?;
        Ok(())
    }

    async fn require_post(&self, post_id: i64) -> Result<Post> {
        self.store
            .get_post(post_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("post {}", post_id)))
    }

    async fn owned_post(&self, actor: &str, post_id: i64) -> Result<Post> {
        let post = self.require_post(post_id).await?;
        if post.author_id != actor {
            return Err(Error::forbidden("only the author may change this post"));
        }
        Ok(post)
    }

    async fn owned_comment(&self, actor: &str, comment_id: i64) -> Result<Comment> {
        let comment = self
            .store
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("comment {}", comment_id)))?;
        if comment.author_id != actor {
            return Err(Error::forbidden("only the author may change this comment"));
        }
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{temp_store, user};

    #[tokio::test]
    async fn test_create_post_validation() {
        let (_dir, store) = temp_store().await;
        let posts = PostManager::new(store.clone());
        let a = user(&store, "a").await;

        assert!(matches!(
            posts.create_post(&a.id, "  ", None).await.unwrap_err(),
            Error::Validation(_)
        ));
        assert!(matches!(
            posts.create_post(&a.id, "", Some(" ")).await.unwrap_err(),
            Error::Validation(_)
        ));
        let post = posts.create_post(&a.id, "", Some("https://cdn/p.png")).await.unwrap();
        assert_eq!(post.media_url.as_deref(), Some("https://cdn/p.png"));
    }

    #[tokio::test]
    async fn test_only_author_edits_and_deletes() {
        let (_dir, store) = temp_store().await;
        let posts = PostManager::new(store.clone());
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        let post = posts.create_post(&a.id, "hello", None).await.unwrap();

        assert!(matches!(
            posts.update_post(&b.id, post.id, "hacked", None).await.unwrap_err(),
            Error::Forbidden(_)
        ));
        assert!(matches!(
            posts.delete_post(&b.id, post.id).await.unwrap_err(),
            Error::Forbidden(_)
        ));

        let updated = posts.update_post(&a.id, post.id, "edited", None).await.unwrap();
        assert_eq!(updated.content, "edited");

        posts.delete_post(&a.id, post.id).await.unwrap();
        assert!(matches!(
            posts.delete_post(&a.id, post.id).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_like_twice_leaves_one() {
        let (_dir, store) = temp_store().await;
        let posts = PostManager::new(store.clone());
        let a = user(&store, "a").await;
        let post = posts.create_post(&a.id, "hello", None).await.unwrap();

        posts.like(&a.id, post.id).await.unwrap();
        posts.like(&a.id, post.id).await.unwrap();
        assert_eq!(posts.like_count(post.id).await.unwrap(), 1);

        posts.unlike(&a.id, post.id).await.unwrap();
        posts.unlike(&a.id, post.id).await.unwrap();
        assert_eq!(posts.like_count(post.id).await.unwrap(), 0);

        assert!(matches!(
            posts.like(&a.id, 424242).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_comment_lifecycle() {
        let (_dir, store) = temp_store().await;
        let posts = PostManager::new(store.clone());
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        let post = posts.create_post(&a.id, "hello", None).await.unwrap();

        let comment = posts.add_comment(&b.id, post.id, "nice").await.unwrap();
        assert!(matches!(
            posts.update_comment(&a.id, comment.id, "mine now").await.unwrap_err(),
            Error::Forbidden(_)
        ));
        let edited = posts.update_comment(&b.id, comment.id, "very nice").await.unwrap();
        assert_eq!(edited.content, "very nice");

        let listed = posts.comments(post.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].comment.content, "very nice");

        posts.delete_comment(&b.id, comment.id).await.unwrap();
        assert!(posts.comments(post.id).await.unwrap().is_empty());
        assert!(matches!(
            posts.delete_comment(&b.id, comment.id).await.unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(matches!(
            posts.add_comment(&b.id, post.id, " ").await.unwrap_err(),
            Error::Validation(_)
        ));
    }
}
