//! Profiles
//!
//! Registration, own-profile edits and viewing other users.

use tracing::info;

use crate::core::error::{Error, Result};
use crate::feed::FeedAssembler;
use crate::graph::GraphResolver;
use crate::models::{
    Connections, NewUser, ProfileDetail, ProfileUpdate, ProfileView, User,
};
use crate::store::Store;

#[derive(Clone, Debug)]
pub struct ProfileManager {
    store: Store,
    graph: GraphResolver,
    feed: FeedAssembler,
}

fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} is required", field)));
    }
    Ok(())
}

impl ProfileManager {
    pub fn new(store: Store, graph: GraphResolver, feed: FeedAssembler) -> Self {
        Self { store, graph, feed }
    }

    pub async fn register(&self, new_user: NewUser) -> Result<User> {
        require_text(&new_user.name, "name")?;
        require_text(&new_user.username, "username")?;

        let new_user = NewUser {
            username: new_user.username.trim().to_string(),
            ..new_user
        };
        if self.store.username_owner(&new_user.username).await?.is_some() {
            return Err(Error::conflict("username already exists"));
        }

        self.store.insert_user(&new_user).await
    }

    pub async fn me(&self, user_id: &str) -> Result<ProfileDetail> {
        self.store
            .profile_detail(user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {}", user_id)))
    }

    /// Only the owner may edit; the new username must be free.
    pub async fn update_profile(
        &self,
        actor: &str,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<ProfileDetail> {
        if actor != user_id {
            return Err(Error::forbidden("profiles can only be edited by their owner"));
        }
        require_text(&update.name, "name")?;
        require_text(&update.username, "username")?;

        let update = ProfileUpdate {
            username: update.username.trim().to_string(),
            ..update
        };
        if let Some(owner) = self.store.username_owner(&update.username).await? {
            if owner != user_id {
                return Err(Error::conflict("username already exists"));
            }
        }

        if !self.store.update_profile(user_id, &update).await? {
            return Err(Error::not_found(format!("user {}", user_id)));
        }
        info!("[Profiles] {} updated profile", user_id);
        self.me(user_id).await
    }

    /// Store the media collaborator's reference as-is.
    pub async fn update_avatar(&self, actor: &str, avatar_url: &str) -> Result<ProfileDetail> {
        require_text(avatar_url, "avatar_url")?;
        if !self.store.update_avatar(actor, avatar_url).await? {
            return Err(Error::not_found(format!("user {}", actor)));
        }
        self.me(actor).await
    }

    /// Another user's profile. Their posts are included only when the two
    /// are connected, or when viewing yourself.
    pub async fn view(&self, viewer_id: &str, target_id: &str) -> Result<ProfileView> {
        let profile = self.me(target_id).await?;
        let status = self.graph.connection_status(viewer_id, target_id).await?;

        let posts = if viewer_id == target_id || status.is_connected() {
            Some(self.feed.posts_by(viewer_id, target_id).await?)
        } else {
            None
        };

        Ok(ProfileView {
            profile,
            status,
            posts,
        })
    }

    /// Follower and following profiles.
    pub async fn connections(&self, user_id: &str) -> Result<Connections> {
        let relationships = self.graph.relationships(user_id).await?;
        Ok(Connections {
            followers: self.store.profiles_by_ids(&relationships.follower_ids).await?,
            followings: self.store.profiles_by_ids(&relationships.following_ids).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionStatus;
    use crate::store::test_support::{temp_store, user};

    fn manager(store: &Store) -> ProfileManager {
        let graph = GraphResolver::new(store.clone());
        let feed = FeedAssembler::new(store.clone());
        ProfileManager::new(store.clone(), graph, feed)
    }

    #[tokio::test]
    async fn test_register_validation_and_conflict() {
        let (_dir, store) = temp_store().await;
        let profiles = manager(&store);

        let user = profiles
            .register(NewUser {
                name: "Alice".into(),
                username: "alice".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(user.username, "alice");

        let err = profiles
            .register(NewUser {
                name: "Other".into(),
                username: " alice ".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let err = profiles
            .register(NewUser {
                name: "".into(),
                username: "bob".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_profile_rules() {
        let (_dir, store) = temp_store().await;
        let profiles = manager(&store);
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let update = |username: &str| ProfileUpdate {
            name: "New Name".into(),
            username: username.into(),
            bio: Some("hi".into()),
        };

        assert!(matches!(
            profiles.update_profile(&bob.id, &alice.id, update("x")).await.unwrap_err(),
            Error::Forbidden(_)
        ));
        assert!(matches!(
            profiles.update_profile(&alice.id, &alice.id, update("bob")).await.unwrap_err(),
            Error::Conflict(_)
        ));

        // keeping your own username is fine
        let detail = profiles
            .update_profile(&alice.id, &alice.id, update("alice"))
            .await
            .unwrap();
        assert_eq!(detail.name, "New Name");
        assert_eq!(detail.bio.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_view_hides_posts_unless_connected() {
        let (_dir, store) = temp_store().await;
        let profiles = manager(&store);
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        store.insert_post(&b.id, "b's post", None).await.unwrap();

        let view = profiles.view(&a.id, &b.id).await.unwrap();
        assert_eq!(view.status, ConnectionStatus::None);
        assert!(view.posts.is_none());

        store.insert_follow_edge(&b.id, &a.id).await.unwrap();
        let view = profiles.view(&a.id, &b.id).await.unwrap();
        assert_eq!(view.status, ConnectionStatus::BFollowsA);
        assert_eq!(view.posts.unwrap().len(), 1);
        assert_eq!(view.profile.following_count, 1);

        assert!(matches!(
            profiles.view(&a.id, "ghost").await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_connections_lists() {
        let (_dir, store) = temp_store().await;
        let profiles = manager(&store);
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        let c = user(&store, "c").await;
        store.insert_follow_edge(&a.id, &b.id).await.unwrap();
        store.insert_follow_edge(&c.id, &a.id).await.unwrap();

        let connections = profiles.connections(&a.id).await.unwrap();
        assert_eq!(connections.followings.len(), 1);
        assert_eq!(connections.followings[0].id, b.id);
        assert_eq!(connections.followers[0].id, c.id);
    }

    #[tokio::test]
    async fn test_update_avatar() {
        let (_dir, store) = temp_store().await;
        let profiles = manager(&store);
        let a = user(&store, "a").await;

        let detail = profiles.update_avatar(&a.id, "https://cdn/a.png").await.unwrap();
        assert_eq!(detail.avatar_url.as_deref(), Some("https://cdn/a.png"));
    }
}
