//! User rows and profile projections

use std::collections::BTreeSet;

use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};
use tracing::info;
use uuid::Uuid;

use super::{now_micros, Store};
use crate::core::error::Result;
use crate::models::{from_micros, NewUser, ProfileDetail, ProfileUpdate, PublicProfile, User};

/// Whether `user_id` names an existing user.
pub async fn user_exists<'e, E: SqliteExecutor<'e>>(exec: E, user_id: &str) -> Result<bool> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(exec)
        .await?;
    Ok(row.is_some())
}

type UserRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
);

const PROFILE_DETAIL_SQL: &str = r#"
    SELECT u.id, u.name, u.username, u.bio, u.avatar_url,
        (SELECT COUNT(*) FROM follow_edges e WHERE e.followee_id = u.id),
        (SELECT COUNT(*) FROM follow_edges e WHERE e.follower_id = u.id)
    FROM users u
    WHERE u.id = ?
"#;

impl Store {
    /// Insert a user. A taken username surfaces as `Conflict`.
    pub async fn insert_user(&self, new_user: &NewUser) -> Result<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: new_user.name.clone(),
            username: new_user.username.clone(),
            bio: new_user.bio.clone(),
            avatar_url: new_user.avatar_url.clone(),
            credential_hash: new_user.credential_hash.clone(),
            created_at: from_micros(now_micros()),
        };

        sqlx::query(
            "INSERT INTO users (id, name, username, bio, avatar_url, credential_hash, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.bio)
        .bind(&user.avatar_url)
        .bind(&user.credential_hash)
        .bind(user.created_at.timestamp_micros())
        .execute(&self.pool)
        .await?;

        info!("[Store] User registered: {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, username, bio, avatar_url, credential_hash, created_at
             FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, name, username, bio, avatar_url, credential_hash, created_at)| User {
                id,
                name,
                username,
                bio,
                avatar_url,
                credential_hash,
                created_at: from_micros(created_at),
            },
        ))
    }

    /// Id of the user currently holding `username`, if any.
    pub async fn username_owner(&self, username: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Returns false when no such user exists.
    pub async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET name = ?, username = ?, bio = ? WHERE id = ?")
            .bind(&update.name)
            .bind(&update.username)
            .bind(&update.bio)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_avatar(&self, user_id: &str, avatar_url: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET avatar_url = ? WHERE id = ?")
            .bind(avatar_url)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn profile_detail(&self, user_id: &str) -> Result<Option<ProfileDetail>> {
        let row: Option<(String, String, String, Option<String>, Option<String>, i64, i64)> =
            sqlx::query_as(PROFILE_DETAIL_SQL)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(
            |(id, name, username, bio, avatar_url, follower_count, following_count)| {
                ProfileDetail {
                    id,
                    name,
                    username,
                    bio,
                    avatar_url,
                    follower_count,
                    following_count,
                }
            },
        ))
    }

    pub async fn public_profile(&self, user_id: &str) -> Result<Option<PublicProfile>> {
        let profile = sqlx::query_as::<_, PublicProfile>(
            "SELECT id, name, username, avatar_url FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Profiles for the given ids, ordered by username. Unknown ids are skipped.
    pub async fn profiles_by_ids<'a, I>(&self, ids: I) -> Result<Vec<PublicProfile>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let ids: Vec<&String> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, name, username, avatar_url FROM users WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(") ORDER BY username");

        let profiles = qb
            .build_query_as::<PublicProfile>()
            .fetch_all(&self.pool)
            .await?;
        Ok(profiles)
    }

    /// Ids of users whose handle starts with `prefix`. An empty prefix
    /// designates no one.
    pub async fn user_ids_with_prefix(&self, prefix: &str) -> Result<BTreeSet<String>> {
        if prefix.is_empty() {
            return Ok(BTreeSet::new());
        }

        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM users WHERE substr(username, 1, ?) = ?")
                .bind(prefix.chars().count() as i64)
                .bind(prefix)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Every user whose id is not in `excluded`, ordered by username.
    pub async fn profiles_excluding(
        &self,
        excluded: &BTreeSet<String>,
    ) -> Result<Vec<PublicProfile>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, name, username, avatar_url FROM users");
        if !excluded.is_empty() {
            qb.push(" WHERE id NOT IN (");
            let mut separated = qb.separated(", ");
            for id in excluded {
                separated.push_bind(id.as_str());
            }
            separated.push_unseparated(")");
        }
        qb.push(" ORDER BY username");

        let profiles = qb
            .build_query_as::<PublicProfile>()
            .fetch_all(&self.pool)
            .await?;
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::store::test_support::{temp_store, user};

    #[tokio::test]
    async fn test_insert_and_get_user() {
        let (_dir, store) = temp_store().await;
        let alice = user(&store, "alice").await;

        let loaded = store.get_user(&alice.id).await.unwrap().unwrap();
        assert_eq!(loaded.username, "alice");
        assert_eq!(loaded.name, "ALICE");
        assert!(user_exists(store.pool(), &alice.id).await.unwrap());
        assert!(!user_exists(store.pool(), "nobody").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let (_dir, store) = temp_store().await;
        user(&store, "alice").await;

        let err = store
            .insert_user(&NewUser {
                name: "Other".into(),
                username: "alice".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_prefix_lookup_treats_underscore_literally() {
        let (_dir, store) = temp_store().await;
        let guest = user(&store, "guest_42").await;
        user(&store, "guestbook").await;
        user(&store, "alice").await;

        let ids = store.user_ids_with_prefix("guest_").await.unwrap();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&guest.id));
        assert!(store.user_ids_with_prefix("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profiles_excluding() {
        let (_dir, store) = temp_store().await;
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        user(&store, "carol").await;

        let excluded: BTreeSet<String> = [alice.id.clone(), bob.id.clone()].into_iter().collect();
        let rest = store.profiles_excluding(&excluded).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].username, "carol");
    }
}
