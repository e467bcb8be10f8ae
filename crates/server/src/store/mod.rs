//! Entity Store
//!
//! SQLite-backed persistence for users, posts, likes, comments, follow
//! edges, follow requests, messages and issued sessions. Every other
//! component reads and writes through here.
//!
//! Pool-level reads and single-statement writes are methods on [`Store`].
//! The follow-graph rows are the contended resource, so their queries live
//! in [`relations`] as free functions generic over the executor: the same
//! query runs against the pool for reads and inside a transaction for the
//! connection workflow.

pub mod messages;
pub mod posts;
pub mod relations;
pub mod sessions;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

use crate::config::ServerConfig;
use crate::core::error::Result;

pub use sessions::Session;

/// Current time as stored: Unix microseconds.
pub(crate) fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

/// Handle to the relational store. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database named in `config` and make
    /// sure the schema exists.
    pub async fn connect(config: &ServerConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;

        info!("[Store] Opened {}", config.database_url);
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a read transaction: every statement in it sees one snapshot.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Start a write transaction that takes the write lock up front.
    /// Check-then-write sequences run inside one.
    pub async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Create tables and adjacency indexes.
    pub async fn init_schema(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                username TEXT NOT NULL UNIQUE,
                bio TEXT,
                avatar_url TEXT,
                credential_hash TEXT,
                created_at INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                media_url TEXT,
                created_at INTEGER NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id, created_at)",
            r#"
            CREATE TABLE IF NOT EXISTS likes (
                author_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (author_id, post_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id)",
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created_at)",
            r#"
            CREATE TABLE IF NOT EXISTS follow_edges (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                follower_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                followee_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                UNIQUE(follower_id, followee_id),
                CHECK (follower_id <> followee_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_edges_followee ON follow_edges(followee_id)",
            r#"
            CREATE TABLE IF NOT EXISTS follow_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                requester_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                requestee_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                UNIQUE(requester_id, requestee_id),
                CHECK (requester_id <> requestee_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_requests_requestee ON follow_requests(requestee_id)",
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                receiver_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                CHECK (sender_id <> receiver_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_id, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_messages_receiver ON messages(receiver_id, created_at)",
        ];

        for sql in statements {
            sqlx::query(sql).execute(&self.pool).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::{NewUser, User};
    use tempfile::TempDir;

    /// Fresh store in a temp directory. Keep the `TempDir` alive for the test.
    pub async fn temp_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig::with_database_dir(dir.path());
        let store = Store::connect(&config).await.unwrap();
        (dir, store)
    }

    pub async fn user(store: &Store, username: &str) -> User {
        store
            .insert_user(&NewUser {
                name: username.to_uppercase(),
                username: username.to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
    }
}
