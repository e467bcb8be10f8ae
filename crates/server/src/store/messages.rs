//! Direct messages

use sqlx::SqliteExecutor;

use super::{now_micros, Store};
use crate::core::error::Result;
use crate::models::{from_micros, Message};

/// Messages are immutable once written.
pub async fn insert_message<'e, E: SqliteExecutor<'e>>(
    exec: E,
    sender_id: &str,
    receiver_id: &str,
    content: &str,
) -> Result<Message> {
    let created_at = now_micros();
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO messages (sender_id, receiver_id, content, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(sender_id)
    .bind(receiver_id)
    .bind(content)
    .bind(created_at)
    .fetch_one(exec)
    .await?;

    Ok(Message {
        id,
        sender_id: sender_id.to_string(),
        receiver_id: receiver_id.to_string(),
        content: content.to_string(),
        created_at: from_micros(created_at),
    })
}

impl Store {
    /// Both directions between `a` and `b`, oldest first.
    pub async fn thread(&self, a: &str, b: &str) -> Result<Vec<Message>> {
        let rows: Vec<(i64, String, String, String, i64)> = sqlx::query_as(
            r#"
            SELECT id, sender_id, receiver_id, content, created_at
            FROM messages
            WHERE (sender_id = ?1 AND receiver_id = ?2)
               OR (sender_id = ?2 AND receiver_id = ?1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, sender_id, receiver_id, content, created_at)| Message {
                id,
                sender_id,
                receiver_id,
                content,
                created_at: from_micros(created_at),
            })
            .collect())
    }

    /// The counterparty of every message touching `user_id`, most recent
    /// message first. Partners repeat once per message.
    pub async fn message_counterparties(&self, user_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END
            FROM messages
            WHERE sender_id = ?1 OR receiver_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
