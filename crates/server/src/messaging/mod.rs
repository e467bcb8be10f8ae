//! Messaging Gate & Conversation Aggregator
//!
//! Direct messages need at least one follow edge between the two users,
//! in either direction. Threads read oldest first; the conversation list
//! is one entry per partner, most recent interaction first.

use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::core::error::{Error, Result};
use crate::graph::GraphResolver;
use crate::models::{Message, PublicProfile, Thread};
use crate::store::messages::insert_message;
use crate::store::users::user_exists;
use crate::store::Store;

#[derive(Clone, Debug)]
pub struct MessageManager {
    store: Store,
    graph: GraphResolver,
}

impl MessageManager {
    pub fn new(store: Store, graph: GraphResolver) -> Self {
        Self { store, graph }
    }

    /// The connection check and the insert share one transaction.
    pub async fn send_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        text: &str,
    ) -> Result<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::validation("message text is required"));
        }

        let mut tx = self.store.begin_write().await?;

        if !user_exists(&mut *tx, receiver_id).await? {
            return Err(Error::not_found(format!("user {}", receiver_id)));
        }
        let status = GraphResolver::status_with(&mut tx, sender_id, receiver_id).await?;
        if !status.is_connected() {
            return Err(Error::forbidden("messaging requires a follow connection"));
        }

        let message = insert_message(&mut *tx, sender_id, receiver_id, text).await?;
        tx.commit().await?;

        info!("[Messages] {} -> {} (#{})", sender_id, receiver_id, message.id);
        Ok(message)
    }

    /// Every message between `user_id` and `partner_id`, oldest first.
    pub async fn thread(&self, user_id: &str, partner_id: &str) -> Result<Thread> {
        let partner = self
            .store
            .public_profile(partner_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {}", partner_id)))?;

        let status = self.graph.connection_status(user_id, partner_id).await?;
        if !status.is_connected() {
            return Err(Error::forbidden("thread not visible without a follow connection"));
        }

        let messages = self.store.thread(user_id, partner_id).await?;
        Ok(Thread { partner, messages })
    }

    /// Distinct partners, ordered by their most recent message.
    pub async fn conversations(&self, user_id: &str) -> Result<Vec<PublicProfile>> {
        self.graph.relationships(user_id).await?;

        let counterparties = self.store.message_counterparties(user_id).await?;
        let partners = first_occurrences(counterparties);

        let mut profiles: HashMap<String, PublicProfile> = self
            .store
            .profiles_by_ids(&partners)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(partners
            .iter()
            .filter_map(|id| profiles.remove(id))
            .collect())
    }
}

/// Keep the first occurrence of each id, preserving order.
fn first_occurrences(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{temp_store, user};

    fn manager(store: &Store) -> MessageManager {
        MessageManager::new(store.clone(), GraphResolver::new(store.clone()))
    }

    #[test]
    fn test_first_occurrences() {
        let ids = vec!["b", "c", "b", "a", "c"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(first_occurrences(ids), vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let (_dir, store) = temp_store().await;
        let messages = manager(&store);
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;

        assert!(matches!(
            messages.send_message(&a.id, &b.id, "hi").await.unwrap_err(),
            Error::Forbidden(_)
        ));
        assert!(matches!(
            messages.thread(&a.id, &b.id).await.unwrap_err(),
            Error::Forbidden(_)
        ));

        // one-directional edge is enough, for both sides
        store.insert_follow_edge(&a.id, &b.id).await.unwrap();
        messages.send_message(&a.id, &b.id, "hi").await.unwrap();
        messages.send_message(&b.id, &a.id, "hello").await.unwrap();

        let thread = messages.thread(&b.id, &a.id).await.unwrap();
        assert_eq!(thread.partner.id, a.id);
        let texts: Vec<&str> = thread.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["hi", "hello"]);
    }

    #[tokio::test]
    async fn test_send_validation() {
        let (_dir, store) = temp_store().await;
        let messages = manager(&store);
        let a = user(&store, "a").await;

        assert!(matches!(
            messages.send_message(&a.id, "ghost", "hi").await.unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(matches!(
            messages.send_message(&a.id, "ghost", "   ").await.unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_conversations_deduplicated() {
        let (_dir, store) = temp_store().await;
        let messages = manager(&store);
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        let c = user(&store, "c").await;
        store.insert_follow_edge(&a.id, &b.id).await.unwrap();
        store.insert_follow_edge(&c.id, &a.id).await.unwrap();

        messages.send_message(&a.id, &b.id, "1").await.unwrap();
        messages.send_message(&b.id, &a.id, "2").await.unwrap();
        messages.send_message(&c.id, &a.id, "3").await.unwrap();
        messages.send_message(&a.id, &b.id, "4").await.unwrap();

        let partners: Vec<String> = messages
            .conversations(&a.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(partners, vec![b.id.clone(), c.id.clone()]);

        assert!(messages.conversations(&user(&store, "d").await.id).await.unwrap().is_empty());
    }
}
