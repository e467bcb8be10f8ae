//! Discovery Engine
//!
//! "People you may not know": everyone minus the caller, their followers,
//! their followings, the targets of their pending requests and system
//! accounts. Users who sent the caller a request stay discoverable.

use std::collections::BTreeSet;

use tracing::debug;

use crate::core::error::Result;
use crate::graph::GraphResolver;
use crate::models::PublicProfile;
use crate::store::Store;

#[derive(Clone, Debug)]
pub struct DiscoveryEngine {
    store: Store,
    graph: GraphResolver,
    system_account_prefix: String,
}

impl DiscoveryEngine {
    pub fn new(store: Store, graph: GraphResolver, system_account_prefix: String) -> Self {
        Self {
            store,
            graph,
            system_account_prefix,
        }
    }

    pub async fn discoverable(&self, user_id: &str) -> Result<Vec<PublicProfile>> {
        let relationships = self.graph.relationships(user_id).await?;
        let system_accounts = self
            .store
            .user_ids_with_prefix(&self.system_account_prefix)
            .await?;

        let mut excluded: BTreeSet<String> = BTreeSet::new();
        excluded.extend(relationships.follower_ids);
        excluded.extend(relationships.following_ids);
        excluded.extend(relationships.pending_outgoing);
        excluded.extend(system_accounts);
        excluded.insert(user_id.to_string());

        let people = self.store.profiles_excluding(&excluded).await?;
        debug!(
            "[Discovery] {} discoverable for {} ({} excluded)",
            people.len(),
            user_id,
            excluded.len()
        );
        Ok(people)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::relations::insert_request;
    use crate::store::test_support::{temp_store, user};

    #[tokio::test]
    async fn test_discoverable_set_subtraction() {
        let (_dir, store) = temp_store().await;
        let discovery = DiscoveryEngine::new(
            store.clone(),
            GraphResolver::new(store.clone()),
            "guest_".to_string(),
        );
        let me = user(&store, "me").await;
        let followed = user(&store, "followed").await;
        let follower = user(&store, "follower").await;
        let requested = user(&store, "requested").await;
        let requester = user(&store, "requester").await;
        let stranger = user(&store, "stranger").await;
        user(&store, "guest_1").await;

        store.insert_follow_edge(&me.id, &followed.id).await.unwrap();
        store.insert_follow_edge(&follower.id, &me.id).await.unwrap();
        insert_request(store.pool(), &me.id, &requested.id).await.unwrap();
        insert_request(store.pool(), &requester.id, &me.id).await.unwrap();

        let ids: BTreeSet<String> = discovery
            .discoverable(&me.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids, BTreeSet::from([requester.id.clone(), stranger.id.clone()]));
        assert!(!ids.contains(&me.id));
    }

    #[tokio::test]
    async fn test_lonely_user_sees_nobody_but_others() {
        let (_dir, store) = temp_store().await;
        let discovery =
            DiscoveryEngine::new(store.clone(), GraphResolver::new(store.clone()), String::new());
        let me = user(&store, "me").await;
        assert!(discovery.discoverable(&me.id).await.unwrap().is_empty());

        user(&store, "guest_1").await;
        // empty prefix: no system accounts
        assert_eq!(discovery.discoverable(&me.id).await.unwrap().len(), 1);
    }
}
