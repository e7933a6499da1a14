use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use charterly_core::domain::conversation::ConversationState;
use charterly_core::domain::trip::{ThreadId, UserId};
use charterly_core::store::{ConversationStore, StoreError};

/// Store used by tests and the smoke command; same contract as the SQL
/// store, no persistence across processes.
#[derive(Default)]
pub struct InMemoryConversationStore {
    states: RwLock<HashMap<String, ConversationState>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, thread_id: &ThreadId) -> Result<Option<ConversationState>, StoreError> {
        let states = self.states.read().await;
        Ok(states.get(&thread_id.0).cloned())
    }

    async fn set(&self, state: ConversationState) -> Result<(), StoreError> {
        let mut states = self.states.write().await;
        states.insert(state.thread_id.0.clone(), state);
        Ok(())
    }

    async fn delete(&self, thread_id: &ThreadId) -> Result<(), StoreError> {
        let mut states = self.states.write().await;
        states.remove(&thread_id.0);
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationState>, StoreError> {
        let states = self.states.read().await;
        let mut found: Vec<ConversationState> =
            states.values().filter(|state| state.user_id == *user_id).cloned().collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn cleanup_older_than(
        &self,
        days_old: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let cutoff = now - Duration::days(days_old);
        let mut states = self.states.write().await;
        let before = states.len();
        states.retain(|_, state| state.updated_at >= cutoff);
        Ok((before - states.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use charterly_core::domain::conversation::ConversationState;
    use charterly_core::domain::trip::{ThreadId, UserId};
    use charterly_core::store::ConversationStore;

    use super::InMemoryConversationStore;

    fn state_at(thread: &str, user: &str, day: u32) -> ConversationState {
        let now = Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap();
        ConversationState::new(ThreadId(thread.to_string()), UserId(user.to_string()), now)
    }

    #[tokio::test]
    async fn in_memory_store_round_trip() {
        let store = InMemoryConversationStore::new();
        let state = state_at("T-1", "U-1", 1);

        store.set(state.clone()).await.expect("save state");
        let found = store.get(&state.thread_id).await.expect("load state");
        assert_eq!(found, Some(state));

        let absent = store.get(&ThreadId("T-absent".to_string())).await.expect("load absent");
        assert_eq!(absent, None);
    }

    #[tokio::test]
    async fn cleanup_honors_the_ttl_cutoff() {
        let store = InMemoryConversationStore::new();
        store.set(state_at("T-old", "U-1", 1)).await.expect("save old");
        store.set(state_at("T-new", "U-1", 20)).await.expect("save new");

        let now = Utc.with_ymd_and_hms(2026, 3, 21, 9, 0, 0).unwrap();
        let removed = store.cleanup_older_than(10, now).await.expect("cleanup");

        assert_eq!(removed, 1);
        let remaining = store.list_for_user(&UserId("U-1".to_string())).await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].thread_id, ThreadId("T-new".to_string()));
    }
}
