//! Port for conversation-state persistence.
//!
//! The backing store is opaque to the dialogue layer: whole-state reads and
//! writes keyed by thread id, with read-your-writes consistency assumed. A
//! missing thread is a normal outcome (`Ok(None)`), never an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::conversation::ConversationState;
use crate::domain::trip::{ThreadId, UserId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("stored state could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get(&self, thread_id: &ThreadId) -> Result<Option<ConversationState>, StoreError>;

    /// Whole-state replacement. The orchestrator computes the new state in
    /// memory; the store performs no merging.
    async fn set(&self, state: ConversationState) -> Result<(), StoreError>;

    async fn delete(&self, thread_id: &ThreadId) -> Result<(), StoreError>;

    async fn list_for_user(&self, user_id: &UserId)
        -> Result<Vec<ConversationState>, StoreError>;

    /// TTL sweep: delete states untouched for more than `days_old` days as of
    /// `now`, returning how many were removed.
    async fn cleanup_older_than(
        &self,
        days_old: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}
