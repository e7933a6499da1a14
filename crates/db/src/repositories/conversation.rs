use chrono::{DateTime, Duration, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use charterly_core::domain::conversation::{ConversationState, ConversationStep};
use charterly_core::domain::trip::{ThreadId, UserId};
use charterly_core::store::{ConversationStore, StoreError};

use crate::DbPool;

pub struct SqlConversationStore {
    pool: DbPool,
}

impl SqlConversationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ConversationStore for SqlConversationStore {
    async fn get(&self, thread_id: &ThreadId) -> Result<Option<ConversationState>, StoreError> {
        let row = sqlx::query(
            "SELECT
                thread_id,
                user_id,
                current_step,
                data_json,
                completed_fields_json,
                missing_fields_json,
                step_history_json,
                turns_json,
                metadata_json,
                created_at,
                updated_at
             FROM conversation_state
             WHERE thread_id = ?",
        )
        .bind(&thread_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(state_from_row).transpose()
    }

    async fn set(&self, state: ConversationState) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO conversation_state (
                thread_id,
                user_id,
                current_step,
                data_json,
                completed_fields_json,
                missing_fields_json,
                step_history_json,
                turns_json,
                metadata_json,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(thread_id) DO UPDATE SET
                user_id = excluded.user_id,
                current_step = excluded.current_step,
                data_json = excluded.data_json,
                completed_fields_json = excluded.completed_fields_json,
                missing_fields_json = excluded.missing_fields_json,
                step_history_json = excluded.step_history_json,
                turns_json = excluded.turns_json,
                metadata_json = excluded.metadata_json,
                updated_at = excluded.updated_at",
        )
        .bind(&state.thread_id.0)
        .bind(&state.user_id.0)
        .bind(state.current_step.as_str())
        .bind(encode_json("data", &state.data)?)
        .bind(encode_json("completed_fields", &state.completed_fields)?)
        .bind(encode_json("missing_fields", &state.missing_fields)?)
        .bind(encode_json("step_history", &state.step_history)?)
        .bind(encode_json("turns", &state.turns)?)
        .bind(encode_json("metadata", &state.metadata)?)
        .bind(state.created_at.to_rfc3339())
        .bind(state.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn delete(&self, thread_id: &ThreadId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM conversation_state WHERE thread_id = ?")
            .bind(&thread_id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationState>, StoreError> {
        let rows = sqlx::query(
            "SELECT
                thread_id,
                user_id,
                current_step,
                data_json,
                completed_fields_json,
                missing_fields_json,
                step_history_json,
                turns_json,
                metadata_json,
                created_at,
                updated_at
             FROM conversation_state
             WHERE user_id = ?
             ORDER BY updated_at DESC",
        )
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(state_from_row).collect()
    }

    async fn cleanup_older_than(
        &self,
        days_old: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let cutoff = now - Duration::days(days_old);
        let result = sqlx::query("DELETE FROM conversation_state WHERE updated_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected())
    }
}

fn backend(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

fn encode_json<T: serde::Serialize>(column: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value)
        .map_err(|error| StoreError::Decode(format!("could not encode `{column}`: {error}")))
}

fn decode_json<T: serde::de::DeserializeOwned>(
    column: &str,
    value: String,
) -> Result<T, StoreError> {
    serde_json::from_str(&value)
        .map_err(|error| StoreError::Decode(format!("invalid JSON in `{column}`: {error}")))
}

fn state_from_row(row: SqliteRow) -> Result<ConversationState, StoreError> {
    let step_raw = try_get::<String>(&row, "current_step")?;
    let current_step = ConversationStep::parse(&step_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown conversation step `{step_raw}`")))?;

    Ok(ConversationState {
        thread_id: ThreadId(try_get(&row, "thread_id")?),
        user_id: UserId(try_get(&row, "user_id")?),
        current_step,
        data: decode_json("data_json", try_get(&row, "data_json")?)?,
        completed_fields: decode_json(
            "completed_fields_json",
            try_get(&row, "completed_fields_json")?,
        )?,
        missing_fields: decode_json("missing_fields_json", try_get(&row, "missing_fields_json")?)?,
        step_history: decode_json("step_history_json", try_get(&row, "step_history_json")?)?,
        turns: decode_json("turns_json", try_get(&row, "turns_json")?)?,
        metadata: decode_json("metadata_json", try_get(&row, "metadata_json")?)?,
        created_at: parse_timestamp("created_at", try_get(&row, "created_at")?)?,
        updated_at: parse_timestamp("updated_at", try_get(&row, "updated_at")?)?,
    })
}

fn try_get<T>(row: &SqliteRow, column: &str) -> Result<T, StoreError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(backend)
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| StoreError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})")),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use charterly_core::domain::conversation::{ConversationRole, ConversationState};
    use charterly_core::domain::trip::{ThreadId, UserId};
    use charterly_core::store::ConversationStore;

    use super::SqlConversationStore;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn sample_state(thread: &str, user: &str) -> ConversationState {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut state =
            ConversationState::new(ThreadId(thread.to_string()), UserId(user.to_string()), now);
        state.data.departure = Some("JFK".to_string());
        state.data.arrival = Some("LAX".to_string());
        state.push_turn(ConversationRole::User, "JFK to LAX", now);
        state.metadata.insert("last_intent".to_string(), serde_json::json!("request_create"));
        state.refresh(now);
        state
    }

    #[tokio::test]
    async fn sql_store_round_trips_whole_state() {
        let pool = setup_pool().await;
        let store = SqlConversationStore::new(pool.clone());
        let state = sample_state("T-1", "U-1");

        store.set(state.clone()).await.expect("save state");
        let found = store.get(&state.thread_id).await.expect("load state");

        assert_eq!(found, Some(state));
        pool.close().await;
    }

    #[tokio::test]
    async fn missing_thread_reads_as_none() {
        let pool = setup_pool().await;
        let store = SqlConversationStore::new(pool.clone());

        let found = store.get(&ThreadId("T-absent".to_string())).await.expect("load state");
        assert_eq!(found, None);
        pool.close().await;
    }

    #[tokio::test]
    async fn set_replaces_the_previous_state_for_the_thread() {
        let pool = setup_pool().await;
        let store = SqlConversationStore::new(pool.clone());

        let mut state = sample_state("T-2", "U-1");
        store.set(state.clone()).await.expect("first save");

        state.data.passengers = Some(4);
        state.refresh(state.updated_at + Duration::minutes(1));
        store.set(state.clone()).await.expect("second save");

        let found = store.get(&state.thread_id).await.expect("load state");
        assert_eq!(found, Some(state));
        pool.close().await;
    }

    #[tokio::test]
    async fn delete_removes_the_thread() {
        let pool = setup_pool().await;
        let store = SqlConversationStore::new(pool.clone());
        let state = sample_state("T-3", "U-2");

        store.set(state.clone()).await.expect("save state");
        store.delete(&state.thread_id).await.expect("delete state");

        let found = store.get(&state.thread_id).await.expect("load state");
        assert_eq!(found, None);
        pool.close().await;
    }

    #[tokio::test]
    async fn list_for_user_returns_only_their_threads() {
        let pool = setup_pool().await;
        let store = SqlConversationStore::new(pool.clone());

        store.set(sample_state("T-4", "U-3")).await.expect("save first");
        store.set(sample_state("T-5", "U-3")).await.expect("save second");
        store.set(sample_state("T-6", "U-other")).await.expect("save other user");

        let states = store.list_for_user(&UserId("U-3".to_string())).await.expect("list");
        assert_eq!(states.len(), 2);
        assert!(states.iter().all(|state| state.user_id.0 == "U-3"));
        pool.close().await;
    }

    #[tokio::test]
    async fn cleanup_removes_only_states_past_the_ttl() {
        let pool = setup_pool().await;
        let store = SqlConversationStore::new(pool.clone());

        let mut stale = sample_state("T-stale", "U-4");
        let stale_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        stale.created_at = stale_at;
        stale.updated_at = stale_at;
        store.set(stale).await.expect("save stale");

        store.set(sample_state("T-fresh", "U-4")).await.expect("save fresh");

        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let removed = store.cleanup_older_than(30, now).await.expect("cleanup");

        assert_eq!(removed, 1);
        let remaining = store.list_for_user(&UserId("U-4".to_string())).await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].thread_id, ThreadId("T-fresh".to_string()));
        pool.close().await;
    }
}
