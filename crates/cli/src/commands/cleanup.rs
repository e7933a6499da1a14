use chrono::Utc;

use charterly_core::config::{AppConfig, LoadOptions};
use charterly_core::store::ConversationStore;
use charterly_db::{connect_with_settings, migrations, SqlConversationStore};

use crate::commands::CommandResult;

/// Out-of-band TTL sweep: deletes conversation state untouched for longer
/// than the configured retention window.
pub fn run(days_override: Option<i64>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "cleanup",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let days_old = days_override.unwrap_or(config.conversation.state_ttl_days);
    if days_old <= 0 {
        return CommandResult::failure(
            "cleanup",
            "invalid_argument",
            "days must be greater than zero",
            2,
        );
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "cleanup",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let store = SqlConversationStore::new(pool.clone());
        let removed = store
            .cleanup_older_than(days_old, Utc::now())
            .await
            .map_err(|error| ("cleanup", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<u64, (&'static str, String, u8)>(removed)
    });

    match result {
        Ok(removed) => CommandResult::success(
            "cleanup",
            format!("removed {removed} conversation state(s) older than {days_old} day(s)"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("cleanup", error_class, message, exit_code)
        }
    }
}
