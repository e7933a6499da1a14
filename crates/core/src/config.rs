use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub intent: IntentConfig,
    pub retry: RetryConfig,
    pub conversation: ConversationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Settings for the message-intent classification service. The `keyword`
/// provider is fully local and needs no credentials.
#[derive(Clone, Debug)]
pub struct IntentConfig {
    pub provider: IntentProvider,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub timeout_secs: u64,
    pub confidence_floor: f64,
}

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub alert_threshold: u32,
}

#[derive(Clone, Debug)]
pub struct ConversationConfig {
    pub state_ttl_days: i64,
    pub max_clarification_rounds: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentProvider {
    Keyword,
    OpenAi,
    Anthropic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub intent_provider: Option<IntentProvider>,
    pub intent_model: Option<String>,
    pub max_retries: Option<u32>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://charterly.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            intent: IntentConfig {
                provider: IntentProvider::Keyword,
                api_key: None,
                model: "keyword-v1".to_string(),
                timeout_secs: 30,
                confidence_floor: 0.4,
            },
            retry: RetryConfig {
                max_retries: 3,
                base_delay_ms: 1_000,
                max_delay_ms: 30_000,
                alert_threshold: 5,
            },
            conversation: ConversationConfig {
                state_ttl_days: 30,
                max_clarification_rounds: 5,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for IntentProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(ConfigError::Validation(format!(
                "unsupported intent provider `{other}` (expected keyword|openai|anthropic)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("charterly.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(intent) = patch.intent {
            if let Some(provider) = intent.provider {
                self.intent.provider = provider;
            }
            if let Some(api_key_value) = intent.api_key {
                self.intent.api_key = Some(api_key_value.into());
            }
            if let Some(model) = intent.model {
                self.intent.model = model;
            }
            if let Some(timeout_secs) = intent.timeout_secs {
                self.intent.timeout_secs = timeout_secs;
            }
            if let Some(confidence_floor) = intent.confidence_floor {
                self.intent.confidence_floor = confidence_floor;
            }
        }

        if let Some(retry) = patch.retry {
            if let Some(max_retries) = retry.max_retries {
                self.retry.max_retries = max_retries;
            }
            if let Some(base_delay_ms) = retry.base_delay_ms {
                self.retry.base_delay_ms = base_delay_ms;
            }
            if let Some(max_delay_ms) = retry.max_delay_ms {
                self.retry.max_delay_ms = max_delay_ms;
            }
            if let Some(alert_threshold) = retry.alert_threshold {
                self.retry.alert_threshold = alert_threshold;
            }
        }

        if let Some(conversation) = patch.conversation {
            if let Some(state_ttl_days) = conversation.state_ttl_days {
                self.conversation.state_ttl_days = state_ttl_days;
            }
            if let Some(max_clarification_rounds) = conversation.max_clarification_rounds {
                self.conversation.max_clarification_rounds = max_clarification_rounds;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CHARTERLY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("CHARTERLY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("CHARTERLY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("CHARTERLY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("CHARTERLY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CHARTERLY_INTENT_PROVIDER") {
            self.intent.provider = value.parse()?;
        }
        if let Some(value) = read_env("CHARTERLY_INTENT_API_KEY") {
            self.intent.api_key = Some(value.into());
        }
        if let Some(value) = read_env("CHARTERLY_INTENT_MODEL") {
            self.intent.model = value;
        }
        if let Some(value) = read_env("CHARTERLY_INTENT_TIMEOUT_SECS") {
            self.intent.timeout_secs = parse_u64("CHARTERLY_INTENT_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CHARTERLY_RETRY_MAX_RETRIES") {
            self.retry.max_retries = parse_u32("CHARTERLY_RETRY_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("CHARTERLY_RETRY_BASE_DELAY_MS") {
            self.retry.base_delay_ms = parse_u64("CHARTERLY_RETRY_BASE_DELAY_MS", &value)?;
        }
        if let Some(value) = read_env("CHARTERLY_RETRY_MAX_DELAY_MS") {
            self.retry.max_delay_ms = parse_u64("CHARTERLY_RETRY_MAX_DELAY_MS", &value)?;
        }

        if let Some(value) = read_env("CHARTERLY_CONVERSATION_STATE_TTL_DAYS") {
            self.conversation.state_ttl_days =
                parse_i64("CHARTERLY_CONVERSATION_STATE_TTL_DAYS", &value)?;
        }

        let log_level =
            read_env("CHARTERLY_LOGGING_LEVEL").or_else(|| read_env("CHARTERLY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CHARTERLY_LOGGING_FORMAT").or_else(|| read_env("CHARTERLY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(intent_provider) = overrides.intent_provider {
            self.intent.provider = intent_provider;
        }
        if let Some(intent_model) = overrides.intent_model {
            self.intent.model = intent_model;
        }
        if let Some(max_retries) = overrides.max_retries {
            self.retry.max_retries = max_retries;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_intent(&self.intent)?;
        validate_retry(&self.retry)?;
        validate_conversation(&self.conversation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("charterly.toml"), PathBuf::from("config/charterly.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_intent(intent: &IntentConfig) -> Result<(), ConfigError> {
    if intent.timeout_secs == 0 || intent.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "intent.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&intent.confidence_floor) {
        return Err(ConfigError::Validation(
            "intent.confidence_floor must be in range 0.0..=1.0".to_string(),
        ));
    }

    match intent.provider {
        IntentProvider::OpenAi | IntentProvider::Anthropic => {
            let missing = intent
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "intent.api_key is required for openai/anthropic providers".to_string(),
                ));
            }
        }
        IntentProvider::Keyword => {}
    }

    Ok(())
}

fn validate_retry(retry: &RetryConfig) -> Result<(), ConfigError> {
    if retry.base_delay_ms == 0 {
        return Err(ConfigError::Validation(
            "retry.base_delay_ms must be greater than zero".to_string(),
        ));
    }

    if retry.max_delay_ms < retry.base_delay_ms {
        return Err(ConfigError::Validation(
            "retry.max_delay_ms must be at least retry.base_delay_ms".to_string(),
        ));
    }

    if retry.alert_threshold == 0 {
        return Err(ConfigError::Validation(
            "retry.alert_threshold must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_conversation(conversation: &ConversationConfig) -> Result<(), ConfigError> {
    if conversation.state_ttl_days <= 0 {
        return Err(ConfigError::Validation(
            "conversation.state_ttl_days must be greater than zero".to_string(),
        ));
    }

    if conversation.max_clarification_rounds == 0 {
        return Err(ConfigError::Validation(
            "conversation.max_clarification_rounds must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    intent: Option<IntentPatch>,
    retry: Option<RetryPatch>,
    conversation: Option<ConversationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct IntentPatch {
    provider: Option<IntentProvider>,
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    confidence_floor: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RetryPatch {
    max_retries: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    alert_threshold: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ConversationPatch {
    state_ttl_days: Option<i64>,
    max_clarification_rounds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, IntentProvider, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const MANAGED_VARS: &[&str] = &[
        "CHARTERLY_DATABASE_URL",
        "CHARTERLY_DATABASE_MAX_CONNECTIONS",
        "CHARTERLY_DATABASE_TIMEOUT_SECS",
        "CHARTERLY_INTENT_PROVIDER",
        "CHARTERLY_INTENT_API_KEY",
        "CHARTERLY_INTENT_MODEL",
        "CHARTERLY_INTENT_TIMEOUT_SECS",
        "CHARTERLY_RETRY_MAX_RETRIES",
        "CHARTERLY_RETRY_BASE_DELAY_MS",
        "CHARTERLY_RETRY_MAX_DELAY_MS",
        "CHARTERLY_CONVERSATION_STATE_TTL_DAYS",
        "CHARTERLY_LOGGING_LEVEL",
        "CHARTERLY_LOGGING_FORMAT",
        "CHARTERLY_LOG_LEVEL",
        "CHARTERLY_LOG_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars() {
        for var in MANAGED_VARS {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_validate_without_any_input() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.database.url == "sqlite://charterly.db", "default database url expected")?;
        ensure(
            matches!(config.intent.provider, IntentProvider::Keyword),
            "default intent provider should be keyword",
        )?;
        ensure(config.retry.max_retries == 3, "default max retries should be 3")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("TEST_INTENT_API_KEY", "sk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("charterly.toml");
            fs::write(
                &path,
                r#"
[intent]
provider = "anthropic"
api_key = "${TEST_INTENT_API_KEY}"
model = "claude-haiku"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                matches!(config.intent.provider, IntentProvider::Anthropic),
                "provider should come from the file",
            )?;
            let api_key = config.intent.api_key.ok_or("api key should be present")?;
            ensure(
                api_key.expose_secret() == "sk-from-env",
                "api key should be interpolated from the environment",
            )
        })();

        env::remove_var("TEST_INTENT_API_KEY");
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("CHARTERLY_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("CHARTERLY_RETRY_MAX_RETRIES", "7");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("charterly.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.retry.max_retries == 7, "env max retries should win over defaults")
        })();

        clear_vars();
        result
    }

    #[test]
    fn remote_provider_without_api_key_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("CHARTERLY_INTENT_PROVIDER", "openai");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("intent.api_key")
            );
            ensure(has_message, "validation failure should mention intent.api_key")
        })();

        clear_vars();
        result
    }

    #[test]
    fn invalid_retry_delays_fail_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("CHARTERLY_RETRY_BASE_DELAY_MS", "60000");
        env::set_var("CHARTERLY_RETRY_MAX_DELAY_MS", "1000");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected validation failure".to_string()),
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("retry.max_delay_ms")
            );
            ensure(has_message, "validation failure should mention retry.max_delay_ms")
        })();

        clear_vars();
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("CHARTERLY_INTENT_PROVIDER", "anthropic");
        env::set_var("CHARTERLY_INTENT_API_KEY", "sk-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain api key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })();

        clear_vars();
        result
    }
}
