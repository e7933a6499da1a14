use serde::Serialize;
use serde_json::json;

use charterly_core::config::{AppConfig, IntentProvider, LoadOptions, LogFormat};

#[derive(Debug, Serialize)]
struct ConfigReport {
    command: &'static str,
    status: &'static str,
    config: serde_json::Value,
}

/// Shows the effective configuration after file, environment and override
/// layering. Secrets are replaced, never printed.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return serde_json::to_string(&json!({
                "command": "config",
                "status": "error",
                "error_class": "config_validation",
                "message": error.to_string(),
            }))
            .unwrap_or_else(|serialize_error| serialize_error.to_string());
        }
    };

    let report = ConfigReport {
        command: "config",
        status: "ok",
        config: json!({
            "database": {
                "url": config.database.url,
                "max_connections": config.database.max_connections,
                "timeout_secs": config.database.timeout_secs,
            },
            "intent": {
                "provider": provider_name(config.intent.provider),
                "api_key": config.intent.api_key.as_ref().map(|_| "[redacted]"),
                "model": config.intent.model,
                "timeout_secs": config.intent.timeout_secs,
                "confidence_floor": config.intent.confidence_floor,
            },
            "retry": {
                "max_retries": config.retry.max_retries,
                "base_delay_ms": config.retry.base_delay_ms,
                "max_delay_ms": config.retry.max_delay_ms,
                "alert_threshold": config.retry.alert_threshold,
            },
            "conversation": {
                "state_ttl_days": config.conversation.state_ttl_days,
                "max_clarification_rounds": config.conversation.max_clarification_rounds,
            },
            "logging": {
                "level": config.logging.level,
                "format": format_name(config.logging.format),
            },
        }),
    };

    serde_json::to_string_pretty(&report)
        .unwrap_or_else(|error| format!("config serialization failed: {error}"))
}

fn provider_name(provider: IntentProvider) -> &'static str {
    match provider {
        IntentProvider::Keyword => "keyword",
        IntentProvider::OpenAi => "openai",
        IntentProvider::Anthropic => "anthropic",
    }
}

fn format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}
