//! Centralized failure classification and retry policy.
//!
//! Workers never decide their own retries. Every failed `AgentResult` is fed
//! through the monitor, which classifies severity and transience, decides
//! retry vs. give-up with capped exponential backoff, and decides alerting.
//!
//! The recurrence counter keyed by `source:code` lives on the monitor
//! instance and is process-lifetime only; a restart resets it. That staleness
//! is accepted, not accidental.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use charterly_core::config::RetryConfig;
use charterly_core::domain::task::{AgentTask, TaskStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    Authentication,
    Database,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::Database => "database",
            Self::Unknown => "unknown",
        }
    }
}

/// Raw failure as reported by a worker boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerFailure {
    pub message: String,
    pub code: Option<String>,
    pub source: Option<String>,
    pub severity: Option<ErrorSeverity>,
}

impl WorkerFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), ..Self::default() }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = Some(severity);
        self
    }
}

/// Derived view of a failure. Computed fresh on every classification call,
/// never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    pub message: String,
    pub source: String,
    pub severity: ErrorSeverity,
    pub is_transient: bool,
    pub kind: ErrorKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorAssessment {
    pub analysis: ErrorAnalysis,
    pub should_retry: bool,
    pub retry_delay_ms: u64,
    pub alert_required: bool,
    pub suggestions: Vec<String>,
}

const CRITICAL_MARKERS: &[&str] = &["database", "db failure", "fatal", "panic", "corrupt"];
const HIGH_MARKERS: &[&str] = &["auth", "permission", "forbidden", "unauthorized"];
const LOW_MARKERS: &[&str] = &["cache", "warning", "deprecated"];

const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "etimedout",
    "network",
    "connection",
    "econnreset",
    "econnrefused",
    "unavailable",
    "temporar",
    "rate limit",
    "too many requests",
];
const PERMANENT_MARKERS: &[&str] = &[
    "validation",
    "invalid",
    "missing required",
    "not_found",
    "not found",
    "auth",
    "permission",
    "unauthorized",
    "forbidden",
];

/// Pure classification of a raw failure into severity, transience and kind.
pub fn classify(failure: &WorkerFailure) -> ErrorAnalysis {
    let haystack = format!(
        "{} {}",
        failure.code.as_deref().unwrap_or_default(),
        failure.message
    )
    .to_ascii_lowercase();

    let severity = failure.severity.unwrap_or_else(|| infer_severity(&haystack));
    let kind = infer_kind(&haystack);
    let is_transient = infer_transience(&haystack);

    ErrorAnalysis {
        message: failure.message.clone(),
        source: failure.source.clone().unwrap_or_else(|| "unknown".to_string()),
        severity,
        is_transient,
        kind,
    }
}

fn infer_severity(haystack: &str) -> ErrorSeverity {
    if CRITICAL_MARKERS.iter().any(|marker| haystack.contains(marker)) {
        ErrorSeverity::Critical
    } else if HIGH_MARKERS.iter().any(|marker| haystack.contains(marker)) {
        ErrorSeverity::High
    } else if LOW_MARKERS.iter().any(|marker| haystack.contains(marker)) {
        ErrorSeverity::Low
    } else {
        ErrorSeverity::Medium
    }
}

fn infer_kind(haystack: &str) -> ErrorKind {
    let matches_any = |markers: &[&str]| markers.iter().any(|marker| haystack.contains(marker));

    if matches_any(&["timeout", "timed out", "etimedout"]) {
        ErrorKind::Timeout
    } else if matches_any(&["econnreset", "econnrefused", "network", "connection", "dns", "socket"])
    {
        ErrorKind::Network
    } else if matches_any(&["auth", "permission", "unauthorized", "forbidden", "credential"]) {
        ErrorKind::Authentication
    } else if matches_any(&["validation", "invalid", "missing required"]) {
        ErrorKind::Validation
    } else if matches_any(&["database", "sqlite", "sql", "constraint", "deadlock"]) {
        ErrorKind::Database
    } else {
        ErrorKind::Unknown
    }
}

// Unknown failures default to transient: the policy is optimistic about
// retrying what it cannot recognize.
fn infer_transience(haystack: &str) -> bool {
    if TRANSIENT_MARKERS.iter().any(|marker| haystack.contains(marker)) {
        return true;
    }
    if PERMANENT_MARKERS.iter().any(|marker| haystack.contains(marker)) {
        return false;
    }
    true
}

/// What the pipeline should do with a failed task.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineAction {
    /// Re-run the same work: a fresh pending copy of the task, to be
    /// scheduled after the backoff delay.
    Requeue { task: AgentTask, delay_ms: u64, assessment: ErrorAssessment },
    /// Give up and surface the failure with its recovery suggestions.
    Surface { assessment: ErrorAssessment },
}

pub struct ErrorMonitor {
    config: RetryConfig,
    occurrences: Mutex<HashMap<String, u32>>,
}

impl ErrorMonitor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config, occurrences: Mutex::new(HashMap::new()) }
    }

    /// Retry only while below the attempt cap, for transient failures, and
    /// never for critical severity. No exceptions to the conjunction.
    pub fn should_retry(&self, analysis: &ErrorAnalysis, attempt: u32) -> bool {
        attempt < self.config.max_retries
            && analysis.is_transient
            && analysis.severity != ErrorSeverity::Critical
    }

    /// Capped exponential backoff: `base * 2^(attempt-1)`, attempt >= 1.
    pub fn retry_delay_ms(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(31);
        self.config
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.config.max_delay_ms)
    }

    /// Full decision for one failed attempt: classification, retry choice,
    /// backoff, alerting and recovery suggestions.
    pub fn assess(&self, failure: &WorkerFailure, attempt: u32) -> ErrorAssessment {
        let analysis = classify(failure);
        let occurrence_count = self.record_occurrence(failure);

        let should_retry = self.should_retry(&analysis, attempt);
        let retry_delay_ms = if should_retry { self.retry_delay_ms(attempt) } else { 0 };

        let alert_required = analysis.severity == ErrorSeverity::Critical
            || analysis.severity == ErrorSeverity::High
            || occurrence_count >= self.config.alert_threshold;

        let mut suggestions = recovery_suggestions(analysis.kind);
        if should_retry {
            suggestions.insert(
                0,
                format!(
                    "Retry attempt {} of {} scheduled after {retry_delay_ms}ms",
                    attempt + 1,
                    self.config.max_retries,
                ),
            );
        }

        debug!(
            event_name = "monitor.failure_assessed",
            source = %analysis.source,
            severity = analysis.severity.as_str(),
            kind = analysis.kind.as_str(),
            transient = analysis.is_transient,
            attempt,
            should_retry,
            alert_required,
            "worker failure assessed"
        );

        ErrorAssessment { analysis, should_retry, retry_delay_ms, alert_required, suggestions }
    }

    /// Turns a failed task into the pipeline's next move: a requeued copy of
    /// the task (delayed by the computed backoff) or a terminal surface with
    /// recovery suggestions.
    pub fn next_action(
        &self,
        task: &AgentTask,
        failure: &WorkerFailure,
        attempt: u32,
    ) -> PipelineAction {
        let assessment = self.assess(failure, attempt);

        if assessment.should_retry {
            let mut retry_task = task.clone();
            retry_task.status = TaskStatus::Pending;
            PipelineAction::Requeue {
                task: retry_task,
                delay_ms: assessment.retry_delay_ms,
                assessment,
            }
        } else {
            PipelineAction::Surface { assessment }
        }
    }

    fn record_occurrence(&self, failure: &WorkerFailure) -> u32 {
        let signature = format!(
            "{}:{}",
            failure.source.as_deref().unwrap_or("unknown"),
            failure.code.as_deref().unwrap_or("unknown"),
        );

        let mut occurrences = self.occurrences.lock().unwrap_or_else(|poison| poison.into_inner());
        let count = occurrences.entry(signature).or_insert(0);
        *count += 1;
        *count
    }
}

fn recovery_suggestions(kind: ErrorKind) -> Vec<String> {
    let fixed: &[&str] = match kind {
        ErrorKind::Network => {
            &["Check network connectivity", "Verify the downstream endpoint is reachable"]
        }
        ErrorKind::Timeout => {
            &["Increase the operation timeout", "Check downstream service performance"]
        }
        ErrorKind::Validation => &["Review the request payload for missing or malformed fields"],
        ErrorKind::Authentication => {
            &["Check service credentials", "Verify the token has not expired"]
        }
        ErrorKind::Database => {
            &["Check the database connection", "Verify credentials and the failing query"]
        }
        ErrorKind::Unknown => &["Review logs for details", "Escalate if the failure repeats"],
    };

    fixed.iter().map(|suggestion| (*suggestion).to_string()).collect()
}
