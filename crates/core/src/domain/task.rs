use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Worker-type tag used for task routing. A closed set so dispatch stays
/// exhaustiveness-checked when a new worker is added.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    Orchestrator,
    ClientData,
    FlightSearch,
    ProposalAnalysis,
    Communication,
    ErrorMonitor,
}

impl WorkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orchestrator => "orchestrator",
            Self::ClientData => "client_data",
            Self::FlightSearch => "flight_search",
            Self::ProposalAnalysis => "proposal_analysis",
            Self::Communication => "communication",
            Self::ErrorMonitor => "error_monitor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "orchestrator" => Some(Self::Orchestrator),
            "client_data" => Some(Self::ClientData),
            "flight_search" => Some(Self::FlightSearch),
            "proposal_analysis" => Some(Self::ProposalAnalysis),
            "communication" => Some(Self::Communication),
            "error_monitor" => Some(Self::ErrorMonitor),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Urgent,
    High,
    Normal,
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "urgent" => Some(Self::Urgent),
            "high" => Some(Self::High),
            "normal" => Some(Self::Normal),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// User-facing wording for the same departure-derived urgency that drives
    /// task scheduling, so messaging and scheduling never disagree.
    pub fn urgency_label(&self) -> &'static str {
        match self {
            Self::Urgent => "departing within 24 hours",
            Self::High => "departing within 3 days",
            Self::Normal => "departing within a week",
            Self::Low => "departing later",
        }
    }
}

/// Single urgency calculation shared by task creation and user messaging.
pub fn priority_for_departure(departure: NaiveDate, today: NaiveDate) -> TaskPriority {
    let days_until = (departure - today).num_days();
    if days_until <= 1 {
        TaskPriority::Urgent
    } else if days_until <= 3 {
        TaskPriority::High
    } else if days_until <= 7 {
        TaskPriority::Normal
    } else {
        TaskPriority::Low
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InFlight,
    Done,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_flight" => Some(Self::InFlight),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Unit of delegated work emitted by the task orchestrator once a
/// conversation reaches `Complete`. Payload shape is owned by the target
/// worker; the pipeline treats it as opaque.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentTask {
    pub id: TaskId,
    pub kind: WorkerKind,
    pub payload: serde_json::Value,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub target: WorkerKind,
    pub created_at: DateTime<Utc>,
}

impl AgentTask {
    pub fn new(
        kind: WorkerKind,
        payload: serde_json::Value,
        priority: TaskPriority,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskId::generate(),
            kind,
            payload,
            priority,
            status: TaskStatus::Pending,
            target: kind,
            created_at,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub execution_time_ms: u64,
    pub tool_calls: u32,
}

/// Uniform result envelope produced by every worker. Failures are data, not
/// exceptions; nothing crosses a worker boundary by unwinding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub metadata: ResultMetadata,
}

impl AgentResult {
    pub fn ok(data: serde_json::Value, metadata: ResultMetadata) -> Self {
        Self { success: true, data: Some(data), error: None, metadata }
    }

    pub fn failed(error: impl Into<String>, metadata: ResultMetadata) -> Self {
        Self { success: false, data: None, error: Some(error.into()), metadata }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{priority_for_departure, TaskPriority, TaskStatus, WorkerKind};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn worker_kind_round_trips_from_storage_encoding() {
        let kinds = [
            WorkerKind::Orchestrator,
            WorkerKind::ClientData,
            WorkerKind::FlightSearch,
            WorkerKind::ProposalAnalysis,
            WorkerKind::Communication,
            WorkerKind::ErrorMonitor,
        ];
        for kind in kinds {
            assert_eq!(WorkerKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn task_status_round_trips_from_storage_encoding() {
        let statuses =
            [TaskStatus::Pending, TaskStatus::InFlight, TaskStatus::Done, TaskStatus::Failed];
        for status in statuses {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn urgency_thresholds_follow_days_until_departure() {
        let today = date(2026, 3, 1);
        assert_eq!(priority_for_departure(date(2026, 3, 1), today), TaskPriority::Urgent);
        assert_eq!(priority_for_departure(date(2026, 3, 2), today), TaskPriority::Urgent);
        assert_eq!(priority_for_departure(date(2026, 3, 4), today), TaskPriority::High);
        assert_eq!(priority_for_departure(date(2026, 3, 8), today), TaskPriority::Normal);
        assert_eq!(priority_for_departure(date(2026, 3, 9), today), TaskPriority::Low);
    }

    #[test]
    fn urgency_label_matches_the_scheduling_priority() {
        let today = date(2026, 3, 1);
        let priority = priority_for_departure(date(2026, 3, 2), today);
        assert_eq!(priority.urgency_label(), "departing within 24 hours");
    }
}
