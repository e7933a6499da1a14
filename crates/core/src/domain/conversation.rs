use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::trip::{RequiredField, ThreadId, TripRequest, UserId};

/// Which field group the dialogue is currently collecting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    CollectingRoute,
    CollectingDates,
    CollectingPassengers,
    CollectingPreferences,
    Complete,
}

impl ConversationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CollectingRoute => "collecting_route",
            Self::CollectingDates => "collecting_dates",
            Self::CollectingPassengers => "collecting_passengers",
            Self::CollectingPreferences => "collecting_preferences",
            Self::Complete => "complete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "collecting_route" => Some(Self::CollectingRoute),
            "collecting_dates" => Some(Self::CollectingDates),
            "collecting_passengers" => Some(Self::CollectingPassengers),
            "collecting_preferences" => Some(Self::CollectingPreferences),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }

    /// Required fields owned by this step. Preferences collect only optional
    /// fields, so that step and `Complete` own none.
    pub fn fields(&self) -> &'static [RequiredField] {
        match self {
            Self::CollectingRoute => &[RequiredField::Departure, RequiredField::Arrival],
            Self::CollectingDates => &[RequiredField::DepartureDate],
            Self::CollectingPassengers => &[RequiredField::Passengers],
            Self::CollectingPreferences | Self::Complete => &[],
        }
    }

    /// The earliest step that still has missing fields, or `Complete`.
    pub fn for_missing(missing: &[RequiredField]) -> Self {
        let wants = |step: Self| step.fields().iter().any(|field| missing.contains(field));

        if wants(Self::CollectingRoute) {
            Self::CollectingRoute
        } else if wants(Self::CollectingDates) {
            Self::CollectingDates
        } else if wants(Self::CollectingPassengers) {
            Self::CollectingPassengers
        } else {
            Self::Complete
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationRole {
    User,
    Assistant,
    System,
}

impl ConversationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ConversationRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Persisted multi-turn state for one conversation thread. Written back as a
/// whole after every turn; the store performs no merging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub thread_id: ThreadId,
    pub user_id: UserId,
    pub current_step: ConversationStep,
    pub data: TripRequest,
    pub completed_fields: Vec<RequiredField>,
    pub missing_fields: Vec<RequiredField>,
    pub step_history: Vec<ConversationStep>,
    pub turns: Vec<ConversationTurn>,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(thread_id: ThreadId, user_id: UserId, now: DateTime<Utc>) -> Self {
        let data = TripRequest::default();
        let missing_fields = data.missing_fields();
        Self {
            thread_id,
            user_id,
            current_step: ConversationStep::CollectingRoute,
            data,
            completed_fields: Vec::new(),
            missing_fields,
            step_history: vec![ConversationStep::CollectingRoute],
            turns: Vec::new(),
            metadata: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Recompute the derived field sets from `data` without touching the
    /// step. They are never stored ad hoc; this is the only writer.
    pub fn recompute_fields(&mut self) {
        self.completed_fields = self.data.completed_fields();
        self.missing_fields = self.data.missing_fields();
    }

    /// Recompute the derived field sets and step from `data`. Appends to the
    /// step history only when the step actually changes.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        self.recompute_fields();

        let next = ConversationStep::for_missing(&self.missing_fields);
        if next != self.current_step {
            self.current_step = next;
            self.step_history.push(next);
        }
        self.updated_at = now;
    }

    /// Force a specific step (used for branches the required-field machine
    /// does not know about, like the optional preferences round).
    pub fn set_step(&mut self, step: ConversationStep, now: DateTime<Utc>) {
        if step != self.current_step {
            self.current_step = step;
            self.step_history.push(step);
            self.updated_at = now;
        }
    }

    pub fn push_turn(&mut self, role: ConversationRole, content: impl Into<String>, now: DateTime<Utc>) {
        self.turns.push(ConversationTurn { role, content: content.into(), timestamp: now });
        self.updated_at = now;
    }

    pub fn is_complete(&self) -> bool {
        self.current_step == ConversationStep::Complete && self.missing_fields.is_empty()
    }

    pub fn clarification_rounds(&self) -> u64 {
        self.metadata.get("clarification_rounds").and_then(serde_json::Value::as_u64).unwrap_or(0)
    }

    pub fn bump_clarification_rounds(&mut self) -> u64 {
        let rounds = self.clarification_rounds() + 1;
        self.metadata.insert("clarification_rounds".to_string(), serde_json::json!(rounds));
        rounds
    }
}
