//! Task orchestration on top of the dialogue flow.
//!
//! The orchestrator is itself a worker. Free text is classified (with a safe
//! default), conversational messages drive the dialogue, and once a request
//! reaches `Complete` one task per downstream concern is emitted: client
//! lookup when a client name is known, flight search always. One urgency
//! calculation feeds both task priority and the user-facing label.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use charterly_core::domain::conversation::{ConversationState, ConversationStep};
use charterly_core::domain::task::{
    priority_for_departure, AgentTask, TaskPriority, WorkerKind,
};
use charterly_core::domain::trip::{ThreadId, UserId};
use charterly_core::errors::ApplicationError;
use charterly_core::store::ConversationStore;

use crate::classify::{classify_or_default, IntentClassifier, MessageIntent};
use crate::dialogue::DialogueOrchestrator;
use crate::worker::{MetricsCell, Worker, WorkerContext, WorkerOutput};

const RECENT_TURN_WINDOW: usize = 6;

#[derive(Clone, Debug)]
pub struct OrchestratorReply {
    pub message: String,
    pub step: ConversationStep,
    pub complete: bool,
    pub tasks: Vec<AgentTask>,
}

pub struct TaskOrchestrator {
    store: Arc<dyn ConversationStore>,
    dialogue: DialogueOrchestrator,
    classifier: Arc<dyn IntentClassifier>,
    confidence_floor: f64,
    metrics: MetricsCell,
}

impl TaskOrchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        classifier: Arc<dyn IntentClassifier>,
        confidence_floor: f64,
        max_clarification_rounds: u64,
    ) -> Self {
        Self {
            store: store.clone(),
            dialogue: DialogueOrchestrator::new(store, max_clarification_rounds),
            classifier,
            confidence_floor,
            metrics: MetricsCell::new(),
        }
    }

    pub async fn handle_message(
        &self,
        thread_id: &ThreadId,
        user_id: &UserId,
        text: &str,
    ) -> Result<OrchestratorReply, ApplicationError> {
        self.handle_message_at(thread_id, user_id, text, Utc::now()).await
    }

    pub async fn handle_message_at(
        &self,
        thread_id: &ThreadId,
        user_id: &UserId,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<OrchestratorReply, ApplicationError> {
        let existing = self
            .store
            .get(thread_id)
            .await
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        let recent_turns: Vec<_> = existing
            .as_ref()
            .map(|state| {
                state.turns.iter().rev().take(RECENT_TURN_WINDOW).rev().cloned().collect()
            })
            .unwrap_or_default();

        let mut classification =
            classify_or_default(self.classifier.as_ref(), text, &recent_turns).await;
        if classification.confidence < self.confidence_floor {
            classification.label = MessageIntent::RequestCreate;
        }

        info!(
            event_name = "orchestrator.message_classified",
            thread_id = %thread_id.0,
            label = classification.label.as_str(),
            confidence = classification.confidence,
            "incoming message classified"
        );

        match classification.label {
            MessageIntent::SessionReset => {
                self.store
                    .delete(thread_id)
                    .await
                    .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
                Ok(OrchestratorReply {
                    message: "Done, I cleared that request. Where would you like to fly?"
                        .to_string(),
                    step: ConversationStep::CollectingRoute,
                    complete: false,
                    tasks: Vec::new(),
                })
            }
            MessageIntent::RequestStatus => Ok(status_reply(existing.as_ref())),
            MessageIntent::SmallTalk => {
                let step = existing
                    .as_ref()
                    .map(|state| state.current_step)
                    .unwrap_or(ConversationStep::CollectingRoute);
                Ok(OrchestratorReply {
                    message: "Happy to help with your charter whenever you are ready.".to_string(),
                    step,
                    complete: false,
                    tasks: Vec::new(),
                })
            }
            MessageIntent::RequestCreate => {
                let reply = self.dialogue.handle_turn_at(thread_id, user_id, text, now).await?;

                let mut state = reply.state;
                state
                    .metadata
                    .insert("last_intent".to_string(), json!(classification.label.as_str()));
                self.store
                    .set(state.clone())
                    .await
                    .map_err(|error| ApplicationError::Persistence(error.to_string()))?;

                let mut message = reply.message;
                let tasks = if reply.complete {
                    let tasks = self.plan_tasks(&state, now);
                    if let Some(priority) = tasks.first().map(|task| task.priority) {
                        message.push_str(&format!(
                            " Priority {}: {}.",
                            priority.as_str(),
                            priority.urgency_label()
                        ));
                    }
                    info!(
                        event_name = "orchestrator.tasks_emitted",
                        thread_id = %thread_id.0,
                        count = tasks.len(),
                        "downstream tasks emitted for completed request"
                    );
                    tasks
                } else {
                    Vec::new()
                };

                Ok(OrchestratorReply {
                    message,
                    step: reply.step,
                    complete: reply.complete,
                    tasks,
                })
            }
        }
    }

    /// One task per downstream concern. The departure-derived priority is the
    /// same value surfaced to the user, so scheduling and messaging cannot
    /// drift apart.
    pub fn plan_tasks(&self, state: &ConversationState, now: DateTime<Utc>) -> Vec<AgentTask> {
        let today = now.date_naive();
        let priority = state
            .data
            .departure_date
            .map(|departure| priority_for_departure(departure, today))
            .unwrap_or(TaskPriority::Normal);

        let mut tasks = Vec::new();

        if let Some(client_name) = &state.data.client_name {
            tasks.push(AgentTask::new(
                WorkerKind::ClientData,
                json!({"client_name": client_name, "thread_id": &state.thread_id.0}),
                priority,
                now,
            ));
        }

        tasks.push(AgentTask::new(
            WorkerKind::FlightSearch,
            json!({"request": &state.data, "thread_id": &state.thread_id.0}),
            priority,
            now,
        ));

        tasks
    }
}

fn status_reply(state: Option<&ConversationState>) -> OrchestratorReply {
    match state {
        None => OrchestratorReply {
            message: "No active request on this thread yet. Tell me where you want to fly."
                .to_string(),
            step: ConversationStep::CollectingRoute,
            complete: false,
            tasks: Vec::new(),
        },
        Some(state) if state.is_complete() => OrchestratorReply {
            message: "Your request is complete and out for search.".to_string(),
            step: ConversationStep::Complete,
            complete: true,
            tasks: Vec::new(),
        },
        Some(state) => {
            let labels: Vec<&str> =
                state.missing_fields.iter().map(|field| field.label()).collect();
            OrchestratorReply {
                message: format!("Still collecting details. Missing: {}.", labels.join(", ")),
                step: state.current_step,
                complete: false,
                tasks: Vec::new(),
            }
        }
    }
}

#[async_trait]
impl Worker for TaskOrchestrator {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Orchestrator
    }

    fn metrics_cell(&self) -> &MetricsCell {
        &self.metrics
    }

    async fn perform(&self, context: &WorkerContext) -> Result<WorkerOutput> {
        let thread_id = context
            .payload
            .get("thread_id")
            .and_then(serde_json::Value::as_str)
            .context("payload is missing required field `thread_id`")?;
        let user_id = context
            .payload
            .get("user_id")
            .and_then(serde_json::Value::as_str)
            .context("payload is missing required field `user_id`")?;
        let text = context
            .payload
            .get("text")
            .and_then(serde_json::Value::as_str)
            .context("payload is missing required field `text`")?;

        let reply = self
            .handle_message(
                &ThreadId(thread_id.to_string()),
                &UserId(user_id.to_string()),
                text,
            )
            .await?;

        Ok(WorkerOutput::new(
            json!({
                "message": reply.message,
                "step": reply.step.as_str(),
                "complete": reply.complete,
                "tasks": reply.tasks,
            }),
            1,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::bail;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use charterly_core::domain::conversation::ConversationTurn;
    use charterly_core::domain::task::{TaskPriority, TaskStatus, WorkerKind};
    use charterly_core::domain::trip::{ThreadId, UserId};
    use charterly_core::store::ConversationStore;
    use charterly_db::InMemoryConversationStore;

    use super::TaskOrchestrator;
    use crate::classify::{IntentClassification, IntentClassifier, KeywordIntentClassifier};

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap()
    }

    fn orchestrator() -> (TaskOrchestrator, Arc<InMemoryConversationStore>) {
        let store = Arc::new(InMemoryConversationStore::new());
        let orchestrator =
            TaskOrchestrator::new(store.clone(), Arc::new(KeywordIntentClassifier::new()), 0.4, 5);
        (orchestrator, store)
    }

    async fn send(orchestrator: &TaskOrchestrator, text: &str) -> super::OrchestratorReply {
        orchestrator
            .handle_message_at(
                &ThreadId("T-1".to_string()),
                &UserId("U-1".to_string()),
                text,
                now(),
            )
            .await
            .expect("message should be handled")
    }

    #[tokio::test]
    async fn completed_request_emits_flight_search_task() {
        let (orchestrator, _store) = orchestrator();

        let reply = send(
            &orchestrator,
            "Charter from Miami to Chicago tomorrow for 6 people, no preference",
        )
        .await;

        assert!(reply.complete, "reply was: {}", reply.message);
        assert_eq!(reply.tasks.len(), 1);
        assert_eq!(reply.tasks[0].kind, WorkerKind::FlightSearch);
        assert_eq!(reply.tasks[0].target, WorkerKind::FlightSearch);
        assert_eq!(reply.tasks[0].status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn known_client_adds_a_client_data_task() {
        let (orchestrator, _store) = orchestrator();

        let reply = send(
            &orchestrator,
            "Charter from Miami to Chicago tomorrow for 6 people, no preference, \
             client Harrison Ventures",
        )
        .await;

        assert!(reply.complete, "reply was: {}", reply.message);
        assert_eq!(reply.tasks.len(), 2);
        assert_eq!(reply.tasks[0].kind, WorkerKind::ClientData);
        assert_eq!(reply.tasks[1].kind, WorkerKind::FlightSearch);
    }

    #[tokio::test]
    async fn next_day_departures_are_urgent_in_task_and_message() {
        let (orchestrator, _store) = orchestrator();

        let reply = send(
            &orchestrator,
            "Charter from Miami to Chicago tomorrow for 6 people, no preference",
        )
        .await;

        assert_eq!(reply.tasks[0].priority, TaskPriority::Urgent);
        assert!(reply.message.contains("Priority urgent"));
        assert!(reply.message.contains("within 24 hours"));
    }

    #[tokio::test]
    async fn distant_departures_are_low_priority() {
        let (orchestrator, _store) = orchestrator();

        let reply = send(
            &orchestrator,
            "Charter from Miami to Chicago on 2026-06-01 for 6 people, no preference",
        )
        .await;

        assert!(reply.complete);
        assert_eq!(reply.tasks[0].priority, TaskPriority::Low);
    }

    #[tokio::test]
    async fn reset_deletes_the_thread_state() {
        let (orchestrator, store) = orchestrator();

        send(&orchestrator, "JFK to LAX").await;
        let reply = send(&orchestrator, "actually let's start over").await;

        assert!(reply.message.contains("cleared"));
        let stored = store.get(&ThreadId("T-1".to_string())).await.expect("store read");
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn status_reports_missing_fields() {
        let (orchestrator, _store) = orchestrator();

        send(&orchestrator, "JFK to LAX").await;
        let reply = send(&orchestrator, "what's the status?").await;

        assert!(!reply.complete);
        assert!(reply.message.contains("departure date"));
        assert!(reply.message.contains("passenger count"));
        assert!(reply.tasks.is_empty());
    }

    #[tokio::test]
    async fn small_talk_does_not_touch_the_request() {
        let (orchestrator, store) = orchestrator();

        send(&orchestrator, "JFK to LAX").await;
        let before =
            store.get(&ThreadId("T-1".to_string())).await.expect("read").expect("state");

        let reply = send(&orchestrator, "thanks!").await;
        assert!(reply.tasks.is_empty());

        let after = store.get(&ThreadId("T-1".to_string())).await.expect("read").expect("state");
        assert_eq!(before.data, after.data);
    }

    #[tokio::test]
    async fn classifier_failure_still_processes_the_request() {
        struct FailingClassifier;

        #[async_trait]
        impl IntentClassifier for FailingClassifier {
            async fn classify(
                &self,
                _utterance: &str,
                _recent_turns: &[ConversationTurn],
            ) -> anyhow::Result<IntentClassification> {
                bail!("classification service down")
            }
        }

        let store = Arc::new(InMemoryConversationStore::new());
        let orchestrator = TaskOrchestrator::new(store, Arc::new(FailingClassifier), 0.4, 5);

        let reply = orchestrator
            .handle_message_at(
                &ThreadId("T-1".to_string()),
                &UserId("U-1".to_string()),
                "JFK to LAX",
                now(),
            )
            .await
            .expect("message should be handled");

        // Safe default: treat as request creation and keep collecting.
        assert!(!reply.complete);
        assert!(reply.message.contains("departure date") || !reply.message.is_empty());
    }

    #[tokio::test]
    async fn last_intent_lands_in_state_metadata() {
        let (orchestrator, store) = orchestrator();

        send(&orchestrator, "JFK to LAX").await;
        let state = store.get(&ThreadId("T-1".to_string())).await.expect("read").expect("state");
        assert_eq!(
            state.metadata.get("last_intent").and_then(serde_json::Value::as_str),
            Some("request_create")
        );
    }
}
