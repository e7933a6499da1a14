//! Multi-turn dialogue orchestration.
//!
//! Drives one conversation from "nothing collected" to a complete, validated
//! trip request. Each turn: load state, extract fields from the utterance,
//! merge without clobbering good data, validate, advance the step machine,
//! log the turn and persist the whole state. All suspension points live
//! here; extraction and validation stay synchronous and pure.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use charterly_core::domain::conversation::{
    ConversationRole, ConversationState, ConversationStep,
};
use charterly_core::domain::trip::{ThreadId, TripRequest, UserId};
use charterly_core::errors::ApplicationError;
use charterly_core::inference::CategoryInferrer;
use charterly_core::store::ConversationStore;
use charterly_core::validate::{
    validate_dates, validate_passengers, validate_route, ValidationOutcome,
};

use crate::conversation::{ExtractedFields, IntentExtractor};

/// A merged value only replaces an existing one when the new extraction is
/// at least this confident; filling an empty slot has no floor.
const OVERWRITE_FLOOR: f64 = 0.9;

const PREFERENCES_PROMPTED_KEY: &str = "preferences_prompted";

#[derive(Clone, Debug)]
pub struct DialogueReply {
    pub message: String,
    pub step: ConversationStep,
    pub complete: bool,
    pub warning: Option<String>,
    pub state: ConversationState,
}

pub struct DialogueOrchestrator {
    store: Arc<dyn ConversationStore>,
    extractor: IntentExtractor,
    inferrer: CategoryInferrer,
    max_clarification_rounds: u64,
}

impl DialogueOrchestrator {
    pub fn new(store: Arc<dyn ConversationStore>, max_clarification_rounds: u64) -> Self {
        Self {
            store,
            extractor: IntentExtractor::new(),
            inferrer: CategoryInferrer::new(),
            max_clarification_rounds,
        }
    }

    pub async fn handle_turn(
        &self,
        thread_id: &ThreadId,
        user_id: &UserId,
        text: &str,
    ) -> Result<DialogueReply, ApplicationError> {
        self.handle_turn_at(thread_id, user_id, text, Utc::now()).await
    }

    pub async fn handle_turn_at(
        &self,
        thread_id: &ThreadId,
        user_id: &UserId,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<DialogueReply, ApplicationError> {
        let today = now.date_naive();

        let mut state = self
            .store
            .get(thread_id)
            .await
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?
            .unwrap_or_else(|| ConversationState::new(thread_id.clone(), user_id.clone(), now));

        state.push_turn(ConversationRole::User, text, now);
        let extracted = self.extractor.extract(text, today);

        // Ambiguous date extraction bypasses merge/validate/advance entirely:
        // an ambiguous guess is never committed to the request record.
        if extracted.dates.ambiguous && state.data.departure_date.is_none() {
            let rounds = state.bump_clarification_rounds();
            let mut message = extracted
                .dates
                .clarification
                .clone()
                .unwrap_or_else(|| "Could you give me an exact departure date?".to_string());
            if rounds >= self.max_clarification_rounds {
                message.push_str(" A concrete date like 2026-04-15 gets us there fastest.");
            }

            state.push_turn(ConversationRole::Assistant, message.clone(), now);
            self.persist(&state).await?;
            return Ok(DialogueReply {
                message,
                step: state.current_step,
                complete: false,
                warning: None,
                state,
            });
        }

        // A waved-off preferences question resolves that round by policy;
        // the extractor itself never commits a default.
        if crate::conversation::mentions_no_preference(text) {
            state.metadata.insert(PREFERENCES_PROMPTED_KEY.to_string(), serde_json::json!(true));
        }

        merge_extracted(&mut state.data, &extracted, state.current_step);
        debug!(
            event_name = "dialogue.fields_merged",
            thread_id = %thread_id.0,
            missing = ?state.data.missing_fields(),
            "merged extracted fields into the request record"
        );

        let reply = match first_validation_failure(&state.data, today) {
            Some((failed_step, outcome)) => {
                state.recompute_fields();
                state.set_step(failed_step, now);
                let message = failure_prompt(&outcome);
                state.push_turn(ConversationRole::Assistant, message.clone(), now);
                DialogueReply {
                    message,
                    step: state.current_step,
                    complete: false,
                    warning: outcome.warning,
                    state: state.clone(),
                }
            }
            None => {
                // No validation failure means every required field is present
                // and valid, so refresh lands on Complete; the only open
                // question is whether preferences were ever offered.
                let warning = collected_warning(&state.data);
                state.refresh(now);

                if !preferences_resolved(&state) {
                    state
                        .metadata
                        .insert(PREFERENCES_PROMPTED_KEY.to_string(), serde_json::json!(true));
                    state.set_step(ConversationStep::CollectingPreferences, now);
                    let message = self.preferences_prompt(&state.data);
                    state.push_turn(ConversationRole::Assistant, message.clone(), now);
                    DialogueReply {
                        message,
                        step: state.current_step,
                        complete: false,
                        warning,
                        state: state.clone(),
                    }
                } else {
                    let message = completion_summary(&state.data, warning.as_deref());
                    state.push_turn(ConversationRole::Assistant, message.clone(), now);
                    DialogueReply {
                        message,
                        step: ConversationStep::Complete,
                        complete: true,
                        warning,
                        state: state.clone(),
                    }
                }
            }
        };

        self.persist(&reply.state).await?;
        info!(
            event_name = "dialogue.turn_handled",
            thread_id = %thread_id.0,
            step = reply.step.as_str(),
            complete = reply.complete,
            "dialogue turn handled"
        );
        Ok(reply)
    }

    async fn persist(&self, state: &ConversationState) -> Result<(), ApplicationError> {
        self.store
            .set(state.clone())
            .await
            .map_err(|error| ApplicationError::Persistence(error.to_string()))
    }

    fn preferences_prompt(&self, data: &TripRequest) -> String {
        let recommendation = data
            .passengers
            .map(|passengers| self.inferrer.recommend(i64::from(passengers)));

        match recommendation {
            Some(recommendation) => format!(
                "Almost there. {} Any aircraft preference, budget, or special requirements? \
                 \"No preference\" works too.",
                recommendation.reasoning
            ),
            None => "Almost there. Any aircraft preference, budget, or special requirements?"
                .to_string(),
        }
    }
}

/// Runs the group validators in field order and reports the step owning the
/// first failure, so the flow stays on (or returns to) the broken group.
fn first_validation_failure(
    data: &TripRequest,
    today: chrono::NaiveDate,
) -> Option<(ConversationStep, ValidationOutcome)> {
    let route = validate_route(data);
    if !route.valid {
        return Some((ConversationStep::CollectingRoute, route));
    }

    let dates = validate_dates(data, today);
    if !dates.valid {
        return Some((ConversationStep::CollectingDates, dates));
    }

    let passengers = validate_passengers(data);
    if !passengers.valid {
        return Some((ConversationStep::CollectingPassengers, passengers));
    }

    None
}

fn merge_extracted(data: &mut TripRequest, extracted: &ExtractedFields, step: ConversationStep) {
    let route = &extracted.route;
    if route.departure.is_some() && route.arrival.is_some() {
        if data.departure.is_none() || route.confidence >= OVERWRITE_FLOOR {
            data.departure = route.departure.clone();
        }
        if data.arrival.is_none() || route.confidence >= OVERWRITE_FLOOR {
            data.arrival = route.arrival.clone();
        }
    } else if step == ConversationStep::CollectingRoute {
        // One-sided mentions are low confidence and only trusted while the
        // flow is actually asking about the route, and only into empty slots.
        if let Some(single) = route.single_location() {
            if data.departure.is_some() && data.arrival.is_none() {
                data.arrival = Some(single.to_string());
            } else if data.departure.is_none() && data.arrival.is_some() {
                data.departure = Some(single.to_string());
            } else if data.departure.is_none() && route.departure.is_some() {
                data.departure = Some(single.to_string());
            } else if data.arrival.is_none() && route.arrival.is_some() {
                data.arrival = Some(single.to_string());
            }
        }
    }

    let dates = &extracted.dates;
    if let Some(departure_date) = dates.departure_date {
        if data.departure_date.is_none() || dates.confidence >= OVERWRITE_FLOOR {
            data.departure_date = Some(departure_date);
        }
    }
    if let Some(return_date) = dates.return_date {
        if data.return_date.is_none() || dates.confidence >= OVERWRITE_FLOOR {
            data.return_date = Some(return_date);
        }
    }

    if let Some(count) = extracted.passengers.count {
        if data.passengers.is_none() || extracted.passengers.confidence >= OVERWRITE_FLOOR {
            data.passengers = Some(count);
        }
    }

    if let Some(category) = extracted.aircraft.category {
        if data.aircraft_preference.is_none() || extracted.aircraft.confidence >= OVERWRITE_FLOOR {
            data.aircraft_preference = Some(category);
        }
    }

    if let Some(amount) = extracted.budget.amount {
        if data.budget.is_none() || extracted.budget.confidence >= OVERWRITE_FLOOR {
            data.budget = Some(amount);
        }
    }

    if data.special_requirements.is_none() {
        data.special_requirements = extracted.special_requirements.clone();
    }
    if data.client_name.is_none() {
        data.client_name = extracted.client_name.clone();
    }
}

fn preferences_resolved(state: &ConversationState) -> bool {
    let already_prompted = state
        .metadata
        .get(PREFERENCES_PROMPTED_KEY)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);

    already_prompted
        || state.data.aircraft_preference.is_some()
        || state.data.budget.is_some()
        || state.data.special_requirements.is_some()
}

fn collected_warning(data: &TripRequest) -> Option<String> {
    validate_passengers(data).warning
}

fn failure_prompt(outcome: &ValidationOutcome) -> String {
    let mut message = outcome.error.clone().unwrap_or_else(|| "That did not work.".to_string());
    for suggestion in &outcome.suggestions {
        message.push(' ');
        message.push_str(suggestion);
    }
    message
}

fn completion_summary(data: &TripRequest, warning: Option<&str>) -> String {
    let departure = data.departure.as_deref().unwrap_or("?");
    let arrival = data.arrival.as_deref().unwrap_or("?");
    let passengers = data.passengers.unwrap_or_default();

    let mut message = match data.departure_date {
        Some(date) => format!(
            "Your request is complete: {departure} to {arrival}, departing {date}, \
             {passengers} passengers."
        ),
        None => format!("Your request is complete: {departure} to {arrival}."),
    };

    if let Some(return_date) = data.return_date {
        message.push_str(&format!(" Returning {return_date}."));
    }
    if let Some(category) = data.aircraft_preference {
        message.push_str(&format!(" Preferred aircraft: {}.", category.label()));
    }
    if let Some(warning) = warning {
        message.push_str(&format!(" Note: {warning}"));
    }
    message.push_str(" Searching the marketplace now.");
    message
}
