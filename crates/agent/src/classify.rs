//! Message-intent classification.
//!
//! The classification service is an external collaborator behind the
//! `IntentClassifier` trait. A failed call never propagates: the caller
//! receives the safe default label (assume a request is being created) and
//! the conversation continues.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use charterly_core::domain::conversation::ConversationTurn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageIntent {
    RequestCreate,
    RequestStatus,
    SessionReset,
    SmallTalk,
}

impl MessageIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestCreate => "request_create",
            Self::RequestStatus => "request_status",
            Self::SessionReset => "session_reset",
            Self::SmallTalk => "small_talk",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub label: MessageIntent,
    pub confidence: f64,
    pub rationale: Option<String>,
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        utterance: &str,
        recent_turns: &[ConversationTurn],
    ) -> Result<IntentClassification>;
}

/// The label used whenever classification is unavailable or too uncertain.
pub fn safe_default() -> IntentClassification {
    IntentClassification {
        label: MessageIntent::RequestCreate,
        confidence: 0.0,
        rationale: Some("classifier unavailable; assuming request creation".to_string()),
    }
}

/// Classify, converting any service failure into the safe default instead of
/// surfacing it.
pub async fn classify_or_default(
    classifier: &dyn IntentClassifier,
    utterance: &str,
    recent_turns: &[ConversationTurn],
) -> IntentClassification {
    match classifier.classify(utterance, recent_turns).await {
        Ok(classification) => classification,
        Err(error) => {
            warn!(
                event_name = "classify.fallback_to_default",
                error = %error,
                "intent classification failed; using safe default"
            );
            safe_default()
        }
    }
}

/// Deterministic keyword classifier. Serves as the default provider and as
/// the fallback path when no remote classifier is configured.
#[derive(Clone, Debug, Default)]
pub struct KeywordIntentClassifier;

impl KeywordIntentClassifier {
    pub fn new() -> Self {
        Self
    }

    fn classify_text(&self, utterance: &str, recent_turns: &[ConversationTurn]) -> IntentClassification {
        let text = utterance.trim().to_ascii_lowercase();

        let reset_markers =
            ["start over", "start again", "reset", "cancel this", "never mind", "forget it"];
        if reset_markers.iter().any(|marker| text.contains(marker)) {
            return IntentClassification {
                label: MessageIntent::SessionReset,
                confidence: 0.9,
                rationale: Some("reset phrasing detected".to_string()),
            };
        }

        let status_markers =
            ["status", "where are we", "what's left", "what is left", "progress so far"];
        if status_markers.iter().any(|marker| text.contains(marker)) {
            return IntentClassification {
                label: MessageIntent::RequestStatus,
                confidence: 0.85,
                rationale: Some("status phrasing detected".to_string()),
            };
        }

        let trip_markers = [
            "fly", "flight", "trip", "charter", "jet", "from", " to ", "passenger", "people",
            "tomorrow", "depart", "return", "airport",
        ];
        let has_trip_signal = trip_markers.iter().any(|marker| text.contains(marker));

        let greeting_only = !has_trip_signal
            && text.split_whitespace().count() <= 4
            && ["hi", "hello", "hey", "good morning", "good afternoon", "thanks", "thank you"]
                .iter()
                .any(|greeting| text.starts_with(greeting));
        // A greeting mid-conversation is still small talk, but an opening
        // greeting with no history gets the request-creation default so the
        // flow can introduce itself by prompting for a route.
        if greeting_only && !recent_turns.is_empty() {
            return IntentClassification {
                label: MessageIntent::SmallTalk,
                confidence: 0.8,
                rationale: Some("greeting with no trip details".to_string()),
            };
        }

        IntentClassification {
            label: MessageIntent::RequestCreate,
            confidence: if has_trip_signal { 0.9 } else { 0.6 },
            rationale: None,
        }
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(
        &self,
        utterance: &str,
        recent_turns: &[ConversationTurn],
    ) -> Result<IntentClassification> {
        Ok(self.classify_text(utterance, recent_turns))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;
    use async_trait::async_trait;
    use chrono::Utc;

    use charterly_core::domain::conversation::{ConversationRole, ConversationTurn};

    use super::{
        classify_or_default, IntentClassification, IntentClassifier, KeywordIntentClassifier,
        MessageIntent,
    };

    struct FailingClassifier;

    #[async_trait]
    impl IntentClassifier for FailingClassifier {
        async fn classify(
            &self,
            _utterance: &str,
            _recent_turns: &[ConversationTurn],
        ) -> anyhow::Result<IntentClassification> {
            bail!("service unavailable")
        }
    }

    fn prior_turn() -> ConversationTurn {
        ConversationTurn {
            role: ConversationRole::Assistant,
            content: "Where are you flying?".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn classifier_failure_falls_back_to_request_creation() {
        let classification = classify_or_default(&FailingClassifier, "JFK to LAX", &[]).await;

        assert_eq!(classification.label, MessageIntent::RequestCreate);
        assert_eq!(classification.confidence, 0.0);
        assert!(classification.rationale.is_some());
    }

    #[tokio::test]
    async fn trip_phrasing_classifies_as_request_creation() {
        let classifier = KeywordIntentClassifier::new();
        let classification =
            classifier.classify("I need a flight from JFK to LAX tomorrow", &[]).await.unwrap();

        assert_eq!(classification.label, MessageIntent::RequestCreate);
        assert!(classification.confidence >= 0.9);
    }

    #[tokio::test]
    async fn reset_phrasing_classifies_as_session_reset() {
        let classifier = KeywordIntentClassifier::new();
        let classification =
            classifier.classify("let's start over please", &[prior_turn()]).await.unwrap();
        assert_eq!(classification.label, MessageIntent::SessionReset);
    }

    #[tokio::test]
    async fn status_phrasing_classifies_as_request_status() {
        let classifier = KeywordIntentClassifier::new();
        let classification =
            classifier.classify("what's the status of my request?", &[prior_turn()]).await.unwrap();
        assert_eq!(classification.label, MessageIntent::RequestStatus);
    }

    #[tokio::test]
    async fn mid_conversation_greeting_is_small_talk() {
        let classifier = KeywordIntentClassifier::new();
        let classification = classifier.classify("hey thanks!", &[prior_turn()]).await.unwrap();
        assert_eq!(classification.label, MessageIntent::SmallTalk);
    }

    #[tokio::test]
    async fn opening_greeting_defaults_to_request_creation() {
        let classifier = KeywordIntentClassifier::new();
        let classification = classifier.classify("hello", &[]).await.unwrap();
        assert_eq!(classification.label, MessageIntent::RequestCreate);
    }
}
