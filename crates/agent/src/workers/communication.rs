use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use charterly_core::domain::task::WorkerKind;

use super::MessageDelivery;
use crate::worker::{MetricsCell, Worker, WorkerContext, WorkerOutput};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveredMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Delivery port implementation that records instead of sending; used by
/// tests and the smoke command.
#[derive(Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<DeliveredMessage>>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<DeliveredMessage> {
        self.sent.lock().unwrap_or_else(|poison| poison.into_inner()).clone()
    }
}

#[async_trait]
impl MessageDelivery for RecordingDelivery {
    async fn deliver(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let mut sent = self.sent.lock().unwrap_or_else(|poison| poison.into_inner());
        sent.push(DeliveredMessage {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub struct CommunicationWorker {
    delivery: Arc<dyn MessageDelivery>,
    metrics: MetricsCell,
}

impl CommunicationWorker {
    pub fn new(delivery: Arc<dyn MessageDelivery>) -> Self {
        Self { delivery, metrics: MetricsCell::new() }
    }
}

#[async_trait]
impl Worker for CommunicationWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Communication
    }

    fn metrics_cell(&self) -> &MetricsCell {
        &self.metrics
    }

    async fn perform(&self, context: &WorkerContext) -> Result<WorkerOutput> {
        let recipient = context
            .payload
            .get("recipient")
            .and_then(serde_json::Value::as_str)
            .context("payload is missing required field `recipient`")?;

        let subject = context
            .payload
            .get("subject")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("Your charter proposal");

        let body = match context.payload.get("summary").and_then(serde_json::Value::as_str) {
            Some(summary) => summary.to_string(),
            None => "Your charter proposal is attached. Reply to confirm or adjust.".to_string(),
        };

        self.delivery.deliver(recipient, subject, &body).await?;

        Ok(WorkerOutput::new(json!({"delivered": true, "recipient": recipient}), 1))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::{CommunicationWorker, RecordingDelivery};
    use crate::worker::{Worker, WorkerContext};

    #[tokio::test]
    async fn delivers_the_summary_to_the_recipient() {
        let delivery = Arc::new(RecordingDelivery::new());
        let worker = CommunicationWorker::new(delivery.clone());
        let context = WorkerContext {
            payload: json!({
                "recipient": "dana.whitfield@example.com",
                "summary": "JFK to LAX on 2026-06-01, Citation Latitude, $24,000.",
            }),
            ..WorkerContext::default()
        };

        let result = worker.execute(&context).await;
        assert!(result.success);

        let sent = delivery.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "dana.whitfield@example.com");
        assert!(sent[0].body.contains("Citation Latitude"));
    }

    #[tokio::test]
    async fn missing_recipient_is_a_structured_failure() {
        let worker = CommunicationWorker::new(Arc::new(RecordingDelivery::new()));
        let result = worker.execute(&WorkerContext::default()).await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap_or_default().contains("recipient"));
    }
}
