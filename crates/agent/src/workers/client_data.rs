use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use charterly_core::domain::task::WorkerKind;
use charterly_core::inference::AircraftCategory;

use super::{ClientDirectory, ClientProfile};
use crate::worker::{MetricsCell, Worker, WorkerContext, WorkerOutput};

/// Name-keyed directory backed by a fixed list. Lookup is case-insensitive
/// on the full name or the company.
#[derive(Clone, Debug, Default)]
pub struct StaticClientDirectory {
    profiles: Vec<ClientProfile>,
}

impl StaticClientDirectory {
    pub fn new(profiles: Vec<ClientProfile>) -> Self {
        Self { profiles }
    }

    pub fn with_seed() -> Self {
        Self::new(vec![
            ClientProfile {
                name: "Harrison Ventures".to_string(),
                company: Some("Harrison Ventures LLC".to_string()),
                email: Some("travel@harrisonventures.example".to_string()),
                preferred_category: Some(AircraftCategory::SuperMidsize),
                past_trips: 12,
            },
            ClientProfile {
                name: "Dana Whitfield".to_string(),
                company: None,
                email: Some("dana.whitfield@example.com".to_string()),
                preferred_category: None,
                past_trips: 3,
            },
        ])
    }
}

#[async_trait]
impl ClientDirectory for StaticClientDirectory {
    async fn lookup(&self, name: &str) -> Result<Option<ClientProfile>> {
        let needle = name.trim().to_ascii_lowercase();
        Ok(self
            .profiles
            .iter()
            .find(|profile| {
                profile.name.to_ascii_lowercase() == needle
                    || profile
                        .company
                        .as_deref()
                        .is_some_and(|company| company.to_ascii_lowercase() == needle)
            })
            .cloned())
    }
}

pub struct ClientDataWorker {
    directory: Arc<dyn ClientDirectory>,
    metrics: MetricsCell,
}

impl ClientDataWorker {
    pub fn new(directory: Arc<dyn ClientDirectory>) -> Self {
        Self { directory, metrics: MetricsCell::new() }
    }
}

#[async_trait]
impl Worker for ClientDataWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::ClientData
    }

    fn metrics_cell(&self) -> &MetricsCell {
        &self.metrics
    }

    async fn perform(&self, context: &WorkerContext) -> Result<WorkerOutput> {
        let client_name = context
            .payload
            .get("client_name")
            .and_then(serde_json::Value::as_str)
            .context("payload is missing required field `client_name`")?;

        let profile = self.directory.lookup(client_name).await?;

        // An absent client is a data outcome, not a failure; the pipeline
        // carries on without profile enrichment.
        let data = match profile {
            Some(profile) => json!({"found": true, "client": profile}),
            None => json!({"found": false, "client_name": client_name}),
        };

        Ok(WorkerOutput::new(data, 1))
    }
}
