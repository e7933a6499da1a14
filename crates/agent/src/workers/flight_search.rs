use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;

use charterly_core::domain::task::WorkerKind;
use charterly_core::domain::trip::TripRequest;
use charterly_core::inference::CategoryInferrer;

use super::{baseline_price, representative_model, FlightMarketplace, FlightOption};
use crate::worker::{MetricsCell, Worker, WorkerContext, WorkerOutput};

/// Deterministic marketplace: derives options from the category
/// recommendation for the requested passenger count, one per primary and
/// alternative category, round trips priced at both legs.
#[derive(Clone, Debug, Default)]
pub struct StaticMarketplace {
    inferrer: CategoryInferrer,
}

impl StaticMarketplace {
    pub fn new() -> Self {
        Self::default()
    }
}

const OPERATORS: [&str; 3] = ["Skyline Air", "Meridian Jets", "Apex Aviation"];

#[async_trait]
impl FlightMarketplace for StaticMarketplace {
    async fn search(&self, request: &TripRequest) -> Result<Vec<FlightOption>> {
        let passengers = i64::from(request.passengers.unwrap_or(1));
        let recommendation = self.inferrer.recommend(passengers);
        let leg_factor =
            if request.is_round_trip() { Decimal::from(2) } else { Decimal::from(1) };

        let categories =
            std::iter::once(recommendation.category).chain(recommendation.alternatives);

        Ok(categories
            .enumerate()
            .map(|(index, category)| FlightOption {
                model: representative_model(category).to_string(),
                category,
                operator: OPERATORS[index % OPERATORS.len()].to_string(),
                seats: category.band().max_pax,
                price: baseline_price(category) * leg_factor,
                available: category.band().max_pax >= passengers,
            })
            .collect())
    }
}

pub struct FlightSearchWorker {
    marketplace: Arc<dyn FlightMarketplace>,
    metrics: MetricsCell,
}

impl FlightSearchWorker {
    pub fn new(marketplace: Arc<dyn FlightMarketplace>) -> Self {
        Self { marketplace, metrics: MetricsCell::new() }
    }
}

#[async_trait]
impl Worker for FlightSearchWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::FlightSearch
    }

    fn metrics_cell(&self) -> &MetricsCell {
        &self.metrics
    }

    async fn perform(&self, context: &WorkerContext) -> Result<WorkerOutput> {
        let request: TripRequest = serde_json::from_value(
            context.payload.get("request").cloned().unwrap_or(serde_json::Value::Null),
        )
        .context("payload is missing a decodable `request`")?;

        let missing = request.missing_fields();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|field| field.as_str()).collect();
            bail!("validation failed, missing required fields: {}", names.join(", "));
        }

        let options = self.marketplace.search(&request).await?;

        Ok(WorkerOutput::new(
            json!({
                "route": {
                    "departure": request.departure,
                    "arrival": request.arrival,
                },
                "count": options.len(),
                "options": options,
            }),
            1,
        ))
    }
}
