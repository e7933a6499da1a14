use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::json;

use charterly_core::domain::task::WorkerKind;
use charterly_core::domain::trip::TripRequest;
use charterly_core::inference::CategoryInferrer;

use super::FlightOption;
use crate::worker::{MetricsCell, Worker, WorkerContext, WorkerOutput};

const MAX_RANKED: usize = 3;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoredOption {
    pub option: FlightOption,
    pub score: f64,
    pub reasoning: String,
}

/// Ranks marketplace options against the request: category fit against the
/// inferred recommendation, price against budget, and availability. Pure
/// control logic, no collaborators.
pub struct ProposalAnalysisWorker {
    inferrer: CategoryInferrer,
    metrics: MetricsCell,
}

impl ProposalAnalysisWorker {
    pub fn new() -> Self {
        Self { inferrer: CategoryInferrer::new(), metrics: MetricsCell::new() }
    }

    fn score(&self, request: &TripRequest, option: &FlightOption) -> Option<ScoredOption> {
        let passengers = i64::from(request.passengers.unwrap_or(1));
        if option.seats < passengers {
            return None;
        }

        let recommendation = self.inferrer.recommend(passengers);
        let mut reasons = Vec::new();

        let fit = if option.category == recommendation.category {
            reasons.push(format!("{} matches the recommended category", option.model));
            0.4
        } else if recommendation.alternatives.contains(&option.category) {
            reasons.push(format!("{} is a recommended alternative", option.model));
            0.25
        } else {
            0.1
        };

        let budget = match request.budget {
            None => 0.2,
            Some(budget) if option.price <= budget => {
                reasons.push("within budget".to_string());
                0.3
            }
            Some(budget) => {
                let ratio = (budget.to_f64().unwrap_or(0.0)
                    / option.price.to_f64().unwrap_or(f64::MAX))
                .clamp(0.0, 1.0);
                reasons.push("over budget".to_string());
                0.3 * ratio
            }
        };

        let availability = if option.available {
            0.2
        } else {
            reasons.push("subject to availability".to_string());
            0.0
        };

        if reasons.is_empty() {
            reasons.push("meets the seat requirement".to_string());
        }

        Some(ScoredOption {
            option: option.clone(),
            score: fit + budget + availability,
            reasoning: reasons.join("; "),
        })
    }
}

impl Default for ProposalAnalysisWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for ProposalAnalysisWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::ProposalAnalysis
    }

    fn metrics_cell(&self) -> &MetricsCell {
        &self.metrics
    }

    async fn perform(&self, context: &WorkerContext) -> Result<WorkerOutput> {
        let request: TripRequest = serde_json::from_value(
            context.payload.get("request").cloned().unwrap_or(serde_json::Value::Null),
        )
        .context("payload is missing a decodable `request`")?;
        let options: Vec<FlightOption> = serde_json::from_value(
            context.payload.get("options").cloned().unwrap_or_else(|| json!([])),
        )
        .context("payload `options` could not be decoded")?;

        let mut ranked: Vec<ScoredOption> =
            options.iter().filter_map(|option| self.score(&request, option)).collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(MAX_RANKED);

        let recommended = ranked.first().cloned();
        Ok(WorkerOutput::from(json!({
            "considered": options.len(),
            "ranked": ranked,
            "recommended": recommended,
        })))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    use charterly_core::domain::trip::TripRequest;
    use charterly_core::inference::AircraftCategory;

    use super::ProposalAnalysisWorker;
    use crate::worker::{Worker, WorkerContext};
    use crate::workers::FlightOption;

    fn request(budget: Option<i64>) -> TripRequest {
        TripRequest {
            departure: Some("JFK".to_string()),
            arrival: Some("LAX".to_string()),
            departure_date: NaiveDate::from_ymd_opt(2026, 6, 1),
            passengers: Some(6),
            budget: budget.map(Decimal::from),
            ..TripRequest::default()
        }
    }

    fn option(category: AircraftCategory, seats: i64, price: i64, available: bool) -> FlightOption {
        FlightOption {
            model: format!("{} test", category.label()),
            category,
            operator: "Skyline Air".to_string(),
            seats,
            price: Decimal::from(price),
            available,
        }
    }

    #[tokio::test]
    async fn ranks_the_recommended_category_first_when_affordable() {
        let worker = ProposalAnalysisWorker::new();
        let context = WorkerContext {
            payload: json!({
                "request": request(Some(40_000)),
                "options": [
                    option(AircraftCategory::Heavy, 16, 55_000, true),
                    option(AircraftCategory::Midsize, 9, 24_000, true),
                ],
            }),
            ..WorkerContext::default()
        };

        let result = worker.execute(&context).await;
        assert!(result.success);
        let data = result.data.expect("data");
        assert_eq!(data["recommended"]["option"]["category"], "midsize");
        assert!(data["recommended"]["reasoning"]
            .as_str()
            .unwrap_or_default()
            .contains("recommended category"));
    }

    #[tokio::test]
    async fn undersized_aircraft_are_excluded() {
        let worker = ProposalAnalysisWorker::new();
        let context = WorkerContext {
            payload: json!({
                "request": request(None),
                "options": [option(AircraftCategory::VeryLight, 5, 11_000, true)],
            }),
            ..WorkerContext::default()
        };

        let result = worker.execute(&context).await;
        let data = result.data.expect("data");
        assert_eq!(data["ranked"].as_array().map(Vec::len), Some(0));
        assert!(data["recommended"].is_null());
    }

    #[tokio::test]
    async fn ranking_is_capped_at_three() {
        let worker = ProposalAnalysisWorker::new();
        let context = WorkerContext {
            payload: json!({
                "request": request(None),
                "options": [
                    option(AircraftCategory::Midsize, 9, 24_000, true),
                    option(AircraftCategory::SuperMidsize, 10, 32_000, true),
                    option(AircraftCategory::Heavy, 16, 55_000, true),
                    option(AircraftCategory::UltraLongRange, 19, 85_000, true),
                ],
            }),
            ..WorkerContext::default()
        };

        let result = worker.execute(&context).await;
        let data = result.data.expect("data");
        assert_eq!(data["ranked"].as_array().map(Vec::len), Some(3));
        assert_eq!(data["considered"], 4);
    }
}
