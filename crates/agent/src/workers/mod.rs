//! Concrete pipeline workers and the collaborator ports they call.
//!
//! The ports (marketplace, client directory, message delivery) stand in for
//! external integrations; the static implementations are deterministic so
//! the control logic around them stays fully testable.

pub mod client_data;
pub mod communication;
pub mod flight_search;
pub mod proposal;

pub use client_data::{ClientDataWorker, StaticClientDirectory};
pub use communication::{CommunicationWorker, RecordingDelivery};
pub use flight_search::{FlightSearchWorker, StaticMarketplace};
pub use proposal::ProposalAnalysisWorker;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use charterly_core::domain::trip::TripRequest;
use charterly_core::inference::AircraftCategory;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlightOption {
    pub model: String,
    pub category: AircraftCategory,
    pub operator: String,
    pub seats: i64,
    pub price: Decimal,
    pub available: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub preferred_category: Option<AircraftCategory>,
    pub past_trips: u32,
}

#[async_trait]
pub trait FlightMarketplace: Send + Sync {
    async fn search(&self, request: &TripRequest) -> Result<Vec<FlightOption>>;
}

#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<Option<ClientProfile>>;
}

#[async_trait]
pub trait MessageDelivery: Send + Sync {
    async fn deliver(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

pub(crate) fn representative_model(category: AircraftCategory) -> &'static str {
    match category {
        AircraftCategory::Turboprop => "King Air 350i",
        AircraftCategory::VeryLight => "Phenom 100EV",
        AircraftCategory::Light => "Citation CJ3+",
        AircraftCategory::Midsize => "Citation Latitude",
        AircraftCategory::SuperMidsize => "Challenger 350",
        AircraftCategory::Heavy => "Gulfstream G450",
        AircraftCategory::UltraLongRange => "Global 7500",
    }
}

pub(crate) fn baseline_price(category: AircraftCategory) -> Decimal {
    match category {
        AircraftCategory::Turboprop => Decimal::from(9_500),
        AircraftCategory::VeryLight => Decimal::from(11_000),
        AircraftCategory::Light => Decimal::from(16_500),
        AircraftCategory::Midsize => Decimal::from(24_000),
        AircraftCategory::SuperMidsize => Decimal::from(32_000),
        AircraftCategory::Heavy => Decimal::from(55_000),
        AircraftCategory::UltraLongRange => Decimal::from(85_000),
    }
}
