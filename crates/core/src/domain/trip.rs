use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::inference::AircraftCategory;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Fields a trip request must carry before it can leave the conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Departure,
    Arrival,
    DepartureDate,
    Passengers,
}

pub const REQUIRED_FIELDS: [RequiredField; 4] = [
    RequiredField::Departure,
    RequiredField::Arrival,
    RequiredField::DepartureDate,
    RequiredField::Passengers,
];

impl RequiredField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Departure => "departure",
            Self::Arrival => "arrival",
            Self::DepartureDate => "departure_date",
            Self::Passengers => "passengers",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "departure" => Some(Self::Departure),
            "arrival" => Some(Self::Arrival),
            "departure_date" => Some(Self::DepartureDate),
            "passengers" => Some(Self::Passengers),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Departure => "departure location",
            Self::Arrival => "arrival location",
            Self::DepartureDate => "departure date",
            Self::Passengers => "passenger count",
        }
    }
}

/// Partially collected charter request. Every field stays optional until the
/// validator has confirmed it; the required-field sets on the conversation
/// state are derived from this record, never stored ad hoc.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub passengers: Option<u32>,
    pub aircraft_preference: Option<AircraftCategory>,
    pub budget: Option<Decimal>,
    pub special_requirements: Option<String>,
    pub client_name: Option<String>,
}

impl TripRequest {
    pub fn has_field(&self, field: RequiredField) -> bool {
        match field {
            RequiredField::Departure => {
                self.departure.as_deref().is_some_and(|value| !value.trim().is_empty())
            }
            RequiredField::Arrival => {
                self.arrival.as_deref().is_some_and(|value| !value.trim().is_empty())
            }
            RequiredField::DepartureDate => self.departure_date.is_some(),
            RequiredField::Passengers => self.passengers.is_some(),
        }
    }

    pub fn completed_fields(&self) -> Vec<RequiredField> {
        REQUIRED_FIELDS.iter().copied().filter(|field| self.has_field(*field)).collect()
    }

    pub fn missing_fields(&self) -> Vec<RequiredField> {
        REQUIRED_FIELDS.iter().copied().filter(|field| !self.has_field(*field)).collect()
    }

    pub fn is_round_trip(&self) -> bool {
        self.return_date.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{RequiredField, TripRequest, REQUIRED_FIELDS};

    #[test]
    fn required_field_round_trips_from_storage_encoding() {
        for field in REQUIRED_FIELDS {
            assert_eq!(RequiredField::parse(field.as_str()), Some(field));
        }
        assert_eq!(RequiredField::parse("budget"), None);
    }

    #[test]
    fn completed_and_missing_partition_the_required_set() {
        let request = TripRequest {
            departure: Some("Teterboro".to_string()),
            passengers: Some(4),
            ..TripRequest::default()
        };

        let completed = request.completed_fields();
        let missing = request.missing_fields();

        assert_eq!(completed, vec![RequiredField::Departure, RequiredField::Passengers]);
        assert_eq!(missing, vec![RequiredField::Arrival, RequiredField::DepartureDate]);
        assert_eq!(completed.len() + missing.len(), REQUIRED_FIELDS.len());
        for field in completed {
            assert!(!missing.contains(&field));
        }
    }

    #[test]
    fn whitespace_only_locations_do_not_count_as_collected() {
        let request = TripRequest { departure: Some("   ".to_string()), ..TripRequest::default() };
        assert!(!request.has_field(RequiredField::Departure));
    }
}
