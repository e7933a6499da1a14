//! Per-field-group validation rules for a trip request.
//!
//! Validators are pure predicates over a request snapshot: no state, no
//! conversation history, no clock access beyond the `today` argument. The
//! dialogue loop and any final pre-submission check share these functions.

use chrono::NaiveDate;

use crate::domain::trip::TripRequest;

/// Passenger counts above this stay valid but get a large-group warning.
pub const LARGE_GROUP_THRESHOLD: u32 = 19;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub error: Option<String>,
    pub warning: Option<String>,
    pub suggestions: Vec<String>,
}

impl ValidationOutcome {
    pub fn ok() -> Self {
        Self { valid: true, ..Self::default() }
    }

    pub fn ok_with_warning(warning: impl Into<String>) -> Self {
        Self { valid: true, warning: Some(warning.into()), ..Self::default() }
    }

    fn invalid(error: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self { valid: false, error: Some(error.into()), warning: None, suggestions }
    }
}

/// Both endpoints present, non-empty and distinct. When one side is missing
/// the message names the side the caller already supplied so the next prompt
/// can be targeted.
pub fn validate_route(request: &TripRequest) -> ValidationOutcome {
    let departure = request.departure.as_deref().map(str::trim).filter(|value| !value.is_empty());
    let arrival = request.arrival.as_deref().map(str::trim).filter(|value| !value.is_empty());

    match (departure, arrival) {
        (None, None) => ValidationOutcome::invalid(
            "No route information yet.",
            vec!["Tell me where you are flying from and to, e.g. \"JFK to LAX\".".to_string()],
        ),
        (Some(departure), None) => ValidationOutcome::invalid(
            format!("Departure is set to {departure}, but the arrival is still missing."),
            vec![format!("Where are you flying to from {departure}?")],
        ),
        (None, Some(arrival)) => ValidationOutcome::invalid(
            format!("Arrival is set to {arrival}, but the departure is still missing."),
            vec![format!("Where are you departing from on the way to {arrival}?")],
        ),
        (Some(departure), Some(arrival)) => {
            if departure.eq_ignore_ascii_case(arrival) {
                ValidationOutcome::invalid(
                    format!("Departure and arrival are both {departure}; they must differ."),
                    vec!["Double-check the destination for this trip.".to_string()],
                )
            } else {
                ValidationOutcome::ok()
            }
        }
    }
}

/// Departure date required and not in the past (start-of-day comparison, so a
/// same-day request is valid). A return date must fall strictly after the
/// departure date.
pub fn validate_dates(request: &TripRequest, today: NaiveDate) -> ValidationOutcome {
    let Some(departure_date) = request.departure_date else {
        return ValidationOutcome::invalid(
            "No departure date yet.",
            vec!["When would you like to depart? A date or \"tomorrow\" both work.".to_string()],
        );
    };

    if departure_date < today {
        return ValidationOutcome::invalid(
            format!("Departure date {departure_date} is in the past."),
            vec![format!("Pick a date on or after {today}.")],
        );
    }

    if let Some(return_date) = request.return_date {
        if return_date <= departure_date {
            return ValidationOutcome::invalid(
                format!(
                    "Return date {return_date} is not after the departure date {departure_date}."
                ),
                vec!["For a round trip the return must come after the departure.".to_string()],
            );
        }
    }

    ValidationOutcome::ok()
}

/// Positive passenger count required. Large groups stay valid but carry a
/// warning so routing can branch to group handling.
pub fn validate_passengers(request: &TripRequest) -> ValidationOutcome {
    let Some(passengers) = request.passengers else {
        return ValidationOutcome::invalid(
            "No passenger count yet.",
            vec!["How many passengers are traveling?".to_string()],
        );
    };

    if passengers == 0 {
        return ValidationOutcome::invalid(
            "Passenger count must be at least one.",
            vec!["How many people are actually flying?".to_string()],
        );
    }

    if passengers > LARGE_GROUP_THRESHOLD {
        return ValidationOutcome::ok_with_warning(format!(
            "{passengers} passengers exceeds typical charter capacity; large-group \
             routing may need multiple aircraft or a commercial charter."
        ));
    }

    ValidationOutcome::ok()
}

/// Full-record check in field order; returns the first failing group so the
/// dialogue can re-prompt for exactly one thing. Warnings from passing groups
/// are preserved on the aggregate outcome.
pub fn validate_request(request: &TripRequest, today: NaiveDate) -> ValidationOutcome {
    let mut warning = None;

    for outcome in [
        validate_route(request),
        validate_dates(request, today),
        validate_passengers(request),
    ] {
        if !outcome.valid {
            return outcome;
        }
        if warning.is_none() {
            warning = outcome.warning;
        }
    }

    ValidationOutcome { valid: true, error: None, warning, suggestions: Vec::new() }
}
