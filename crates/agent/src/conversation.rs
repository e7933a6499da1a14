//! Per-utterance field extraction.
//!
//! One utterance in, partial trip fields out, each group with a confidence
//! in [0, 1] (0 meaning nothing recognized). Patterns are tried in
//! descending specificity and the first successful pattern wins. Everything
//! here is pure: date resolution takes `today` as an argument and no state
//! survives between calls.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use charterly_core::inference::AircraftCategory;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteExtraction {
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub confidence: f64,
}

impl RouteExtraction {
    fn none() -> Self {
        Self::default()
    }

    /// The single endpoint of a one-sided mention, if that is all we got.
    pub fn single_location(&self) -> Option<&str> {
        match (&self.departure, &self.arrival) {
            (Some(location), None) | (None, Some(location)) => Some(location.as_str()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DateExtraction {
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub confidence: f64,
    pub ambiguous: bool,
    pub clarification: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PassengerExtraction {
    pub count: Option<u32>,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AircraftExtraction {
    pub category: Option<AircraftCategory>,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BudgetExtraction {
    pub amount: Option<Decimal>,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedFields {
    pub route: RouteExtraction,
    pub dates: DateExtraction,
    pub passengers: PassengerExtraction,
    pub aircraft: AircraftExtraction,
    pub budget: BudgetExtraction,
    pub special_requirements: Option<String>,
    pub client_name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct IntentExtractor;

impl IntentExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str, today: NaiveDate) -> ExtractedFields {
        ExtractedFields {
            route: extract_route(text),
            dates: extract_dates(text, today),
            passengers: extract_passengers(text),
            aircraft: extract_aircraft(text),
            budget: extract_budget(text),
            special_requirements: extract_special_requirements(text),
            client_name: extract_client_name(text),
        }
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

static AIRPORT_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{3})\s*(?:to|->|-)\s*([A-Z]{3})\b").expect("valid regex"));
static FROM_TO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfrom\s+(.+?)\s+to\s+(.+)").expect("valid regex"));
static VERB_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:flying|fly|going|go|travel(?:ing|ling)?|heading)\s+from\b")
        .expect("valid regex")
});
static TO_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:flying|fly|going|heading|travel(?:ing|ling)?)\s+to\s+(.+?)\s+from\s+(.+)")
        .expect("valid regex")
});
static GENERIC_TO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)\s+to\s+(.+)$").expect("valid regex"));
static ONE_SIDED_FROM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfrom\s+(.+)$").expect("valid regex"));
static ONE_SIDED_TO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bto\s+(.+)$").expect("valid regex"));
// Case-sensitive on purpose: a bare location mention is only trusted when it
// is written like a proper noun ("Aspen", "just Teterboro").
static BARE_LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[Jj]ust\s+)?([A-Z][A-Za-z\s.'-]{1,40})$").expect("valid regex"));

const LOCATION_STOP_WORDS: &[&str] = &[
    "on", "for", "with", "departing", "leaving", "next", "this", "tomorrow", "today", "returning",
    "return", "in", "at", "around", "by", "and", "we", "i", "need", "want", "book", "charter",
    "flight", "fly", "flying", "please", "passengers", "people", "one", "hello", "hi", "hey",
    "thanks", "thank", "yes", "no", "ok", "okay", "sure",
];

/// Tries route patterns in priority order and stops at the first success.
pub fn extract_route(text: &str) -> RouteExtraction {
    if let Some(captures) = AIRPORT_PAIR.captures(text) {
        return RouteExtraction {
            departure: Some(captures[1].to_string()),
            arrival: Some(captures[2].to_string()),
            confidence: 0.95,
        };
    }

    if let Some(captures) = FROM_TO.captures(text) {
        let departure = trim_location(&captures[1]);
        let arrival = trim_location(&captures[2]);
        if let (Some(departure), Some(arrival)) = (departure, arrival) {
            // Plain "from X to Y" reads as a direct statement; a leading
            // travel verb marks the looser conversational phrasing.
            let confidence = if VERB_FROM.is_match(text) { 0.85 } else { 0.95 };
            return RouteExtraction {
                departure: Some(departure),
                arrival: Some(arrival),
                confidence,
            };
        }
    }

    if let Some(captures) = TO_FROM.captures(text) {
        let arrival = trim_location(&captures[1]);
        let departure = trim_location(&captures[2]);
        if let (Some(departure), Some(arrival)) = (departure, arrival) {
            return RouteExtraction {
                departure: Some(departure),
                arrival: Some(arrival),
                confidence: 0.85,
            };
        }
    }

    if let Some(captures) = GENERIC_TO.captures(text) {
        let departure = trim_location(&captures[1]);
        let arrival = trim_location(&captures[2]);
        if let (Some(departure), Some(arrival)) = (departure, arrival) {
            return RouteExtraction {
                departure: Some(departure),
                arrival: Some(arrival),
                confidence: 0.90,
            };
        }
    }

    if let Some(captures) = ONE_SIDED_FROM.captures(text) {
        if let Some(departure) = trim_location(&captures[1]) {
            return RouteExtraction {
                departure: Some(departure),
                arrival: None,
                confidence: 0.50,
            };
        }
    }

    if let Some(captures) = ONE_SIDED_TO.captures(text) {
        if let Some(arrival) = trim_location(&captures[1]) {
            return RouteExtraction { departure: None, arrival: Some(arrival), confidence: 0.40 };
        }
    }

    if let Some(captures) = BARE_LOCATION.captures(text) {
        if let Some(location) = trim_location(&captures[1]) {
            return RouteExtraction {
                departure: Some(location),
                arrival: None,
                confidence: 0.30,
            };
        }
    }

    RouteExtraction::none()
}

/// Cuts a raw capture down to something that plausibly names a place: stops
/// at the first stop word, digit or punctuation, and rejects leftovers that
/// read as sentence fragments.
fn trim_location(raw: &str) -> Option<String> {
    let mut words = Vec::new();

    for word in raw.split_whitespace() {
        let cleaned: String =
            word.trim_matches(|ch: char| ch.is_ascii_punctuation() && ch != '\'').to_string();
        if cleaned.is_empty() {
            break;
        }
        if cleaned.chars().any(|ch| ch.is_ascii_digit()) {
            break;
        }
        if LOCATION_STOP_WORDS.contains(&cleaned.to_ascii_lowercase().as_str()) {
            break;
        }
        words.push(cleaned);
        if words.len() == 4 {
            break;
        }
    }

    if words.is_empty() {
        return None;
    }
    Some(words.join(" "))
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("valid regex"));
static MONTH_NAME_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:t|tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s*(\d{4}))?\b",
    )
    .expect("valid regex")
});
static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{2,4}))?\b").expect("valid regex"));
static IN_N_DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bin\s+(\d{1,2})\s+days?\b").expect("valid regex"));
static RETURNING_IN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:returning|return|coming\s+back|back)\s+in\s+(\d{1,2})\s+days?\b")
        .expect("valid regex")
});
static FOR_N_DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfor\s+(\d{1,2})\s+(?:days?|nights?)\b").expect("valid regex"));
static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:(next|this)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .expect("valid regex")
});

/// Resolves departure and return dates in priority order: explicit dates,
/// relative terms, weekday references, compound relative returns. A bare
/// "next month" is flagged ambiguous instead of guessed.
pub fn extract_dates(text: &str, today: NaiveDate) -> DateExtraction {
    let explicit = explicit_dates(text, today);

    let (departure_date, mut confidence) = match explicit.first() {
        Some((date, pattern_confidence)) => (Some(*date), *pattern_confidence),
        None => relative_departure(text, today),
    };

    let mut return_date = explicit.get(1).map(|(date, _)| *date);

    if let Some(departure) = departure_date {
        if return_date.is_none() {
            return_date = relative_return(text, departure);
        }
    }

    if departure_date.is_none() {
        let lowered = text.to_ascii_lowercase();
        if lowered.contains("next month") {
            return DateExtraction {
                departure_date: None,
                return_date: None,
                confidence: 0.0,
                ambiguous: true,
                clarification: Some(
                    "Next month covers a range of dates. Which day would you like to depart?"
                        .to_string(),
                ),
            };
        }
        confidence = 0.0;
    }

    DateExtraction { departure_date, return_date, confidence, ambiguous: false, clarification: None }
}

/// Explicit calendar dates in order of appearance, most specific notation
/// first. Dates without a year roll to the next occurrence when the naive
/// same-year reading is already past.
fn explicit_dates(text: &str, today: NaiveDate) -> Vec<(NaiveDate, f64)> {
    let mut found: Vec<(usize, NaiveDate, f64)> = Vec::new();

    for captures in ISO_DATE.captures_iter(text) {
        let position = captures.get(0).map(|m| m.start()).unwrap_or_default();
        let year: i32 = captures[1].parse().unwrap_or_default();
        let month: u32 = captures[2].parse().unwrap_or_default();
        let day: u32 = captures[3].parse().unwrap_or_default();
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            found.push((position, date, 0.95));
        }
    }

    for captures in MONTH_NAME_DATE.captures_iter(text) {
        let position = captures.get(0).map(|m| m.start()).unwrap_or_default();
        let Some(month) = month_from_name(&captures[1]) else { continue };
        let day: u32 = captures[2].parse().unwrap_or_default();

        match captures.get(3) {
            Some(year_match) => {
                let year: i32 = year_match.as_str().parse().unwrap_or_default();
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    found.push((position, date, 0.95));
                }
            }
            None => {
                if let Some(date) = roll_forward(today, month, day) {
                    found.push((position, date, 0.90));
                }
            }
        }
    }

    for captures in SLASH_DATE.captures_iter(text) {
        let position = captures.get(0).map(|m| m.start()).unwrap_or_default();
        let month: u32 = captures[1].parse().unwrap_or_default();
        let day: u32 = captures[2].parse().unwrap_or_default();

        match captures.get(3) {
            Some(year_match) => {
                let mut year: i32 = year_match.as_str().parse().unwrap_or_default();
                if year < 100 {
                    year += 2000;
                }
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    found.push((position, date, 0.90));
                }
            }
            None => {
                if let Some(date) = roll_forward(today, month, day) {
                    found.push((position, date, 0.85));
                }
            }
        }
    }

    found.sort_by_key(|(position, _, _)| *position);
    found.dedup_by_key(|(_, date, _)| *date);
    found.into_iter().map(|(_, date, confidence)| (date, confidence)).collect()
}

fn relative_departure(text: &str, today: NaiveDate) -> (Option<NaiveDate>, f64) {
    let lowered = text.to_ascii_lowercase();

    if lowered.contains("day after tomorrow") {
        return (Some(today + Duration::days(2)), 0.90);
    }
    if lowered.contains("tomorrow") {
        return (Some(today + Duration::days(1)), 0.90);
    }
    if lowered.contains("today") || lowered.contains("tonight") {
        return (Some(today), 0.90);
    }
    // Resolved literally; validation rejects it as a past date downstream.
    if lowered.contains("yesterday") {
        return (Some(today - Duration::days(1)), 0.90);
    }
    if lowered.contains("next week") {
        return (Some(today + Duration::days(7)), 0.85);
    }

    // "in N days" only counts as a departure when it is not the tail of a
    // "returning in N days" compound.
    if let Some(captures) = IN_N_DAYS.captures(text) {
        let whole = captures.get(0).map(|m| m.start()).unwrap_or_default();
        let is_return_tail = RETURNING_IN
            .captures(text)
            .and_then(|ret| ret.get(0))
            .is_some_and(|ret| ret.start() <= whole && whole < ret.end());
        if !is_return_tail {
            let days: i64 = captures[1].parse().unwrap_or_default();
            return (Some(today + Duration::days(days)), 0.90);
        }
    }

    if let Some(captures) = WEEKDAY.captures(text) {
        if let Some(weekday) = weekday_from_name(&captures[2]) {
            return (Some(next_weekday(today, weekday)), 0.85);
        }
    }

    (None, 0.0)
}

fn relative_return(text: &str, departure: NaiveDate) -> Option<NaiveDate> {
    if let Some(captures) = RETURNING_IN.captures(text) {
        let days: i64 = captures[1].parse().unwrap_or_default();
        return Some(departure + Duration::days(days));
    }

    if let Some(captures) = FOR_N_DAYS.captures(text) {
        let days: i64 = captures[1].parse().unwrap_or_default();
        return Some(departure + Duration::days(days));
    }

    None
}

fn roll_forward(today: NaiveDate, month: u32, day: u32) -> Option<NaiveDate> {
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
    match this_year {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let prefix: String = name.to_ascii_lowercase().chars().take(3).collect();
    match prefix.as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.to_ascii_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Next occurrence strictly after today, so "next monday" on a Monday means
/// a week out.
fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let today_index = today.weekday().num_days_from_monday() as i64;
    let target_index = weekday.num_days_from_monday() as i64;
    let mut ahead = (target_index - today_index).rem_euclid(7);
    if ahead == 0 {
        ahead = 7;
    }
    today + Duration::days(ahead)
}

// ---------------------------------------------------------------------------
// Passengers
// ---------------------------------------------------------------------------

static PAX_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,3})\s*(?:passengers?|people|pax|guests?|travel(?:l)?ers?|adults?|persons?)\b",
    )
    .expect("valid regex")
});
static PARTY_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:party|group|family|team)\s+of\s+(\w+)\b").expect("valid regex")
});
static OF_US: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,3})\s+of\s+us\b").expect("valid regex"));
static FOR_N: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfor\s+(\d{1,3})\s*([a-z]*)").expect("valid regex"));

pub fn extract_passengers(text: &str) -> PassengerExtraction {
    if let Some(captures) = PAX_COUNT.captures(text) {
        if let Ok(count) = captures[1].parse::<u32>() {
            return PassengerExtraction { count: Some(count), confidence: 0.95 };
        }
    }

    let lowered = text.to_ascii_lowercase();
    if ["just me", "only me", "by myself", "solo trip", "traveling alone", "travelling alone"]
        .iter()
        .any(|phrase| lowered.contains(phrase))
    {
        return PassengerExtraction { count: Some(1), confidence: 0.90 };
    }

    if let Some(captures) = PARTY_OF.captures(text) {
        if let Some(count) = parse_count_word(&captures[1]) {
            return PassengerExtraction { count: Some(count), confidence: 0.90 };
        }
    }

    if let Some(captures) = OF_US.captures(text) {
        if let Ok(count) = captures[1].parse::<u32>() {
            return PassengerExtraction { count: Some(count), confidence: 0.90 };
        }
    }

    // "for N" only reads as a passenger count when no unit word follows,
    // so "for 5 days" or "for 50k" never lands here.
    if let Some(captures) = FOR_N.captures(text) {
        let unit = captures[2].to_ascii_lowercase();
        let excluded = [
            "day", "days", "night", "nights", "hour", "hours", "week", "weeks", "k", "dollars",
            "usd", "grand",
        ];
        if !excluded.contains(&unit.as_str()) {
            if let Ok(count) = captures[1].parse::<u32>() {
                return PassengerExtraction { count: Some(count), confidence: 0.70 };
            }
        }
    }

    PassengerExtraction::default()
}

fn parse_count_word(word: &str) -> Option<u32> {
    if let Ok(count) = word.parse::<u32>() {
        return Some(count);
    }
    match word.to_ascii_lowercase().as_str() {
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Aircraft
// ---------------------------------------------------------------------------

const NO_PREFERENCE_PHRASES: &[&str] = &[
    "no preference",
    "any aircraft",
    "any jet",
    "anything works",
    "don't care",
    "doesn't matter",
    "whatever works",
];

// Ordered most specific first; the first hit wins.
const CATEGORY_NAMES: &[(&str, AircraftCategory)] = &[
    ("super midsize", AircraftCategory::SuperMidsize),
    ("super-midsize", AircraftCategory::SuperMidsize),
    ("super mid", AircraftCategory::SuperMidsize),
    ("ultra long range", AircraftCategory::UltraLongRange),
    ("ultra-long-range", AircraftCategory::UltraLongRange),
    ("long range", AircraftCategory::UltraLongRange),
    ("very light", AircraftCategory::VeryLight),
    ("turboprop", AircraftCategory::Turboprop),
    ("turbo prop", AircraftCategory::Turboprop),
    ("midsize", AircraftCategory::Midsize),
    ("mid-size", AircraftCategory::Midsize),
    ("mid size", AircraftCategory::Midsize),
    ("heavy", AircraftCategory::Heavy),
    ("light", AircraftCategory::Light),
];

const MODEL_FAMILIES: &[(&str, AircraftCategory)] = &[
    ("king air", AircraftCategory::Turboprop),
    ("pilatus", AircraftCategory::Turboprop),
    ("pc-12", AircraftCategory::Turboprop),
    ("caravan", AircraftCategory::Turboprop),
    ("vision jet", AircraftCategory::VeryLight),
    ("hondajet", AircraftCategory::VeryLight),
    ("honda jet", AircraftCategory::VeryLight),
    ("mustang", AircraftCategory::VeryLight),
    ("eclipse", AircraftCategory::VeryLight),
    ("phenom", AircraftCategory::Light),
    ("citation cj", AircraftCategory::Light),
    ("learjet", AircraftCategory::Light),
    ("hawker", AircraftCategory::Midsize),
    ("latitude", AircraftCategory::Midsize),
    ("excel", AircraftCategory::Midsize),
    ("xls", AircraftCategory::Midsize),
    ("praetor", AircraftCategory::SuperMidsize),
    ("sovereign", AircraftCategory::SuperMidsize),
    ("citation x", AircraftCategory::SuperMidsize),
    ("challenger", AircraftCategory::SuperMidsize),
    ("gulfstream", AircraftCategory::Heavy),
    ("falcon", AircraftCategory::Heavy),
    ("legacy", AircraftCategory::Heavy),
    ("global", AircraftCategory::UltraLongRange),
    ("g650", AircraftCategory::UltraLongRange),
    ("g700", AircraftCategory::UltraLongRange),
];

/// True when the utterance waves the aircraft question off. The extractor
/// still yields nothing for these; the dialogue layer decides what a waved
/// answer means.
pub fn mentions_no_preference(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    NO_PREFERENCE_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

/// "No preference" deliberately yields no extraction: the field stays in the
/// missing set and any default is applied by policy downstream, not here.
pub fn extract_aircraft(text: &str) -> AircraftExtraction {
    let lowered = text.to_ascii_lowercase();

    if NO_PREFERENCE_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        return AircraftExtraction::default();
    }

    for (name, category) in CATEGORY_NAMES {
        if contains_word(&lowered, name) {
            return AircraftExtraction { category: Some(*category), confidence: 0.90 };
        }
    }

    for (family, category) in MODEL_FAMILIES {
        if lowered.contains(family) {
            return AircraftExtraction { category: Some(*category), confidence: 0.80 };
        }
    }

    AircraftExtraction::default()
}

/// Word-boundary containment, so "light" never fires inside "flight".
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut search_from = 0;
    while let Some(found) = haystack[search_from..].find(needle) {
        let start = search_from + found;
        let end = start + needle.len();
        let boundary_before = start == 0
            || !haystack[..start].chars().next_back().is_some_and(|ch| ch.is_ascii_alphanumeric());
        let boundary_after =
            !haystack[end..].chars().next().is_some_and(|ch| ch.is_ascii_alphanumeric());
        if boundary_before && boundary_after {
            return true;
        }
        search_from = end;
    }
    false
}

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

static COMMA_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\s*(\d{1,3}(?:,\d{3})+)\b").expect("valid regex"));
static K_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\$?\s*(\d+(?:\.\d+)?)\s*k\b").expect("valid regex"));
static DOLLAR_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*(\d+(?:\.\d+)?)\b").expect("valid regex"));
static BARE_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{5,9})\b").expect("valid regex"));

/// The five-digit floor on bare numbers keeps passenger counts and day
/// counts from being misread as budgets.
pub fn extract_budget(text: &str) -> BudgetExtraction {
    if let Some(captures) = COMMA_AMOUNT.captures(text) {
        let digits: String = captures[1].chars().filter(char::is_ascii_digit).collect();
        if let Ok(amount) = digits.parse::<Decimal>() {
            return BudgetExtraction { amount: Some(amount), confidence: 0.90 };
        }
    }

    if let Some(captures) = K_AMOUNT.captures(text) {
        if let Ok(amount) = captures[1].parse::<Decimal>() {
            return BudgetExtraction {
                amount: Some(amount * Decimal::from(1_000)),
                confidence: 0.90,
            };
        }
    }

    if let Some(captures) = DOLLAR_AMOUNT.captures(text) {
        if let Ok(amount) = captures[1].parse::<Decimal>() {
            return BudgetExtraction { amount: Some(amount), confidence: 0.85 };
        }
    }

    if let Some(captures) = BARE_AMOUNT.captures(text) {
        if let Ok(amount) = captures[1].parse::<Decimal>() {
            return BudgetExtraction { amount: Some(amount), confidence: 0.70 };
        }
    }

    BudgetExtraction::default()
}

// ---------------------------------------------------------------------------
// Special requirements and client name
// ---------------------------------------------------------------------------

const REQUIREMENT_KEYWORDS: &[&str] = &[
    "pet",
    "dog",
    "cat",
    "wheelchair",
    "accessible",
    "catering",
    "kosher",
    "vegetarian",
    "vegan",
    "medical",
    "oxygen",
    "skis",
    "golf clubs",
    "infant",
    "car seat",
    "wifi",
];

pub fn extract_special_requirements(text: &str) -> Option<String> {
    let lowered = text.to_ascii_lowercase();
    let matched: Vec<&str> = REQUIREMENT_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| contains_word(&lowered, keyword))
        .collect();

    if matched.is_empty() {
        None
    } else {
        Some(matched.join("; "))
    }
}

static CLIENT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[Cc]lient|[Oo]n behalf of)\s*:?\s+([A-Z][\w'&.-]*(?:\s+[A-Z][\w'&.-]*){0,2})")
        .expect("valid regex")
});

pub fn extract_client_name(text: &str) -> Option<String> {
    CLIENT_NAME.captures(text).map(|captures| captures[1].trim().to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use rust_decimal::Decimal;

    use charterly_core::inference::AircraftCategory;

    use super::{
        extract_aircraft, extract_budget, extract_client_name, extract_dates, extract_passengers,
        extract_route, extract_special_requirements, IntentExtractor,
    };

    fn today() -> NaiveDate {
        // A Monday, so weekday arithmetic is easy to eyeball.
        NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
    }

    #[test]
    fn airport_code_pair_extracts_at_high_confidence() {
        let route = extract_route("JFK to LAX");
        assert_eq!(route.departure.as_deref(), Some("JFK"));
        assert_eq!(route.arrival.as_deref(), Some("LAX"));
        assert_eq!(route.confidence, 0.95);
    }

    #[test]
    fn from_to_phrasing_extracts_city_names() {
        let route = extract_route("We need a charter from New York to Los Angeles on Friday");
        assert_eq!(route.departure.as_deref(), Some("New York"));
        assert_eq!(route.arrival.as_deref(), Some("Los Angeles"));
        assert_eq!(route.confidence, 0.95);
    }

    #[test]
    fn conversational_phrasing_scores_lower_than_plain_from_to() {
        let route = extract_route("We are flying from Boston to Miami tomorrow");
        assert_eq!(route.departure.as_deref(), Some("Boston"));
        assert_eq!(route.arrival.as_deref(), Some("Miami"));
        assert_eq!(route.confidence, 0.85);
    }

    #[test]
    fn generic_city_pair_scores_point_nine() {
        let route = extract_route("Chicago to Denver");
        assert_eq!(route.departure.as_deref(), Some("Chicago"));
        assert_eq!(route.arrival.as_deref(), Some("Denver"));
        assert_eq!(route.confidence, 0.90);
    }

    #[test]
    fn one_sided_mention_keeps_low_confidence() {
        let route = extract_route("from Teterboro");
        assert_eq!(route.departure.as_deref(), Some("Teterboro"));
        assert_eq!(route.arrival, None);
        assert_eq!(route.confidence, 0.50);
        assert_eq!(route.single_location(), Some("Teterboro"));

        let bare = extract_route("just Aspen");
        assert_eq!(bare.single_location(), Some("Aspen"));
        assert_eq!(bare.confidence, 0.30);
    }

    #[test]
    fn sentence_fragments_do_not_parse_as_routes() {
        let route = extract_route("I need to book something");
        assert_eq!(route.departure, None);
        assert_eq!(route.arrival, None);
    }

    #[test]
    fn iso_dates_resolve_with_year() {
        let dates = extract_dates("departing 2026-04-10, returning 2026-04-15", today());
        assert_eq!(dates.departure_date, NaiveDate::from_ymd_opt(2026, 4, 10));
        assert_eq!(dates.return_date, NaiveDate::from_ymd_opt(2026, 4, 15));
        assert_eq!(dates.confidence, 0.95);
    }

    #[test]
    fn month_name_without_year_rolls_to_next_occurrence() {
        // January 5 is already past on 2026-03-02, so it rolls to 2027.
        let dates = extract_dates("we leave January 5", today());
        assert_eq!(dates.departure_date, NaiveDate::from_ymd_opt(2027, 1, 5));

        let ahead = extract_dates("we leave June 12", today());
        assert_eq!(ahead.departure_date, NaiveDate::from_ymd_opt(2026, 6, 12));
    }

    #[test]
    fn tomorrow_with_relative_return_produces_ordered_pair() {
        let dates = extract_dates("tomorrow, returning in 5 days", today());
        let departure = dates.departure_date.expect("departure resolved");
        let return_date = dates.return_date.expect("return resolved");

        assert_eq!(departure, today() + Duration::days(1));
        assert_eq!(return_date, departure + Duration::days(5));
        assert!(return_date > departure);
        assert_eq!(departure.to_string(), "2026-03-03");
        assert_eq!(return_date.to_string(), "2026-03-08");
    }

    #[test]
    fn next_week_and_in_n_days_resolve_relative_to_today() {
        assert_eq!(
            extract_dates("sometime next week", today()).departure_date,
            Some(today() + Duration::days(7))
        );
        assert_eq!(
            extract_dates("in 3 days", today()).departure_date,
            Some(today() + Duration::days(3))
        );
    }

    #[test]
    fn next_weekday_resolves_strictly_after_today() {
        // today() is a Monday; "next monday" means a week out.
        let dates = extract_dates("next monday works", today());
        assert_eq!(dates.departure_date, Some(today() + Duration::days(7)));

        let friday = extract_dates("next friday", today());
        assert_eq!(friday.departure_date, Some(today() + Duration::days(4)));
    }

    #[test]
    fn bare_next_month_is_flagged_ambiguous_not_guessed() {
        let dates = extract_dates("sometime next month", today());
        assert!(dates.ambiguous);
        assert_eq!(dates.departure_date, None);
        assert!(dates.clarification.is_some());
    }

    #[test]
    fn explicit_date_beats_the_next_month_ambiguity() {
        let dates = extract_dates("next month, ideally April 2", today());
        assert!(!dates.ambiguous);
        assert_eq!(dates.departure_date, NaiveDate::from_ymd_opt(2026, 4, 2));
    }

    #[test]
    fn stay_length_produces_a_return_date() {
        let dates = extract_dates("2026-05-01 for 4 nights", today());
        assert_eq!(dates.return_date, NaiveDate::from_ymd_opt(2026, 5, 5));
    }

    #[test]
    fn passenger_forms_parse() {
        assert_eq!(extract_passengers("5 passengers").count, Some(5));
        assert_eq!(extract_passengers("12 people total").count, Some(12));
        assert_eq!(extract_passengers("just me this time").count, Some(1));
        assert_eq!(extract_passengers("party of six").count, Some(6));
        assert_eq!(extract_passengers("family of 4").count, Some(4));
        assert_eq!(extract_passengers("there will be 3 of us").count, Some(3));
        assert_eq!(extract_passengers("for 8").count, Some(8));
    }

    #[test]
    fn day_counts_are_not_passenger_counts() {
        assert_eq!(extract_passengers("for 5 days").count, None);
        assert_eq!(extract_passengers("for 2 nights").count, None);
    }

    #[test]
    fn aircraft_category_names_parse() {
        assert_eq!(extract_aircraft("a light jet please").category, Some(AircraftCategory::Light));
        assert_eq!(
            extract_aircraft("super midsize preferred").category,
            Some(AircraftCategory::SuperMidsize)
        );
        assert_eq!(
            extract_aircraft("ultra long range for this one").category,
            Some(AircraftCategory::UltraLongRange)
        );
        assert_eq!(extract_aircraft("a king air is fine").category, Some(AircraftCategory::Turboprop));
        assert_eq!(extract_aircraft("maybe a gulfstream").category, Some(AircraftCategory::Heavy));
    }

    #[test]
    fn flight_does_not_trigger_the_light_category() {
        assert_eq!(extract_aircraft("we need a flight to denver").category, None);
    }

    #[test]
    fn no_preference_extracts_nothing_by_design() {
        assert_eq!(extract_aircraft("no preference on aircraft").category, None);
        assert_eq!(extract_aircraft("any jet works").category, None);
    }

    #[test]
    fn budget_forms_parse() {
        assert_eq!(extract_budget("around 45k").amount, Some(Decimal::from(45_000)));
        assert_eq!(extract_budget("budget is $45,000").amount, Some(Decimal::from(45_000)));
        assert_eq!(extract_budget("up to 60000 for this").amount, Some(Decimal::from(60_000)));
        assert_eq!(extract_budget("$9500 cap").amount, Some(Decimal::from(9_500)));
    }

    #[test]
    fn small_numbers_are_not_budgets() {
        assert_eq!(extract_budget("5 passengers on March 3").amount, None);
        assert_eq!(extract_budget("party of 8").amount, None);
    }

    #[test]
    fn special_requirements_and_client_names_are_captured() {
        assert_eq!(
            extract_special_requirements("bringing a dog and need catering").as_deref(),
            Some("dog; catering")
        );
        assert_eq!(extract_special_requirements("nothing special"), None);
        assert_eq!(
            extract_client_name("this is for client Harrison Ventures").as_deref(),
            Some("Harrison Ventures")
        );
        assert_eq!(extract_client_name("no client mentioned"), None);
    }

    #[test]
    fn extractor_handles_twenty_plus_common_phrasings() {
        struct Case {
            text: &'static str,
            expect_route: bool,
            expect_date: bool,
            expect_passengers: bool,
        }

        let cases = vec![
            Case { text: "JFK to LAX tomorrow for 4 people", expect_route: true, expect_date: true, expect_passengers: true },
            Case { text: "from Miami to Chicago", expect_route: true, expect_date: false, expect_passengers: false },
            Case { text: "flying from Dallas to Houston next friday", expect_route: true, expect_date: true, expect_passengers: false },
            Case { text: "Boston to Washington", expect_route: true, expect_date: false, expect_passengers: false },
            Case { text: "need a jet on 2026-06-01", expect_route: false, expect_date: true, expect_passengers: false },
            Case { text: "we leave April 15, 2026", expect_route: false, expect_date: true, expect_passengers: false },
            Case { text: "departing 6/15", expect_route: false, expect_date: true, expect_passengers: false },
            Case { text: "tomorrow works best", expect_route: false, expect_date: true, expect_passengers: false },
            Case { text: "today if possible", expect_route: false, expect_date: true, expect_passengers: false },
            Case { text: "sometime next week", expect_route: false, expect_date: true, expect_passengers: false },
            Case { text: "in 10 days", expect_route: false, expect_date: true, expect_passengers: false },
            Case { text: "next wednesday", expect_route: false, expect_date: true, expect_passengers: false },
            Case { text: "5 passengers", expect_route: false, expect_date: false, expect_passengers: true },
            Case { text: "just me", expect_route: false, expect_date: false, expect_passengers: true },
            Case { text: "party of ten", expect_route: false, expect_date: false, expect_passengers: true },
            Case { text: "family of 3 flying out", expect_route: false, expect_date: false, expect_passengers: true },
            Case { text: "2 of us", expect_route: false, expect_date: false, expect_passengers: true },
            Case { text: "SFO to SEA on 2026-07-04 with 6 travelers", expect_route: true, expect_date: true, expect_passengers: true },
            Case { text: "going from Aspen to Vail", expect_route: true, expect_date: false, expect_passengers: false },
            Case { text: "tomorrow, returning in 5 days", expect_route: false, expect_date: true, expect_passengers: false },
            Case { text: "from Teterboro", expect_route: true, expect_date: false, expect_passengers: false },
            Case { text: "8 pax day after tomorrow", expect_route: false, expect_date: true, expect_passengers: true },
        ];

        let extractor = IntentExtractor::new();
        for (index, case) in cases.iter().enumerate() {
            let fields = extractor.extract(case.text, today());
            if case.expect_route {
                assert!(
                    fields.route.departure.is_some() || fields.route.arrival.is_some(),
                    "case {index} expected a route: {}",
                    case.text
                );
            }
            if case.expect_date {
                assert!(
                    fields.dates.departure_date.is_some(),
                    "case {index} expected a date: {}",
                    case.text
                );
            }
            if case.expect_passengers {
                assert!(
                    fields.passengers.count.is_some(),
                    "case {index} expected passengers: {}",
                    case.text
                );
            }
        }
    }
}
