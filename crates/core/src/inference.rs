//! Passenger-count to aircraft-category inference.
//!
//! The inferrer never fails: out-of-domain counts produce a best-effort
//! recommendation with a lowered confidence and an explanatory note instead
//! of an error.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AircraftCategory {
    Turboprop,
    VeryLight,
    Light,
    Midsize,
    SuperMidsize,
    Heavy,
    UltraLongRange,
}

pub const ALL_CATEGORIES: [AircraftCategory; 7] = [
    AircraftCategory::Turboprop,
    AircraftCategory::VeryLight,
    AircraftCategory::Light,
    AircraftCategory::Midsize,
    AircraftCategory::SuperMidsize,
    AircraftCategory::Heavy,
    AircraftCategory::UltraLongRange,
];

/// Certified and typical seating band for a category, plus its typical
/// still-air range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryBand {
    pub min_pax: i64,
    pub max_pax: i64,
    pub typical_min: i64,
    pub typical_max: i64,
    pub typical_range_nm: u32,
}

impl AircraftCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Turboprop => "turboprop",
            Self::VeryLight => "very_light",
            Self::Light => "light",
            Self::Midsize => "midsize",
            Self::SuperMidsize => "super_midsize",
            Self::Heavy => "heavy",
            Self::UltraLongRange => "ultra_long_range",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "turboprop" => Some(Self::Turboprop),
            "very_light" => Some(Self::VeryLight),
            "light" => Some(Self::Light),
            "midsize" => Some(Self::Midsize),
            "super_midsize" => Some(Self::SuperMidsize),
            "heavy" => Some(Self::Heavy),
            "ultra_long_range" => Some(Self::UltraLongRange),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Turboprop => "Turboprop",
            Self::VeryLight => "Very Light Jet",
            Self::Light => "Light Jet",
            Self::Midsize => "Midsize Jet",
            Self::SuperMidsize => "Super Midsize Jet",
            Self::Heavy => "Heavy Jet",
            Self::UltraLongRange => "Ultra Long Range Jet",
        }
    }

    pub fn band(&self) -> CategoryBand {
        match self {
            Self::Turboprop => CategoryBand {
                min_pax: 1,
                max_pax: 9,
                typical_min: 4,
                typical_max: 6,
                typical_range_nm: 1_000,
            },
            Self::VeryLight => CategoryBand {
                min_pax: 1,
                max_pax: 5,
                typical_min: 2,
                typical_max: 4,
                typical_range_nm: 1_100,
            },
            Self::Light => CategoryBand {
                min_pax: 2,
                max_pax: 7,
                typical_min: 4,
                typical_max: 6,
                typical_range_nm: 1_700,
            },
            Self::Midsize => CategoryBand {
                min_pax: 4,
                max_pax: 9,
                typical_min: 6,
                typical_max: 8,
                typical_range_nm: 2_800,
            },
            Self::SuperMidsize => CategoryBand {
                min_pax: 6,
                max_pax: 10,
                typical_min: 8,
                typical_max: 9,
                typical_range_nm: 3_400,
            },
            Self::Heavy => CategoryBand {
                min_pax: 8,
                max_pax: 16,
                typical_min: 10,
                typical_max: 14,
                typical_range_nm: 4_500,
            },
            Self::UltraLongRange => CategoryBand {
                min_pax: 10,
                max_pax: 19,
                typical_min: 12,
                typical_max: 16,
                typical_range_nm: 6_800,
            },
        }
    }
}

pub fn can_accommodate(category: AircraftCategory, passengers: i64) -> bool {
    let band = category.band();
    passengers >= band.min_pax && passengers <= band.max_pax
}

/// Every category whose certified band contains the count. Falls back to the
/// largest category for oversized groups so the list is never empty for any
/// count of at least one.
pub fn capable_categories(passengers: i64) -> Vec<AircraftCategory> {
    let capable: Vec<AircraftCategory> = ALL_CATEGORIES
        .iter()
        .copied()
        .filter(|category| can_accommodate(*category, passengers))
        .collect();

    if capable.is_empty() && passengers >= 1 {
        return vec![AircraftCategory::UltraLongRange];
    }
    capable
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecommendation {
    pub category: AircraftCategory,
    pub confidence: f64,
    pub alternatives: Vec<AircraftCategory>,
    pub reasoning: String,
    pub note: Option<String>,
}

const MAX_ALTERNATIVES: usize = 3;
const LARGE_GROUP_LIMIT: i64 = 19;

/// Maps a passenger count to a ranked category recommendation.
#[derive(Clone, Copy, Debug)]
pub struct CategoryInferrer {
    /// How many seats above the count a category band may start and still be
    /// offered as a roomier alternative.
    pub alternative_headroom: i64,
}

impl Default for CategoryInferrer {
    fn default() -> Self {
        Self { alternative_headroom: 2 }
    }
}

impl CategoryInferrer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recommend(&self, passengers: i64) -> CategoryRecommendation {
        if passengers < 1 {
            let category = primary_category(1);
            return CategoryRecommendation {
                category,
                confidence: 0.50,
                alternatives: self.alternatives_for(category, 1),
                reasoning: build_reasoning(category, 1),
                note: Some(
                    "Passenger count was below one; assuming a single traveler.".to_string(),
                ),
            };
        }

        if passengers > LARGE_GROUP_LIMIT {
            let category = AircraftCategory::UltraLongRange;
            return CategoryRecommendation {
                category,
                confidence: 0.60,
                alternatives: Vec::new(),
                reasoning: build_reasoning(category, passengers),
                note: Some(
                    "Groups above 19 passengers usually need multiple aircraft or a commercial charter."
                        .to_string(),
                ),
            };
        }

        let category = primary_category(passengers);
        CategoryRecommendation {
            category,
            confidence: confidence_for(category, passengers),
            alternatives: self.alternatives_for(category, passengers),
            reasoning: build_reasoning(category, passengers),
            note: None,
        }
    }

    fn alternatives_for(&self, primary: AircraftCategory, passengers: i64) -> Vec<AircraftCategory> {
        let mut alternatives: Vec<AircraftCategory> = ALL_CATEGORIES
            .iter()
            .copied()
            .filter(|category| *category != primary)
            .filter(|category| {
                let band = category.band();
                let contains = passengers >= band.min_pax && passengers <= band.max_pax;
                let slightly_larger = band.min_pax > passengers
                    && band.min_pax - passengers <= self.alternative_headroom;
                contains || slightly_larger
            })
            .collect();

        alternatives.sort_by_key(|category| category.band().max_pax);
        alternatives.truncate(MAX_ALTERNATIVES);
        alternatives
    }
}

/// Fixed primary thresholds; alternatives and confidence soften the edges.
fn primary_category(passengers: i64) -> AircraftCategory {
    if passengers <= 4 {
        AircraftCategory::Light
    } else if passengers <= 6 {
        AircraftCategory::Midsize
    } else if passengers <= 8 {
        AircraftCategory::SuperMidsize
    } else if passengers <= 12 {
        AircraftCategory::Heavy
    } else {
        AircraftCategory::UltraLongRange
    }
}

fn confidence_for(category: AircraftCategory, passengers: i64) -> f64 {
    let band = category.band();
    if passengers >= band.typical_min && passengers <= band.typical_max {
        0.95
    } else if passengers >= band.min_pax && passengers <= band.max_pax {
        0.85
    } else if passengers >= band.min_pax - 1 && passengers <= band.max_pax + 2 {
        0.70
    } else {
        0.60
    }
}

// Three clauses computed independently so the wording stays consistent when
// a band or threshold moves.
fn build_reasoning(category: AircraftCategory, passengers: i64) -> String {
    let band = category.band();

    let fit = if passengers >= band.typical_min && passengers <= band.typical_max {
        format!("A {} is the standard fit for {passengers} passengers", category.label())
    } else if passengers <= band.max_pax {
        format!("A {} can carry {passengers} passengers", category.label())
    } else {
        format!("A {} is the closest single-aircraft match for {passengers} passengers", category.label())
    };

    let capacity = if band.max_pax - passengers >= 2 {
        format!("with seats to spare ({} certified)", band.max_pax)
    } else {
        format!("at close to full capacity ({} certified)", band.max_pax)
    };

    let range = format!("and covers roughly {} nm nonstop", band.typical_range_nm);

    format!("{fit} {capacity} {range}.")
}
