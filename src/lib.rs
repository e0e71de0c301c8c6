//! # Trip Planner Library
//!
//! A travel-planning orchestrator in Rust. Given trip parameters (origin,
//! destination, dates, budget, style) it resolves free-text place names to
//! canonical location codes, queries flight, hotel, weather and attraction
//! providers, and hands the aggregate to a generative-text model to produce
//! a human-readable itinerary.

pub mod airports;
pub mod amadeus;
pub mod attractions;
pub mod cache;
pub mod currency;
pub mod gemini;
pub mod hotels;
pub mod planner;
pub mod weather;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

// Re-export main types for convenience
pub use airports::{AirportKind, AirportRecord, AirportTable, LocationResolution};
pub use amadeus::{AmadeusClient, FlightOffer, FlightOutcome, FlightSearchQuery, ProviderFailure};
pub use attractions::Attraction;
pub use hotels::HotelOption;
pub use planner::{Config, SectionOutcome, SynthesisInput, TripPlan, TripPlanner};
pub use weather::DayForecast;

/// Error types for the trip-planner library
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Location not recognized: {0}")]
    LocationNotRecognized(String),

    #[error("Invalid date format: {0}")]
    DateParseError(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("{service} request failed: {message}")]
    ProviderError {
        service: &'static str,
        message: String,
    },

    #[error("Text generation failed: {0}")]
    GenerationError(String),

    #[error("Invalid parameter: {0}")]
    ParseError(String),
}

/// Traveler configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TravelerCounts {
    pub adults: i32,
    pub children: i32,
}

impl Default for TravelerCounts {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
        }
    }
}

/// Cabin class enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    /// Wire value expected by the flight provider's travelClass parameter
    pub fn as_param(self) -> &'static str {
        match self {
            CabinClass::Economy => "ECONOMY",
            CabinClass::PremiumEconomy => "PREMIUM_ECONOMY",
            CabinClass::Business => "BUSINESS",
            CabinClass::First => "FIRST",
        }
    }
}

impl FromStr for CabinClass {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "economy" => Ok(CabinClass::Economy),
            "premium-economy" | "premium_economy" => Ok(CabinClass::PremiumEconomy),
            "business" => Ok(CabinClass::Business),
            "first" => Ok(CabinClass::First),
            _ => Err(PlanError::ParseError(format!("Invalid cabin class: {}", s))),
        }
    }
}

impl Default for CabinClass {
    fn default() -> Self {
        CabinClass::Economy
    }
}

/// Trip budget with an ISO 4217 currency code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub amount: f64,
    pub currency: String,
}

impl Budget {
    pub fn eur(amount: f64) -> Self {
        Self {
            amount,
            currency: "EUR".to_string(),
        }
    }
}

/// Complete trip request with all parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    /// Free-text origin place name (e.g., "Stockholm")
    pub origin: String,
    /// Free-text destination place name (e.g., "Paris")
    pub destination: String,
    /// Departure date (YYYY-MM-DD)
    pub start_date: String,
    /// Trip length in days; the return date is derived from it
    pub duration_days: i64,
    pub travelers: TravelerCounts,
    pub cabin_class: CabinClass,
    /// Free-text vacation style fed to the itinerary generator (e.g., "beach")
    pub vacation_style: String,
    pub budget: Budget,
}

/// Main public API function: plan a trip end to end.
///
/// Builds a [`TripPlanner`] from environment credentials and runs one
/// sequential pass through the agents.
///
/// # Example
/// ```rust,no_run
/// use trip_planner::{plan_trip, Budget, CabinClass, TravelerCounts, TripRequest};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let request = TripRequest {
///     origin: "Stockholm".to_string(),
///     destination: "Lisbon".to_string(),
///     start_date: "2025-10-10".to_string(),
///     duration_days: 7,
///     travelers: TravelerCounts::default(),
///     cabin_class: CabinClass::Economy,
///     vacation_style: "city break".to_string(),
///     budget: Budget::eur(2000.0),
/// };
///
/// let plan = plan_trip(request).await?;
/// println!("{}", plan.itinerary);
/// # Ok(())
/// # }
/// ```
pub async fn plan_trip(request: TripRequest) -> Result<TripPlan, PlanError> {
    let planner = TripPlanner::from_env()?;
    planner.plan(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cabin_class_parsing() {
        assert!(matches!("economy".parse::<CabinClass>(), Ok(CabinClass::Economy)));
        assert!(matches!(
            "premium-economy".parse::<CabinClass>(),
            Ok(CabinClass::PremiumEconomy)
        ));
        assert!(matches!("business".parse::<CabinClass>(), Ok(CabinClass::Business)));
        assert!(matches!("first".parse::<CabinClass>(), Ok(CabinClass::First)));
        assert!("invalid".parse::<CabinClass>().is_err());
    }

    #[test]
    fn test_cabin_class_wire_values() {
        assert_eq!(CabinClass::Economy.as_param(), "ECONOMY");
        assert_eq!(CabinClass::PremiumEconomy.as_param(), "PREMIUM_ECONOMY");
        assert_eq!(CabinClass::Business.as_param(), "BUSINESS");
        assert_eq!(CabinClass::First.as_param(), "FIRST");
    }

    #[test]
    fn test_traveler_counts_default() {
        let travelers = TravelerCounts::default();
        assert_eq!(travelers.adults, 1);
        assert_eq!(travelers.children, 0);
    }

    #[test]
    fn test_budget_eur() {
        let budget = Budget::eur(1500.0);
        assert_eq!(budget.amount, 1500.0);
        assert_eq!(budget.currency, "EUR");
    }
}
