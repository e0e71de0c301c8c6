//! Trip orchestration
//!
//! One sequential pass per user submission: resolve both place names, search
//! flights, then gather hotel, weather and attraction data, normalize every
//! agent outcome into a section, and hand the aggregate to the text
//! generator. A single failing data source degrades its section; only an
//! unresolved location aborts the plan, since every downstream call would be
//! meaningless without codes.

use crate::airports::{AirportTable, LocationResolution};
use crate::amadeus::{
    format_duration, AmadeusClient, FlightOffer, FlightOutcome, FlightSearchQuery,
};
use crate::attractions::{Attraction, AttractionsClient};
use crate::cache::TtlCache;
use crate::currency::CurrencyClient;
use crate::gemini::GeminiClient;
use crate::hotels::{HotelOption, HotelsClient};
use crate::weather::{DayForecast, WeatherClient};
use crate::{Budget, PlanError, TripRequest};
use chrono::NaiveDate;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const FLIGHT_CACHE_TTL: Duration = Duration::from_secs(3600);
const MAX_FLIGHT_OFFERS: u32 = 5;
const MAX_HOTELS: usize = 5;
const MAX_ATTRACTIONS: usize = 6;

/// Provider credentials, read from the environment.
///
/// Flight search and text generation are mandatory; the remaining providers
/// are optional and their sections degrade when unconfigured.
#[derive(Debug, Clone)]
pub struct Config {
    pub amadeus_client_id: String,
    pub amadeus_client_secret: String,
    pub gemini_api_key: String,
    pub liteapi_key: Option<String>,
    pub openweather_api_key: Option<String>,
    pub geoapify_api_key: Option<String>,
    pub currency_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, PlanError> {
        Ok(Self {
            amadeus_client_id: require_env("AMADEUS_CLIENT_ID")?,
            amadeus_client_secret: require_env("AMADEUS_CLIENT_SECRET")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            liteapi_key: optional_env("LITEAPI_KEY"),
            openweather_api_key: optional_env("OPENWEATHER_API_KEY"),
            geoapify_api_key: optional_env("GEOAPIFY_API_KEY"),
            currency_api_key: optional_env("CURRENCY_API_KEY"),
        })
    }
}

fn require_env(name: &'static str) -> Result<String, PlanError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(PlanError::MissingCredential(name))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Normalized per-agent outcome in the synthesis input.
///
/// `Empty` means the agent confirmed there is nothing to report;
/// `Unavailable` means the data source failed and the section is a gap.
/// The two are rendered differently and must never be merged.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum SectionOutcome<T> {
    Data(T),
    Empty,
    Unavailable { reason: String },
}

impl<T> SectionOutcome<T> {
    pub fn is_data(&self) -> bool {
        matches!(self, SectionOutcome::Data(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SectionOutcome::Empty)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, SectionOutcome::Unavailable { .. })
    }
}

/// Structured aggregate of all agent outputs, handed to text generation
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisInput {
    pub origin_city: String,
    pub origin_code: String,
    pub destination_city: String,
    pub destination_code: String,
    pub destination_region: String,
    pub vacation_style: String,
    pub adults: i32,
    pub children: i32,
    pub duration_days: i64,
    pub start_date: String,
    pub return_date: String,
    pub budget_eur: f64,
    pub flights: SectionOutcome<Vec<FlightOffer>>,
    pub hotels: SectionOutcome<Vec<HotelOption>>,
    pub weather: SectionOutcome<Vec<DayForecast>>,
    pub attractions: SectionOutcome<Vec<Attraction>>,
}

/// A completed plan: generated prose plus the aggregate it was built from
#[derive(Debug, Clone, Serialize)]
pub struct TripPlan {
    pub itinerary: String,
    pub synthesis: SynthesisInput,
}

/// Orchestrator over the provider clients
pub struct TripPlanner {
    table: &'static AirportTable,
    flights: AmadeusClient,
    hotels: Option<HotelsClient>,
    weather: Option<WeatherClient>,
    attractions: Option<AttractionsClient>,
    currency: CurrencyClient,
    generator: GeminiClient,
    flight_cache: TtlCache<FlightOutcome>,
}

impl TripPlanner {
    pub fn new(config: Config) -> Result<Self, PlanError> {
        let hotels = config.liteapi_key.map(HotelsClient::new).transpose()?;
        let weather = config.openweather_api_key.map(WeatherClient::new).transpose()?;
        let attractions = config
            .geoapify_api_key
            .map(AttractionsClient::new)
            .transpose()?;

        Ok(Self {
            table: AirportTable::global(),
            flights: AmadeusClient::new(config.amadeus_client_id, config.amadeus_client_secret)?,
            hotels,
            weather,
            attractions,
            currency: CurrencyClient::new(config.currency_api_key)?,
            generator: GeminiClient::new(config.gemini_api_key)?,
            flight_cache: TtlCache::new(FLIGHT_CACHE_TTL),
        })
    }

    pub fn from_env() -> Result<Self, PlanError> {
        Self::new(Config::from_env()?)
    }

    /// Plan a trip end to end.
    ///
    /// Resolution happens before any provider call: an unrecognized origin or
    /// destination short-circuits with [`PlanError::LocationNotRecognized`].
    #[instrument(level = "info", skip(self, request), fields(origin = %request.origin, destination = %request.destination))]
    pub async fn plan(&self, request: TripRequest) -> Result<TripPlan, PlanError> {
        let return_date = derive_return_date(&request.start_date, request.duration_days)?;

        let origin = self
            .table
            .resolve(&request.origin)
            .ok_or_else(|| PlanError::LocationNotRecognized(request.origin.clone()))?;
        let destination = self
            .table
            .resolve(&request.destination)
            .ok_or_else(|| PlanError::LocationNotRecognized(request.destination.clone()))?;
        info!(
            origin_code = %origin.location_code,
            destination_code = %destination.location_code,
            destination_region = %destination.region_code,
            "Locations resolved"
        );

        let query = FlightSearchQuery {
            origin: origin.location_code.clone(),
            destination: destination.location_code.clone(),
            departure_date: request.start_date.clone(),
            return_date: Some(return_date.clone()),
            travelers: request.travelers,
            cabin_class: request.cabin_class,
            max_offers: MAX_FLIGHT_OFFERS,
        };
        let flight_outcome = self.search_flights(&query).await;

        let hotels = self
            .hotel_section(&request, &destination, &return_date)
            .await;
        let weather = self.weather_section(&request, &destination).await;
        let attractions = self.attraction_section(&request, &destination).await;
        let budget_eur = self.normalize_budget(&request.budget).await;

        let synthesis = compose_synthesis(
            &request,
            &origin,
            &destination,
            &return_date,
            budget_eur,
            flight_outcome,
            hotels,
            weather,
            attractions,
        );

        let prompt = render_prompt(&synthesis);
        let itinerary = self.generator.generate(&prompt).await?;

        Ok(TripPlan {
            itinerary,
            synthesis,
        })
    }

    /// Flight search with TTL memoization. Failures are not memoized so a
    /// transient fault can clear on the next identical query.
    async fn search_flights(&self, query: &FlightSearchQuery) -> FlightOutcome {
        let key = query.cache_key();
        if let Some(hit) = self.flight_cache.get(&key) {
            debug!(key = %key, "Flight cache hit");
            return hit;
        }

        let outcome = self.flights.search(query).await;
        if !matches!(outcome, FlightOutcome::Failed(_)) {
            self.flight_cache.insert(&key, outcome.clone());
        }
        outcome
    }

    async fn hotel_section(
        &self,
        request: &TripRequest,
        destination: &LocationResolution,
        checkout: &str,
    ) -> SectionOutcome<Vec<HotelOption>> {
        let Some(client) = &self.hotels else {
            return SectionOutcome::Unavailable {
                reason: "hotel search is not configured".to_string(),
            };
        };

        match client
            .search(
                &request.destination,
                &destination.region_code,
                &request.start_date,
                checkout,
                request.travelers,
                MAX_HOTELS,
            )
            .await
        {
            Ok(hotels) if hotels.is_empty() => SectionOutcome::Empty,
            Ok(hotels) => SectionOutcome::Data(hotels),
            Err(e) => {
                warn!(error = %e, "Hotel search failed; section degraded");
                SectionOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn weather_section(
        &self,
        request: &TripRequest,
        destination: &LocationResolution,
    ) -> SectionOutcome<Vec<DayForecast>> {
        let Some(client) = &self.weather else {
            return SectionOutcome::Unavailable {
                reason: "weather forecast is not configured".to_string(),
            };
        };

        match client
            .forecast(&request.destination, Some(&destination.region_code))
            .await
        {
            Ok(days) if days.is_empty() => SectionOutcome::Empty,
            Ok(days) => SectionOutcome::Data(days),
            Err(e) => {
                warn!(error = %e, "Weather lookup failed; section degraded");
                SectionOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn attraction_section(
        &self,
        request: &TripRequest,
        destination: &LocationResolution,
    ) -> SectionOutcome<Vec<Attraction>> {
        let Some(client) = &self.attractions else {
            return SectionOutcome::Unavailable {
                reason: "attraction search is not configured".to_string(),
            };
        };

        match client
            .tourist_attractions(
                &request.destination,
                Some(&destination.region_code),
                MAX_ATTRACTIONS,
            )
            .await
        {
            Ok(places) if places.is_empty() => SectionOutcome::Empty,
            Ok(places) => SectionOutcome::Data(places),
            Err(e) => {
                warn!(error = %e, "Attraction lookup failed; section degraded");
                SectionOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Normalize the budget to EUR for the synthesis input. Conversion
    /// failure passes the raw amount through.
    async fn normalize_budget(&self, budget: &Budget) -> f64 {
        if budget.currency.eq_ignore_ascii_case("EUR") {
            return budget.amount;
        }
        match self
            .currency
            .convert(budget.amount, &budget.currency, "EUR")
            .await
        {
            Ok(eur) => eur,
            Err(e) => {
                warn!(error = %e, currency = %budget.currency, "Budget conversion failed; using raw amount");
                budget.amount
            }
        }
    }
}

/// Derive the return date from the start date and trip length
fn derive_return_date(start_date: &str, duration_days: i64) -> Result<String, PlanError> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
        .map_err(|_| PlanError::DateParseError(start_date.to_string()))?;
    let return_date = start + chrono::Duration::days(duration_days);
    Ok(return_date.format("%Y-%m-%d").to_string())
}

/// Normalize the flight outcome into a section; found offers are sorted
/// ascending by total price.
fn flight_section(outcome: FlightOutcome) -> SectionOutcome<Vec<FlightOffer>> {
    match outcome {
        FlightOutcome::Found(mut offers) => {
            offers.sort_by(|a, b| {
                a.total_price
                    .partial_cmp(&b.total_price)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            SectionOutcome::Data(offers)
        }
        FlightOutcome::NoneAvailable => SectionOutcome::Empty,
        FlightOutcome::Failed(failure) => SectionOutcome::Unavailable {
            reason: failure.to_string(),
        },
    }
}

/// Combine per-agent outcomes into the synthesis input
#[allow(clippy::too_many_arguments)]
pub fn compose_synthesis(
    request: &TripRequest,
    origin: &LocationResolution,
    destination: &LocationResolution,
    return_date: &str,
    budget_eur: f64,
    flights: FlightOutcome,
    hotels: SectionOutcome<Vec<HotelOption>>,
    weather: SectionOutcome<Vec<DayForecast>>,
    attractions: SectionOutcome<Vec<Attraction>>,
) -> SynthesisInput {
    SynthesisInput {
        origin_city: request.origin.clone(),
        origin_code: origin.location_code.clone(),
        destination_city: request.destination.clone(),
        destination_code: destination.location_code.clone(),
        destination_region: destination.region_code.clone(),
        vacation_style: request.vacation_style.clone(),
        adults: request.travelers.adults,
        children: request.travelers.children,
        duration_days: request.duration_days,
        start_date: request.start_date.clone(),
        return_date: return_date.to_string(),
        budget_eur,
        flights: flight_section(flights),
        hotels,
        weather,
        attractions,
    }
}

fn render_section<T>(
    section: &SectionOutcome<Vec<T>>,
    label: &str,
    none_line: &str,
    line: impl Fn(&T) -> String,
) -> String {
    match section {
        SectionOutcome::Data(items) => items.iter().map(line).collect::<Vec<_>>().join("\n"),
        SectionOutcome::Empty => format!("  {}", none_line),
        SectionOutcome::Unavailable { reason } => format!(
            "  {} data is unavailable ({}); treat this as a gap, not a confirmed absence.",
            label, reason
        ),
    }
}

/// Render the synthesis input into the generation prompt.
///
/// Confirmed absences and degraded sections are spelled out so the model
/// reports them honestly instead of inventing specifics.
pub fn render_prompt(input: &SynthesisInput) -> String {
    let flight_lines = render_section(
        &input.flights,
        "Flight",
        "No flights found for these dates; the search completed and the absence is confirmed.",
        |offer| {
            let duration = offer
                .itineraries
                .first()
                .map(|it| format_duration(&it.duration))
                .unwrap_or_else(|| "unknown".to_string());
            format!(
                "  - {:.2} {} total, {} stop(s), outbound {}",
                offer.total_price,
                offer.currency,
                offer.outbound_stops(),
                duration
            )
        },
    );

    let hotel_lines = render_section(
        &input.hotels,
        "Hotel",
        "No hotels found for these dates.",
        |hotel| {
            format!(
                "  - {}, Address: {}, Price: {:.2} {}",
                hotel.name, hotel.address, hotel.price, hotel.currency
            )
        },
    );

    let weather_lines = render_section(
        &input.weather,
        "Weather",
        "No forecast data available.",
        |day| format!("  {}", day),
    );

    let attraction_lines = render_section(
        &input.attractions,
        "Attraction",
        "No attraction data available.",
        |place| format!("  - {} ({})", place.name, place.address),
    );

    format!(
        "You are a travel agent. A user wants a {style} vacation in {destination}.\n\
         They travel with {adults} adult(s) and {children} child(ren) for {duration} days,\n\
         departing {start} from {origin_city} ({origin_code}) and returning {return_date}.\n\
         The total budget is {budget:.0} EUR.\n\
         \n\
         Where a section below reports a confirmed absence, state that plainly and suggest a\n\
         reasonable budget for that category. Where a section reports unavailable data, label\n\
         the gap instead of inventing options.\n\
         \n\
         Flight options from {origin_code} to {destination_code}:\n\
         {flights}\n\
         \n\
         Hotel options in {destination}:\n\
         {hotels}\n\
         \n\
         Weather forecast:\n\
         {weather}\n\
         \n\
         Tourist attractions:\n\
         {attractions}\n\
         \n\
         Generate the plan with exactly these sections: Destination Overview, Flights,\n\
         Accommodation, Weather, Top Attractions, Cost Breakdown (flights, accommodation,\n\
         food, activities, transportation, buffer) and a Total Estimated Cost in EUR.",
        style = input.vacation_style,
        destination = input.destination_city,
        adults = input.adults,
        children = input.children,
        duration = input.duration_days,
        start = input.start_date,
        origin_city = input.origin_city,
        origin_code = input.origin_code,
        return_date = input.return_date,
        budget = input.budget_eur,
        destination_code = input.destination_code,
        flights = flight_lines,
        hotels = hotel_lines,
        weather = weather_lines,
        attractions = attraction_lines,
    )
}
