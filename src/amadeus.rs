//! Flight-offer search client for the Amadeus Self-Service API
//!
//! The provider's sandbox environment is backed by sparse data: identical
//! queries may succeed or fail across time without caller misuse, and "zero
//! results" is sometimes reported through the error channel. The adapter
//! therefore classifies every response into a closed [`FlightOutcome`] and
//! never surfaces a fault to the caller.

use crate::{CabinClass, PlanError, TravelerCounts};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};

const DEFAULT_BASE_URL: &str = "https://test.api.amadeus.com";

/// Refresh the OAuth token slightly before the provider expires it
const TOKEN_EXPIRY_GRACE: Duration = Duration::from_secs(30);

/// Flight search parameters as accepted by the provider
#[derive(Debug, Clone)]
pub struct FlightSearchQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: Option<String>,
    pub travelers: TravelerCounts,
    pub cabin_class: CabinClass,
    pub max_offers: u32,
}

impl FlightSearchQuery {
    /// Build the outgoing query parameter set.
    ///
    /// The returnDate parameter is emitted only when a return date was
    /// supplied. A one-way request must not carry the field at all; the
    /// provider rejects an explicit empty value with a request-format error.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("originLocationCode", self.origin.clone()),
            ("destinationLocationCode", self.destination.clone()),
            ("departureDate", self.departure_date.clone()),
        ];
        if let Some(ref return_date) = self.return_date {
            params.push(("returnDate", return_date.clone()));
        }
        params.push(("adults", self.travelers.adults.to_string()));
        if self.travelers.children > 0 {
            params.push(("children", self.travelers.children.to_string()));
        }
        params.push(("travelClass", self.cabin_class.as_param().to_string()));
        params.push(("currencyCode", "EUR".to_string()));
        params.push(("max", self.max_offers.to_string()));
        params
    }

    /// Memoization key covering every parameter that affects the outcome
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}",
            self.origin,
            self.destination,
            self.departure_date,
            self.return_date.as_deref().unwrap_or("-"),
            self.travelers.adults,
            self.travelers.children,
            self.cabin_class.as_param(),
            self.max_offers,
        )
    }
}

/// One leg of an itinerary
#[derive(Debug, Clone, Serialize)]
pub struct FlightSegment {
    pub from: String,
    pub to: String,
    pub departure: String,
    pub arrival: String,
    pub carrier: String,
    pub flight_number: String,
}

/// One journey (outbound or return) of an offer.
///
/// The duration describes the whole journey, not any single segment.
#[derive(Debug, Clone, Serialize)]
pub struct Itinerary {
    pub duration: String,
    pub segments: Vec<FlightSegment>,
}

/// A priced, bookable flight option
#[derive(Debug, Clone, Serialize)]
pub struct FlightOffer {
    pub total_price: f64,
    pub currency: String,
    pub itineraries: Vec<Itinerary>,
}

impl FlightOffer {
    /// Stop count of the outbound journey
    pub fn outbound_stops(&self) -> usize {
        self.itineraries
            .first()
            .map(|it| it.segments.len().saturating_sub(1))
            .unwrap_or(0)
    }
}

/// Diagnostic for a failed provider call
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub code: Option<String>,
    pub message: String,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Outcome of a flight search.
///
/// `NoneAvailable` is a valid, expected business outcome: the provider
/// affirmatively reported zero matching fares. `Failed` means the request
/// itself could not be resolved. The two must never be collapsed.
#[derive(Debug, Clone)]
pub enum FlightOutcome {
    Found(Vec<FlightOffer>),
    NoneAvailable,
    Failed(ProviderFailure),
}

// --- provider wire format ---

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<RawOffer>,
}

#[derive(Debug, Deserialize)]
struct RawOffer {
    price: RawPrice,
    #[serde(default)]
    itineraries: Vec<RawItinerary>,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    total: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct RawItinerary {
    #[serde(default)]
    duration: String,
    #[serde(default)]
    segments: Vec<RawSegment>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    departure: RawEndpoint,
    arrival: RawEndpoint,
    #[serde(rename = "carrierCode")]
    carrier_code: String,
    number: String,
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    #[serde(rename = "iataCode")]
    iata_code: String,
    at: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ProviderErrorBody {
    code: Option<i64>,
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ProviderErrorBody>,
}

/// "No applicable fare" is the provider's way of saying zero matches under
/// stricter fare semantics; it arrives on the error channel but is not a
/// failure.
fn is_no_fare_error(error: &ProviderErrorBody) -> bool {
    let text = format!(
        "{} {}",
        error.title.as_deref().unwrap_or(""),
        error.detail.as_deref().unwrap_or(""),
    )
    .to_uppercase()
    .replace(' ', "_");
    text.contains("NO_FARE_APPLICABLE") || text.contains("NO_COMBINABLE_FARES")
}

fn classify_provider_errors(errors: &[ProviderErrorBody]) -> FlightOutcome {
    if errors.iter().any(is_no_fare_error) {
        info!("Provider reported no applicable fares; treating as zero results");
        return FlightOutcome::NoneAvailable;
    }

    let failure = match errors.first() {
        Some(first) => ProviderFailure {
            code: first.code.map(|c| c.to_string()),
            message: match (&first.title, &first.detail) {
                (Some(title), Some(detail)) => format!("{}: {}", title, detail),
                (Some(title), None) => title.clone(),
                (None, Some(detail)) => detail.clone(),
                (None, None) => "provider returned an error without detail".to_string(),
            },
        },
        None => ProviderFailure {
            code: None,
            message: "provider returned an error without detail".to_string(),
        },
    };
    FlightOutcome::Failed(failure)
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Client for the flight-offer provider
pub struct AmadeusClient {
    http_client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl AmadeusClient {
    pub fn new(client_id: String, client_secret: String) -> Result<Self, PlanError> {
        let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id,
            client_secret,
            token: Mutex::new(None),
        })
    }

    /// Override the provider base URL (sandbox vs. production)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Search flight offers, classifying every response into a
    /// [`FlightOutcome`]. Transport faults become `Failed`, never a panic or
    /// an `Err` to the caller.
    #[instrument(level = "info", skip(self, query), fields(origin = %query.origin, destination = %query.destination))]
    pub async fn search(&self, query: &FlightSearchQuery) -> FlightOutcome {
        match self.try_search(query).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Flight search transport failure");
                FlightOutcome::Failed(ProviderFailure {
                    code: None,
                    message: e.to_string(),
                })
            }
        }
    }

    async fn try_search(&self, query: &FlightSearchQuery) -> Result<FlightOutcome, PlanError> {
        let token = self.access_token().await?;
        let url = format!("{}/v2/shopping/flight-offers", self.base_url);

        let start_time = Instant::now();
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .query(&query.query_params())
            .send()
            .await?;
        let status = response.status();
        info!(
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            "Flight search request completed"
        );

        if status.is_success() {
            let payload: OffersResponse = response.json().await?;
            if payload.data.is_empty() {
                info!("Provider returned an empty offer list");
                return Ok(FlightOutcome::NoneAvailable);
            }
            let offers: Vec<FlightOffer> = payload.data.into_iter().map(simplify_offer).collect();
            debug!(offers = offers.len(), "Simplified provider offers");
            return Ok(FlightOutcome::Found(offers));
        }

        let body = response.text().await?;
        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) => Ok(classify_provider_errors(&parsed.errors)),
            Err(_) => Ok(FlightOutcome::Failed(ProviderFailure {
                code: None,
                message: format!("HTTP {}: {}", status, body),
            })),
        }
    }

    async fn access_token(&self) -> Result<String, PlanError> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        debug!("Requesting new provider access token");
        let url = format!("{}/v1/security/oauth2/token", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let token: TokenResponse = response.json().await?;
        let expires_at = Instant::now()
            + Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_GRACE);

        let mut guard = self.token.lock().expect("token cache lock poisoned");
        *guard = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }

    fn cached_token(&self) -> Option<String> {
        let guard = self.token.lock().expect("token cache lock poisoned");
        guard
            .as_ref()
            .filter(|t| t.expires_at > Instant::now())
            .map(|t| t.value.clone())
    }
}

fn simplify_offer(raw: RawOffer) -> FlightOffer {
    let itineraries = raw
        .itineraries
        .into_iter()
        .map(|it| Itinerary {
            duration: it.duration,
            segments: it
                .segments
                .into_iter()
                .map(|s| FlightSegment {
                    from: s.departure.iata_code,
                    to: s.arrival.iata_code,
                    departure: s.departure.at,
                    arrival: s.arrival.at,
                    carrier: s.carrier_code,
                    flight_number: s.number,
                })
                .collect(),
        })
        .collect();

    FlightOffer {
        total_price: raw.price.total.parse().unwrap_or(0.0),
        currency: raw.price.currency,
        itineraries,
    }
}

/// Render an ISO-8601 journey duration ("PT11H30M") as "11h 30m"
pub fn format_duration(iso: &str) -> String {
    let re = Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?$").expect("valid duration pattern");
    match re.captures(iso) {
        Some(caps) => {
            let hours = caps.get(1).map(|m| m.as_str()).unwrap_or("0");
            let minutes = caps.get(2).map(|m| m.as_str()).unwrap_or("0");
            format!("{}h {}m", hours, minutes)
        }
        None => iso.to_string(),
    }
}
