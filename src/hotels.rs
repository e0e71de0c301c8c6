//! Hotel search client for LiteAPI
//!
//! Two-step flow: list hotels for a city, then probe per-hotel rates for the
//! stay. Hotels without a priced rate are skipped. The country code must come
//! from location resolution; searching by city name alone matches same-named
//! cities in the wrong country.

use crate::{PlanError, TravelerCounts};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://api.liteapi.travel/v3.0";
const PER_PAGE: u32 = 10;

/// Rates are probed for at most this many hotels per search
const RATE_PROBE_LIMIT: usize = 3;

/// A hotel with a confirmed price for the stay
#[derive(Debug, Clone, Serialize)]
pub struct HotelOption {
    pub name: String,
    pub address: String,
    pub price: f64,
    pub currency: String,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub stars: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct HotelListResponse {
    #[serde(default)]
    data: Vec<RawHotel>,
}

#[derive(Debug, Deserialize)]
struct RawHotel {
    id: String,
    name: Option<String>,
    address: Option<String>,
    rating: Option<f64>,
    #[serde(rename = "reviewCount")]
    review_count: Option<i64>,
    stars: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    data: Vec<RawHotelRates>,
}

#[derive(Debug, Deserialize)]
struct RawHotelRates {
    #[serde(default, rename = "roomTypes")]
    room_types: Vec<RawRoomType>,
}

#[derive(Debug, Deserialize)]
struct RawRoomType {
    #[serde(default)]
    rates: Vec<RawRate>,
}

#[derive(Debug, Deserialize)]
struct RawRate {
    #[serde(rename = "retailRate")]
    retail_rate: Option<RawRetailRate>,
}

#[derive(Debug, Deserialize)]
struct RawRetailRate {
    #[serde(default)]
    total: Vec<RawAmount>,
}

#[derive(Debug, Deserialize)]
struct RawAmount {
    amount: Option<f64>,
}

impl RawHotelRates {
    /// First priced rate in the response, if any
    fn first_price(&self) -> Option<f64> {
        self.room_types
            .first()?
            .rates
            .first()?
            .retail_rate
            .as_ref()?
            .total
            .first()?
            .amount
    }
}

/// Client for the hotel provider
pub struct HotelsClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl HotelsClient {
    pub fn new(api_key: String) -> Result<Self, PlanError> {
        let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Search hotels in a city and return priced options sorted ascending by
    /// price. Zero results is an empty list, not an error.
    #[instrument(level = "info", skip(self, travelers), fields(city = city, country = country))]
    pub async fn search(
        &self,
        city: &str,
        country: &str,
        checkin: &str,
        checkout: &str,
        travelers: TravelerCounts,
        top_n: usize,
    ) -> Result<Vec<HotelOption>, PlanError> {
        let url = format!("{}/data/hotels", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .header("Accept", "application/json")
            .query(&[
                ("countryCode", country.to_string()),
                ("cityName", city.to_string()),
                ("checkin", checkin.to_string()),
                ("checkout", checkout.to_string()),
                ("adults", travelers.adults.to_string()),
                ("currency", "EUR".to_string()),
                ("page", "1".to_string()),
                ("perPage", PER_PAGE.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlanError::ProviderError {
                service: "hotel search",
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let listing: HotelListResponse = response.json().await?;
        info!(hotels = listing.data.len(), "Hotel listing fetched");

        let mut hotels = Vec::new();
        for hotel in listing.data.into_iter().take(RATE_PROBE_LIMIT) {
            match self.probe_rate(&hotel.id, checkin, checkout, travelers).await {
                Ok(Some(price)) => {
                    hotels.push(HotelOption {
                        name: hotel.name.unwrap_or_else(|| "Unnamed hotel".to_string()),
                        address: hotel
                            .address
                            .unwrap_or_else(|| "No address available".to_string()),
                        price,
                        currency: "EUR".to_string(),
                        rating: hotel.rating,
                        review_count: hotel.review_count,
                        stars: hotel.stars,
                    });
                }
                Ok(None) => {
                    debug!(hotel_id = %hotel.id, "Hotel has no priced rate; skipping");
                }
                Err(e) => {
                    warn!(hotel_id = %hotel.id, error = %e, "Rate probe failed; skipping hotel");
                }
            }
        }

        hotels.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal));
        hotels.truncate(top_n);
        Ok(hotels)
    }

    async fn probe_rate(
        &self,
        hotel_id: &str,
        checkin: &str,
        checkout: &str,
        travelers: TravelerCounts,
    ) -> Result<Option<f64>, PlanError> {
        let url = format!("{}/hotels/rates", self.base_url);
        let children_ages = vec![10; travelers.children.max(0) as usize];
        let body = serde_json::json!({
            "hotelIds": [hotel_id],
            "checkin": checkin,
            "checkout": checkout,
            "currency": "EUR",
            "guestNationality": "US",
            "occupancies": [{"adults": travelers.adults, "children": children_ages}],
        });

        let response = self
            .http_client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let rates: RatesResponse = response.json().await?;
        Ok(rates.data.first().and_then(RawHotelRates::first_price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_price_walks_nested_payload() {
        let payload = r#"{
            "data": [{
                "roomTypes": [{
                    "rates": [{
                        "retailRate": {"total": [{"amount": 412.5}]}
                    }]
                }]
            }]
        }"#;
        let rates: RatesResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(rates.data[0].first_price(), Some(412.5));
    }

    #[test]
    fn test_first_price_handles_missing_levels() {
        let empty: RatesResponse = serde_json::from_str(r#"{"data":[{"roomTypes":[]}]}"#).unwrap();
        assert_eq!(empty.data[0].first_price(), None);

        let no_amount: RatesResponse = serde_json::from_str(
            r#"{"data":[{"roomTypes":[{"rates":[{"retailRate":{"total":[{}]}}]}]}]}"#,
        )
        .unwrap();
        assert_eq!(no_amount.data[0].first_price(), None);
    }

    #[test]
    fn test_hotel_listing_parses_optional_fields() {
        let payload = r#"{
            "data": [
                {"id": "lp1", "name": "Hotel Central", "address": "Main St 1",
                 "rating": 8.7, "reviewCount": 1204, "stars": 4},
                {"id": "lp2"}
            ]
        }"#;
        let listing: HotelListResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(listing.data.len(), 2);
        assert_eq!(listing.data[0].name.as_deref(), Some("Hotel Central"));
        assert_eq!(listing.data[1].name, None);
    }
}
