//! Points-of-interest client for Geoapify
//!
//! Geocodes the city to coordinates, then lists tourism attractions within a
//! radius around the city center.

use crate::PlanError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

const GEOCODE_URL: &str = "https://api.geoapify.com/v1/geocode/search";
const PLACES_URL: &str = "https://api.geoapify.com/v2/places";

const DEFAULT_RADIUS_M: u32 = 5000;

/// A tourist attraction near the destination
#[derive(Debug, Clone, Serialize)]
pub struct Attraction {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    name: Option<String>,
    formatted: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Client for the attractions provider
pub struct AttractionsClient {
    http_client: Client,
    api_key: String,
}

impl AttractionsClient {
    pub fn new(api_key: String) -> Result<Self, PlanError> {
        let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http_client,
            api_key,
        })
    }

    /// Geocode a city to (latitude, longitude)
    async fn city_coordinates(
        &self,
        city: &str,
        country_code: Option<&str>,
    ) -> Result<(f64, f64), PlanError> {
        let text = match country_code {
            Some(code) if !code.is_empty() => format!("{},{}", city, code),
            _ => city.to_string(),
        };

        let collection: FeatureCollection = self
            .http_client
            .get(GEOCODE_URL)
            .query(&[("text", text.as_str()), ("apiKey", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let properties = collection
            .features
            .first()
            .map(|f| &f.properties)
            .ok_or_else(|| PlanError::ProviderError {
                service: "attractions",
                message: format!("city not found: {}", city),
            })?;

        match (properties.lat, properties.lon) {
            (Some(lat), Some(lon)) => Ok((lat, lon)),
            _ => Err(PlanError::ProviderError {
                service: "attractions",
                message: format!("no coordinates returned for {}", city),
            }),
        }
    }

    /// List tourist attractions around the city center. Zero results is an
    /// empty list, not an error.
    #[instrument(level = "info", skip(self), fields(city = city))]
    pub async fn tourist_attractions(
        &self,
        city: &str,
        country_code: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Attraction>, PlanError> {
        let (lat, lon) = self.city_coordinates(city, country_code).await?;

        // The circle filter uses a literal lon,lat,radius triple.
        let url = format!(
            "{}?categories=tourism.attraction&filter=circle:{},{},{}&limit={}&apiKey={}",
            PLACES_URL, lon, lat, DEFAULT_RADIUS_M, limit, self.api_key
        );

        let collection: FeatureCollection = self
            .http_client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let attractions = collect_attractions(collection);
        info!(attractions = attractions.len(), "Attractions fetched");
        Ok(attractions)
    }
}

fn collect_attractions(collection: FeatureCollection) -> Vec<Attraction> {
    collection
        .features
        .into_iter()
        .map(|feature| Attraction {
            name: feature
                .properties
                .name
                .unwrap_or_else(|| "Unnamed".to_string()),
            address: feature
                .properties
                .formatted
                .unwrap_or_else(|| "No address available".to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_attractions_defaults_missing_fields() {
        let payload = r#"{
            "features": [
                {"properties": {"name": "Belém Tower", "formatted": "Av. Brasília, Lisbon", "lat": 38.69, "lon": -9.21}},
                {"properties": {"lat": 38.7, "lon": -9.13}}
            ]
        }"#;
        let collection: FeatureCollection = serde_json::from_str(payload).unwrap();
        let attractions = collect_attractions(collection);

        assert_eq!(attractions.len(), 2);
        assert_eq!(attractions[0].name, "Belém Tower");
        assert_eq!(attractions[1].name, "Unnamed");
        assert_eq!(attractions[1].address, "No address available");
    }

    #[test]
    fn test_empty_feature_collection() {
        let collection: FeatureCollection = serde_json::from_str(r#"{"features": []}"#).unwrap();
        assert!(collect_attractions(collection).is_empty());
    }
}
