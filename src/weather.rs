//! Weather forecast client for OpenWeatherMap
//!
//! Geocodes the city first, then reduces the 5-day/3-hour forecast to one
//! entry per date for the first few days of the trip.

use crate::PlanError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

const GEOCODE_URL: &str = "http://api.openweathermap.org/geo/1.0/direct";
const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Forecasts are reduced to this many distinct days
const FORECAST_DAYS: usize = 3;

/// One day of forecast data
#[derive(Debug, Clone, Serialize)]
pub struct DayForecast {
    pub date: String,
    pub temp_c: f64,
    pub description: String,
}

impl fmt::Display for DayForecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.1}°C, {}", self.date, self.temp_c, self.description)
    }
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt_txt: String,
    main: ForecastMain,
    #[serde(default)]
    weather: Vec<ForecastWeather>,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastWeather {
    description: String,
}

/// Reduce 3-hourly forecast entries to the first distinct dates
fn summarize_forecast(entries: &[ForecastEntry]) -> Vec<DayForecast> {
    let mut seen_dates = HashSet::new();
    let mut summary = Vec::new();

    for entry in entries {
        let date = entry.dt_txt.split(' ').next().unwrap_or("").to_string();
        if date.is_empty() || !seen_dates.insert(date.clone()) {
            continue;
        }
        summary.push(DayForecast {
            date,
            temp_c: entry.main.temp,
            description: entry
                .weather
                .first()
                .map(|w| w.description.clone())
                .unwrap_or_else(|| "unknown".to_string()),
        });
        if summary.len() >= FORECAST_DAYS {
            break;
        }
    }

    summary
}

/// Client for the weather provider
pub struct WeatherClient {
    http_client: Client,
    api_key: String,
}

impl WeatherClient {
    pub fn new(api_key: String) -> Result<Self, PlanError> {
        let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http_client,
            api_key,
        })
    }

    /// Fetch a short forecast for a city.
    ///
    /// The region code is appended to the geocoding query only when present;
    /// an empty suffix makes the lookup fail.
    #[instrument(level = "info", skip(self), fields(city = city))]
    pub async fn forecast(
        &self,
        city: &str,
        country_code: Option<&str>,
    ) -> Result<Vec<DayForecast>, PlanError> {
        let query = match country_code {
            Some(code) if !code.is_empty() => format!("{},{}", city, code),
            _ => city.to_string(),
        };

        let geo: Vec<GeoResult> = self
            .http_client
            .get(GEOCODE_URL)
            .query(&[
                ("q", query.as_str()),
                ("limit", "1"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let coords = geo.first().ok_or_else(|| PlanError::ProviderError {
            service: "weather",
            message: format!("could not geocode '{}'", city),
        })?;

        let forecast: ForecastResponse = self
            .http_client
            .get(FORECAST_URL)
            .query(&[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let summary = summarize_forecast(&forecast.list);
        info!(days = summary.len(), "Forecast summarized");
        Ok(summary)
    }
}
