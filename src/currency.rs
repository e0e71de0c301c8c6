//! Currency conversion client for exchangerate.host
//!
//! Used to normalize a non-EUR budget for the synthesis input. The free plan
//! works without an access key; a key is attached when configured.

use crate::PlanError;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const CONVERT_URL: &str = "https://api.exchangerate.host/convert";

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    #[serde(default)]
    success: bool,
    result: Option<f64>,
    error: Option<ConvertError>,
}

#[derive(Debug, Deserialize)]
struct ConvertError {
    info: Option<String>,
}

/// Client for the exchange-rate provider
pub struct CurrencyClient {
    http_client: Client,
    access_key: Option<String>,
}

impl CurrencyClient {
    pub fn new(access_key: Option<String>) -> Result<Self, PlanError> {
        let http_client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            http_client,
            access_key,
        })
    }

    /// Convert an amount between two ISO 4217 currencies, rounded to cents
    #[instrument(level = "debug", skip(self))]
    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, PlanError> {
        let mut params = vec![
            ("from", from.to_string()),
            ("to", to.to_string()),
            ("amount", amount.to_string()),
        ];
        if let Some(ref key) = self.access_key {
            params.push(("access_key", key.clone()));
        }

        let response: ConvertResponse = self
            .http_client
            .get(CONVERT_URL)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match (response.success, response.result) {
            (true, Some(result)) => {
                let rounded = (result * 100.0).round() / 100.0;
                debug!(amount, from, to, converted = rounded, "Currency converted");
                Ok(rounded)
            }
            _ => {
                let info = response
                    .error
                    .and_then(|e| e.info)
                    .unwrap_or_else(|| "unknown conversion error".to_string());
                Err(PlanError::ProviderError {
                    service: "currency conversion",
                    message: info,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_response_success() {
        let payload = r#"{"success": true, "result": 163.4567}"#;
        let parsed: ConvertResponse = serde_json::from_str(payload).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.result, Some(163.4567));
    }

    #[test]
    fn test_convert_response_error_shape() {
        let payload = r#"{"success": false, "error": {"info": "invalid currency"}}"#;
        let parsed: ConvertResponse = serde_json::from_str(payload).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error.unwrap().info.as_deref(), Some("invalid currency"));
    }

    #[test]
    fn test_missing_success_field_defaults_false() {
        let parsed: ConvertResponse = serde_json::from_str("{}").unwrap();
        assert!(!parsed.success);
    }
}
