//! Text-generation client for the Gemini generateContent API
//!
//! The synthesis input is rendered into a prompt elsewhere; this client only
//! submits the prompt and extracts the generated text.

use crate::PlanError;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .find_map(|part| part.text)
    }
}

/// Client for the generative-text model
pub struct GeminiClient {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self, PlanError> {
        let http_client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Generate prose from a composed prompt
    #[instrument(level = "info", skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String, PlanError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}],
        });

        let response = self.http_client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PlanError::GenerationError(format!(
                "HTTP {}: {}",
                status, detail
            )));
        }

        let payload: GenerateResponse = response.json().await?;
        let text = payload
            .first_text()
            .ok_or_else(|| PlanError::GenerationError("model returned no candidates".to_string()))?;
        info!(chars = text.len(), "Itinerary text generated");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text_extraction() {
        let payload = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Day 1: arrive and explore."}]}
            }]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(
            parsed.first_text().as_deref(),
            Some("Day 1: arrive and explore.")
        );
    }

    #[test]
    fn test_first_text_on_empty_response() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(parsed.first_text().is_none());

        let no_parts: GenerateResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": []}}]}"#).unwrap();
        assert!(no_parts.first_text().is_none());
    }
}
