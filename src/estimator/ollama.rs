//! Ollama Estimator
//!
//! Deterministic numeric climate scoring through a local Ollama model.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{parse_baseline, SlowEstimator};
use crate::config::EstimatorConfig;
use crate::errors::{Result, VibeError};
use crate::types::Vibe;

const CLIMATE_PROMPT: &str = r"You are a machine-to-machine emotional climate scoring engine.

Evaluate the LONG-TERM emotional climate of the text.

This is not momentary emotion.
This is not expressive intensity.
This represents the stable underlying mood.

You must output five values in this exact order:

1) Valence: negative (0.0) to positive (1.0)
2) Arousal: calm (0.0) to energized (1.0)
3) Dominance: passive/weak (0.0) to powerful/controlled (1.0)
4) Complexity: minimal/simple (0.0) to rich/visually dense (1.0)
5) Coherence: chaotic/disorganized (0.0) to harmonious/ordered (1.0)

Neutral baseline for all dimensions is 0.5.

Only move away from 0.5 if the text shows a clear sustained emotional direction.

If tone is mixed, uncertain, or mild, stay near 0.5.

Weight recent text more heavily than earlier text.
If emotional tone has shifted recently, reflect the shift.

All values must remain between 0.2 and 0.8.
Never exceed this range.

Deviation magnitude should reflect sustained emotional strength:
0.52-0.58 = mild climate
0.58-0.68 = clear climate
0.68-0.8  = dominant sustained climate

Return EXACTLY five floating point numbers separated by spaces.
No words.
No explanations.
No commas.
No brackets.

Example valid output:
0.25 0.48 0.82 0.40 0.70

Text:
";

/// Slow estimator backed by Ollama's `/api/generate`
pub struct OllamaEstimator {
    client: Client,
    base_url: String,
    model: String,
    timeout_secs: f64,
}

impl OllamaEstimator {
    pub fn new(config: &EstimatorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| VibeError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Checks whether Ollama answers at all
    pub async fn is_available(&self) -> bool {
        let tags_url = format!("{}/api/tags", self.base_url);
        self.client
            .get(&tags_url)
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    fn build_prompt(text: &str) -> String {
        format!("{CLIMATE_PROMPT}{text}\n\nOutput:\n")
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "prompt": Self::build_prompt(text),
            "stream": false,
            "options": {
                "temperature": 0.0,
                "top_k": 1,
                "num_predict": 42,
                "repeat_penalty": 1.05,
                "stop": ["\n"],
                "num_ctx": 512,
                "num_thread": 2,
            }
        })
    }
}

#[async_trait]
impl SlowEstimator for OllamaEstimator {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn extract_baseline(&self, context: &str) -> Result<Vibe> {
        let url = format!("{}/api/generate", self.base_url);
        debug!("Requesting climate from {} ({})", url, self.model);

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(context))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    VibeError::EstimatorUnavailable(
                        "Ollama not running. Start with: ollama serve".to_string(),
                    )
                } else if e.is_timeout() {
                    VibeError::EstimatorTimeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    VibeError::EstimatorRequest(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(VibeError::EstimatorRequest(format!("{status}: {text}")));
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| VibeError::EstimatorRequest(e.to_string()))?;

        match parse_baseline(&data.response) {
            Ok(vibe) => {
                info!("Baseline scored: {:.2}", vibe);
                Ok(vibe)
            }
            Err(e) => {
                warn!("Invalid climate response: {}", data.response.trim());
                Err(e)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let estimator = OllamaEstimator::new(&EstimatorConfig::default()).unwrap();
        assert_eq!(estimator.model(), "nemotron-mini:4b-instruct-q5_K_M");
        assert!(estimator.base_url.contains("localhost:11434"));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = EstimatorConfig {
            base_url: "http://example:11434/".to_string(),
            ..EstimatorConfig::default()
        };
        let estimator = OllamaEstimator::new(&config).unwrap();
        assert_eq!(estimator.base_url, "http://example:11434");
    }

    #[test]
    fn test_request_body_is_deterministic() {
        let estimator = OllamaEstimator::new(&EstimatorConfig::default()).unwrap();
        let body = estimator.request_body("we won the match");

        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["options"]["temperature"], json!(0.0));
        assert_eq!(body["options"]["top_k"], json!(1));
        assert_eq!(body["options"]["stop"], json!(["\n"]));
        let prompt = body["prompt"].as_str().unwrap();
        assert!(prompt.contains("Text:\nwe won the match"));
        assert!(prompt.ends_with("Output:\n"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_estimator_failure() {
        let config = EstimatorConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2.0,
            ..EstimatorConfig::default()
        };
        let estimator = OllamaEstimator::new(&config).unwrap();
        let err = estimator.extract_baseline("hello").await.unwrap_err();
        assert!(err.is_estimator_failure());
        assert!(!estimator.is_available().await);
    }
}
