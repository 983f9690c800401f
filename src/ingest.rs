//! Transcript ingestion boundary.
//!
//! Validation happens here so malformed input never reaches the blender.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VibeError};
use crate::types::Vibe;

/// One transcript submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptPayload {
    pub text: String,
    /// Per-call baseline influence override in [0, 1]
    #[serde(default)]
    pub influence: Option<f64>,
}

impl TranscriptPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            influence: None,
        }
    }

    pub fn with_influence(mut self, influence: f64) -> Self {
        self.influence = Some(influence);
        self
    }

    /// Reads one input line: a JSON payload when it looks like an object,
    /// plain transcript text otherwise.
    pub fn from_line(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        if trimmed.starts_with('{') {
            serde_json::from_str(trimmed)
                .map_err(|e| VibeError::InvalidPayload(e.to_string()))
        } else {
            Ok(Self::new(trimmed))
        }
    }

    /// Trimmed text, after checking text and influence.
    pub fn validate(&self) -> Result<&str> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(VibeError::EmptyTranscript);
        }

        if let Some(influence) = self.influence {
            if !(0.0..=1.0).contains(&influence) {
                return Err(VibeError::InfluenceOutOfRange(influence));
            }
        }

        Ok(text)
    }
}

/// Result of ingesting one payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    /// Rendered value after the last sentence's burst
    pub vibe: Vibe,
    pub influence_used: f64,
    pub sentences_processed: usize,
    pub transcript_count: u64,
    pub context_words: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   \n\t")]
    fn test_empty_text_rejected(#[case] text: &str) {
        let payload = TranscriptPayload::new(text);
        assert!(matches!(payload.validate(), Err(VibeError::EmptyTranscript)));
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.01)]
    #[case(f64::NAN)]
    fn test_influence_out_of_range(#[case] influence: f64) {
        let payload = TranscriptPayload::new("hello").with_influence(influence);
        assert!(matches!(
            payload.validate(),
            Err(VibeError::InfluenceOutOfRange(_))
        ));
    }

    #[test]
    fn test_valid_payload_trimmed() {
        let payload = TranscriptPayload::new("  hi there  ").with_influence(1.0);
        assert_eq!(payload.validate().unwrap(), "hi there");
    }

    #[test]
    fn test_from_line() {
        let json = TranscriptPayload::from_line(r#"{"text": "We did it!", "influence": 0.5}"#).unwrap();
        assert_eq!(json.text, "We did it!");
        assert_eq!(json.influence, Some(0.5));

        let plain = TranscriptPayload::from_line("  just words \n").unwrap();
        assert_eq!(plain, TranscriptPayload::new("just words"));

        assert!(matches!(
            TranscriptPayload::from_line("{not json"),
            Err(VibeError::InvalidPayload(_))
        ));
    }
}
