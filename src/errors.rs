use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the VIBE engine
#[derive(Error, Debug)]
pub enum VibeError {
    /// Transcript text was empty or whitespace only
    #[error("Empty transcript text")]
    EmptyTranscript,

    /// Payload line could not be parsed
    #[error("Invalid transcript payload: {0}")]
    InvalidPayload(String),

    /// Caller-supplied influence override outside [0, 1]
    #[error("influence must be between 0.0 and 1.0, got {0}")]
    InfluenceOutOfRange(f64),

    /// Amplifier constructed without any cinematic exemplar
    #[error("Cinematic exemplar library is empty")]
    EmptyExemplarLibrary,

    /// Exemplar file could not be read or parsed
    #[error("Failed to load exemplars from {path}: {message}")]
    ExemplarLoad { path: PathBuf, message: String },

    /// Lexicon file could not be read
    #[error("Failed to load lexicon from {path}: {message}")]
    LexiconLoad { path: PathBuf, message: String },

    /// Slow estimator is not reachable or disabled
    #[error("Slow estimator unavailable: {0}")]
    EstimatorUnavailable(String),

    /// Slow estimator request failed
    #[error("Slow estimator request failed: {0}")]
    EstimatorRequest(String),

    /// Slow estimator did not answer in time
    #[error("Slow estimator timed out after {timeout_secs}s")]
    EstimatorTimeout { timeout_secs: f64 },

    /// Slow estimator answered with something that is not five values in [0, 1]
    #[error("Malformed baseline response: {0}")]
    MalformedBaseline(String),

    /// Output device rejected a frame
    #[error("Sink error: {0}")]
    Sink(String),

    /// Blender or coordinator mutex was poisoned
    #[error("Failed to lock engine state: {0}")]
    StateLock(String),

    /// Async work requested outside a Tokio runtime
    #[error("No Tokio runtime: {0}")]
    Runtime(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error related to IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for VIBE operations
pub type Result<T> = std::result::Result<T, VibeError>;

impl<T> From<std::sync::PoisonError<T>> for VibeError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        VibeError::StateLock(err.to_string())
    }
}

impl VibeError {
    /// True for errors that only mean "no slow correction this cycle"
    pub fn is_estimator_failure(&self) -> bool {
        matches!(
            self,
            VibeError::EstimatorUnavailable(_)
                | VibeError::EstimatorRequest(_)
                | VibeError::EstimatorTimeout { .. }
                | VibeError::MalformedBaseline(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimator_failures_are_classified() {
        assert!(VibeError::EstimatorUnavailable("off".into()).is_estimator_failure());
        assert!(VibeError::EstimatorTimeout { timeout_secs: 2.0 }.is_estimator_failure());
        assert!(VibeError::MalformedBaseline("0.1 0.2".into()).is_estimator_failure());
        assert!(!VibeError::EmptyTranscript.is_estimator_failure());
        assert!(!VibeError::Sink("closed".into()).is_estimator_failure());
    }

    #[test]
    fn test_influence_message() {
        let err = VibeError::InfluenceOutOfRange(1.5);
        assert_eq!(err.to_string(), "influence must be between 0.0 and 1.0, got 1.5");
    }
}
