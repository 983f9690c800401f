//! Slow mood estimation
//!
//! Long-horizon "climate" reading over the recent context window. High latency
//! and allowed to be absent; every failure means "no correction this cycle".

mod ollama;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{Result, VibeError};
use crate::types::{Vibe, VIBE_DIMS};

pub use ollama::OllamaEstimator;

lazy_static! {
    /// Numbers a chatty model may wrap in prose
    static ref UNIT_NUMBER: Regex = Regex::new(r"0\.\d+|1\.0+|[01]").expect("Invalid number regex");
}

/// Context text → baseline reading
#[async_trait]
pub trait SlowEstimator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract_baseline(&self, context: &str) -> Result<Vibe>;
}

/// Estimator used when none is configured: always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEstimator;

#[async_trait]
impl SlowEstimator for NullEstimator {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn extract_baseline(&self, _context: &str) -> Result<Vibe> {
        Err(VibeError::EstimatorUnavailable(
            "no slow estimator configured".to_string(),
        ))
    }
}

/// Pulls exactly five values in [0, 1] out of a model reply.
///
/// Extra numbers after the fifth are ignored; fewer than five is malformed.
pub fn parse_baseline(output: &str) -> Result<Vibe> {
    let values: Vec<f64> = UNIT_NUMBER
        .find_iter(output)
        .take(VIBE_DIMS)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect();

    if values.len() != VIBE_DIMS || !values.iter().all(|v| (0.0..=1.0).contains(v)) {
        return Err(VibeError::MalformedBaseline(output.trim().to_string()));
    }

    Vibe::from_slice(&values).ok_or_else(|| VibeError::MalformedBaseline(output.trim().to_string()))
}
