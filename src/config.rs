//! Engine Configuration
//!
//! Tunable constants for the blender, amplifier, coordinator and the
//! reference collaborators. Every field has a default so a partial file works.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, VibeError};

/// Accepted render rates, in Hz
pub const MIN_TICK_HZ: f64 = 0.01;
pub const MAX_TICK_HZ: f64 = 1000.0;

/// Full engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub blender: BlenderConfig,
    pub amplifier: AmplifierConfig,
    pub coordinator: CoordinatorConfig,
    pub estimator: EstimatorConfig,
    pub extractor: ExtractorConfig,
    pub sink: SinkConfig,
}

/// Attack / hold / decay constants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlenderConfig {
    /// How much a normal sentence nudges the baseline
    pub default_influence: f64,
    /// How much a slow-estimator correction nudges the baseline
    pub baseline_influence: f64,
    pub dwell_secs: f64,
    pub hold_secs: f64,
    /// Fraction of the remaining gap covered per tick
    pub decay_rate: f64,
}

impl Default for BlenderConfig {
    fn default() -> Self {
        Self {
            default_influence: 0.22,
            baseline_influence: 0.70,
            dwell_secs: 1.2,
            hold_secs: 0.8,
            decay_rate: 0.06,
        }
    }
}

impl BlenderConfig {
    pub fn dwell(&self) -> Duration {
        Duration::try_from_secs_f64(self.dwell_secs).unwrap_or_default()
    }

    pub fn hold(&self) -> Duration {
        Duration::try_from_secs_f64(self.hold_secs).unwrap_or_default()
    }
}

/// Passion / drama knobs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AmplifierConfig {
    pub passion: f64,
    pub drama: f64,
    /// Number of exemplars blended when snapping
    pub k: usize,
    pub max_passion: f64,
    /// JSON exemplar palette; the built-in palette is used when unset
    pub exemplars_path: Option<PathBuf>,
}

impl Default for AmplifierConfig {
    fn default() -> Self {
        Self {
            passion: 2.25,
            drama: 0.65,
            k: 1,
            max_passion: 3.5,
            exemplars_path: None,
        }
    }
}

/// Tick loop and slow-update scheduling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub tick_hz: f64,
    pub settle_threshold: f64,
    /// Words kept in the rolling context buffer
    pub context_capacity: usize,
    /// Trailing words sent to the slow estimator
    pub window_words: usize,
    /// Text used for the startup baseline; `None` skips the warm-up
    pub warmup_text: Option<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tick_hz: 10.0,
            settle_threshold: 0.02,
            context_capacity: 200,
            window_words: 100,
            warmup_text: Some("Say hello to Reachy.".to_string()),
        }
    }
}

impl CoordinatorConfig {
    /// Period of the render loop; never zero.
    ///
    /// Rates outside [`MIN_TICK_HZ`, `MAX_TICK_HZ`] are clamped into it.
    pub fn tick_interval(&self) -> Duration {
        let hz = if self.tick_hz.is_nan() {
            MAX_TICK_HZ
        } else {
            self.tick_hz.clamp(MIN_TICK_HZ, MAX_TICK_HZ)
        };
        Duration::from_secs_f64(1.0 / hz).max(Duration::from_nanos(1))
    }
}

/// Slow mood estimator (Ollama)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstimatorConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".to_string(),
            model: "nemotron-mini:4b-instruct-q5_K_M".to_string(),
            timeout_secs: 20.0,
        }
    }
}

impl EstimatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::from_secs(20))
    }
}

/// Fast extractor
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractorConfig {
    /// NRC-VAD style lexicon (TSV with header)
    pub lexicon_path: Option<PathBuf>,
}

/// Output device
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SinkConfig {
    /// Character device or file receiving `VIBE ...` lines; dry run when unset
    pub device_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Configuration directory
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "vibe-eyes", "vibe-eyes")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Default config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Rejects values the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| -> Result<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(VibeError::Configuration(format!(
                    "{name} must be in [0, 1], got {v}"
                )))
            }
        };
        let non_negative = |name: &str, v: f64| -> Result<()> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(VibeError::Configuration(format!(
                    "{name} must be a non-negative number, got {v}"
                )))
            }
        };

        unit("blender.default_influence", self.blender.default_influence)?;
        unit("blender.baseline_influence", self.blender.baseline_influence)?;
        unit("blender.decay_rate", self.blender.decay_rate)?;
        non_negative("blender.dwell_secs", self.blender.dwell_secs)?;
        non_negative("blender.hold_secs", self.blender.hold_secs)?;

        unit("amplifier.drama", self.amplifier.drama)?;
        non_negative("amplifier.passion", self.amplifier.passion)?;
        non_negative("amplifier.max_passion", self.amplifier.max_passion)?;

        if !(MIN_TICK_HZ..=MAX_TICK_HZ).contains(&self.coordinator.tick_hz) {
            return Err(VibeError::Configuration(format!(
                "coordinator.tick_hz must be in [{MIN_TICK_HZ}, {MAX_TICK_HZ}], got {}",
                self.coordinator.tick_hz
            )));
        }
        non_negative("coordinator.settle_threshold", self.coordinator.settle_threshold)?;
        if self.coordinator.context_capacity == 0 {
            return Err(VibeError::Configuration(
                "coordinator.context_capacity must be at least 1".to_string(),
            ));
        }
        if self.coordinator.window_words == 0
            || self.coordinator.window_words > self.coordinator.context_capacity
        {
            return Err(VibeError::Configuration(format!(
                "coordinator.window_words must be in 1..={}, got {}",
                self.coordinator.context_capacity, self.coordinator.window_words
            )));
        }

        if !(self.estimator.timeout_secs.is_finite() && self.estimator.timeout_secs > 0.0) {
            return Err(VibeError::Configuration(format!(
                "estimator.timeout_secs must be positive, got {}",
                self.estimator.timeout_secs
            )));
        }

        Ok(())
    }
}

/// Loads configuration from `path`, or from the platform config dir.
///
/// A missing file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match EngineConfig::config_path() {
            Some(p) => p,
            None => return Ok(EngineConfig::default()),
        },
    };

    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| VibeError::Configuration(format!("Failed to read config: {e}")))?;

    // TOML by extension, JSON otherwise
    let config: EngineConfig = if path.extension().is_some_and(|e| e == "toml") {
        toml::from_str(&content)
            .map_err(|e| VibeError::Configuration(format!("Invalid TOML config: {e}")))?
    } else {
        serde_json::from_str(&content)
            .map_err(|e| VibeError::Configuration(format!("Invalid JSON config: {e}")))?
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.blender.default_influence, 0.22);
        assert_eq!(config.coordinator.window_words, 100);
        assert_eq!(config.coordinator.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_tick_interval_never_zero() {
        for tick_hz in [1e10, f64::INFINITY, f64::NAN, 0.0, -5.0, 1e-300] {
            let coordinator = CoordinatorConfig {
                tick_hz,
                ..CoordinatorConfig::default()
            };
            let interval = coordinator.tick_interval();
            assert!(interval >= Duration::from_millis(1), "tick_hz {tick_hz}");
            assert!(interval <= Duration::from_secs(100), "tick_hz {tick_hz}");
        }
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[amplifier]\npassion = 1.5\n\n[estimator]\nenabled = false").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.amplifier.passion, 1.5);
        assert_eq!(config.amplifier.drama, 0.65);
        assert!(!config.estimator.enabled);
        assert_eq!(config.blender, BlenderConfig::default());
    }

    #[test]
    fn test_json_config() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"blender": {{"decay_rate": 0.1}}}}"#).unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.blender.decay_rate, 0.1);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = EngineConfig::default();
        config.blender.decay_rate = 1.5;
        assert!(matches!(config.validate(), Err(VibeError::Configuration(_))));

        let mut config = EngineConfig::default();
        config.coordinator.window_words = 500;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.coordinator.tick_hz = 0.0;
        assert!(config.validate().is_err());

        // Periods that round to zero or overflow a Duration
        for tick_hz in [1e10, 1e-300, f64::INFINITY, f64::NAN, 1000.5] {
            let mut config = EngineConfig::default();
            config.coordinator.tick_hz = tick_hz;
            assert!(
                matches!(config.validate(), Err(VibeError::Configuration(_))),
                "tick_hz {tick_hz} accepted"
            );
        }

        for tick_hz in [MIN_TICK_HZ, MAX_TICK_HZ] {
            let mut config = EngineConfig::default();
            config.coordinator.tick_hz = tick_hz;
            assert!(config.validate().is_ok());
        }
    }
}
