//! Cinematic exemplar palette.
//!
//! Reference emotional states that the amplifier can snap toward. Loaded once
//! and read-only afterwards.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VibeError};
use crate::types::Vibe;

/// One reference state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    pub name: String,
    pub source: String,
    /// The reference reading. Named `input` to match the palette dataset rows.
    #[serde(rename = "input")]
    pub vibe: Vibe,
}

impl Exemplar {
    pub fn new(name: &str, source: &str, values: [f64; 5]) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            vibe: Vibe::clamped(values),
        }
    }
}

/// Immutable, non-empty list of exemplars
#[derive(Debug, Clone)]
pub struct ExemplarLibrary {
    exemplars: Vec<Exemplar>,
}

impl ExemplarLibrary {
    /// Fails on an empty list.
    pub fn new(exemplars: Vec<Exemplar>) -> Result<Self> {
        if exemplars.is_empty() {
            return Err(VibeError::EmptyExemplarLibrary);
        }
        Ok(Self { exemplars })
    }

    /// Palette compiled into the binary
    pub fn builtin() -> Self {
        Self {
            exemplars: vec![
                Exemplar::new("Triumphant Victory", "sports drama finale", [0.90, 0.85, 0.85, 0.55, 0.80]),
                Exemplar::new("Quiet Grief", "family drama", [0.15, 0.25, 0.25, 0.45, 0.70]),
                Exemplar::new("Creeping Dread", "psychological horror", [0.20, 0.70, 0.20, 0.65, 0.35]),
                Exemplar::new("Blind Rage", "revenge thriller", [0.10, 0.95, 0.80, 0.40, 0.25]),
                Exemplar::new("Tender Romance", "romantic drama", [0.85, 0.40, 0.50, 0.40, 0.85]),
                Exemplar::new("Awe", "space epic", [0.80, 0.65, 0.40, 0.80, 0.75]),
                Exemplar::new("Calm Contemplation", "art house", [0.60, 0.15, 0.50, 0.60, 0.85]),
                Exemplar::new("Panic", "disaster film", [0.15, 0.95, 0.15, 0.70, 0.15]),
                Exemplar::new("Playful Mischief", "heist comedy", [0.80, 0.70, 0.60, 0.45, 0.60]),
                Exemplar::new("Melancholy", "indie drama", [0.30, 0.20, 0.35, 0.50, 0.75]),
                Exemplar::new("Cold Menace", "crime noir", [0.25, 0.45, 0.90, 0.55, 0.70]),
                Exemplar::new("Neutral Observation", "documentary", [0.50, 0.40, 0.50, 0.50, 0.80]),
            ],
        }
    }

    /// Reads a JSON array of `{"name", "source", "input": [5 floats]}` rows.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| VibeError::ExemplarLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let exemplars: Vec<Exemplar> =
            serde_json::from_str(&content).map_err(|e| VibeError::ExemplarLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Self::new(exemplars)
    }

    pub fn len(&self) -> usize {
        self.exemplars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exemplars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exemplar> {
        self.exemplars.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&Exemplar> {
        self.exemplars.get(idx)
    }
}
