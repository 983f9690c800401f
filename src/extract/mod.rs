//! Fast VIBE extraction
//!
//! Per-sentence reading used for bursts. The engine only depends on the
//! [`FastExtractor`] trait; [`LexiconExtractor`] is the bundled implementation:
//!
//! - V, A, D: intensity-weighted mean over an NRC-VAD style lexicon
//! - Complexity: Flesch-Kincaid grade / 20
//! - Coherence: mean bag-of-words cosine between adjacent sentences

pub mod readability;
pub mod text;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::{Result, VibeError};
use crate::types::{clamp_unit, Vibe};

/// Synchronous, pure text → VIBE reading
pub trait FastExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vibe;
}

/// Coherence reported for single-sentence text
const SINGLE_SENTENCE_COHERENCE: f64 = 0.8;

/// Weight of a word missing from the lexicon
const UNKNOWN_WORD_WEIGHT: f64 = 0.01;

/// Lexicon-driven extractor
#[derive(Debug, Clone, Default)]
pub struct LexiconExtractor {
    /// word → [v, a, d] in [0, 1]
    lexicon: HashMap<String, [f64; 3]>,
}

impl LexiconExtractor {
    pub fn new(lexicon: HashMap<String, [f64; 3]>) -> Self {
        Self { lexicon }
    }

    /// Loads a TSV lexicon: header line, then `word\tv\ta\td` with values in [-1, 1].
    ///
    /// Short or unparsable rows are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| VibeError::LexiconLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let lexicon = parse_lexicon(&content);
        if lexicon.is_empty() {
            warn!("Lexicon at {} has no usable rows", path.display());
        } else {
            debug!("Loaded {} lexicon entries from {}", lexicon.len(), path.display());
        }

        Ok(Self { lexicon })
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }

    fn vad(&self, text: &str) -> [f64; 3] {
        let tokens = text::words(text);
        if tokens.is_empty() {
            return [0.5; 3];
        }

        let mut sum = [0.0; 3];
        let mut total_weight = 0.0;
        for token in &tokens {
            let (vad, weight) = match self.lexicon.get(token) {
                Some(vad) => {
                    let intensity: f64 = vad.iter().map(|x| (x - 0.5).abs()).sum();
                    (*vad, (intensity + 0.01).powi(2))
                }
                None => ([0.5; 3], UNKNOWN_WORD_WEIGHT),
            };
            for (s, x) in sum.iter_mut().zip(vad) {
                *s += x * weight;
            }
            total_weight += weight;
        }

        sum.map(|s| s / total_weight)
    }

    fn complexity(text: &str) -> f64 {
        clamp_unit(readability::flesch_kincaid_grade(text) / 20.0)
    }

    fn coherence(text: &str) -> f64 {
        let sentences = text::split_sentences(text);
        if sentences.len() < 2 {
            return SINGLE_SENTENCE_COHERENCE;
        }

        let bags: Vec<HashMap<String, f64>> = sentences.iter().map(|s| bag_of_words(s)).collect();
        let sims: Vec<f64> = bags.windows(2).map(|w| cosine(&w[0], &w[1])).collect();
        let mean = sims.iter().sum::<f64>() / sims.len() as f64;

        (mean + 1.0) / 2.0
    }
}

impl FastExtractor for LexiconExtractor {
    fn extract(&self, text: &str) -> Vibe {
        let [v, a, d] = self.vad(text);
        Vibe::clamped([v, a, d, Self::complexity(text), Self::coherence(text)])
    }
}

fn parse_lexicon(content: &str) -> HashMap<String, [f64; 3]> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.trim().split('\t');
            let word = parts.next()?.to_lowercase();
            let mut vad = [0.0; 3];
            for slot in &mut vad {
                let raw: f64 = parts.next()?.trim().parse().ok()?;
                *slot = (raw + 1.0) / 2.0;
            }
            Some((word, vad))
        })
        .collect()
}

fn bag_of_words(sentence: &str) -> HashMap<String, f64> {
    let mut bag = HashMap::new();
    for w in text::words(sentence) {
        *bag.entry(w).or_insert(0.0) += 1.0;
    }
    bag
}

fn cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(k, x)| b.get(k).map(|y| x * y))
        .sum();
    let norm = |m: &HashMap<String, f64>| m.values().map(|x| x * x).sum::<f64>().sqrt();
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
