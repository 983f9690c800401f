//! Cinematic Amplifier
//!
//! Two stateless stages applied to every fast reading:
//!
//! 1. **Passion**: radial gain around neutral (0.5) on Valence, Arousal and
//!    Dominance. The gain grows with the distance from neutral, so strong
//!    readings are exaggerated more than weak ones.
//! 2. **Drama**: linear pull toward the nearest cinematic exemplar(s) under a
//!    weighted Euclidean distance that cares mostly about Valence and Arousal.

pub mod exemplars;

use serde::Serialize;

use crate::errors::Result;
use crate::types::{clamp_unit, Vibe, VIBE_DIMS};

pub use exemplars::{Exemplar, ExemplarLibrary};

/// Emotional importance of each dimension in exemplar matching
pub const DIMENSION_WEIGHTS: [f64; VIBE_DIMS] = [3.0, 3.0, 1.2, 0.3, 0.3];

/// Default passion ceiling
pub const MAX_PASSION: f64 = 3.5;

/// Keeps inverse-distance weights finite on an exact match
const IDW_EPSILON: f64 = 0.01;

/// Only V, A and D receive radial gain
const AMPLIFIED_DIMS: usize = 3;

/// Diagnostic view of a nearby exemplar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExemplarMatch {
    pub name: String,
    pub source: String,
    pub distance: f64,
}

/// Every stage of one amplification, for telemetry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmplifiedReading {
    pub natural: Vibe,
    pub post_passion: Vibe,
    pub post_drama: Vibe,
    /// Nearest exemplar to the post-passion reading; `None` when drama is off
    pub cinema: Option<ExemplarMatch>,
}

/// Per-dimension palette statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExemplarStats {
    pub mean: [f64; VIBE_DIMS],
    pub std: [f64; VIBE_DIMS],
    pub min: [f64; VIBE_DIMS],
    pub max: [f64; VIBE_DIMS],
    pub count: usize,
    pub dimension_weights: [f64; VIBE_DIMS],
}

/// Radial amplifier with cinematic snapping
#[derive(Debug, Clone)]
pub struct CinematicAmplifier {
    library: ExemplarLibrary,
    max_passion: f64,
}

impl CinematicAmplifier {
    pub fn new(library: ExemplarLibrary) -> Self {
        Self {
            library,
            max_passion: MAX_PASSION,
        }
    }

    /// Builds from raw exemplars, failing when there are none.
    pub fn from_exemplars(exemplars: Vec<Exemplar>) -> Result<Self> {
        Ok(Self::new(ExemplarLibrary::new(exemplars)?))
    }

    pub fn with_max_passion(mut self, max_passion: f64) -> Self {
        self.max_passion = max_passion.max(0.0);
        self
    }

    pub fn library(&self) -> &ExemplarLibrary {
        &self.library
    }

    /// Radial gain on V, A, D; Complexity and Coherence pass through.
    pub fn amplify_magnitude(&self, vibe: &Vibe, passion: f64) -> Vibe {
        let passion = if passion.is_finite() {
            passion.clamp(0.0, self.max_passion)
        } else {
            0.0
        };

        let mut values = vibe.values();
        for v in values.iter_mut().take(AMPLIFIED_DIMS) {
            let delta = *v - 0.5;
            let gain = 1.0 + passion * delta.abs();
            *v = 0.5 + delta * gain;
        }
        Vibe::clamped(values)
    }

    /// Interpolates `drama` of the way toward the nearest exemplar target.
    ///
    /// With `k > 1` the target is the inverse-distance-weighted mean of the
    /// `k` nearest exemplars.
    pub fn snap_toward_exemplar(&self, vibe: &Vibe, drama: f64, k: usize) -> Vibe {
        let drama = clamp_drama(drama);
        if drama <= 0.0 {
            return *vibe;
        }

        let target = self.target(vibe, k);
        vibe.lerp(&target, drama)
    }

    /// Nearest `k` exemplars, closest first.
    pub fn nearest_exemplars(&self, vibe: &Vibe, k: usize) -> Vec<ExemplarMatch> {
        self.ranked(vibe, k)
            .into_iter()
            .filter_map(|(idx, distance)| {
                self.library.get(idx).map(|ex| ExemplarMatch {
                    name: ex.name.clone(),
                    source: ex.source.clone(),
                    distance,
                })
            })
            .collect()
    }

    /// Passion then drama, keeping every intermediate value.
    pub fn amplify(&self, natural: &Vibe, passion: f64, drama: f64, k: usize) -> AmplifiedReading {
        let post_passion = self.amplify_magnitude(natural, passion);
        let post_drama = self.snap_toward_exemplar(&post_passion, drama, k);

        let cinema = if clamp_drama(drama) > 0.0 {
            self.nearest_exemplars(&post_passion, 1).into_iter().next()
        } else {
            None
        };

        AmplifiedReading {
            natural: *natural,
            post_passion,
            post_drama,
            cinema,
        }
    }

    pub fn exemplar_stats(&self) -> ExemplarStats {
        let count = self.library.len();
        let n = count as f64;

        let mut mean = [0.0; VIBE_DIMS];
        let mut min = [f64::INFINITY; VIBE_DIMS];
        let mut max = [f64::NEG_INFINITY; VIBE_DIMS];
        for ex in self.library.iter() {
            for (i, v) in ex.vibe.values().into_iter().enumerate() {
                mean[i] += v / n;
                min[i] = min[i].min(v);
                max[i] = max[i].max(v);
            }
        }

        // Population standard deviation
        let mut std = [0.0; VIBE_DIMS];
        for ex in self.library.iter() {
            for (i, v) in ex.vibe.values().into_iter().enumerate() {
                std[i] += (v - mean[i]).powi(2) / n;
            }
        }
        let std = std.map(f64::sqrt);

        ExemplarStats {
            mean,
            std,
            min,
            max,
            count,
            dimension_weights: DIMENSION_WEIGHTS,
        }
    }

    fn target(&self, vibe: &Vibe, k: usize) -> Vibe {
        let ranked = self.ranked(vibe, k);

        if let [(idx, _)] = ranked.as_slice() {
            if let Some(ex) = self.library.get(*idx) {
                return ex.vibe;
            }
        }

        let weights: Vec<f64> = ranked
            .iter()
            .map(|(_, d)| 1.0 / (d + IDW_EPSILON))
            .collect();
        let total: f64 = weights.iter().sum();

        let mut blended = [0.0; VIBE_DIMS];
        for ((idx, _), w) in ranked.iter().zip(weights.iter()) {
            if let Some(ex) = self.library.get(*idx) {
                for (b, v) in blended.iter_mut().zip(ex.vibe.values()) {
                    *b += v * w / total;
                }
            }
        }
        Vibe::clamped(blended)
    }

    /// `(index, distance)` of the `k` nearest exemplars, ascending.
    fn ranked(&self, vibe: &Vibe, k: usize) -> Vec<(usize, f64)> {
        let mut all: Vec<(usize, f64)> = self
            .library
            .iter()
            .enumerate()
            .map(|(i, ex)| (i, weighted_distance(&ex.vibe, vibe)))
            .collect();
        all.sort_by(|a, b| a.1.total_cmp(&b.1));
        all.truncate(k.max(1));
        all
    }
}

/// Weighted Euclidean distance: `‖(a − b) ⊙ w‖₂`
pub fn weighted_distance(a: &Vibe, b: &Vibe) -> f64 {
    a.values()
        .iter()
        .zip(b.values().iter())
        .zip(DIMENSION_WEIGHTS.iter())
        .map(|((x, y), w)| ((x - y) * w).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn clamp_drama(drama: f64) -> f64 {
    if drama.is_finite() {
        drama.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
