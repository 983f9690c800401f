//! Core value types shared by every stage of the pipeline.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Number of VIBE dimensions
pub const VIBE_DIMS: usize = 5;

/// One axis of the VIBE space, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Valence,
    Arousal,
    Dominance,
    Complexity,
    Coherence,
}

impl Dimension {
    pub const ALL: [Dimension; VIBE_DIMS] = [
        Dimension::Valence,
        Dimension::Arousal,
        Dimension::Dominance,
        Dimension::Complexity,
        Dimension::Coherence,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Short label used in telemetry lines
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Valence => "V",
            Dimension::Arousal => "A",
            Dimension::Dominance => "D",
            Dimension::Complexity => "Cx",
            Dimension::Coherence => "Co",
        }
    }
}

/// A VIBE reading: Valence, Arousal, Dominance, Complexity, Coherence.
///
/// Always a plain `Copy` value so a reading handed to another component can
/// never be mutated behind its back. Every constructor clamps to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 5]")]
pub struct Vibe([f64; VIBE_DIMS]);

impl Vibe {
    /// Neutral point of every axis
    pub const NEUTRAL: Vibe = Vibe([0.5; VIBE_DIMS]);

    /// Startup resting point: neutral, slightly ordered
    pub const RESTING: Vibe = Vibe([0.5, 0.5, 0.5, 0.5, 0.8]);

    /// Builds a reading, clamping each component to [0, 1].
    ///
    /// Non-finite components fall back to neutral.
    pub fn clamped(values: [f64; VIBE_DIMS]) -> Self {
        Vibe(values.map(clamp_unit))
    }

    /// Builds a reading from a slice; `None` unless it has exactly five values.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let arr: [f64; VIBE_DIMS] = values.try_into().ok()?;
        Some(Self::clamped(arr))
    }

    pub fn values(&self) -> [f64; VIBE_DIMS] {
        self.0
    }

    pub fn get(&self, dim: Dimension) -> f64 {
        self.0[dim.index()]
    }

    /// Moves `fraction` of the way toward `target`, then clamps.
    ///
    /// A fraction of 1 or more lands exactly on `target`.
    pub fn lerp(&self, target: &Vibe, fraction: f64) -> Vibe {
        if fraction >= 1.0 {
            return *target;
        }
        let mut out = self.0;
        for (o, t) in out.iter_mut().zip(target.0.iter()) {
            *o += fraction * (t - *o);
        }
        Vibe::clamped(out)
    }

    /// Per-dimension absolute distance to `other`
    pub fn abs_diff(&self, other: &Vibe) -> [f64; VIBE_DIMS] {
        let mut out = [0.0; VIBE_DIMS];
        for (i, o) in out.iter_mut().enumerate() {
            *o = (self.0[i] - other.0[i]).abs();
        }
        out
    }

    /// Largest per-dimension distance to `other`
    pub fn max_abs_diff(&self, other: &Vibe) -> f64 {
        self.abs_diff(other).into_iter().fold(0.0, f64::max)
    }

    pub fn named(&self) -> NamedVibe {
        NamedVibe {
            valence: self.0[0],
            arousal: self.0[1],
            dominance: self.0[2],
            complexity: self.0[3],
            coherence: self.0[4],
        }
    }
}

impl Default for Vibe {
    fn default() -> Self {
        Vibe::RESTING
    }
}

impl Index<usize> for Vibe {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl TryFrom<Vec<f64>> for Vibe {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Vibe::from_slice(&values)
            .ok_or_else(|| format!("expected {VIBE_DIMS} values, got {}", values.len()))
    }
}

impl From<Vibe> for [f64; VIBE_DIMS] {
    fn from(v: Vibe) -> Self {
        v.0
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(3);
        for (i, dim) in Dimension::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}:{:.*}", dim.label(), precision, self.0[i])?;
        }
        Ok(())
    }
}

/// Field-named view of a reading, for status output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NamedVibe {
    pub valence: f64,
    pub arousal: f64,
    pub dominance: f64,
    pub complexity: f64,
    pub coherence: f64,
}

/// Clamps to [0, 1]; NaN and infinities become neutral.
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.5
    }
}
