//! # VIBE Eyes
//!
//! Turns streaming transcript text into a continuous five-dimensional
//! emotional signal (Valence, Arousal, Dominance, Complexity, Coherence) for an
//! animated robotic-eye display.
//!
//! Fast per-sentence readings arrive as instant bursts that hold, then decay
//! toward a slowly drifting baseline. A slow long-horizon estimator corrects
//! that baseline, but only once the signal has settled and never more than one
//! request at a time.

pub mod amplifier;
pub mod blender;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod engine;
pub mod errors;
pub mod estimator;
pub mod extract;
pub mod ingest;
pub mod sink;
pub mod types;

pub use amplifier::{CinematicAmplifier, Exemplar, ExemplarLibrary};
pub use blender::TemporalBlender;
pub use config::{load_config, EngineConfig};
pub use coordinator::SlowCoordinator;
pub use engine::{EngineStatus, VibeEngine};
pub use errors::{Result, VibeError};
pub use ingest::{IngestReport, TranscriptPayload};
pub use types::{Dimension, Vibe};
