//! Temporal Blender
//!
//! Attack / hold / decay state machine behind the rendered signal.
//!
//! - A burst replaces `current` immediately (attack)
//! - `current` is frozen for the dwell + hold plateau
//! - Afterwards every tick relaxes `current` exponentially toward `baseline`
//! - Every burst also drags `baseline` part of the way toward itself, so
//!   reactions fade but leave a lasting mood shift

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::BlenderConfig;
use crate::types::{clamp_unit, Vibe, VIBE_DIMS};

/// Diagnostic view of the blender
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlenderSnapshot {
    pub baseline: Vibe,
    pub current: Vibe,
    pub hold_remaining_secs: f64,
    pub secs_since_baseline_update: f64,
}

/// Owns the rendered value and the resting baseline.
#[derive(Debug, Clone)]
pub struct TemporalBlender {
    config: BlenderConfig,
    baseline: Vibe,
    current: Vibe,
    dwell_until: Instant,
    hold_until: Instant,
    last_baseline_update: Instant,
}

impl TemporalBlender {
    pub fn new(config: BlenderConfig) -> Self {
        Self::with_baseline(config, Vibe::RESTING)
    }

    /// Starts settled on `baseline`.
    pub fn with_baseline(config: BlenderConfig, baseline: Vibe) -> Self {
        let now = Instant::now();
        Self {
            config,
            baseline,
            current: baseline,
            dwell_until: now,
            hold_until: now,
            last_baseline_update: now,
        }
    }

    pub fn config(&self) -> &BlenderConfig {
        &self.config
    }

    pub fn baseline(&self) -> Vibe {
        self.baseline
    }

    pub fn current(&self) -> Vibe {
        self.current
    }

    /// End of the plateau started by the last burst
    pub fn hold_until(&self) -> Instant {
        self.hold_until
    }

    pub fn dwell_until(&self) -> Instant {
        self.dwell_until
    }

    pub fn apply_burst(&mut self, burst: Vibe, influence: Option<f64>) {
        self.apply_burst_at(burst, influence, Instant::now());
    }

    /// Attack: show `burst` at full strength, start the plateau, nudge baseline.
    ///
    /// `influence` falls back to the configured default and is clamped to [0, 1].
    pub fn apply_burst_at(&mut self, burst: Vibe, influence: Option<f64>, now: Instant) {
        self.current = burst;

        self.dwell_until = now + self.config.dwell();
        self.hold_until = self.dwell_until + self.config.hold();

        let alpha = clamp_unit(influence.unwrap_or(self.config.default_influence));
        self.baseline = self.baseline.lerp(&self.current, alpha);
    }

    pub fn apply_baseline_correction(&mut self, vibe: Vibe) {
        self.apply_baseline_correction_at(vibe, Instant::now());
    }

    /// A burst at the long-horizon influence.
    pub fn apply_baseline_correction_at(&mut self, vibe: Vibe, now: Instant) {
        self.apply_burst_at(vibe, Some(self.config.baseline_influence), now);
        self.last_baseline_update = now;
    }

    pub fn tick(&mut self) -> Vibe {
        self.tick_at(Instant::now())
    }

    /// Returns the value to render at `now`, decaying once the plateau is over.
    pub fn tick_at(&mut self, now: Instant) -> Vibe {
        if now < self.hold_until {
            return self.current;
        }

        self.current = self.current.lerp(&self.baseline, self.config.decay_rate);
        self.current
    }

    pub fn settle_distance(&self) -> [f64; VIBE_DIMS] {
        self.current.abs_diff(&self.baseline)
    }

    /// True when every dimension is strictly within `threshold` of baseline.
    pub fn is_settled(&self, threshold: f64) -> bool {
        self.settle_distance().iter().all(|d| *d < threshold)
    }

    pub fn snapshot_at(&self, now: Instant) -> BlenderSnapshot {
        BlenderSnapshot {
            baseline: self.baseline,
            current: self.current,
            hold_remaining_secs: self
                .hold_until
                .saturating_duration_since(now)
                .as_secs_f64(),
            secs_since_baseline_update: now
                .saturating_duration_since(self.last_baseline_update)
                .as_secs_f64(),
        }
    }

    pub fn snapshot(&self) -> BlenderSnapshot {
        self.snapshot_at(Instant::now())
    }

    /// Remaining plateau at `now`
    pub fn hold_remaining(&self, now: Instant) -> Duration {
        self.hold_until.saturating_duration_since(now)
    }
}

impl Default for TemporalBlender {
    fn default() -> Self {
        Self::new(BlenderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    fn neutral_blender() -> TemporalBlender {
        TemporalBlender::with_baseline(BlenderConfig::default(), Vibe::NEUTRAL)
    }

    fn assert_close(actual: Vibe, expected: [f64; 5]) {
        for i in 0..5 {
            assert!(
                (actual[i] - expected[i]).abs() < EPS,
                "dim {i}: {} != {}",
                actual[i],
                expected[i]
            );
        }
    }

    #[test]
    fn test_burst_scenario_default_influence() {
        let mut b = neutral_blender();
        let burst = Vibe::clamped([0.9, 0.8, 0.2, 0.5, 0.8]);

        b.apply_burst_at(burst, None, Instant::now());

        assert_eq!(b.current(), burst);
        assert_close(b.baseline(), [0.588, 0.566, 0.434, 0.5, 0.566]);
    }

    #[test]
    fn test_full_influence_moves_baseline_onto_burst() {
        let mut b = neutral_blender();
        let burst = Vibe::clamped([0.1, 0.95, 0.3, 0.7, 0.2]);

        b.apply_burst_at(burst, Some(1.0), Instant::now());

        assert_eq!(b.current(), burst);
        assert_eq!(b.baseline(), burst);
    }

    #[test]
    fn test_zero_influence_leaves_baseline() {
        let mut b = neutral_blender();
        b.apply_burst_at(Vibe::clamped([1.0; 5]), Some(0.0), Instant::now());
        assert_eq!(b.baseline(), Vibe::NEUTRAL);
    }

    #[test]
    fn test_plateau_holds_burst_value() {
        let mut b = neutral_blender();
        let t0 = Instant::now();
        let burst = Vibe::clamped([0.9, 0.9, 0.9, 0.9, 0.9]);
        b.apply_burst_at(burst, None, t0);

        assert!((b.hold_remaining(t0).as_secs_f64() - 2.0).abs() < 1e-6);
        let dwell = b.dwell_until().saturating_duration_since(t0).as_secs_f64();
        assert!((dwell - 1.2).abs() < 1e-6);

        for ms in [0, 500, 1200, 1999] {
            assert_eq!(b.tick_at(t0 + Duration::from_millis(ms)), burst);
        }
        assert_eq!(b.current(), burst);
    }

    #[test]
    fn test_single_decay_tick() {
        let config = BlenderConfig::default();
        let mut b = TemporalBlender::with_baseline(config, Vibe::NEUTRAL);
        let t0 = Instant::now();
        b.apply_burst_at(Vibe::clamped([0.9; 5]), Some(0.0), t0);

        let after_hold = t0 + Duration::from_secs(3);
        let v = b.tick_at(after_hold);
        assert_close(v, [0.876; 5]);
    }

    #[test]
    fn test_decay_recurrence_converges_without_overshoot() {
        let mut b = neutral_blender();
        let t0 = Instant::now();
        b.apply_burst_at(Vibe::clamped([0.9, 0.1, 0.7, 0.3, 0.5]), Some(0.0), t0);
        let later = t0 + Duration::from_secs(5);
        let baseline = b.baseline();

        let mut prev = b.current();
        for _ in 0..200 {
            let next = b.tick_at(later);
            for i in 0..5 {
                let gap_prev = (prev[i] - baseline[i]).abs();
                let gap_next = (next[i] - baseline[i]).abs();
                assert!(gap_next <= gap_prev);
                // Same side of baseline as before
                assert!((prev[i] - baseline[i]) * (next[i] - baseline[i]) >= 0.0);
                let expected = prev[i] + 0.06 * (baseline[i] - prev[i]);
                assert!((next[i] - expected).abs() < EPS);
            }
            prev = next;
        }
        assert!(b.is_settled(0.001));
    }

    #[test]
    fn test_converged_tick_is_stable() {
        let mut b = neutral_blender();
        let now = Instant::now() + Duration::from_secs(10);
        assert_eq!(b.tick_at(now), Vibe::NEUTRAL);
        assert_eq!(b.tick_at(now), Vibe::NEUTRAL);
    }

    #[test]
    fn test_baseline_correction_uses_large_influence() {
        let mut b = neutral_blender();
        let t0 = Instant::now();
        b.apply_baseline_correction_at(Vibe::clamped([0.7, 0.3, 0.5, 0.5, 0.5]), t0);
        assert_close(b.baseline(), [0.64, 0.36, 0.5, 0.5, 0.5]);

        let snap = b.snapshot_at(t0 + Duration::from_millis(500));
        assert!((snap.secs_since_baseline_update - 0.5).abs() < 1e-6);
        assert!((snap.hold_remaining_secs - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_baseline_never_moves_away_from_burst() {
        let mut b = neutral_blender();
        let t0 = Instant::now();
        let burst = Vibe::clamped([0.2, 0.9, 0.6, 0.1, 1.0]);
        for step in 0..20 {
            let before = b.baseline().abs_diff(&burst);
            b.apply_burst_at(burst, None, t0 + Duration::from_secs(step));
            let after = b.baseline().abs_diff(&burst);
            for i in 0..5 {
                assert!(after[i] <= before[i]);
            }
        }
    }

    #[rstest]
    #[case(0.019, true)]
    #[case(0.0, true)]
    #[case(0.021, false)]
    #[case(0.3, false)]
    fn test_settle_threshold(#[case] offset: f64, #[case] settled: bool) {
        let mut b = neutral_blender();
        let mut values = [0.5; 5];
        values[2] += offset;
        // Zero influence keeps baseline at neutral while current moves.
        b.apply_burst_at(Vibe::clamped(values), Some(0.0), Instant::now());
        assert_eq!(b.is_settled(0.02), settled);
    }

    #[test]
    fn test_out_of_range_influence_clamped() {
        let mut b = neutral_blender();
        let burst = Vibe::clamped([1.0; 5]);
        b.apply_burst_at(burst, Some(7.0), Instant::now());
        assert_eq!(b.baseline(), burst);
    }
}
