//! Movement metric calculator
//!
//! Derives pointer speed, path straightness, and motion naturalness from a
//! capped sliding window of position samples. The window bounds memory and
//! keeps the metrics about recent motion; old samples must not perpetually
//! bias the path shape.

use crate::events::MovementSample;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Minimum samples in the window before metrics are produced
pub const MIN_MOVEMENT_SAMPLES: usize = 10;

/// Fixed window capacity; oldest sample evicted on overflow
pub const MOVEMENT_WINDOW: usize = 100;

/// Divisor of the expected-reversal baseline `(window_len - 2) / 3`.
///
/// Empirical heuristic with no stated derivation; tune with care.
const REVERSAL_BASELINE_DIVISOR: f64 = 3.0;

/// Derived movement metrics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MovementMetrics {
    /// Path distance per millisecond over the window
    pub speed: f64,
    /// Direct-to-traveled distance ratio (0-1); near 1 is a straight line
    pub straightness: f64,
    /// Normalized acceleration-sign-reversal count (0-1); near 0 is
    /// constant-velocity, machine-like motion
    pub naturalness: f64,
}

/// Movement channel state: sliding window plus last computed metrics
#[derive(Debug, Default)]
pub struct MovementChannel {
    samples: VecDeque<MovementSample>,
    seen: u64,
    metrics: MovementMetrics,
}

impl MovementChannel {
    /// Append a position sample, evicting the oldest when the window is
    /// full, and recompute metrics once the window has enough samples.
    pub fn push(&mut self, sample: MovementSample) {
        if self.samples.len() == MOVEMENT_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.seen += 1;

        if self.samples.len() >= MIN_MOVEMENT_SAMPLES {
            self.recompute();
        }
    }

    /// Total samples observed, including evicted ones
    pub fn samples(&self) -> u64 {
        self.seen
    }

    /// Last computed metrics (stale-but-valid below the sample minimum)
    pub fn metrics(&self) -> MovementMetrics {
        self.metrics
    }

    /// Whether the window currently has enough samples to contribute
    pub fn is_ready(&self) -> bool {
        self.samples.len() >= MIN_MOVEMENT_SAMPLES
    }

    fn recompute(&mut self) {
        let window = self.samples.make_contiguous();

        if let Some(speed) = compute_speed(window) {
            self.metrics.speed = speed;
        }
        self.metrics.straightness = compute_straightness(window);
        self.metrics.naturalness = compute_naturalness(window);
    }
}

/// Euclidean distance between two samples
fn distance(a: &MovementSample, b: &MovementSample) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

/// Time delta between two samples in milliseconds
fn delta_ms(a: &MovementSample, b: &MovementSample) -> f64 {
    (b.timestamp - a.timestamp).num_milliseconds() as f64
}

/// Mean speed over the window: total path distance / total elapsed time.
///
/// Pairs with a non-positive time delta contribute neither distance nor
/// time. Returns None when no pair qualifies, leaving the previous value.
fn compute_speed(window: &[MovementSample]) -> Option<f64> {
    let mut total_distance = 0.0;
    let mut total_time_ms = 0.0;

    for pair in window.windows(2) {
        let dt = delta_ms(&pair[0], &pair[1]);
        if dt <= 0.0 {
            continue;
        }
        total_distance += distance(&pair[0], &pair[1]);
        total_time_ms += dt;
    }

    if total_time_ms <= 0.0 {
        return None;
    }
    Some(total_distance / total_time_ms)
}

/// Path straightness: direct first-to-last distance over traveled distance.
///
/// Clamped to at most 1; 0 when no movement occurred. A pointer gliding
/// along a line scores 1 regardless of speed.
fn compute_straightness(window: &[MovementSample]) -> f64 {
    let (first, last) = match (window.first(), window.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return 0.0,
    };

    let traveled: f64 = window
        .windows(2)
        .map(|pair| distance(&pair[0], &pair[1]))
        .sum();
    if traveled <= 0.0 {
        return 0.0;
    }

    (distance(first, last) / traveled).min(1.0)
}

/// Motion naturalness from acceleration-direction reversals.
///
/// Speeds come from consecutive sample pairs (pairs with a non-positive
/// time delta are skipped); each consecutive speed pair classifies the
/// local acceleration as increasing, decreasing, or unchanged. A reversal
/// is a nonzero direction opposite to the last nonzero direction; unchanged
/// steps neither count nor reset it. The count normalizes by the heuristic
/// baseline `(window_len - 2) / 3`, clamped to at most 1. Human motion
/// jitters between speeding up and slowing down; scripted constant-velocity
/// motion produces almost no reversals.
fn compute_naturalness(window: &[MovementSample]) -> f64 {
    let mut speeds = Vec::with_capacity(window.len().saturating_sub(1));
    for pair in window.windows(2) {
        let dt = delta_ms(&pair[0], &pair[1]);
        if dt <= 0.0 {
            continue;
        }
        speeds.push(distance(&pair[0], &pair[1]) / dt);
    }
    if speeds.len() < 2 {
        return 0.0;
    }

    let mut reversals = 0u32;
    let mut last_sign = 0i8;
    for pair in speeds.windows(2) {
        let diff = pair[1] - pair[0];
        let sign = if diff > 0.0 {
            1i8
        } else if diff < 0.0 {
            -1i8
        } else {
            0i8
        };
        if sign != 0 {
            if last_sign != 0 && sign != last_sign {
                reversals += 1;
            }
            last_sign = sign;
        }
    }

    let baseline = (window.len() as f64 - 2.0) / REVERSAL_BASELINE_DIVISOR;
    if baseline <= 0.0 {
        return 0.0;
    }
    (reversals as f64 / baseline).min(1.0)
}
