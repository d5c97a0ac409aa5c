//! Click metric calculator
//!
//! Derives click cadence and positional/temporal pattern uniformity from the
//! buffered click sequence. Mouse clicks and touch taps share one channel.

use crate::events::ClickEvent;
use crate::metrics::{mean, std_dev};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Minimum clicks before metrics are produced
pub const MIN_CLICK_EVENTS: usize = 3;

/// Fixed capacity of the click buffer; oldest evicted on overflow
pub const MAX_CLICK_EVENTS: usize = 128;

/// Coordinate standard deviation (units) below which positioning is
/// suspiciously fixed
const POSITION_STDDEV_FLOOR: f64 = 5.0;

/// Inter-click-interval standard deviation (ms) below which cadence is
/// suspiciously uniform
const INTERVAL_STDDEV_FLOOR_MS: f64 = 20.0;

/// Pattern-score increments
const FIXED_POSITION_WEIGHT: f64 = 0.3;
const UNIFORM_INTERVAL_WEIGHT: f64 = 0.4;
const FAST_CLICK_WEIGHT: f64 = 0.3;

/// Derived click metrics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ClickMetrics {
    /// Mean inter-click interval in milliseconds
    pub speed: f64,
    /// Pattern-uniformity score (0-1); higher reads more automated
    pub pattern_score: f64,
}

/// Click channel state: bounded buffer plus last computed metrics
#[derive(Debug, Default)]
pub struct ClickChannel {
    events: VecDeque<ClickEvent>,
    seen: u64,
    metrics: ClickMetrics,
}

impl ClickChannel {
    /// Append a click and recompute metrics if the channel has enough
    /// samples. `fast_click_threshold_ms` is the configured fast-click
    /// suspicion threshold.
    pub fn push(&mut self, event: ClickEvent, fast_click_threshold_ms: f64) {
        if self.events.len() == MAX_CLICK_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.seen += 1;

        if self.events.len() >= MIN_CLICK_EVENTS {
            self.recompute(fast_click_threshold_ms);
        }
    }

    /// Total clicks observed, including evicted ones
    pub fn samples(&self) -> u64 {
        self.seen
    }

    /// Last computed metrics (stale-but-valid below the sample minimum)
    pub fn metrics(&self) -> ClickMetrics {
        self.metrics
    }

    /// Whether the channel currently has enough samples to contribute
    pub fn is_ready(&self) -> bool {
        self.events.len() >= MIN_CLICK_EVENTS
    }

    fn recompute(&mut self, fast_click_threshold_ms: f64) {
        let events = self.events.make_contiguous();
        let intervals = inter_click_intervals(events);

        self.metrics.speed = mean(&intervals);
        self.metrics.pattern_score =
            compute_pattern_score(events, &intervals, fast_click_threshold_ms);
    }
}

/// Pattern-uniformity score, additive and capped at 1.
///
/// +0.3 when either coordinate's standard deviation across all recorded
/// positions is below 5 units; +0.4 when the inter-click-interval standard
/// deviation is below 20 ms; +0.3 when the mean interval is below the
/// configured fast-click threshold.
fn compute_pattern_score(
    events: &[ClickEvent],
    intervals: &[f64],
    fast_click_threshold_ms: f64,
) -> f64 {
    let mut score = 0.0;

    let xs: Vec<f64> = events.iter().map(|e| e.x).collect();
    let ys: Vec<f64> = events.iter().map(|e| e.y).collect();
    if std_dev(&xs) < POSITION_STDDEV_FLOOR || std_dev(&ys) < POSITION_STDDEV_FLOOR {
        score += FIXED_POSITION_WEIGHT;
    }

    if std_dev(intervals) < INTERVAL_STDDEV_FLOOR_MS {
        score += UNIFORM_INTERVAL_WEIGHT;
    }

    if mean(intervals) < fast_click_threshold_ms {
        score += FAST_CLICK_WEIGHT;
    }

    score.min(1.0)
}

/// Successive inter-click intervals in milliseconds
fn inter_click_intervals(events: &[ClickEvent]) -> Vec<f64> {
    events
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64)
        .collect()
}
