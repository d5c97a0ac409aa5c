//! Typing metric calculator
//!
//! Derives typing speed (words per minute) and timing consistency from the
//! buffered key-press sequence. Modifier-only presses and presses outside
//! text-input targets are excluded upstream.

use crate::events::KeyEvent;
use crate::metrics::std_dev;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Minimum key presses before metrics are produced
pub const MIN_KEY_EVENTS: usize = 5;

/// Fixed capacity of the key-press buffer; oldest evicted on overflow
pub const MAX_KEY_EVENTS: usize = 256;

/// Key presses counted as one word
const KEYS_PER_WORD: f64 = 5.0;

/// Inter-keystroke standard deviation (ms) that maps to zero consistency
const CONSISTENCY_STDDEV_CEILING_MS: f64 = 500.0;

/// Derived typing metrics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TypingMetrics {
    /// Words per minute, treating every 5 key presses as one word
    pub wpm: f64,
    /// Timing consistency (0-1); low inter-keystroke variance reads high
    pub consistency: f64,
}

/// Typing channel state: bounded buffer plus last computed metrics
#[derive(Debug, Default)]
pub struct TypingChannel {
    events: VecDeque<KeyEvent>,
    seen: u64,
    metrics: TypingMetrics,
}

impl TypingChannel {
    /// Append a key press and recompute metrics if the channel has enough
    /// samples. Below the minimum, metrics keep their previous values.
    pub fn push(&mut self, event: KeyEvent) {
        if self.events.len() == MAX_KEY_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.seen += 1;

        if self.events.len() >= MIN_KEY_EVENTS {
            self.recompute();
        }
    }

    /// Total key presses observed, including evicted ones
    pub fn samples(&self) -> u64 {
        self.seen
    }

    /// Last computed metrics (stale-but-valid below the sample minimum)
    pub fn metrics(&self) -> TypingMetrics {
        self.metrics
    }

    /// Whether the channel currently has enough samples to contribute
    pub fn is_ready(&self) -> bool {
        self.events.len() >= MIN_KEY_EVENTS
    }

    fn recompute(&mut self) {
        let events = self.events.make_contiguous();

        // Clock anomalies (elapsed <= 0) skip the wpm update rather than
        // dividing by zero; the previous value stays in place.
        if let Some(wpm) = compute_wpm(events) {
            self.metrics.wpm = wpm;
        }
        self.metrics.consistency = compute_consistency(events);
    }
}

/// Words per minute over the buffered presses.
///
/// Formula: `(presses / 5) / elapsed_minutes` with elapsed measured from
/// first to last press. Returns None when elapsed time is not positive.
fn compute_wpm(events: &[KeyEvent]) -> Option<f64> {
    let first = events.first()?;
    let last = events.last()?;
    let elapsed_ms = (last.timestamp - first.timestamp).num_milliseconds() as f64;
    if elapsed_ms <= 0.0 {
        return None;
    }

    let words = events.len() as f64 / KEYS_PER_WORD;
    let minutes = elapsed_ms / 60_000.0;
    Some(words / minutes)
}

/// Timing consistency from successive inter-keystroke intervals.
///
/// Formula: `1 - min(1, stddev / 500)` over the interval standard deviation
/// in milliseconds. Lower variance reads as higher consistency, which the
/// aggregator treats as more suspicious.
fn compute_consistency(events: &[KeyEvent]) -> f64 {
    let intervals = inter_key_intervals(events);
    if intervals.is_empty() {
        return 0.0;
    }
    let sd = std_dev(&intervals);
    1.0 - (sd / CONSISTENCY_STDDEV_CEILING_MS).min(1.0)
}

/// Successive inter-keystroke intervals in milliseconds
fn inter_key_intervals(events: &[KeyEvent]) -> Vec<f64> {
    events
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64)
        .collect()
}
