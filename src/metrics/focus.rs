//! Focus transition calculator
//!
//! Derives the tab-switch frequency from window focus/blur events.

use crate::events::{FocusEvent, FocusKind};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Minimum focus events before metrics are produced
pub const MIN_FOCUS_EVENTS: usize = 2;

/// Fixed capacity of the focus buffer; oldest evicted on overflow
pub const MAX_FOCUS_EVENTS: usize = 64;

/// Derived focus metrics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FocusMetrics {
    /// Focus/blur transitions per minute
    pub switch_frequency: f64,
}

/// Focus channel state: bounded buffer plus last computed metrics
#[derive(Debug, Default)]
pub struct FocusChannel {
    events: VecDeque<FocusEvent>,
    seen: u64,
    metrics: FocusMetrics,
}

impl FocusChannel {
    /// Append a focus transition and recompute once the channel has enough
    /// samples.
    pub fn push(&mut self, event: FocusEvent) {
        if self.events.len() == MAX_FOCUS_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.seen += 1;

        if self.events.len() >= MIN_FOCUS_EVENTS {
            self.recompute();
        }
    }

    /// Total focus events observed, including evicted ones
    pub fn samples(&self) -> u64 {
        self.seen
    }

    /// Last computed metrics (stale-but-valid below the sample minimum)
    pub fn metrics(&self) -> FocusMetrics {
        self.metrics
    }

    /// Whether the channel currently has enough samples to contribute
    pub fn is_ready(&self) -> bool {
        self.events.len() >= MIN_FOCUS_EVENTS
    }

    fn recompute(&mut self) {
        let events = self.events.make_contiguous();
        if let Some(frequency) = compute_switch_frequency(events) {
            self.metrics.switch_frequency = frequency;
        }
    }
}

/// Switch frequency: differing-adjacent-kind pairs per elapsed minute.
///
/// Returns None when elapsed time between the first and last event is not
/// positive, leaving the previous value in place.
fn compute_switch_frequency(events: &[FocusEvent]) -> Option<f64> {
    let first = events.first()?;
    let last = events.last()?;
    let elapsed_min = (last.timestamp - first.timestamp).num_milliseconds() as f64 / 60_000.0;
    if elapsed_min <= 0.0 {
        return None;
    }

    let switches = events
        .windows(2)
        .filter(|pair| pair[0].kind != pair[1].kind)
        .count();
    Some(switches as f64 / elapsed_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn focus_at(kind: FocusKind, ms: i64) -> FocusEvent {
        FocusEvent {
            kind,
            timestamp: ts(ms),
        }
    }

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_alternating_transitions_per_minute() {
        let mut channel = FocusChannel::default();
        // blur -> focus -> blur -> focus over 3 minutes: 3 switches
        channel.push(focus_at(FocusKind::Blur, 0));
        channel.push(focus_at(FocusKind::Focus, 60_000));
        channel.push(focus_at(FocusKind::Blur, 120_000));
        channel.push(focus_at(FocusKind::Focus, 180_000));

        assert!((channel.metrics().switch_frequency - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_kind_pairs_do_not_count() {
        let mut channel = FocusChannel::default();
        channel.push(focus_at(FocusKind::Focus, 0));
        channel.push(focus_at(FocusKind::Focus, 30_000));
        channel.push(focus_at(FocusKind::Blur, 60_000));

        // one switch over one minute
        assert!((channel.metrics().switch_frequency - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_elapsed_skips_recompute() {
        let mut channel = FocusChannel::default();
        channel.push(focus_at(FocusKind::Blur, 500));
        channel.push(focus_at(FocusKind::Focus, 500));

        assert_eq!(channel.metrics().switch_frequency, 0.0);
    }

    #[test]
    fn test_single_event_produces_nothing() {
        let mut channel = FocusChannel::default();
        channel.push(focus_at(FocusKind::Blur, 0));

        assert!(!channel.is_ready());
        assert_eq!(channel.metrics().switch_frequency, 0.0);
    }
}
