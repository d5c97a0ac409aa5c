//! Copy/paste correlator
//!
//! Matches paste events to prior in-session copies by text similarity,
//! classifies each paste as internal or external, and derives a clipboard
//! suspicion sub-score. A paste whose text has no sufficiently similar
//! earlier copy implies the content originated outside the tracked page.

use crate::similarity::text_similarity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Minimum clipboard events (copies + pastes) before metrics are produced
pub const MIN_CLIPBOARD_EVENTS: usize = 2;

/// Fixed capacity of each clipboard buffer; oldest evicted on overflow
pub const MAX_CLIPBOARD_RECORDS: usize = 64;

/// Similarity at or above which a paste matches a copy
pub const MATCH_THRESHOLD: f64 = 0.8;

/// Weight of the external-paste ratio in the suspicion score
const EXTERNAL_RATIO_WEIGHT: f64 = 0.6;

/// Bonus when clipboard activity dominates the session
const DOMINANCE_BONUS: f64 = 0.2;

/// Interaction count above which the dominance bonus can apply
const DOMINANCE_MIN_INTERACTIONS: u64 = 10;

/// A copy action retained for paste matching
#[derive(Debug, Clone)]
pub struct CopyRecord {
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

/// A paste action with its computed classification
#[derive(Debug, Clone)]
pub struct PasteRecord {
    pub timestamp: DateTime<Utc>,
    pub text: String,
    /// True when no qualifying earlier copy exists
    pub external: bool,
    /// Copy-to-paste latency in milliseconds, internal pastes only
    pub latency_ms: Option<f64>,
}

/// Derived clipboard metrics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ClipboardMetrics {
    /// Copies observed
    pub copy_count: u64,
    /// Pastes with no qualifying in-session copy
    pub external_paste_count: u64,
    /// Mean copy-to-paste latency (ms) over internal matches only
    pub avg_copy_paste_latency: f64,
    /// Clipboard suspicion sub-score (0-1)
    pub suspicious_score: f64,
}

/// Clipboard channel state: copy and paste buffers plus last computed
/// metrics
#[derive(Debug, Default)]
pub struct ClipboardChannel {
    copies: VecDeque<CopyRecord>,
    pastes: VecDeque<PasteRecord>,
    seen: u64,
    metrics: ClipboardMetrics,
}

impl ClipboardChannel {
    /// Record a copy action. `total_interactions` is the session-wide
    /// interaction count used by the dominance bonus.
    pub fn push_copy(&mut self, timestamp: DateTime<Utc>, text: String, total_interactions: u64) {
        if self.copies.len() == MAX_CLIPBOARD_RECORDS {
            self.copies.pop_front();
        }
        self.copies.push_back(CopyRecord { timestamp, text });
        self.seen += 1;

        if self.is_ready() {
            self.recompute(total_interactions);
        }
    }

    /// Record a paste action, classifying it against the retained copies.
    pub fn push_paste(&mut self, timestamp: DateTime<Utc>, text: String, total_interactions: u64) {
        let paste = classify_paste(&self.copies, timestamp, text);
        if self.pastes.len() == MAX_CLIPBOARD_RECORDS {
            self.pastes.pop_front();
        }
        self.pastes.push_back(paste);
        self.seen += 1;

        if self.is_ready() {
            self.recompute(total_interactions);
        }
    }

    /// Total clipboard events observed, including evicted ones
    pub fn samples(&self) -> u64 {
        self.seen
    }

    /// Last computed metrics (stale-but-valid below the sample minimum)
    pub fn metrics(&self) -> ClipboardMetrics {
        self.metrics
    }

    /// Whether the channel currently has enough samples to contribute
    pub fn is_ready(&self) -> bool {
        self.copies.len() + self.pastes.len() >= MIN_CLIPBOARD_EVENTS
    }

    fn recompute(&mut self, total_interactions: u64) {
        let external_paste_count = self.pastes.iter().filter(|p| p.external).count() as u64;
        let latencies: Vec<f64> = self.pastes.iter().filter_map(|p| p.latency_ms).collect();
        let avg_latency = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<f64>() / latencies.len() as f64
        };

        self.metrics = ClipboardMetrics {
            copy_count: self.copies.len() as u64,
            external_paste_count,
            avg_copy_paste_latency: avg_latency,
            suspicious_score: compute_suspicion(
                self.pastes.len() as u64,
                external_paste_count,
                (!latencies.is_empty()).then_some(avg_latency),
                self.seen,
                total_interactions,
            ),
        };
    }
}

/// Classify a paste against the retained copies.
///
/// Scans copies in arrival order and accepts the first one with an earlier
/// timestamp whose similarity reaches the match threshold. This is a
/// first-qualifying scan, not a best-match search: an earlier, weaker match
/// wins over a later, stronger one.
fn classify_paste(
    copies: &VecDeque<CopyRecord>,
    timestamp: DateTime<Utc>,
    text: String,
) -> PasteRecord {
    for copy in copies {
        if copy.timestamp >= timestamp {
            continue;
        }
        if text_similarity(&copy.text, &text) >= MATCH_THRESHOLD {
            let latency_ms = (timestamp - copy.timestamp).num_milliseconds() as f64;
            return PasteRecord {
                timestamp,
                text,
                external: false,
                latency_ms: Some(latency_ms),
            };
        }
    }

    PasteRecord {
        timestamp,
        text,
        external: true,
        latency_ms: None,
    }
}

/// Clipboard suspicion score, additive and capped at 1.
///
/// `external_ratio * 0.6`, plus a latency bonus only when at least one
/// internal match exists (avg < 30s: 0.3, < 60s: 0.2, < 120s: 0.1), plus
/// 0.2 when clipboard events make up more than half of all interactions
/// and the session has more than 10 interactions.
fn compute_suspicion(
    paste_count: u64,
    external_paste_count: u64,
    avg_internal_latency_ms: Option<f64>,
    clipboard_events: u64,
    total_interactions: u64,
) -> f64 {
    let mut score = 0.0;

    if paste_count > 0 {
        score += (external_paste_count as f64 / paste_count as f64) * EXTERNAL_RATIO_WEIGHT;
    }

    if let Some(avg) = avg_internal_latency_ms {
        score += if avg < 30_000.0 {
            0.3
        } else if avg < 60_000.0 {
            0.2
        } else if avg < 120_000.0 {
            0.1
        } else {
            0.0
        };
    }

    if total_interactions > DOMINANCE_MIN_INTERACTIONS
        && clipboard_events as f64 > total_interactions as f64 / 2.0
    {
        score += DOMINANCE_BONUS;
    }

    score.min(1.0)
}
