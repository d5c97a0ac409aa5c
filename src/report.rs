//! Report snapshots and the transmission boundary
//!
//! A `Report` is an immutable snapshot of the behavior state. Its wire keys
//! are fixed for consumer compatibility; renaming any of them is a breaking
//! change. Transmission wraps the report in an envelope carrying session
//! and producer identity, and goes through the fire-and-forget `ReportSink`
//! boundary.

use crate::state::BehaviorState;
use crate::{FORMGUARD_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

/// Typing channel snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingReport {
    pub wpm: f64,
    pub consistency: f64,
    pub samples: u64,
}

/// Click channel snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClicksReport {
    pub speed: f64,
    pub pattern_score: f64,
    pub samples: u64,
}

/// Movement channel snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementReport {
    pub speed: f64,
    pub straightness: f64,
    pub naturalness: f64,
    pub samples: u64,
}

/// Focus channel snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSwitchingReport {
    pub frequency: f64,
    pub samples: u64,
}

/// Clipboard channel snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyPasteReport {
    pub copy_paste_count: u64,
    pub external_paste_count: u64,
    pub average_time_between_copy_paste: f64,
    pub suspicious_score: f64,
    pub samples: u64,
}

/// Per-channel metric snapshots
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetrics {
    pub typing: TypingReport,
    pub clicks: ClicksReport,
    pub movement: MovementReport,
    pub tab_switching: TabSwitchingReport,
    pub copy_paste: CopyPasteReport,
}

/// Immutable snapshot of the behavior state at one instant
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    /// Elapsed session duration in milliseconds
    pub session_duration: i64,
    pub bot_score: f64,
    pub confidence: f64,
    pub interaction_count: u64,
    pub metrics: ReportMetrics,
}

impl Report {
    /// Snapshot `state` as of `now`.
    pub fn from_state(state: &BehaviorState, now: DateTime<Utc>) -> Self {
        let typing = state.typing.metrics();
        let clicks = state.clicks.metrics();
        let movement = state.movement.metrics();
        let focus = state.focus.metrics();
        let clipboard = state.clipboard.metrics();

        Self {
            timestamp: now,
            session_duration: (now - state.session_start).num_milliseconds(),
            bot_score: state.bot_score,
            confidence: state.confidence,
            interaction_count: state.interaction_count,
            metrics: ReportMetrics {
                typing: TypingReport {
                    wpm: typing.wpm,
                    consistency: typing.consistency,
                    samples: state.typing.samples(),
                },
                clicks: ClicksReport {
                    speed: clicks.speed,
                    pattern_score: clicks.pattern_score,
                    samples: state.clicks.samples(),
                },
                movement: MovementReport {
                    speed: movement.speed,
                    straightness: movement.straightness,
                    naturalness: movement.naturalness,
                    samples: state.movement.samples(),
                },
                tab_switching: TabSwitchingReport {
                    frequency: focus.switch_frequency,
                    samples: state.focus.samples(),
                },
                copy_paste: CopyPasteReport {
                    copy_paste_count: state.clipboard.samples(),
                    external_paste_count: clipboard.external_paste_count,
                    average_time_between_copy_paste: clipboard.avg_copy_paste_latency,
                    suspicious_score: clipboard.suspicious_score,
                    samples: state.clipboard.samples(),
                },
            },
        }
    }
}

/// Producer identity stamped on transmitted envelopes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
}

impl Default for Producer {
    fn default() -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: FORMGUARD_VERSION.to_string(),
        }
    }
}

/// Transmission wrapper around a report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEnvelope {
    pub session_id: Uuid,
    pub producer: Producer,
    pub report: Report,
}

impl ReportEnvelope {
    pub fn new(session_id: Uuid, report: Report) -> Self {
        Self {
            session_id,
            producer: Producer::default(),
            report,
        }
    }
}

/// Fire-and-forget transmission boundary.
///
/// Implementations must not block event processing; the detector catches
/// and discards any error a sink returns, surfacing it only to the
/// diagnostic log. Delivery outcome never feeds back into scoring state.
pub trait ReportSink {
    fn send(&mut self, envelope: &ReportEnvelope) -> Result<(), crate::error::ScoreError>;
}

/// Sink that writes one JSON envelope per line to a writer.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn send(&mut self, envelope: &ReportEnvelope) -> Result<(), crate::error::ScoreError> {
        let line = serde_json::to_string(envelope)?;
        writeln!(self.writer, "{}", line)
            .map_err(|e| crate::error::ScoreError::SinkError(e.to_string()))
    }
}
