//! Behavior session state
//!
//! One `BehaviorState` aggregates every channel's buffer and metrics plus
//! the session-wide counters. It is owned by a single detector and mutated
//! only from its event-handling path; nothing in this crate shares it.

use crate::metrics::{
    ClickChannel, ClipboardChannel, FocusChannel, MovementChannel, TypingChannel,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// All per-channel state plus session counters and the current score.
#[derive(Debug)]
pub struct BehaviorState {
    pub typing: TypingChannel,
    pub clicks: ClickChannel,
    pub movement: MovementChannel,
    pub focus: FocusChannel,
    pub clipboard: ClipboardChannel,

    /// Running count of every accepted interaction event
    pub interaction_count: u64,
    /// Current bot-likelihood score, always within [0, 1]
    pub bot_score: f64,
    /// Current confidence in the score, always within [0, 1]
    pub confidence: f64,

    /// Session identifier stamped on transmitted report envelopes
    pub session_id: Uuid,
    /// When this session began tracking
    pub session_start: DateTime<Utc>,
}

impl BehaviorState {
    /// Create empty state for a session starting at `session_start`.
    pub fn new(session_start: DateTime<Utc>) -> Self {
        Self {
            typing: TypingChannel::default(),
            clicks: ClickChannel::default(),
            movement: MovementChannel::default(),
            focus: FocusChannel::default(),
            clipboard: ClipboardChannel::default(),
            interaction_count: 0,
            bot_score: 0.0,
            confidence: 0.0,
            session_id: Uuid::new_v4(),
            session_start,
        }
    }
}
