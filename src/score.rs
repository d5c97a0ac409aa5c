//! Multi-factor score aggregation
//!
//! Fuses whichever channels currently have enough samples into one
//! bot-likelihood score and one confidence value, using fixed per-channel
//! weights. Channels below their sample minimum are simply absent; partial
//! evidence never errors.

use crate::config::DetectorConfig;
use crate::state::BehaviorState;

/// Per-channel score weights
const TYPING_WEIGHT: f64 = 0.30;
const CLICKS_WEIGHT: f64 = 0.20;
const MOVEMENT_WEIGHT: f64 = 0.20;
const FOCUS_WEIGHT: f64 = 0.10;
const CLIPBOARD_WEIGHT: f64 = 0.30;

/// Per-channel confidence bases and saturation sample counts
const TYPING_CONFIDENCE: f64 = 0.35;
const TYPING_CONFIDENCE_SATURATION: f64 = 20.0;
const CLICKS_CONFIDENCE: f64 = 0.25;
const CLICKS_CONFIDENCE_SATURATION: f64 = 10.0;
const MOVEMENT_CONFIDENCE: f64 = 0.25;
const MOVEMENT_CONFIDENCE_SATURATION: f64 = 50.0;
const FOCUS_CONFIDENCE: f64 = 0.05;
const CLIPBOARD_CONFIDENCE: f64 = 0.30;
const CLIPBOARD_CONFIDENCE_SATURATION: f64 = 5.0;

/// Typing speeds at or below this wpm contribute nothing
const HUMAN_WPM_CEILING: f64 = 100.0;

/// Consistency above this level starts reading as machine-timed
const CONSISTENCY_SUSPICION_FLOOR: f64 = 0.95;

/// Aggregated result of one scoring pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreOutcome {
    pub bot_score: f64,
    pub confidence: f64,
}

/// Clamp `value / max` into [0, 1]; 0 when `max` is not positive.
fn normalize(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}

/// Recompute the overall bot score and confidence from the channels that
/// currently meet their sample minimums.
///
/// Below the configured interaction gate the outcome is forced to zero on
/// both axes: insufficient evidence is read as human.
pub fn aggregate(state: &BehaviorState, config: &DetectorConfig) -> ScoreOutcome {
    if state.interaction_count < config.min_sample_size {
        return ScoreOutcome {
            bot_score: 0.0,
            confidence: 0.0,
        };
    }

    let mut weighted_sum = 0.0;
    let mut confidence_sum = 0.0;
    let mut active_channels = 0u32;

    if config.track_typing && state.typing.is_ready() {
        weighted_sum += typing_contribution(state, config) * TYPING_WEIGHT;
        confidence_sum += TYPING_CONFIDENCE
            * (state.typing.samples() as f64 / TYPING_CONFIDENCE_SATURATION).min(1.0);
        active_channels += 1;
    }

    if config.track_clicks && state.clicks.is_ready() {
        weighted_sum += clicks_contribution(state, config) * CLICKS_WEIGHT;
        confidence_sum += CLICKS_CONFIDENCE
            * (state.clicks.samples() as f64 / CLICKS_CONFIDENCE_SATURATION).min(1.0);
        active_channels += 1;
    }

    if config.track_movement && state.movement.is_ready() {
        weighted_sum += movement_contribution(state, config) * MOVEMENT_WEIGHT;
        confidence_sum += MOVEMENT_CONFIDENCE
            * (state.movement.samples() as f64 / MOVEMENT_CONFIDENCE_SATURATION).min(1.0);
        active_channels += 1;
    }

    if config.track_focus && state.focus.is_ready() {
        weighted_sum += focus_contribution(state) * FOCUS_WEIGHT;
        confidence_sum += FOCUS_CONFIDENCE;
        active_channels += 1;
    }

    if config.track_clipboard && state.clipboard.is_ready() {
        weighted_sum += state.clipboard.metrics().suspicious_score * CLIPBOARD_WEIGHT;
        confidence_sum += CLIPBOARD_CONFIDENCE
            * (state.clipboard.samples() as f64 / CLIPBOARD_CONFIDENCE_SATURATION).min(1.0);
        active_channels += 1;
    }

    if active_channels == 0 {
        return ScoreOutcome {
            bot_score: 0.0,
            confidence: 0.0,
        };
    }

    let bot_score =
        (weighted_sum / active_channels as f64 * config.sensitivity).clamp(0.0, 1.0);
    let confidence = (confidence_sum / active_channels as f64).clamp(0.0, 1.0);

    ScoreOutcome {
        bot_score,
        confidence,
    }
}

/// Typing contribution: superhuman speed plus machine-timed consistency.
///
/// 0.7 x how far wpm sits above 100, normalized over the configured typing
/// threshold, plus 0.3 x a consistency term that only engages above 0.95
/// and reaches 1 at perfect consistency.
fn typing_contribution(state: &BehaviorState, config: &DetectorConfig) -> f64 {
    let m = state.typing.metrics();
    let speed_term = normalize(m.wpm - HUMAN_WPM_CEILING, config.typing_speed_threshold);
    let consistency_term = if m.consistency > CONSISTENCY_SUSPICION_FLOOR {
        ((m.consistency - CONSISTENCY_SUSPICION_FLOOR) * 20.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    0.7 * speed_term + 0.3 * consistency_term
}

/// Click contribution: faster-than-threshold cadence plus pattern score.
fn clicks_contribution(state: &BehaviorState, config: &DetectorConfig) -> f64 {
    let m = state.clicks.metrics();
    let speed_term = normalize(
        config.click_speed_threshold - m.speed,
        config.click_speed_threshold,
    );
    0.5 * speed_term + 0.5 * m.pattern_score
}

/// Movement contribution: above-threshold straightness plus unnaturalness.
fn movement_contribution(state: &BehaviorState, config: &DetectorConfig) -> f64 {
    let m = state.movement.metrics();
    let straightness_term = normalize(
        m.straightness - config.straightness_threshold,
        1.0 - config.straightness_threshold,
    );
    0.6 * straightness_term + 0.4 * (1.0 - m.naturalness)
}

/// Focus contribution, piecewise on switch frequency.
///
/// Under 0.1 switches/min is suspiciously static (0.5); over 10/min is
/// frantic tab cycling (0.8); anything between reads ordinary (0.2).
fn focus_contribution(state: &BehaviorState) -> f64 {
    let frequency = state.focus.metrics().switch_frequency;
    if frequency < 0.1 {
        0.5
    } else if frequency > 10.0 {
        0.8
    } else {
        0.2
    }
}
