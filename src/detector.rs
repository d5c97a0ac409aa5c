//! Behavior detector
//!
//! Owns one `BehaviorState` and drives the full update path for every
//! accepted event: validate, append to the channel buffer, recompute that
//! channel's metrics, then re-aggregate the overall score. The model is
//! single-threaded and run-to-completion; no handler observes a
//! half-updated state.

use crate::config::DetectorConfig;
use crate::error::ScoreError;
use crate::events::{
    ClickEvent, ClipboardKind, FocusEvent, InteractionEvent, InteractionKind, KeyEvent,
    MovementSample,
};
use crate::report::{Report, ReportEnvelope, ReportSink};
use crate::score::{self, ScoreOutcome};
use crate::state::BehaviorState;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Bot score above which the bot-detected hook fires
pub const BOT_SCORE_ALERT_THRESHOLD: f64 = 0.7;

/// Confidence above which the bot-detected hook fires
pub const BOT_CONFIDENCE_ALERT_THRESHOLD: f64 = 0.6;

/// Decision returned by the bot-detected hook.
///
/// `SuppressAction` asks the embedder to hold back the interaction that
/// triggered detection (e.g. a form submission); the detector itself never
/// blocks anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookDecision {
    #[default]
    Proceed,
    SuppressAction,
}

/// Hook invoked on every generated report snapshot
pub type ReportHook = Box<dyn FnMut(&Report)>;

/// Hook invoked when score and confidence both exceed their alert
/// thresholds
pub type BotDetectedHook = Box<dyn FnMut(&Report) -> HookDecision>;

/// Result of processing one event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessOutcome {
    /// False when tracking is stopped or the event's channel is disabled
    pub ingested: bool,
    pub bot_score: f64,
    pub confidence: f64,
    /// Whether this update crossed the alert thresholds and fired the hook
    pub bot_detected: bool,
    /// Whether the hook asked to suppress the triggering action
    pub suppress_requested: bool,
}

/// Stateful behavior detector.
///
/// Both hooks are invoked synchronously from inside [`process`] and
/// [`report`] — they are side effects of the update call, not deferred
/// dispatches. The exclusive borrow makes re-entering the detector from a
/// hook impossible.
///
/// [`process`]: BehaviorDetector::process
/// [`report`]: BehaviorDetector::report
pub struct BehaviorDetector {
    config: DetectorConfig,
    state: BehaviorState,
    tracking: bool,
    on_report: Option<ReportHook>,
    on_bot_detected: Option<BotDetectedHook>,
    sink: Option<Box<dyn ReportSink>>,
}

impl Default for BehaviorDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl BehaviorDetector {
    /// Create a detector with the given configuration, starting its session
    /// now.
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_session_start(config, Utc::now())
    }

    /// Create a detector whose session began at `session_start`.
    pub fn with_session_start(config: DetectorConfig, session_start: DateTime<Utc>) -> Self {
        Self {
            config: config.normalized(),
            state: BehaviorState::new(session_start),
            tracking: true,
            on_report: None,
            on_bot_detected: None,
            sink: None,
        }
    }

    /// Install the hook fired on every generated report snapshot.
    pub fn on_report(mut self, hook: ReportHook) -> Self {
        self.on_report = Some(hook);
        self
    }

    /// Install the hook fired when score and confidence cross their alert
    /// thresholds.
    pub fn on_bot_detected(mut self, hook: BotDetectedHook) -> Self {
        self.on_bot_detected = Some(hook);
        self
    }

    /// Install the transmission sink for generated reports.
    pub fn with_sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Current configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Read access to the accumulated state
    pub fn state(&self) -> &BehaviorState {
        &self.state
    }

    /// Whether events are currently being ingested
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Resume ingestion, continuing from existing history.
    pub fn start(&mut self) {
        self.tracking = true;
    }

    /// Suppress further ingestion and recomputation. Accumulated state is
    /// kept so a later [`start`](BehaviorDetector::start) continues where
    /// the session left off.
    pub fn stop(&mut self) {
        self.tracking = false;
    }

    /// Process one classified interaction event through the full update
    /// path.
    ///
    /// The bot-detected hook, when it fires, runs synchronously before this
    /// method returns and receives a snapshot taken at the event's
    /// timestamp; that snapshot is not transmitted to the sink.
    pub fn process(&mut self, event: InteractionEvent) -> Result<ProcessOutcome, ScoreError> {
        if !self.tracking {
            return Ok(self.idle_outcome());
        }

        if !self.dispatch(&event)? {
            return Ok(self.idle_outcome());
        }
        self.state.interaction_count += 1;

        let outcome = score::aggregate(&self.state, &self.config);
        Ok(self.finish_update(outcome, event.timestamp))
    }

    /// Store a freshly aggregated outcome and fire the bot-detected hook
    /// when both alert thresholds are crossed. The hook fires on every
    /// qualifying recomputation; single-fire semantics are the embedder's
    /// responsibility.
    fn finish_update(&mut self, outcome: ScoreOutcome, snapshot_time: DateTime<Utc>) -> ProcessOutcome {
        let ScoreOutcome {
            bot_score,
            confidence,
        } = outcome;
        self.state.bot_score = bot_score;
        self.state.confidence = confidence;

        let mut bot_detected = false;
        let mut suppress_requested = false;
        if bot_score > BOT_SCORE_ALERT_THRESHOLD && confidence > BOT_CONFIDENCE_ALERT_THRESHOLD {
            bot_detected = true;
            debug!(bot_score, confidence, "bot-likelihood alert threshold crossed");
            if let Some(hook) = self.on_bot_detected.as_mut() {
                let snapshot = Report::from_state(&self.state, snapshot_time);
                suppress_requested = hook(&snapshot) == HookDecision::SuppressAction;
            }
        }

        ProcessOutcome {
            ingested: true,
            bot_score,
            confidence,
            bot_detected,
            suppress_requested,
        }
    }

    /// Generate a report snapshot as of now, fire the report hook, and push
    /// the snapshot to the sink.
    pub fn report(&mut self) -> Report {
        self.report_at(Utc::now())
    }

    /// Generate a report snapshot as of `now`.
    ///
    /// Sink failures are logged and discarded; they never reach the caller
    /// and never touch scoring state.
    pub fn report_at(&mut self, now: DateTime<Utc>) -> Report {
        let report = Report::from_state(&self.state, now);

        if let Some(hook) = self.on_report.as_mut() {
            hook(&report);
        }

        if let Some(sink) = self.sink.as_mut() {
            let envelope = ReportEnvelope::new(self.state.session_id, report);
            if let Err(e) = sink.send(&envelope) {
                warn!(error = %e, "report transmission failed; discarding");
            }
        }

        report
    }

    /// Route an event to its channel. Returns Ok(false) when the channel is
    /// disabled by configuration, and an error when the payload matching
    /// the event type is missing.
    fn dispatch(&mut self, event: &InteractionEvent) -> Result<bool, ScoreError> {
        match event.event_type {
            InteractionKind::Key => {
                if !self.config.track_typing {
                    return Ok(false);
                }
                let payload = event.key.as_ref().ok_or(ScoreError::MissingPayload("key"))?;
                self.state.typing.push(KeyEvent {
                    key: payload.key.clone(),
                    timestamp: event.timestamp,
                    field: payload.field,
                });
            }
            InteractionKind::Click => {
                if !self.config.track_clicks {
                    return Ok(false);
                }
                let payload = event
                    .click
                    .as_ref()
                    .ok_or(ScoreError::MissingPayload("click"))?;
                self.state.clicks.push(
                    ClickEvent {
                        x: payload.x,
                        y: payload.y,
                        timestamp: event.timestamp,
                    },
                    self.config.click_speed_threshold,
                );
            }
            InteractionKind::Movement => {
                if !self.config.track_movement {
                    return Ok(false);
                }
                let payload = event
                    .movement
                    .as_ref()
                    .ok_or(ScoreError::MissingPayload("movement"))?;
                self.state.movement.push(MovementSample {
                    x: payload.x,
                    y: payload.y,
                    timestamp: event.timestamp,
                });
            }
            InteractionKind::Focus => {
                if !self.config.track_focus {
                    return Ok(false);
                }
                let payload = event
                    .focus
                    .as_ref()
                    .ok_or(ScoreError::MissingPayload("focus"))?;
                self.state.focus.push(FocusEvent {
                    kind: payload.kind,
                    timestamp: event.timestamp,
                });
            }
            InteractionKind::Clipboard => {
                if !self.config.track_clipboard {
                    return Ok(false);
                }
                let payload = event
                    .clipboard
                    .as_ref()
                    .ok_or(ScoreError::MissingPayload("clipboard"))?;
                // The counter includes the event being ingested
                let total = self.state.interaction_count + 1;
                match payload.kind {
                    ClipboardKind::Copy => {
                        self.state
                            .clipboard
                            .push_copy(event.timestamp, payload.text.clone(), total)
                    }
                    ClipboardKind::Paste => {
                        self.state
                            .clipboard
                            .push_paste(event.timestamp, payload.text.clone(), total)
                    }
                }
            }
        }
        Ok(true)
    }

    fn idle_outcome(&self) -> ProcessOutcome {
        ProcessOutcome {
            ingested: false,
            bot_score: self.state.bot_score,
            confidence: self.state.confidence,
            bot_detected: false,
            suppress_requested: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ClickPayload, ClipboardPayload, KeyPayload};
    use crate::report::JsonLinesSink;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn key_event(ms: i64) -> InteractionEvent {
        InteractionEvent {
            timestamp: ts(ms),
            event_type: InteractionKind::Key,
            key: Some(KeyPayload {
                key: "x".to_string(),
                field: Default::default(),
            }),
            click: None,
            movement: None,
            focus: None,
            clipboard: None,
        }
    }

    fn click_event(x: f64, y: f64, ms: i64) -> InteractionEvent {
        InteractionEvent {
            timestamp: ts(ms),
            event_type: InteractionKind::Click,
            key: None,
            click: Some(ClickPayload { x, y }),
            movement: None,
            focus: None,
            clipboard: None,
        }
    }

    fn paste_event(text: &str, ms: i64) -> InteractionEvent {
        InteractionEvent {
            timestamp: ts(ms),
            event_type: InteractionKind::Clipboard,
            key: None,
            click: None,
            movement: None,
            focus: None,
            clipboard: Some(ClipboardPayload {
                kind: ClipboardKind::Paste,
                text: text.to_string(),
                source: None,
            }),
        }
    }

    fn detector() -> BehaviorDetector {
        BehaviorDetector::with_session_start(DetectorConfig::default(), ts(0))
    }

    /// Metronomic superhuman typing plus machine-gun clicking, enough to
    /// clear the interaction gate with two fully suspicious channels.
    fn feed_bot_session(detector: &mut BehaviorDetector) -> ProcessOutcome {
        let mut last = detector.idle_outcome();
        for i in 0..30 {
            last = detector.process(key_event(i * 40)).unwrap();
        }
        for i in 0..15 {
            last = detector.process(click_event(100.0, 100.0, 2_000 + i * 10)).unwrap();
        }
        last
    }

    #[test]
    fn test_score_stays_zero_below_interaction_gate() {
        let mut d = detector();
        for i in 0..10 {
            let outcome = d.process(key_event(i * 40)).unwrap();
            assert_eq!(outcome.bot_score, 0.0);
            assert_eq!(outcome.confidence, 0.0);
        }
    }

    #[test]
    fn test_bot_session_scores_high_but_stays_in_range() {
        let mut d = detector();
        let outcome = feed_bot_session(&mut d);

        // Superhuman typing contributes fully; clicking nearly so. Under
        // the per-channel averaging this lands at the formula's ceiling
        // for two active channels.
        assert!(outcome.bot_score > 0.2);
        assert!(outcome.bot_score <= 0.3 + 1e-9);
        assert!(outcome.confidence > 0.25);
        assert!(!outcome.bot_detected);
    }

    #[test]
    fn test_alert_hook_fires_above_both_thresholds() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let fired_clone = Rc::clone(&fired);

        let mut d = detector().on_bot_detected(Box::new(move |report| {
            fired_clone.borrow_mut().push(report.bot_score);
            HookDecision::SuppressAction
        }));

        let outcome = d.finish_update(
            ScoreOutcome {
                bot_score: 0.9,
                confidence: 0.8,
            },
            ts(1_000),
        );
        assert!(outcome.bot_detected);
        assert!(outcome.suppress_requested);

        // Fires again on the next qualifying recomputation: no debounce
        d.finish_update(
            ScoreOutcome {
                bot_score: 0.85,
                confidence: 0.75,
            },
            ts(2_000),
        );
        assert_eq!(fired.borrow().len(), 2);
    }

    #[test]
    fn test_alert_needs_both_thresholds() {
        let fired = Rc::new(RefCell::new(0u32));
        let fired_clone = Rc::clone(&fired);

        let mut d = detector().on_bot_detected(Box::new(move |_| {
            *fired_clone.borrow_mut() += 1;
            HookDecision::Proceed
        }));

        // High score, low confidence: no alert
        let outcome = d.finish_update(
            ScoreOutcome {
                bot_score: 0.95,
                confidence: 0.5,
            },
            ts(0),
        );
        assert!(!outcome.bot_detected);

        // High confidence, low score: no alert
        let outcome = d.finish_update(
            ScoreOutcome {
                bot_score: 0.6,
                confidence: 0.9,
            },
            ts(0),
        );
        assert!(!outcome.bot_detected);
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn test_hook_absent_means_no_suppression() {
        let mut d = detector();
        let outcome = d.finish_update(
            ScoreOutcome {
                bot_score: 0.9,
                confidence: 0.8,
            },
            ts(0),
        );
        assert!(outcome.bot_detected);
        assert!(!outcome.suppress_requested);
    }

    #[test]
    fn test_stop_suppresses_ingestion_but_keeps_state() {
        let mut d = detector();
        feed_bot_session(&mut d);
        let samples_before = d.state().typing.samples();
        let score_before = d.state().bot_score;

        d.stop();
        let outcome = d.process(key_event(10_000)).unwrap();
        assert!(!outcome.ingested);
        assert_eq!(d.state().typing.samples(), samples_before);
        assert_eq!(d.state().bot_score, score_before);

        d.start();
        let outcome = d.process(key_event(10_040)).unwrap();
        assert!(outcome.ingested);
        assert_eq!(d.state().typing.samples(), samples_before + 1);
    }

    #[test]
    fn test_disabled_channel_events_are_not_counted() {
        let config = DetectorConfig {
            track_clicks: false,
            ..Default::default()
        };
        let mut d = BehaviorDetector::with_session_start(config, ts(0));

        let outcome = d.process(click_event(1.0, 1.0, 0)).unwrap();
        assert!(!outcome.ingested);
        assert_eq!(d.state().interaction_count, 0);
    }

    #[test]
    fn test_invalid_event_is_rejected() {
        let mut d = detector();
        let event = InteractionEvent {
            timestamp: ts(0),
            event_type: InteractionKind::Key,
            key: None,
            click: None,
            movement: None,
            focus: None,
            clipboard: None,
        };

        assert!(d.process(event).is_err());
        assert_eq!(d.state().interaction_count, 0);
    }

    #[test]
    fn test_report_fires_hook_and_sink() {
        let seen = Rc::new(RefCell::new(0u32));
        let seen_clone = Rc::clone(&seen);

        let buffer: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        struct SharedSink(Rc<RefCell<Vec<u8>>>);
        impl ReportSink for SharedSink {
            fn send(&mut self, envelope: &ReportEnvelope) -> Result<(), ScoreError> {
                let mut binding = self.0.borrow_mut();
                let mut sink = JsonLinesSink::new(&mut *binding);
                sink.send(envelope)
            }
        }

        let mut d = detector()
            .on_report(Box::new(move |_| *seen_clone.borrow_mut() += 1))
            .with_sink(Box::new(SharedSink(Rc::clone(&buffer))));

        d.process(key_event(0)).unwrap();
        let report = d.report_at(ts(60_000));

        assert_eq!(*seen.borrow(), 1);
        assert_eq!(report.session_duration, 60_000);
        assert_eq!(report.interaction_count, 1);

        let written = String::from_utf8(buffer.borrow().clone()).unwrap();
        assert_eq!(written.lines().count(), 1);
    }

    #[test]
    fn test_sink_failure_is_swallowed() {
        struct FailingSink;
        impl ReportSink for FailingSink {
            fn send(&mut self, _: &ReportEnvelope) -> Result<(), ScoreError> {
                Err(ScoreError::SinkError("connection refused".to_string()))
            }
        }

        let mut d = detector().with_sink(Box::new(FailingSink));
        d.process(key_event(0)).unwrap();

        // Must not panic or propagate; state is untouched by the failure
        let report = d.report_at(ts(1_000));
        assert_eq!(report.interaction_count, 1);
        assert_eq!(d.state().interaction_count, 1);
    }

    #[test]
    fn test_external_paste_flood_detected_via_clipboard_channel() {
        let mut d = detector();
        // Pad past the interaction gate with slow, ordinary typing
        for i in 0..20 {
            d.process(key_event(i * 700)).unwrap();
        }
        let mut last = d.idle_outcome();
        for i in 0..22 {
            last = d
                .process(paste_event(&format!("pasted block {i}"), 20_000 + i * 500))
                .unwrap();
        }

        let clipboard = d.state().clipboard.metrics();
        assert_eq!(clipboard.external_paste_count, 22);
        // clipboard 22 of 42 interactions: dominance bonus applies
        assert!((clipboard.suspicious_score - 0.8).abs() < 1e-9);
        assert!(last.bot_score > 0.0);
    }

    #[test]
    fn test_outcome_scores_match_state() {
        let mut d = detector();
        let outcome = feed_bot_session(&mut d);
        assert_eq!(outcome.bot_score, d.state().bot_score);
        assert_eq!(outcome.confidence, d.state().confidence);
    }
}
