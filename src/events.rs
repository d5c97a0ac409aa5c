//! Interaction event types
//!
//! Defines the classified interaction events accepted at the input boundary.
//! Event capture and classification (listener wiring, modifier-key and
//! non-text-target filtering) happen upstream; this module only fixes the
//! accepted shapes and their minimum-field requirements.

use crate::error::ScoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Interaction channels recognized by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Key,
    Click,
    Movement,
    Focus,
    Clipboard,
}

/// Kind of form field a key press targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Email,
    Password,
    Search,
    TextArea,
    Other,
}

/// Focus transition direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusKind {
    Focus,
    Blur,
}

/// Clipboard action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardKind {
    Copy,
    Paste,
}

/// A key press on a text-input target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Key identity (e.g. "a", "Backspace")
    pub key: String,
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Kind of field the press targeted
    #[serde(default)]
    pub field: FieldKind,
}

/// A click or tap; mouse and touch share one representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickEvent {
    pub x: f64,
    pub y: f64,
    pub timestamp: DateTime<Utc>,
}

/// One pointer position sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementSample {
    pub x: f64,
    pub y: f64,
    pub timestamp: DateTime<Utc>,
}

/// A window focus transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusEvent {
    pub kind: FocusKind,
    pub timestamp: DateTime<Utc>,
}

/// Key payload carried on the wire envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPayload {
    pub key: String,
    #[serde(default)]
    pub field: FieldKind,
}

/// Click payload carried on the wire envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickPayload {
    pub x: f64,
    pub y: f64,
}

/// Movement payload carried on the wire envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementPayload {
    pub x: f64,
    pub y: f64,
}

/// Focus payload carried on the wire envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusPayload {
    pub kind: FocusKind,
}

/// Clipboard payload carried on the wire envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipboardPayload {
    pub kind: ClipboardKind,
    /// Copied or pasted text
    pub text: String,
    /// Descriptor of the element the action targeted
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A classified interaction event with timestamp and type-specific payload.
///
/// The payload field matching `event_type` must be present; all others are
/// ignored. `is_external` on pastes is computed by the correlator, never
/// accepted as input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Event type
    pub event_type: InteractionKind,
    /// Key press data (present when event_type is Key)
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyPayload>,
    /// Click data (present when event_type is Click)
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click: Option<ClickPayload>,
    /// Movement sample data (present when event_type is Movement)
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement: Option<MovementPayload>,
    /// Focus transition data (present when event_type is Focus)
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<FocusPayload>,
    /// Clipboard action data (present when event_type is Clipboard)
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clipboard: Option<ClipboardPayload>,
}

impl InteractionEvent {
    /// Check that the payload matching `event_type` is present.
    pub fn validate(&self) -> Result<(), ScoreError> {
        match self.event_type {
            InteractionKind::Key if self.key.is_none() => Err(ScoreError::MissingPayload("key")),
            InteractionKind::Click if self.click.is_none() => {
                Err(ScoreError::MissingPayload("click"))
            }
            InteractionKind::Movement if self.movement.is_none() => {
                Err(ScoreError::MissingPayload("movement"))
            }
            InteractionKind::Focus if self.focus.is_none() => {
                Err(ScoreError::MissingPayload("focus"))
            }
            InteractionKind::Clipboard if self.clipboard.is_none() => {
                Err(ScoreError::MissingPayload("clipboard"))
            }
            _ => Ok(()),
        }
    }
}

/// Parse newline-delimited JSON into events (one event per line).
pub fn parse_ndjson(input: &str) -> Result<Vec<InteractionEvent>, ScoreError> {
    let mut events = Vec::new();
    for (lineno, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event: InteractionEvent = serde_json::from_str(trimmed).map_err(|e| {
            ScoreError::ParseError(format!("line {}: {}", lineno + 1, e))
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Parse a JSON array of events.
pub fn parse_array(input: &str) -> Result<Vec<InteractionEvent>, ScoreError> {
    serde_json::from_str(input)
        .map_err(|e| ScoreError::ParseError(format!("Failed to parse event array: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{
            "timestamp": "2024-03-10T12:00:00Z",
            "event_type": "click",
            "click": { "x": 100.0, "y": 200.0 }
        }"#;

        let event: InteractionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, InteractionKind::Click);
        let click = event.click.unwrap();
        assert_eq!(click.x, 100.0);
        assert_eq!(click.y, 200.0);
    }

    #[test]
    fn test_clipboard_event_deserialization() {
        let json = r#"{
            "timestamp": "2024-03-10T12:00:05Z",
            "event_type": "clipboard",
            "clipboard": { "kind": "paste", "text": "hello", "source": "textarea#answer" }
        }"#;

        let event: InteractionEvent = serde_json::from_str(json).unwrap();
        let clipboard = event.clipboard.unwrap();
        assert_eq!(clipboard.kind, ClipboardKind::Paste);
        assert_eq!(clipboard.text, "hello");
        assert_eq!(clipboard.source.as_deref(), Some("textarea#answer"));
    }

    #[test]
    fn test_key_field_defaults_to_text() {
        let json = r#"{
            "timestamp": "2024-03-10T12:00:00Z",
            "event_type": "key",
            "key": { "key": "a" }
        }"#;

        let event: InteractionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.key.unwrap().field, FieldKind::Text);
    }

    #[test]
    fn test_validate_rejects_missing_payload() {
        let event = InteractionEvent {
            timestamp: ts(0),
            event_type: InteractionKind::Movement,
            key: None,
            click: None,
            movement: None,
            focus: None,
            clipboard: None,
        };

        assert!(matches!(
            event.validate(),
            Err(ScoreError::MissingPayload("movement"))
        ));
    }

    #[test]
    fn test_validate_ignores_extra_payloads() {
        let event = InteractionEvent {
            timestamp: ts(0),
            event_type: InteractionKind::Click,
            key: Some(KeyPayload {
                key: "a".to_string(),
                field: FieldKind::Text,
            }),
            click: Some(ClickPayload { x: 1.0, y: 2.0 }),
            movement: None,
            focus: None,
            clipboard: None,
        };

        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_parse_ndjson() {
        let input = r#"
            {"timestamp":"2024-03-10T12:00:00Z","event_type":"focus","focus":{"kind":"blur"}}

            {"timestamp":"2024-03-10T12:00:01Z","event_type":"focus","focus":{"kind":"focus"}}
        "#;

        let events = parse_ndjson(input).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].focus.as_ref().unwrap().kind, FocusKind::Blur);
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let input = "{\"timestamp\":\"2024-03-10T12:00:00Z\",\"event_type\":\"focus\",\"focus\":{\"kind\":\"blur\"}}\nnot json";
        let err = parse_ndjson(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_array() {
        let input = r#"[
            {"timestamp":"2024-03-10T12:00:00Z","event_type":"movement","movement":{"x":1.0,"y":2.0}}
        ]"#;

        let events = parse_array(input).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, InteractionKind::Movement);
    }
}
