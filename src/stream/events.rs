//! Stream event types.
//!
//! Every line of the NDJSON stream decodes into a [`StreamEvent`]. The server
//! identifies events with a free-form `type` string; [`EventKind`] is the
//! closed enumeration the subscriber API is keyed by, with `Unknown` catching
//! forward-compatible server additions and `Any` acting as a catch-all
//! subscription channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Classification of a stream event, used to key subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Server opened the stream.
    StreamStart,
    /// The AI agent started generating.
    AiStart,
    /// A chunk of generated text, possibly containing `<action>` directives.
    AiChunk,
    /// The AI agent finished generating.
    AiComplete,
    /// The backend created the project; carries the result identifier.
    ProjectCreated,
    /// Server-side completion marker.
    Complete,
    /// Server-reported or transport error.
    Error,
    /// Blank keep-alive line (engine-synthesized, carries a timestamp).
    Heartbeat,
    /// A non-blank line failed to decode (engine-synthesized).
    ParseError,
    /// Terminal notification after the byte stream ends (engine-synthesized).
    StreamComplete,
    /// The caller aborted the stream (engine-synthesized).
    Cancelled,
    /// Any server kind this client does not recognize.
    Unknown,
    /// Catch-all channel: receives every decoded server record.
    Any,
}

impl EventKind {
    /// Map a wire `type` string onto the closed enumeration.
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "stream_start" => EventKind::StreamStart,
            "ai_start" => EventKind::AiStart,
            "ai_chunk" => EventKind::AiChunk,
            "ai_complete" => EventKind::AiComplete,
            "project_created" => EventKind::ProjectCreated,
            "complete" => EventKind::Complete,
            "error" => EventKind::Error,
            "heartbeat" => EventKind::Heartbeat,
            "parse_error" => EventKind::ParseError,
            "stream_complete" => EventKind::StreamComplete,
            "stream_cancelled" => EventKind::Cancelled,
            _ => EventKind::Unknown,
        }
    }

    /// Canonical wire name, for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::StreamStart => "stream_start",
            EventKind::AiStart => "ai_start",
            EventKind::AiChunk => "ai_chunk",
            EventKind::AiComplete => "ai_complete",
            EventKind::ProjectCreated => "project_created",
            EventKind::Complete => "complete",
            EventKind::Error => "error",
            EventKind::Heartbeat => "heartbeat",
            EventKind::ParseError => "parse_error",
            EventKind::StreamComplete => "stream_complete",
            EventKind::Cancelled => "stream_cancelled",
            EventKind::Unknown => "unknown",
            EventKind::Any => "event",
        }
    }
}

/// One event from the estimate stream.
///
/// Constructed either by decoding one NDJSON line, or synthesized by the
/// engine (heartbeat, parse error, completion, cancellation). Immutable once
/// constructed; the engine does not retain events after dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// The wire discriminant, preserved verbatim.
    #[serde(rename = "type")]
    pub raw_kind: String,
    /// Human-readable progress text, if the server sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Structured payload; shape depends on the kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Identifier of the created project, present on `project_created`.
    #[serde(
        rename = "projectId",
        alias = "project_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub project_id: Option<String>,
    /// Any remaining fields, kept for catch-all subscribers.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StreamEvent {
    /// Decode one NDJSON record.
    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// The closed classification of this event.
    pub fn kind(&self) -> EventKind {
        EventKind::from_wire(&self.raw_kind)
    }

    /// The textual payload directives are parsed from: the `data` field when
    /// it is a string, otherwise the `message` field.
    pub fn text(&self) -> Option<&str> {
        if let Some(Value::String(text)) = &self.data {
            return Some(text);
        }
        self.message.as_deref()
    }

    fn synthetic(raw_kind: &str) -> Self {
        Self {
            raw_kind: raw_kind.to_string(),
            message: None,
            data: None,
            project_id: None,
            extra: Map::new(),
        }
    }

    /// Heartbeat notification for a blank keep-alive line.
    pub fn heartbeat(timestamp_ms: i64) -> Self {
        let mut event = Self::synthetic("heartbeat");
        event.data = Some(serde_json::json!({ "timestamp": timestamp_ms }));
        event
    }

    /// Notification for a line that failed to decode.
    pub fn parse_error(line: &str, error: &str) -> Self {
        let mut event = Self::synthetic("parse_error");
        event.data = Some(serde_json::json!({ "line": line, "error": error }));
        event
    }

    /// Terminal notification carrying the captured project id, if any.
    pub fn completed(project_id: Option<String>) -> Self {
        let mut event = Self::synthetic("stream_complete");
        event.project_id = project_id;
        event
    }

    /// Notification for a caller-initiated abort.
    pub fn cancelled(reason: &str) -> Self {
        let mut event = Self::synthetic("stream_cancelled");
        event.message = Some(reason.to_string());
        event
    }

    /// Notification for a transport failure.
    pub fn transport_error(message: &str) -> Self {
        let mut event = Self::synthetic("error");
        event.data = Some(serde_json::json!({ "error": message }));
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_wire() {
        assert_eq!(EventKind::from_wire("stream_start"), EventKind::StreamStart);
        assert_eq!(EventKind::from_wire("ai_chunk"), EventKind::AiChunk);
        // Near-miss spellings are not aliases; they stay forward-compatible.
        assert_eq!(EventKind::from_wire("chunk"), EventKind::Unknown);
        assert_eq!(EventKind::from_wire("ai_progress"), EventKind::Unknown);
        assert_eq!(
            EventKind::from_wire("project_created"),
            EventKind::ProjectCreated
        );
        assert_eq!(EventKind::from_wire("totally_new"), EventKind::Unknown);
    }

    #[test]
    fn test_decode_full_record() {
        let line = r#"{"type":"project_created","message":"Project ready","projectId":"proj-42","phase":2}"#;
        let event = StreamEvent::decode(line).unwrap();
        assert_eq!(event.kind(), EventKind::ProjectCreated);
        assert_eq!(event.raw_kind, "project_created");
        assert_eq!(event.message.as_deref(), Some("Project ready"));
        assert_eq!(event.project_id.as_deref(), Some("proj-42"));
        assert_eq!(event.extra["phase"], 2);
    }

    #[test]
    fn test_decode_snake_case_project_id() {
        let line = r#"{"type":"project_created","project_id":"proj-7"}"#;
        let event = StreamEvent::decode(line).unwrap();
        assert_eq!(event.project_id.as_deref(), Some("proj-7"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(StreamEvent::decode("not json at all").is_err());
        assert!(StreamEvent::decode(r#"{"no_type_field":1}"#).is_err());
    }

    #[test]
    fn test_text_prefers_string_data() {
        let line = r#"{"type":"ai_chunk","message":"progress","data":"<action>+ x=1</action>"}"#;
        let event = StreamEvent::decode(line).unwrap();
        assert_eq!(event.text(), Some("<action>+ x=1</action>"));

        let line = r#"{"type":"ai_chunk","message":"progress","data":{"step":1}}"#;
        let event = StreamEvent::decode(line).unwrap();
        assert_eq!(event.text(), Some("progress"));
    }

    #[test]
    fn test_synthetic_events() {
        let hb = StreamEvent::heartbeat(1736956800000);
        assert_eq!(hb.kind(), EventKind::Heartbeat);
        assert_eq!(hb.data.as_ref().unwrap()["timestamp"], 1736956800000i64);

        let pe = StreamEvent::parse_error("{bad", "expected value");
        assert_eq!(pe.kind(), EventKind::ParseError);
        assert_eq!(pe.data.as_ref().unwrap()["line"], "{bad");

        let done = StreamEvent::completed(Some("proj-1".to_string()));
        assert_eq!(done.kind(), EventKind::StreamComplete);
        assert_eq!(done.project_id.as_deref(), Some("proj-1"));

        let cancelled = StreamEvent::cancelled("user cancelled");
        assert_eq!(cancelled.kind(), EventKind::Cancelled);

        let err = StreamEvent::transport_error("connection reset");
        assert_eq!(err.kind(), EventKind::Error);
    }
}
