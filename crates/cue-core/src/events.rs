use serde::{Deserialize, Serialize};

use crate::ids::SessionId;
use crate::step::StepRecord;

/// Stream events emitted by the performer backend during a live session.
/// This is the closed set the console acts on; the backend also emits
/// informational kinds (`ready`, `info`, `error`) which are dropped at
/// decode time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "reasoning")]
    Reasoning { content: String },

    #[serde(rename = "step")]
    Step { data: StepRecord },

    /// Terminal event for the session. Carries the durable session id,
    /// which the backend assigns at completion rather than at start.
    #[serde(rename = "finish")]
    Finish { session_id: SessionId },
}

impl StreamEvent {
    /// Decode one inbound frame. Unknown event kinds and malformed frames
    /// yield `None` — forward compatibility, not an error.
    pub fn decode(text: &str) -> Option<Self> {
        match serde_json::from_str::<Self>(text) {
            Ok(event) => Some(event),
            Err(_) => {
                match serde_json::from_str::<serde_json::Value>(text) {
                    Ok(value) => {
                        let kind = value.get("type").and_then(|t| t.as_str()).unwrap_or("?");
                        tracing::debug!(kind = kind, "Ignoring stream frame");
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Ignoring malformed stream frame");
                    }
                }
                None
            }
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Reasoning { .. } => "reasoning",
            Self::Step { .. } => "step",
            Self::Finish { .. } => "finish",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_reasoning() {
        let event = StreamEvent::decode(r#"{"type":"reasoning","content":"planning the intro"}"#);
        assert_eq!(
            event,
            Some(StreamEvent::Reasoning {
                content: "planning the intro".into()
            })
        );
    }

    #[test]
    fn decode_step() {
        let event = StreamEvent::decode(
            r#"{"type":"step","data":{"speech":"hi","stage":"intro","step":1,"audio_url":"/a/1.mp3"}}"#,
        );
        match event {
            Some(StreamEvent::Step { data }) => {
                assert_eq!(data.speech, "hi");
                assert_eq!(data.audio_url.as_deref(), Some("/a/1.mp3"));
            }
            other => panic!("expected step, got {other:?}"),
        }
    }

    #[test]
    fn decode_finish_tolerates_extra_fields() {
        // The backend attaches a human-readable `content` to finish frames.
        let event = StreamEvent::decode(
            r#"{"type":"finish","session_id":"sess-42","content":"all done"}"#,
        );
        assert_eq!(
            event,
            Some(StreamEvent::Finish {
                session_id: SessionId::from_raw("sess-42")
            })
        );
    }

    #[test]
    fn unknown_kinds_are_dropped() {
        assert_eq!(StreamEvent::decode(r#"{"type":"ready","content":"script archived"}"#), None);
        assert_eq!(StreamEvent::decode(r#"{"type":"info","content":"danmaku injected"}"#), None);
        assert_eq!(StreamEvent::decode(r#"{"type":"error","content":"boom"}"#), None);
    }

    #[test]
    fn malformed_frames_are_dropped() {
        assert_eq!(StreamEvent::decode("not json"), None);
        assert_eq!(StreamEvent::decode("{}"), None);
        // Right kind, wrong payload shape.
        assert_eq!(StreamEvent::decode(r#"{"type":"step","data":{"speech":1}}"#), None);
    }

    #[test]
    fn event_type_strings() {
        let event = StreamEvent::Finish {
            session_id: SessionId::from_raw("s"),
        };
        assert_eq!(event.event_type(), "finish");
    }

    #[test]
    fn serde_roundtrip() {
        let events = vec![
            StreamEvent::Reasoning { content: "thinking".into() },
            StreamEvent::Finish { session_id: SessionId::from_raw("20260828_131500") },
        ];
        for event in &events {
            let json = serde_json::to_string(event).unwrap();
            let parsed = StreamEvent::decode(&json).unwrap();
            assert_eq!(event, &parsed);
        }
    }
}
