//! Inbound resource-update events.
//!
//! The event stream delivers JSON frames of the shape
//! `{"status": ..., "resource_id": ..., "error": ...}`. Fields beyond these
//! three are ignored. Frames missing `status` or `resource_id` (heartbeats,
//! partial writes) are decodable but not *applicable*: the reconciler treats
//! them as no-ops rather than corrupting state.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// One incremental resource-update event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdateEvent {
    /// New lifecycle phase, as reported by the provisioner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Resource this event applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    /// Failure message, when the transition failed. An applicable event
    /// without an error clears any prior one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StateUpdateEvent {
    pub fn new(resource_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            resource_id: Some(resource_id.into()),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Returns `(resource_id, status)` when the event carries both, non-empty.
    ///
    /// Events failing this guard must be dropped without touching the
    /// snapshot.
    #[must_use]
    pub fn applicable(&self) -> Option<(&str, &str)> {
        let resource_id = self.resource_id.as_deref().filter(|id| !id.is_empty())?;
        let status = self.status.as_deref().filter(|s| !s.is_empty())?;
        Some((resource_id, status))
    }
}

/// Error from decoding one event frame.
#[derive(Debug, thiserror::Error)]
#[error("malformed event frame: {source}")]
pub struct EventDecodeError {
    #[from]
    source: serde_json::Error,
}

impl EventDecodeError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        ErrorCode::MalformedEvent
    }
}

/// Decode a single JSON event frame.
///
/// Unknown fields are ignored; missing fields decode to `None` and are
/// handled by the applicability guard, not here.
///
/// # Errors
///
/// Returns [`EventDecodeError`] when the frame is not a JSON object of the
/// expected field types.
pub fn decode_frame(frame: &str) -> Result<StateUpdateEvent, EventDecodeError> {
    Ok(serde_json::from_str(frame)?)
}

#[cfg(test)]
mod tests {
    use super::{StateUpdateEvent, decode_frame};

    #[test]
    fn full_frame_decodes() {
        let event =
            decode_frame(r#"{"status":"created","resource_id":"r1","error":null}"#).unwrap();
        assert_eq!(event.applicable(), Some(("r1", "created")));
        assert_eq!(event.error, None);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let event = decode_frame(
            r#"{"status":"creating","resource_id":"r2","error":"boom","workspace_id":"w-1","seq":42}"#,
        )
        .unwrap();
        assert_eq!(event.applicable(), Some(("r2", "creating")));
        assert_eq!(event.error.as_deref(), Some("boom"));
    }

    #[test]
    fn heartbeat_is_not_applicable() {
        let event = decode_frame("{}").unwrap();
        assert_eq!(event.applicable(), None);

        let event = decode_frame(r#"{"status":"created"}"#).unwrap();
        assert_eq!(event.applicable(), None);

        let event = decode_frame(r#"{"resource_id":"r1"}"#).unwrap();
        assert_eq!(event.applicable(), None);
    }

    #[test]
    fn empty_strings_fail_the_guard() {
        let event = decode_frame(r#"{"status":"","resource_id":"r1"}"#).unwrap();
        assert_eq!(event.applicable(), None);

        let event = decode_frame(r#"{"status":"created","resource_id":""}"#).unwrap();
        assert_eq!(event.applicable(), None);
    }

    #[test]
    fn garbage_frame_is_a_decode_error() {
        assert!(decode_frame("not json").is_err());
        assert!(decode_frame(r#"{"status":7,"resource_id":"r1"}"#).is_err());
    }

    #[test]
    fn builder_roundtrip() {
        let event = StateUpdateEvent::new("r1", "errored").with_error("quota exceeded");
        let json = serde_json::to_string(&event).unwrap();
        let back = decode_frame(&json).unwrap();
        assert_eq!(event, back);
    }
}
