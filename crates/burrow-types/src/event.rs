//! Events delivered to the UI layer while a transfer runs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stream a line of process output arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamOrigin {
    Stdout,
    Stderr,
}

/// Severity of a status line.
///
/// Output on stderr is not an error by itself: the wormhole tool prints
/// key exchange and progress chatter there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Typed notification for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferEvent {
    /// Connection code announced by the sender.
    CodeDiscovered { session_id: Uuid, code: String },
    /// Progress percentage, 0-100. Not guaranteed to be monotonic.
    Progress { session_id: Uuid, percent: u8 },
    /// Human-readable status line.
    Status {
        session_id: Uuid,
        severity: Severity,
        #[serde(skip_serializing_if = "Option::is_none")]
        origin: Option<StreamOrigin>,
        message: String,
    },
    /// Final event of a session that succeeded or failed.
    Complete {
        session_id: Uuid,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl TransferEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            TransferEvent::CodeDiscovered { session_id, .. }
            | TransferEvent::Progress { session_id, .. }
            | TransferEvent::Status { session_id, .. }
            | TransferEvent::Complete { session_id, .. } => *session_id,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, TransferEvent::Complete { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_names() {
        let id = Uuid::new_v4();
        let event = TransferEvent::CodeDiscovered {
            session_id: id,
            code: "3-apple-banana".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "code_discovered");
        assert_eq!(json["code"], "3-apple-banana");

        let event = TransferEvent::Status {
            session_id: id,
            severity: Severity::Info,
            origin: Some(StreamOrigin::Stderr),
            message: "Key established".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["severity"], "info");
        assert_eq!(json["origin"], "stderr");
    }

    #[test]
    fn test_complete_omits_empty_fields() {
        let event = TransferEvent::Complete {
            session_id: Uuid::new_v4(),
            success: false,
            code: None,
            error: Some("connection refused".to_string()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("code").is_none());
        assert_eq!(json["error"], "connection refused");
        assert!(event.is_complete());
    }
}
