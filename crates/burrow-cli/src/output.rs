//! Rendering of transfer events for the terminal.

use burrow_types::{Severity, TransferEvent, TransferKind, TransferReceipt};
use serde::Deserialize;

/// How events are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for EventFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(EventFormat::Text),
            "json" => Ok(EventFormat::Json),
            _ => Err(format!("Invalid event format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

pub fn format_event(event: &TransferEvent, format: EventFormat) -> serde_json::Result<String> {
    if format == EventFormat::Json {
        return serde_json::to_string(event);
    }

    let line = match event {
        TransferEvent::CodeDiscovered { code, .. } => format!(
            "Wormhole code is: {}\nOn the other computer, run: burrow receive {}",
            code, code
        ),
        TransferEvent::Progress { percent, .. } => format!("Progress: {}%", percent),
        TransferEvent::Status { severity, message, .. } => {
            let tag = match severity {
                Severity::Info => "info",
                Severity::Warning => "warn",
                Severity::Error => "error",
            };
            format!("[{}] {}", tag, message)
        }
        TransferEvent::Complete { success: true, .. } => "Transfer complete".to_string(),
        TransferEvent::Complete { error, .. } => format!(
            "Transfer failed: {}",
            error.as_deref().unwrap_or("unknown error")
        ),
    };
    Ok(line)
}

pub fn format_receipt(receipt: &TransferReceipt, format: EventFormat) -> serde_json::Result<String> {
    if format == EventFormat::Json {
        return serde_json::to_string(receipt);
    }

    let line = match receipt.kind {
        TransferKind::ReceiveText => receipt.text.clone().unwrap_or_default(),
        TransferKind::ReceiveFiles => match &receipt.destination {
            Some(dir) => format!("Files saved to {}", dir.display()),
            None => "Files received".to_string(),
        },
        TransferKind::SendFiles | TransferKind::SendText => match &receipt.code {
            Some(code) => format!("Sent with code {}", code),
            None => "Sent".to_string(),
        },
    };
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    #[test]
    fn test_event_format_from_str() {
        assert_eq!("text".parse::<EventFormat>().unwrap(), EventFormat::Text);
        assert_eq!("JSON".parse::<EventFormat>().unwrap(), EventFormat::Json);
        assert!("yaml".parse::<EventFormat>().is_err());
    }

    #[test]
    fn test_text_rendering() {
        let session_id = Uuid::new_v4();
        let progress = TransferEvent::Progress { session_id, percent: 45 };
        assert_eq!(format_event(&progress, EventFormat::Text).unwrap(), "Progress: 45%");

        let failed = TransferEvent::Complete {
            session_id,
            success: false,
            code: None,
            error: Some("connection refused".to_string()),
        };
        assert_eq!(
            format_event(&failed, EventFormat::Text).unwrap(),
            "Transfer failed: connection refused"
        );
    }

    #[test]
    fn test_json_rendering() {
        let event = TransferEvent::CodeDiscovered {
            session_id: Uuid::nil(),
            code: "3-apple-banana".to_string(),
        };
        let line = format_event(&event, EventFormat::Json).unwrap();
        assert!(line.contains(r#""type":"code_discovered""#));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_receipt_rendering() {
        let receipt = TransferReceipt {
            session_id: Uuid::new_v4(),
            kind: TransferKind::ReceiveFiles,
            code: None,
            text: None,
            destination: Some(PathBuf::from("/home/me/Downloads")),
        };
        assert_eq!(
            format_receipt(&receipt, EventFormat::Text).unwrap(),
            "Files saved to /home/me/Downloads"
        );
    }
}
