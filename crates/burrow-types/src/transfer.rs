//! Transfer kinds, lifecycle states and settled results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// The four operations the external wormhole executable is driven for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    SendFiles,
    ReceiveFiles,
    SendText,
    ReceiveText,
}

impl TransferKind {
    /// Receive operations need the incoming offer accepted on stdin.
    pub fn is_receive(self) -> bool {
        matches!(self, TransferKind::ReceiveFiles | TransferKind::ReceiveText)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransferKind::SendFiles => "send_files",
            TransferKind::ReceiveFiles => "receive_files",
            TransferKind::SendText => "send_text",
            TransferKind::ReceiveText => "receive_text",
        }
    }
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a transfer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    /// Session registered, process not yet spawned.
    Starting,
    /// Process is alive and its output is being classified.
    Running,
    /// Receive session waiting for the automatic accept to be written.
    AwaitingConfirmation,
    /// Process exited with status 0.
    Succeeded,
    /// Spawn failure, runtime error or non-zero exit.
    Failed,
    /// Terminated by an explicit cancel request.
    Cancelled,
}

impl TransferState {
    /// Terminal states are absorbing.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferState::Succeeded | TransferState::Failed | TransferState::Cancelled
        )
    }
}

/// Value a transfer resolves with when it succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub session_id: Uuid,
    pub kind: TransferKind,
    /// Connection code announced by the executable (send operations).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Received message, trimmed (receive-text only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Directory the files were written to (receive-files only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
}

/// Settled result of a transfer that did not fail.
///
/// Cancellation is acknowledged here rather than through the failure channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransferOutcome {
    Completed(TransferReceipt),
    Cancelled { session_id: Uuid },
}

impl TransferOutcome {
    pub fn session_id(&self) -> Uuid {
        match self {
            TransferOutcome::Completed(receipt) => receipt.session_id,
            TransferOutcome::Cancelled { session_id } => *session_id,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransferOutcome::Cancelled { .. })
    }
}

/// Snapshot of a live session as seen through the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInfo {
    pub session_id: Uuid,
    pub kind: TransferKind,
    pub started_at: DateTime<Utc>,
}

/// A file picked for sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}
