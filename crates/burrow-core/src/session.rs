//! Per-transfer state machine.
//!
//! A [`TransferSession`] holds everything the driver learns about one run of
//! the wormhole executable. It performs no I/O: the process driver feeds it
//! raw output and exit information and forwards the events it returns.

use crate::classifier::{Signal, classify};
use crate::{LineBuffer, Result, TransferError};
use burrow_types::{
    Severity, StreamOrigin, TransferEvent, TransferKind, TransferReceipt, TransferState,
};
use std::path::PathBuf;
use tracing::{debug, trace, warn};
use uuid::Uuid;

const CONNECTING_MESSAGE: &str = "Connecting to sender...";
const STARTED_MESSAGE: &str = "Transfer started...";

/// Terminal event plus the value the caller's deferred result settles with.
#[derive(Debug)]
pub struct Completion {
    pub event: TransferEvent,
    pub result: Result<TransferReceipt>,
}

#[derive(Debug)]
pub struct TransferSession {
    id: Uuid,
    kind: TransferKind,
    state: TransferState,
    destination: Option<PathBuf>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    stdout_lines: LineBuffer,
    stderr_lines: LineBuffer,
    code: Option<String>,
    progress: Option<u8>,
    started_announced: bool,
}

impl TransferSession {
    pub fn new(id: Uuid, kind: TransferKind) -> Self {
        Self {
            id,
            kind,
            state: TransferState::Starting,
            destination: None,
            stdout: Vec::new(),
            stderr: Vec::new(),
            stdout_lines: LineBuffer::new(),
            stderr_lines: LineBuffer::new(),
            code: None,
            progress: None,
            started_announced: false,
        }
    }

    /// Directory received files are written to.
    pub fn with_destination(mut self, destination: PathBuf) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn progress(&self) -> Option<u8> {
        self.progress
    }

    pub fn accumulated_stdout(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn accumulated_stderr(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// The process spawned. Receive sessions wait for the automatic accept.
    pub fn mark_running(&mut self) -> Vec<TransferEvent> {
        if self.state != TransferState::Starting {
            warn!(target: "burrow::session", "Session {} marked running from {:?}", self.id, self.state);
            return Vec::new();
        }

        if self.kind.is_receive() {
            self.state = TransferState::AwaitingConfirmation;
            debug!(target: "burrow::session", "Session {} awaiting confirmation", self.id);
            vec![self.status(Severity::Info, None, CONNECTING_MESSAGE.to_string())]
        } else {
            self.state = TransferState::Running;
            Vec::new()
        }
    }

    /// The accept token was written to the process.
    pub fn confirmation_sent(&mut self) {
        if self.state == TransferState::AwaitingConfirmation {
            self.state = TransferState::Running;
            debug!(target: "burrow::session", "Session {} confirmed", self.id);
        }
    }

    /// Append a raw chunk from one of the process streams and classify every
    /// line it completes.
    pub fn ingest(&mut self, origin: StreamOrigin, chunk: &[u8]) -> Vec<TransferEvent> {
        if self.state.is_terminal() {
            return Vec::new();
        }

        let lines = match origin {
            StreamOrigin::Stdout => {
                self.stdout.extend_from_slice(chunk);
                self.stdout_lines.push(chunk)
            }
            StreamOrigin::Stderr => {
                self.stderr.extend_from_slice(chunk);
                self.stderr_lines.push(chunk)
            }
        };

        let mut events = Vec::new();
        for line in lines {
            events.extend(self.apply_line(origin, &line));
        }
        events
    }

    /// The stream reached EOF; classify any unterminated last line.
    pub fn flush(&mut self, origin: StreamOrigin) -> Vec<TransferEvent> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        let rest = match origin {
            StreamOrigin::Stdout => self.stdout_lines.finish(),
            StreamOrigin::Stderr => self.stderr_lines.finish(),
        };
        match rest {
            Some(line) => self.apply_line(origin, &line),
            None => Vec::new(),
        }
    }

    /// A status line raised by the driver itself rather than by the process.
    pub fn note(&self, severity: Severity, message: impl Into<String>) -> Option<TransferEvent> {
        if self.state.is_terminal() {
            return None;
        }
        Some(self.status(severity, None, message.into()))
    }

    /// The process exited. `None` when the session already terminated.
    pub fn exited(&mut self, exit_code: Option<i32>) -> Option<Completion> {
        if exit_code == Some(0) {
            if !self.terminate(TransferState::Succeeded) {
                return None;
            }
            let receipt = self.receipt();
            let event = TransferEvent::Complete {
                session_id: self.id,
                success: true,
                code: self.code.clone(),
                error: None,
            };
            return Some(Completion {
                event,
                result: Ok(receipt),
            });
        }

        let message = self.failure_message(exit_code);
        self.failed(TransferError::NonZeroExit {
            code: exit_code,
            message,
        })
    }

    /// Spawn or runtime failure. `None` when the session already terminated.
    pub fn failed(&mut self, error: TransferError) -> Option<Completion> {
        if !self.terminate(TransferState::Failed) {
            return None;
        }
        let event = TransferEvent::Complete {
            session_id: self.id,
            success: false,
            code: None,
            error: Some(error.to_string()),
        };
        Some(Completion {
            event,
            result: Err(error),
        })
    }

    /// Cancel request observed. Returns false when already terminal.
    pub fn cancelled(&mut self) -> bool {
        self.terminate(TransferState::Cancelled)
    }

    fn terminate(&mut self, state: TransferState) -> bool {
        if self.state.is_terminal() {
            trace!(target: "burrow::session", "Session {} already {:?}, ignoring {:?}", self.id, self.state, state);
            return false;
        }
        debug!(target: "burrow::session", "Session {} {:?} -> {:?}", self.id, self.state, state);
        self.state = state;
        true
    }

    fn apply_line(&mut self, origin: StreamOrigin, line: &str) -> Vec<TransferEvent> {
        let mut events = Vec::new();

        if self.kind == TransferKind::ReceiveFiles
            && !self.started_announced
            && (line.contains("Receiving") || line.contains("Sending"))
        {
            self.started_announced = true;
            events.push(self.status(Severity::Info, None, STARTED_MESSAGE.to_string()));
        }

        for signal in classify(line, origin, self.kind) {
            match signal {
                Signal::Code(code) => {
                    if self.code.is_some() {
                        trace!(target: "burrow::session", "Session {} ignoring repeated code {}", self.id, code);
                        continue;
                    }
                    debug!(target: "burrow::session", "Session {} code: {}", self.id, code);
                    self.code = Some(code.clone());
                    events.push(TransferEvent::CodeDiscovered {
                        session_id: self.id,
                        code,
                    });
                }
                Signal::Progress(percent) => {
                    self.progress = Some(percent);
                    events.push(TransferEvent::Progress {
                        session_id: self.id,
                        percent,
                    });
                }
                Signal::Status { origin, message } => {
                    events.push(self.status(Severity::Info, Some(origin), message));
                }
            }
        }

        events
    }

    fn status(&self, severity: Severity, origin: Option<StreamOrigin>, message: String) -> TransferEvent {
        TransferEvent::Status {
            session_id: self.id,
            severity,
            origin,
            message,
        }
    }

    fn receipt(&self) -> TransferReceipt {
        let text = match self.kind {
            TransferKind::ReceiveText => Some(self.accumulated_stdout().trim().to_string()),
            _ => None,
        };
        TransferReceipt {
            session_id: self.id,
            kind: self.kind,
            code: self.code.clone(),
            text,
            destination: self.destination.clone(),
        }
    }

    /// stderr, then stdout, then a generic message.
    fn failure_message(&self, exit_code: Option<i32>) -> String {
        let stderr = self.accumulated_stderr();
        if !stderr.trim().is_empty() {
            return stderr.trim().to_string();
        }
        let stdout = self.accumulated_stdout();
        if !stdout.trim().is_empty() {
            return stdout.trim().to_string();
        }
        match exit_code {
            Some(code) => format!("Process exited with code {}", code),
            None => "Process terminated by signal".to_string(),
        }
    }
}
