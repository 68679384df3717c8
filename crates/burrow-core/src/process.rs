//! Process driver for the wormhole executable.
//!
//! One driver task owns one child process. It reads both output pipes until
//! EOF, feeds the session, and only then reaps the child, so every byte the
//! process wrote is classified before the completion event goes out.

use crate::session::Completion;
use crate::{NOTIFICATION_TITLE, Notifier, Result, TransferError, TransferRegistry, TransferSession};
use burrow_types::{Severity, StreamOrigin, TransferEvent, TransferKind, TransferOutcome, TransferReceipt};
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

const READ_CHUNK: usize = 4096;

/// Build the command for one wormhole invocation.
pub(crate) fn build_command(
    executable: &Path,
    args: &[OsString],
    working_dir: Option<&Path>,
    pipe_stdin: bool,
) -> Command {
    let mut cmd = Command::new(executable);
    cmd.args(args)
        .stdin(if pipe_stdin { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }
    cmd
}

pub(crate) struct Driver {
    session: TransferSession,
    registry: Arc<TransferRegistry>,
    events: mpsc::UnboundedSender<TransferEvent>,
    notifier: Arc<dyn Notifier>,
    confirm_delay: Duration,
    confirm_token: String,
}

impl Driver {
    pub(crate) fn new(
        session: TransferSession,
        registry: Arc<TransferRegistry>,
        events: mpsc::UnboundedSender<TransferEvent>,
        notifier: Arc<dyn Notifier>,
        confirm_delay: Duration,
        confirm_token: String,
    ) -> Self {
        Self {
            session,
            registry,
            events,
            notifier,
            confirm_delay,
            confirm_token,
        }
    }

    /// Drive the child to a terminal state.
    ///
    /// Dropping the driver at the end closes the event channel, which is how
    /// subscribers learn that the session is over.
    pub(crate) async fn run(
        mut self,
        mut child: Child,
        mut cancel_rx: oneshot::Receiver<()>,
    ) -> Result<TransferOutcome> {
        let session_id = self.session.id();
        let initial = self.session.mark_running();
        self.deliver(initial);

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut stdin = child.stdin.take();
        let mut out_buf = [0u8; READ_CHUNK];
        let mut err_buf = [0u8; READ_CHUNK];

        let confirm_timer = tokio::time::sleep(self.confirm_delay);
        tokio::pin!(confirm_timer);
        let mut confirm_pending = self.session.kind().is_receive() && stdin.is_some();

        while stdout.is_some() || stderr.is_some() {
            tokio::select! {
                _ = &mut cancel_rx => return self.cancelled(child).await,
                read = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => {
                    match self.handle_read(StreamOrigin::Stdout, read, &out_buf) {
                        Ok(true) => stdout = None,
                        Ok(false) => {}
                        Err(e) => return self.runtime_failure(child, format!("stdout read failed: {}", e)).await,
                    }
                }
                read = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => {
                    match self.handle_read(StreamOrigin::Stderr, read, &err_buf) {
                        Ok(true) => stderr = None,
                        Ok(false) => {}
                        Err(e) => return self.runtime_failure(child, format!("stderr read failed: {}", e)).await,
                    }
                }
                _ = &mut confirm_timer, if confirm_pending => {
                    confirm_pending = false;
                    self.confirm(&mut stdin).await;
                }
            }
        }

        drop(stdin);
        trace!(target: "burrow::process", "Session {} output drained, waiting for exit", session_id);

        let status = tokio::select! {
            _ = &mut cancel_rx => return self.cancelled(child).await,
            status = child.wait() => status,
        };

        match status {
            Ok(status) => {
                info!(target: "burrow::process", "Wormhole process for session {} exited with code: {:?}", session_id, status.code());
                self.exited(status.code())
            }
            Err(e) => self.runtime_failure(child, format!("wait failed: {}", e)).await,
        }
    }

    /// Returns Ok(true) at EOF.
    fn handle_read(
        &mut self,
        origin: StreamOrigin,
        read: std::io::Result<usize>,
        buf: &[u8],
    ) -> std::io::Result<bool> {
        match read? {
            0 => {
                debug!(target: "burrow::process", "Session {} {:?} closed", self.session.id(), origin);
                let events = self.session.flush(origin);
                self.deliver(events);
                Ok(true)
            }
            n => {
                trace!(target: "burrow::process", "Session {} {:?}: {}", self.session.id(), origin,
                      String::from_utf8_lossy(&buf[..n]));
                let events = self.session.ingest(origin, &buf[..n]);
                self.deliver(events);
                Ok(false)
            }
        }
    }

    /// Accept the incoming offer on the process's stdin.
    async fn confirm(&mut self, stdin: &mut Option<ChildStdin>) {
        let session_id = self.session.id();
        if !self.registry.contains(session_id) {
            return;
        }
        let Some(writer) = stdin.as_mut() else {
            return;
        };

        let line = format!("{}\n", self.confirm_token);
        let written = match writer.write_all(line.as_bytes()).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };

        match written {
            Ok(()) => debug!(target: "burrow::process", "Sent confirmation to session {}", session_id),
            Err(e) => {
                warn!(target: "burrow::process", "Failed to confirm session {}: {}", session_id, e);
                let note = self
                    .session
                    .note(Severity::Warning, format!("Could not confirm transfer: {}", e));
                self.deliver(note.into_iter().collect());
            }
        }
        self.session.confirmation_sent();
    }

    fn exited(&mut self, exit_code: Option<i32>) -> Result<TransferOutcome> {
        let session_id = self.session.id();
        if self.registry.remove(session_id).is_none() {
            // A cancel request got there first.
            self.session.cancelled();
            return Ok(TransferOutcome::Cancelled { session_id });
        }

        match self.session.exited(exit_code) {
            Some(completion) => self.settle(completion),
            None => Ok(TransferOutcome::Cancelled { session_id }),
        }
    }

    async fn runtime_failure(&mut self, mut child: Child, message: String) -> Result<TransferOutcome> {
        let session_id = self.session.id();
        warn!(target: "burrow::process", "Wormhole process error for session {}: {}", session_id, message);
        let _ = child.start_kill();
        let _ = child.wait().await;
        self.fail(message)
    }

    /// Settle a session whose process broke: one error status, then the
    /// failed completion.
    fn fail(&mut self, message: String) -> Result<TransferOutcome> {
        let session_id = self.session.id();
        if self.registry.remove(session_id).is_none() {
            self.session.cancelled();
            return Ok(TransferOutcome::Cancelled { session_id });
        }

        if let Some(note) = self.session.note(Severity::Error, message.clone()) {
            let _ = self.events.send(note);
        }
        match self.session.failed(TransferError::ProcessRuntimeError(message)) {
            Some(completion) => self.settle(completion),
            None => Ok(TransferOutcome::Cancelled { session_id }),
        }
    }

    async fn cancelled(&mut self, mut child: Child) -> Result<TransferOutcome> {
        let session_id = self.session.id();
        info!(target: "burrow::process", "Terminating wormhole process for session {}", session_id);

        if let Err(e) = child.start_kill() {
            debug!(target: "burrow::process", "Kill for session {} failed (already exited?): {}", session_id, e);
        }
        match child.wait().await {
            Ok(status) => debug!(target: "burrow::process", "Session {} reaped: {:?}", session_id, status),
            Err(e) => warn!(target: "burrow::process", "Failed to reap session {}: {}", session_id, e),
        }

        self.session.cancelled();
        info!(target: "burrow::process", "Session {} cancelled", session_id);
        Ok(TransferOutcome::Cancelled { session_id })
    }

    /// Emit the completion event. Only the side that removed the session
    /// from the registry gets here.
    fn settle(&self, completion: Completion) -> Result<TransferOutcome> {
        let session_id = self.session.id();
        let _ = self.events.send(completion.event);

        match completion.result {
            Ok(receipt) => {
                info!(target: "burrow::process", "Session {} succeeded", session_id);
                self.notify(&receipt);
                Ok(TransferOutcome::Completed(receipt))
            }
            Err(e) => {
                warn!(target: "burrow::process", "Session {} failed: {}", session_id, e);
                Err(e)
            }
        }
    }

    fn notify(&self, receipt: &TransferReceipt) {
        let code = receipt.code.as_deref().unwrap_or("unknown");
        let body = match receipt.kind {
            TransferKind::SendFiles => format!("Files sent successfully! Code: {}", code),
            TransferKind::SendText => format!("Text sent! Code: {}", code),
            TransferKind::ReceiveFiles => "Files received successfully!".to_string(),
            TransferKind::ReceiveText => "Text message received!".to_string(),
        };
        self.notifier.notify(NOTIFICATION_TITLE, &body);
    }

    /// Forward events while the session is still registered.
    ///
    /// The registry entry is held for the duration of the send, so a
    /// concurrent cancel either happens before (events dropped) or after.
    fn deliver(&self, events: Vec<TransferEvent>) {
        if events.is_empty() {
            return;
        }
        let session_id = self.session.id();
        let delivered = self.registry.if_live(session_id, || {
            for event in events {
                if self.events.send(event).is_err() {
                    trace!(target: "burrow::process", "No subscriber for session {}", session_id);
                    break;
                }
            }
        });
        if !delivered {
            trace!(target: "burrow::process", "Dropped events for inactive session {}", session_id);
        }
    }
}

async fn read_chunk<R: AsyncRead + Unpin>(
    stream: &mut Option<R>,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    match stream {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}
