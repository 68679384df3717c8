//! Public entry points for starting and cancelling transfers.

use crate::process::{Driver, build_command};
use crate::{
    ActiveTransfer, Notifier, Result, TracingNotifier, TransferError, TransferRegistry,
    TransferSession, bundled_executable_path,
};
use burrow_types::{TransferEvent, TransferInfo, TransferKind, TransferOutcome};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub executable_path: PathBuf,
    /// How long a receive session waits before accepting the offer.
    pub confirm_delay: Duration,
    /// Written to stdin, newline-terminated, to accept an incoming offer.
    pub confirm_token: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            executable_path: bundled_executable_path(Path::new("resources")),
            confirm_delay: Duration::from_secs(1),
            confirm_token: "y".to_string(),
        }
    }
}

/// A running transfer: its event stream and its deferred result.
pub struct Transfer {
    session_id: Uuid,
    kind: TransferKind,
    events: mpsc::UnboundedReceiver<TransferEvent>,
    task: JoinHandle<Result<TransferOutcome>>,
}

impl Transfer {
    pub fn id(&self) -> Uuid {
        self.session_id
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    /// Next event for this session; `None` once the session is terminal.
    pub async fn next_event(&mut self) -> Option<TransferEvent> {
        self.events.recv().await
    }

    /// Wait for the transfer to settle. Events not yet read stay unread.
    pub async fn wait(self) -> Result<TransferOutcome> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(TransferError::ProcessRuntimeError(format!(
                "transfer task failed: {}",
                e
            ))),
        }
    }

    /// Read every event until the session ends, then settle.
    pub async fn collect(mut self) -> (Vec<TransferEvent>, Result<TransferOutcome>) {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        let result = self.wait().await;
        (events, result)
    }
}

impl std::fmt::Debug for Transfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transfer")
            .field("session_id", &self.session_id)
            .field("kind", &self.kind)
            .finish()
    }
}

struct Launch {
    kind: TransferKind,
    args: Vec<OsString>,
    working_dir: Option<PathBuf>,
}

/// Starts wormhole processes and tracks them until they end.
pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: Arc<TransferRegistry>,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self::with_notifier(config, Arc::new(TracingNotifier))
    }

    pub fn with_notifier(config: OrchestratorConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            registry: Arc::new(TransferRegistry::new()),
            notifier,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TransferRegistry> {
        &self.registry
    }

    /// Whether `wormhole --version` runs and exits cleanly.
    pub async fn check_available(&self) -> bool {
        let status = Command::new(&self.config.executable_path)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                debug!(target: "burrow::orchestrator", "Wormhole availability check failed: {}", e);
                false
            }
        }
    }

    /// `wormhole send <files...>`
    pub async fn send_files(&self, paths: &[PathBuf]) -> Result<Transfer> {
        if paths.is_empty() {
            return Err(TransferError::InvalidRequest("no files to send".to_string()));
        }
        let mut args: Vec<OsString> = vec!["send".into()];
        args.extend(paths.iter().map(|p| p.as_os_str().to_os_string()));

        self.launch(Launch {
            kind: TransferKind::SendFiles,
            args,
            working_dir: None,
        })
    }

    /// `wormhole receive <code>` run inside `save_dir`.
    pub async fn receive_files(&self, code: &str, save_dir: &Path) -> Result<Transfer> {
        let code = validate_code(code)?;
        if !save_dir.is_dir() {
            return Err(TransferError::InvalidRequest(format!(
                "save location is not a directory: {}",
                save_dir.display()
            )));
        }

        self.launch(Launch {
            kind: TransferKind::ReceiveFiles,
            args: vec!["receive".into(), code.into()],
            working_dir: Some(save_dir.to_path_buf()),
        })
    }

    /// `wormhole send --text <text>`
    pub async fn send_text(&self, text: &str) -> Result<Transfer> {
        if text.is_empty() {
            return Err(TransferError::InvalidRequest("no text to send".to_string()));
        }

        self.launch(Launch {
            kind: TransferKind::SendText,
            args: vec!["send".into(), "--text".into(), text.into()],
            working_dir: None,
        })
    }

    /// `wormhole receive <code>`, with stdout taken as the message.
    pub async fn receive_text(&self, code: &str) -> Result<Transfer> {
        let code = validate_code(code)?;

        self.launch(Launch {
            kind: TransferKind::ReceiveText,
            args: vec!["receive".into(), code.into()],
            working_dir: None,
        })
    }

    /// Kill a live transfer. Returns true iff one was found.
    pub fn cancel(&self, session_id: Uuid) -> bool {
        self.registry.cancel(session_id)
    }

    pub fn lookup(&self, session_id: Uuid) -> Option<TransferInfo> {
        self.registry.lookup(session_id)
    }

    pub fn active_transfers(&self) -> Vec<TransferInfo> {
        self.registry.active()
    }

    fn launch(&self, launch: Launch) -> Result<Transfer> {
        let executable = &self.config.executable_path;
        if !executable.exists() {
            error!(target: "burrow::orchestrator", "Wormhole binary not found at: {:?}", executable);
            return Err(TransferError::ExecutableNotFound(executable.clone()));
        }

        let session_id = Uuid::new_v4();
        let kind = launch.kind;
        let mut session = TransferSession::new(session_id, kind);
        if kind == TransferKind::ReceiveFiles {
            if let Some(dir) = &launch.working_dir {
                session = session.with_destination(dir.clone());
            }
        }

        let (entry, cancel_rx) = ActiveTransfer::new(kind);
        self.registry.register(session_id, entry)?;

        info!(
            target: "burrow::orchestrator",
            "Spawning wormhole for {} session {}: {:?} {:?}",
            kind, session_id, executable, launch.args
        );

        let mut cmd = build_command(
            executable,
            &launch.args,
            launch.working_dir.as_deref(),
            kind.is_receive(),
        );
        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(target: "burrow::orchestrator", "Failed to spawn wormhole for session {}: {}", session_id, e);
                self.registry.remove(session_id);
                let message = format!("Failed to spawn {}: {}", executable.display(), e);
                session.failed(TransferError::SpawnError(message.clone()));
                return Err(TransferError::SpawnError(message));
            }
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let driver = Driver::new(
            session,
            self.registry.clone(),
            events_tx,
            self.notifier.clone(),
            self.config.confirm_delay,
            self.config.confirm_token.clone(),
        );
        let task = tokio::spawn(driver.run(child, cancel_rx));

        Ok(Transfer {
            session_id,
            kind,
            events: events_rx,
            task,
        })
    }
}

fn validate_code(code: &str) -> Result<&str> {
    let code = code.trim();
    if code.is_empty() {
        return Err(TransferError::InvalidRequest("wormhole code is empty".to_string()));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator_with(executable: PathBuf) -> Orchestrator {
        Orchestrator::new(OrchestratorConfig {
            executable_path: executable,
            ..OrchestratorConfig::default()
        })
    }

    #[test]
    fn test_validate_code() {
        assert_eq!(validate_code("  7-crossword-firefly\n").unwrap(), "7-crossword-firefly");
        assert!(matches!(validate_code("   "), Err(TransferError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("wormhole");
        let orchestrator = orchestrator_with(missing.clone());

        let err = orchestrator
            .send_files(&[PathBuf::from("notes.txt")])
            .await
            .unwrap_err();
        assert!(matches!(&err, TransferError::ExecutableNotFound(p) if *p == missing));
        assert!(err.to_string().contains(&missing.display().to_string()));
        assert!(orchestrator.registry().is_empty());
        assert!(!orchestrator.check_available().await);
    }

    #[tokio::test]
    async fn test_rejects_empty_requests() {
        let orchestrator = orchestrator_with(PathBuf::from("/nonexistent/wormhole"));
        assert!(matches!(
            orchestrator.send_files(&[]).await,
            Err(TransferError::InvalidRequest(_))
        ));
        assert!(matches!(
            orchestrator.receive_text(" ").await,
            Err(TransferError::InvalidRequest(_))
        ));
        assert!(matches!(
            orchestrator.send_text("").await,
            Err(TransferError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_receive_files_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator_with(PathBuf::from("/nonexistent/wormhole"));
        let result = orchestrator
            .receive_files("1-a-b", &dir.path().join("nope"))
            .await;
        assert!(matches!(result, Err(TransferError::InvalidRequest(_))));
    }

    #[test]
    fn test_cancel_unknown() {
        let orchestrator = orchestrator_with(PathBuf::from("/nonexistent/wormhole"));
        assert!(!orchestrator.cancel(Uuid::new_v4()));
        assert!(orchestrator.active_transfers().is_empty());
    }
}
