//! Common test utilities for integration tests.

#![allow(dead_code)]

use burrow_core::{Notifier, Orchestrator, OrchestratorConfig};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Write a shell script standing in for the wormhole executable.
pub fn fake_wormhole(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("wormhole");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Records notifications instead of showing them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<(String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}

impl RecordingNotifier {
    pub fn bodies(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }
}

/// Orchestrator with a short confirmation delay and a recording notifier.
pub fn test_orchestrator(executable: PathBuf) -> (Orchestrator, Arc<RecordingNotifier>) {
    test_orchestrator_with_delay(executable, Duration::from_millis(50))
}

pub fn test_orchestrator_with_delay(
    executable: PathBuf,
    confirm_delay: Duration,
) -> (Orchestrator, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let config = OrchestratorConfig {
        executable_path: executable,
        confirm_delay,
        confirm_token: "y".to_string(),
    };
    let orchestrator = Orchestrator::with_notifier(config, notifier.clone());
    (orchestrator, notifier)
}

/// Upper bound for any single test transfer.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);
