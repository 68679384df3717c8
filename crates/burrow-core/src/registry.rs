//! Registry of live transfer sessions.
//!
//! An id is present exactly while its session is not terminal. Whoever
//! removes the entry first (the process driver on exit, or a cancel request)
//! decides how the session ends; the other side observes `None` and backs off.

use crate::{Result, TransferError};
use burrow_types::{TransferInfo, TransferKind};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::{debug, info};
use uuid::Uuid;

/// Registry entry for one running session.
#[derive(Debug)]
pub struct ActiveTransfer {
    kind: TransferKind,
    started_at: DateTime<Utc>,
    cancel_tx: oneshot::Sender<()>,
}

impl ActiveTransfer {
    /// Create an entry and the receiver the session driver listens on.
    pub fn new(kind: TransferKind) -> (Self, oneshot::Receiver<()>) {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let entry = Self {
            kind,
            started_at: Utc::now(),
            cancel_tx,
        };
        (entry, cancel_rx)
    }

    fn info(&self, session_id: Uuid) -> TransferInfo {
        TransferInfo {
            session_id,
            kind: self.kind,
            started_at: self.started_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct TransferRegistry {
    sessions: DashMap<Uuid, ActiveTransfer>,
}

impl TransferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new session. A duplicate id is a caller bug.
    pub fn register(&self, session_id: Uuid, entry: ActiveTransfer) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.sessions.entry(session_id) {
            Entry::Occupied(_) => Err(TransferError::DuplicateSession(session_id)),
            Entry::Vacant(slot) => {
                debug!(target: "burrow::registry", "Registered {} session {}", entry.kind, session_id);
                slot.insert(entry);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, session_id: Uuid) -> Option<TransferInfo> {
        self.sessions
            .get(&session_id)
            .map(|entry| entry.info(session_id))
    }

    pub fn contains(&self, session_id: Uuid) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Run `f` while holding the session's entry, so it cannot be removed
    /// concurrently. Returns false without running `f` if the id is absent.
    pub fn if_live(&self, session_id: Uuid, f: impl FnOnce()) -> bool {
        match self.sessions.get(&session_id) {
            Some(_entry) => {
                f();
                true
            }
            None => false,
        }
    }

    /// Remove a session. Removing an absent id is a no-op.
    pub fn remove(&self, session_id: Uuid) -> Option<ActiveTransfer> {
        let removed = self.sessions.remove(&session_id).map(|(_, entry)| entry);
        if removed.is_some() {
            debug!(target: "burrow::registry", "Unregistered session {}", session_id);
        }
        removed
    }

    /// Remove a live session and signal its driver to kill the process.
    ///
    /// Returns true iff a live session was found.
    pub fn cancel(&self, session_id: Uuid) -> bool {
        match self.remove(session_id) {
            Some(entry) => {
                info!(target: "burrow::registry", "Cancelling {} session {}", entry.kind, session_id);
                // The driver may have finished between removal and send.
                let _ = entry.cancel_tx.send(());
                true
            }
            None => {
                debug!(target: "burrow::registry", "Cancel for unknown session {}", session_id);
                false
            }
        }
    }

    pub fn active(&self) -> Vec<TransferInfo> {
        self.sessions
            .iter()
            .map(|entry| entry.value().info(*entry.key()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
