//! Error types for Burrow.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Wormhole binary not found at: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("Process spawn failed: {0}")]
    SpawnError(String),

    #[error("Process error: {0}")]
    ProcessRuntimeError(String),

    #[error("{message}")]
    NonZeroExit { code: Option<i32>, message: String },

    #[error("Session already registered: {0}")]
    DuplicateSession(Uuid),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
