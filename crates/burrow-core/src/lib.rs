//! Orchestration of the external wormhole executable for Burrow.
//!
//! The executable does the actual transfer. This crate spawns it, classifies
//! its console output into typed events and settles one result per transfer.

mod buffer;
mod classifier;
mod error;
mod notify;
mod orchestrator;
mod paths;
mod process;
mod registry;
mod session;

pub use buffer::LineBuffer;
pub use classifier::{Signal, classify};
pub use error::TransferError;
pub use notify::{NOTIFICATION_TITLE, Notifier, TracingNotifier};
pub use orchestrator::{Orchestrator, OrchestratorConfig, Transfer};
pub use paths::{bundled_executable_path, default_download_dir, describe_files};
pub use registry::{ActiveTransfer, TransferRegistry};
pub use session::TransferSession;

/// Result type for Burrow operations.
pub type Result<T> = std::result::Result<T, TransferError>;
