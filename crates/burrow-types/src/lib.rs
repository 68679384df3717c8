//! Shared types for the Burrow transfer orchestrator.

mod event;
mod transfer;

pub use event::*;
pub use transfer::*;
