//! Burrow command-line frontend.
//!
//! Configuration, logging and event rendering live here so they can be
//! tested apart from `main.rs`.

pub mod config;
pub mod logging;
pub mod output;
