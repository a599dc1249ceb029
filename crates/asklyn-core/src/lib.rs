//! # AskLyn Core
//!
//! Configuration and the shared error type. Every other AskLyn crate
//! depends on this one; it depends on nothing inside the workspace.

pub mod config;
pub mod error;

pub use config::AskLynConfig;
pub use error::{AskLynError, Result};
