//! Utility modules for the checkpoint tool.

pub mod errors;
pub mod logger;

pub use errors::{CheckpointError, Result};
