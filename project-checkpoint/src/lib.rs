//! Project Checkpoint Library
//!
//! Point-in-time backup of a web project's source tree, with a generated
//! restore script, a text manifest and an optional safety commit.

pub mod checkpoint;
pub mod config;
pub mod fs;
pub mod restore;
pub mod utils;
pub mod vcs;

// Re-export commonly used types
pub use checkpoint::{Checkpoint, CheckpointId, CheckpointRunner};
pub use config::Config;
pub use utils::errors::CheckpointError;
pub type Result<T> = std::result::Result<T, CheckpointError>;
