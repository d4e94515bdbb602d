//! File system operations for checkpoint copies.

pub mod copy;
pub mod metadata;

pub use copy::{copy_dir_recursive, remove_path, CopyStats};
pub use metadata::{copy_with_metadata, FileMetadata};
