//! File metadata handling for checkpoint copies.
//!
//! Copies keep the source's permissions and timestamps so a restored tree
//! looks the same to build tools that compare mtimes.

use std::fs::{self, FileTimes};
use std::path::Path;
use std::time::SystemTime;

/// Metadata carried over from a source file to its copy
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,

    /// Last modified time
    pub modified: SystemTime,

    /// Last access time
    pub accessed: SystemTime,

    /// File permissions (Unix mode bits)
    pub permissions: Option<u32>,
}

impl FileMetadata {
    /// Extract metadata from a file path (follows symlinks)
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let modified = metadata.modified()?;
        let accessed = metadata.accessed().unwrap_or(modified);

        #[cfg(unix)]
        let permissions = {
            use std::os::unix::fs::PermissionsExt;
            Some(metadata.permissions().mode())
        };

        #[cfg(not(unix))]
        let permissions = None;

        Ok(Self {
            size: metadata.len(),
            modified,
            accessed,
            permissions,
        })
    }

    /// Apply this metadata to a file
    pub fn apply_to_path(&self, path: &Path) -> std::io::Result<()> {
        #[cfg(unix)]
        if let Some(mode) = self.permissions {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        }

        // Read-only copies: fall back to a read handle, and skip the times if
        // the platform refuses them there.
        let times = FileTimes::new()
            .set_accessed(self.accessed)
            .set_modified(self.modified);
        match fs::OpenOptions::new().write(true).open(path) {
            Ok(file) => file.set_times(times),
            Err(_) => match fs::File::open(path) {
                Ok(file) => file.set_times(times).or(Ok(())),
                Err(e) => Err(e),
            },
        }
    }
}

/// Copy a single file and carry its metadata over, like `cp -p`
pub fn copy_with_metadata(src: &Path, dst: &Path) -> std::io::Result<u64> {
    if !fs::metadata(src)?.is_file() {
        return Err(super::copy::special_file_error(src));
    }
    let metadata = FileMetadata::from_path(src)?;

    // fs::copy fails on an existing read-only destination
    if let Ok(existing) = fs::symlink_metadata(dst) {
        if existing.permissions().readonly() || existing.file_type().is_symlink() {
            fs::remove_file(dst)?;
        }
    }

    let bytes = fs::copy(src, dst)?;
    metadata.apply_to_path(dst)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_extract_metadata() -> std::io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(b"test content")?;
        temp_file.flush()?;

        let metadata = FileMetadata::from_path(temp_file.path())?;

        assert_eq!(metadata.size, 12);
        assert!(metadata.modified > SystemTime::UNIX_EPOCH);

        Ok(())
    }

    #[test]
    fn test_copy_preserves_mtime() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("src.txt");
        let dst = temp_dir.path().join("dst.txt");
        fs::write(&src, b"hello")?;

        let past = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        fs::File::options()
            .write(true)
            .open(&src)?
            .set_times(FileTimes::new().set_modified(past))?;

        let copied = copy_with_metadata(&src, &dst)?;

        assert_eq!(copied, 5);
        assert_eq!(fs::read(&dst)?, b"hello");
        assert_eq!(fs::metadata(&dst)?.modified()?, past);

        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_permissions_preservation() -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("run.sh");
        let dst = temp_dir.path().join("copy.sh");
        fs::write(&src, b"#!/bin/sh\n")?;
        fs::set_permissions(&src, fs::Permissions::from_mode(0o750))?;

        copy_with_metadata(&src, &dst)?;

        let mode = fs::metadata(&dst)?.permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);

        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_refuses_special_files() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let sock = temp_dir.path().join("app.sock");
        let _listener = std::os::unix::net::UnixListener::bind(&sock)?;

        let err = copy_with_metadata(&sock, &temp_dir.path().join("copy")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
        assert!(!temp_dir.path().join("copy").exists());
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_overwrites_read_only_destination() -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("a.txt");
        let dst = temp_dir.path().join("b.txt");
        fs::write(&src, b"new")?;
        fs::write(&dst, b"old")?;
        fs::set_permissions(&dst, fs::Permissions::from_mode(0o444))?;

        copy_with_metadata(&src, &dst)?;

        assert_eq!(fs::read(&dst)?, b"new");
        Ok(())
    }
}
