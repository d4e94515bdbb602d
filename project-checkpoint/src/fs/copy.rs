//! Recursive directory copy with metadata preservation.
//!
//! Copies merge into an existing destination: files already present are
//! overwritten, anything else under the destination is left alone.

use super::metadata::{copy_with_metadata, FileMetadata};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Totals for one recursive copy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub dirs: usize,
    pub symlinks: usize,
    pub bytes: u64,
}

/// Copy the tree rooted at `src` to `dst`, creating `dst` if needed.
///
/// Symbolic links are recreated as links on unix and copied as their target
/// elsewhere. Special files (FIFOs, sockets, devices) are an error. The first
/// error aborts the copy; whatever was written before it stays in place.
///
/// # Example
/// ```no_run
/// use project_checkpoint::fs::copy_dir_recursive;
/// use std::path::Path;
///
/// let stats = copy_dir_recursive(Path::new("components"), Path::new("/tmp/components")).unwrap();
/// println!("Copied {} files", stats.files);
/// ```
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<CopyStats> {
    let mut stats = CopyStats::default();
    let mut copied_dirs: Vec<(PathBuf, FileMetadata)> = Vec::new();

    let walker = WalkDir::new(src).follow_links(false).sort_by_file_name();

    for entry in walker {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
            copied_dirs.push((target, FileMetadata::from_path(entry.path())?));
            stats.dirs += 1;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
            stats.symlinks += 1;
        } else if file_type.is_file() {
            stats.bytes += copy_with_metadata(entry.path(), &target)?;
            stats.files += 1;
        } else {
            return Err(special_file_error(entry.path()));
        }
    }

    // Deepest first, so a read-only parent does not block its children and
    // writing children does not bump the parent's mtime afterwards.
    for (dir, metadata) in copied_dirs.iter().rev() {
        if let Err(e) = metadata.apply_to_path(dir) {
            debug!("Could not copy metadata to {}: {}", dir.display(), e);
        }
    }

    Ok(stats)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    let link_target = fs::read_link(src)?;
    if fs::symlink_metadata(dst).is_ok() {
        remove_path(dst)?;
    }
    std::os::unix::fs::symlink(link_target, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    if fs::metadata(src)?.is_dir() {
        copy_dir_recursive(src, dst).map(|_| ())
    } else {
        copy_with_metadata(src, dst).map(|_| ())
    }
}

/// FIFOs, sockets and device nodes are not copied; opening a FIFO would block.
pub(crate) fn special_file_error(path: &Path) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("{} is not a regular file, directory or symlink", path.display()),
    )
}

/// Remove a file, link or whole directory tree. Missing paths are not an error.
pub fn remove_path(path: &Path) -> std::io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_empty_directory() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("src");
        fs::create_dir(&src)?;

        let stats = copy_dir_recursive(&src, &temp_dir.path().join("dst"))?;

        assert_eq!(stats.files, 0);
        assert_eq!(stats.dirs, 1);
        assert!(temp_dir.path().join("dst").is_dir());
        Ok(())
    }

    #[test]
    fn test_copy_with_subdirectories() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");

        fs::create_dir_all(src.join("subdir"))?;
        fs::write(src.join("file1.txt"), b"12345")?;
        fs::write(src.join("subdir/file2.txt"), b"1234567")?;

        let stats = copy_dir_recursive(&src, &dst)?;

        assert_eq!(stats.files, 2);
        assert_eq!(stats.dirs, 2);
        assert_eq!(stats.bytes, 12);
        assert_eq!(fs::read(dst.join("file1.txt"))?, b"12345");
        assert_eq!(fs::read(dst.join("subdir/file2.txt"))?, b"1234567");
        Ok(())
    }

    #[test]
    fn test_copy_merges_into_existing_destination() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");

        fs::create_dir_all(&src)?;
        fs::create_dir_all(&dst)?;
        fs::write(src.join("shared.txt"), b"from source")?;
        fs::write(dst.join("shared.txt"), b"stale")?;
        fs::write(dst.join("extra.txt"), b"untouched")?;

        copy_dir_recursive(&src, &dst)?;

        assert_eq!(fs::read(dst.join("shared.txt"))?, b"from source");
        assert_eq!(fs::read(dst.join("extra.txt"))?, b"untouched");
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinks_are_recreated() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");

        fs::create_dir_all(&src)?;
        fs::write(src.join("real.txt"), b"data")?;
        std::os::unix::fs::symlink("real.txt", src.join("link.txt"))?;

        let stats = copy_dir_recursive(&src, &dst)?;

        assert_eq!(stats.symlinks, 1);
        assert_eq!(fs::read_link(dst.join("link.txt"))?, PathBuf::from("real.txt"));
        assert_eq!(fs::read(dst.join("link.txt"))?, b"data");
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_fifo_is_rejected_without_blocking() -> std::io::Result<()> {
        use std::sync::mpsc;
        use std::time::Duration;

        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("src");
        fs::create_dir_all(&src)?;
        fs::write(src.join("a.txt"), b"data")?;
        let status = std::process::Command::new("mkfifo").arg(src.join("pipe")).status()?;
        assert!(status.success());

        let dst = temp_dir.path().join("dst");
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(copy_dir_recursive(&src, &dst));
        });

        let result = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("copy blocked on a FIFO");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_socket_is_rejected() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("src");
        fs::create_dir_all(&src)?;
        let _listener = std::os::unix::net::UnixListener::bind(src.join("app.sock"))?;

        let err = copy_dir_recursive(&src, &temp_dir.path().join("dst")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
        Ok(())
    }

    #[test]
    fn test_remove_path() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path().join("tree");
        fs::create_dir_all(dir.join("nested"))?;
        fs::write(dir.join("nested/file"), b"x")?;
        let file = temp_dir.path().join("single");
        fs::write(&file, b"y")?;

        remove_path(&dir)?;
        remove_path(&file)?;
        remove_path(&temp_dir.path().join("missing"))?;

        assert!(!dir.exists());
        assert!(!file.exists());
        Ok(())
    }
}
