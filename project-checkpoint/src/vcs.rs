//! Best-effort version-control checkpoint.
//!
//! Nothing in here fails a checkpoint: every problem ends up as a
//! [`VcsOutcome`] that the runner reports and moves past.

use crate::utils::errors::{CheckpointError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The three operations the checkpoint needs from a version-control tool
pub trait VersionControl {
    /// Whether `root` is the top of a working tree
    fn is_repository(&self, root: &Path) -> bool;

    /// Whether the working tree has uncommitted changes
    fn status(&self, root: &Path) -> Result<bool>;

    /// Stage every change, including untracked files
    fn stage_all(&self, root: &Path) -> Result<()>;

    fn commit(&self, root: &Path, message: &str) -> Result<()>;
}

/// Git through the `git` executable on `PATH`
#[derive(Debug, Clone)]
pub struct Git {
    program: PathBuf,
}

impl Git {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }

    /// Use a specific git executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, root: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(root)
            .output()
            .map_err(|e| {
                CheckpointError::Vcs(format!("failed to run {}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CheckpointError::Vcs(format!(
                "git {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for Git {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionControl for Git {
    fn is_repository(&self, root: &Path) -> bool {
        // `.git` is a file in worktrees and submodules
        root.join(".git").exists()
    }

    fn status(&self, root: &Path) -> Result<bool> {
        let stdout = self.run(root, &["status", "--porcelain"])?;
        Ok(!stdout.trim().is_empty())
    }

    fn stage_all(&self, root: &Path) -> Result<()> {
        self.run(root, &["add", "-A"]).map(|_| ())
    }

    fn commit(&self, root: &Path, message: &str) -> Result<()> {
        self.run(root, &["commit", "-m", message]).map(|_| ())
    }
}

/// What the version-control step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsOutcome {
    /// Turned off by configuration
    Disabled,
    NotARepository,
    /// Nothing to commit
    Clean,
    Committed,
    /// Staging or committing failed
    CommitFailed(String),
    /// The status query itself failed
    Unavailable(String),
}

impl fmt::Display for VcsOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsOutcome::Disabled => write!(f, "version-control checkpoint disabled"),
            VcsOutcome::NotARepository => write!(f, "not a version-controlled project"),
            VcsOutcome::Clean => write!(f, "no changes to commit (already up to date)"),
            VcsOutcome::Committed => write!(f, "checkpoint commit created"),
            VcsOutcome::CommitFailed(reason) => write!(f, "checkpoint commit failed: {}", reason),
            VcsOutcome::Unavailable(reason) => write!(f, "version control not available: {}", reason),
        }
    }
}

/// Commit the working tree at `root` if it has changes
pub fn vcs_checkpoint<V: VersionControl + ?Sized>(vcs: &V, root: &Path, message: &str) -> VcsOutcome {
    if !vcs.is_repository(root) {
        return VcsOutcome::NotARepository;
    }

    match vcs.status(root) {
        Err(e) => VcsOutcome::Unavailable(e.to_string()),
        Ok(false) => VcsOutcome::Clean,
        Ok(true) => {
            if let Err(e) = vcs.stage_all(root) {
                return VcsOutcome::CommitFailed(e.to_string());
            }
            match vcs.commit(root, message) {
                Ok(()) => VcsOutcome::Committed,
                Err(e) => VcsOutcome::CommitFailed(e.to_string()),
            }
        }
    }
}
