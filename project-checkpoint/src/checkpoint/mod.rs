//! Checkpoint runner - copies the Backup Set into a timestamped directory.
//!
//! One run is a straight pipeline:
//! - create `<prefix><id>/` under the project root
//! - copy every configured item that exists
//! - write RESTORE.sh and MANIFEST.txt
//! - commit the working tree if it is under version control
//!
//! Only failing to create the directory aborts the run. Everything after
//! that is reported and recorded on the returned [`Checkpoint`].

pub mod manifest;

use crate::config::{BackupItem, Config, ItemKind, MANIFEST_NAME, RESTORE_SCRIPT_NAME};
use crate::fs::{copy_dir_recursive, copy_with_metadata, remove_path};
use crate::restore::{render_restore_script, write_restore_script};
use crate::utils::errors::{CheckpointError, Result};
use crate::vcs::{vcs_checkpoint, Git, VcsOutcome, VersionControl};
use chrono::{Local, NaiveDateTime, Timelike};
use manifest::{parse_backed_up, Manifest};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Second-resolution identity of a checkpoint, `YYYYMMDD_HHMMSS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CheckpointId(NaiveDateTime);

impl CheckpointId {
    pub const FORMAT: &'static str = "%Y%m%d_%H%M%S";

    /// Current local time
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self(datetime.with_nanosecond(0).unwrap_or(datetime))
    }

    pub fn parse(s: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(s, Self::FORMAT)
            .map(Self)
            .map_err(|e| CheckpointError::NotACheckpoint(format!("{s}: {e}")))
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// Directory name for this id under the given prefix
    pub fn dir_name(&self, prefix: &str) -> String {
        format!("{prefix}{self}")
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

/// A Backup Set item that exists but could not be copied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub name: String,
    pub reason: String,
}

/// Result of one checkpoint run
#[derive(Debug)]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub backup_dir: PathBuf,
    /// Items copied, in Backup Set order
    pub backed_up: Vec<String>,
    /// Items absent from the project
    pub skipped: Vec<String>,
    pub failures: Vec<ItemFailure>,
    /// None if RESTORE.sh could not be written
    pub restore_script: Option<PathBuf>,
    /// None if MANIFEST.txt could not be written
    pub manifest: Option<PathBuf>,
    pub vcs: VcsOutcome,
}

impl Checkpoint {
    /// Both generated files were written
    pub fn is_restorable(&self) -> bool {
        self.restore_script.is_some() && self.manifest.is_some()
    }
}

enum ItemOutcome {
    Copied,
    Missing,
}

/// Creates checkpoints of one project
pub struct CheckpointRunner<V: VersionControl = Git> {
    config: Config,
    project_root: PathBuf,
    vcs: V,
}

impl CheckpointRunner<Git> {
    pub fn new(config: Config, project_root: impl Into<PathBuf>) -> Self {
        Self::with_vcs(config, project_root, Git::new())
    }
}

impl<V: VersionControl> CheckpointRunner<V> {
    pub fn with_vcs(config: Config, project_root: impl Into<PathBuf>, vcs: V) -> Self {
        Self {
            config,
            project_root: project_root.into(),
            vcs,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Checkpoint directory for a given id
    pub fn backup_dir_for(&self, id: CheckpointId) -> PathBuf {
        self.project_root.join(id.dir_name(&self.config.project.backup_prefix))
    }

    /// Create a checkpoint stamped with the current time
    pub fn create_checkpoint(&self) -> Result<Checkpoint> {
        self.create_checkpoint_at(CheckpointId::now())
    }

    /// Create a checkpoint with an explicit id.
    ///
    /// Re-using an id merges into the existing directory.
    pub fn create_checkpoint_at(&self, id: CheckpointId) -> Result<Checkpoint> {
        let backup_dir = self.backup_dir_for(id);

        info!("Creating {} project checkpoint {}", self.config.project.name, id);
        info!("Backup directory: {}", backup_dir.display());

        create_backup_dir(&backup_dir)?;

        let item_count = self.config.backup.items.len();
        info!("[1/4] Backing up {} configured items...", item_count);
        let mut backed_up = Vec::new();
        let mut skipped = Vec::new();
        let mut failures = Vec::new();

        for item in &self.config.backup.items {
            match self.backup_item(item, &backup_dir) {
                Ok(ItemOutcome::Copied) => {
                    info!("  ✓ Backed up {}", item.name);
                    backed_up.push(item.name.clone());
                }
                Ok(ItemOutcome::Missing) => {
                    debug!("  - Skipped {} (not present)", item.name);
                    skipped.push(item.name.clone());
                }
                Err(e) => {
                    warn!("  ✗ Failed to backup {}: {}", item.name, e);
                    let partial = backup_dir.join(&item.name);
                    if let Err(cleanup) = remove_path(&partial) {
                        warn!("    could not remove partial copy {}: {}", partial.display(), cleanup);
                    }
                    failures.push(ItemFailure {
                        name: item.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!("[2/4] Creating restore script...");
        let script = render_restore_script(&self.config);
        let restore_script = match write_restore_script(&backup_dir, &script) {
            Ok(path) => {
                info!("  ✓ Created {}", RESTORE_SCRIPT_NAME);
                Some(path)
            }
            Err(e) => {
                error!("  ✗ Failed to create {}: {}", RESTORE_SCRIPT_NAME, e);
                None
            }
        };

        info!("[3/4] Creating backup manifest...");
        let manifest = Manifest::new(
            &self.config,
            Local::now().naive_local(),
            id.to_string(),
            &backup_dir,
            backed_up.clone(),
        );
        let manifest_path = backup_dir.join(MANIFEST_NAME);
        let manifest = match std::fs::write(&manifest_path, manifest.to_string()) {
            Ok(()) => {
                info!("  ✓ Created {}", MANIFEST_NAME);
                Some(manifest_path)
            }
            Err(e) => {
                error!("  ✗ Failed to create {}: {}", MANIFEST_NAME, e);
                None
            }
        };

        info!("[4/4] Attempting version-control checkpoint...");
        let vcs = if self.config.vcs.enabled {
            let message = format!("{} ({})", self.config.project.commit_message, id);
            vcs_checkpoint(&self.vcs, &self.project_root, &message)
        } else {
            VcsOutcome::Disabled
        };
        match &vcs {
            VcsOutcome::Committed => info!("  ✓ {}", vcs),
            VcsOutcome::CommitFailed(_) => warn!("  ✗ {}", vcs),
            _ => info!("  ℹ {}", vcs),
        }

        Ok(Checkpoint {
            id,
            backup_dir,
            backed_up,
            skipped,
            failures,
            restore_script,
            manifest,
            vcs,
        })
    }

    fn backup_item(&self, item: &BackupItem, backup_dir: &Path) -> Result<ItemOutcome> {
        let source = self.project_root.join(&item.name);
        let metadata = match std::fs::metadata(&source) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ItemOutcome::Missing),
            Err(e) => return Err(e.into()),
        };
        let dest = backup_dir.join(&item.name);

        match item.kind {
            ItemKind::Dir if metadata.is_dir() => {
                let stats = copy_dir_recursive(&source, &dest)?;
                debug!("    {} files, {} bytes", stats.files, stats.bytes);
            }
            ItemKind::File if metadata.is_file() => {
                copy_with_metadata(&source, &dest)?;
            }
            ItemKind::Dir => {
                return Err(CheckpointError::InvalidItem {
                    name: item.name.clone(),
                    reason: "configured as a directory but is not one".to_string(),
                });
            }
            ItemKind::File => {
                return Err(CheckpointError::InvalidItem {
                    name: item.name.clone(),
                    reason: "configured as a file but is not a regular file".to_string(),
                });
            }
        }

        Ok(ItemOutcome::Copied)
    }
}

fn create_backup_dir(path: &Path) -> Result<()> {
    match std::fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => {
            info!("Backup directory already exists, merging into it");
            Ok(())
        }
        Err(source) => Err(CheckpointError::BackupDirectory {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// An existing checkpoint found on disk
#[derive(Debug, Clone, Serialize)]
pub struct CheckpointSummary {
    pub id: String,
    pub created: NaiveDateTime,
    pub path: PathBuf,
    /// Items from MANIFEST.txt; None when the manifest is missing
    pub items: Option<Vec<String>>,
    pub restorable: bool,
}

/// Checkpoints under `project_root`, newest first
pub fn list_checkpoints(project_root: &Path, prefix: &str) -> Result<Vec<CheckpointSummary>> {
    let mut found: Vec<(CheckpointId, CheckpointSummary)> = Vec::new();

    for entry in std::fs::read_dir(project_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(suffix) = name.strip_prefix(prefix) else {
            continue;
        };
        let Ok(id) = CheckpointId::parse(suffix) else {
            debug!("Ignoring {}: not a checkpoint id", name);
            continue;
        };

        let path = entry.path();
        let items = std::fs::read_to_string(path.join(MANIFEST_NAME))
            .ok()
            .map(|text| parse_backed_up(&text));
        let restorable = path.join(RESTORE_SCRIPT_NAME).is_file();

        found.push((
            id,
            CheckpointSummary {
                id: id.to_string(),
                created: id.datetime(),
                path,
                items,
                restorable,
            },
        ));
    }

    found.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(found.into_iter().map(|(_, summary)| summary).collect())
}
