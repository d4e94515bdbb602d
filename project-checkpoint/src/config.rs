//! Configuration management for the checkpoint tool.
//!
//! The built-in defaults describe the web project this tool was written for.
//! A TOML file may override any section; missing fields fall back to the
//! defaults.

use crate::utils::errors::{CheckpointError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path};

/// Names written into every checkpoint by the tool itself.
pub const RESTORE_SCRIPT_NAME: &str = "RESTORE.sh";
pub const MANIFEST_NAME: &str = "MANIFEST.txt";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub backup: BackupConfig,
    pub log: LogConfig,
    pub vcs: VcsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Display name used in generated text
    pub name: String,

    /// Prefix of the checkpoint directory; the id is appended
    pub backup_prefix: String,

    /// Command the operator should run after a restore
    pub rebuild_command: String,

    /// Informational list written to the manifest
    pub planned_upgrades: Vec<String>,

    /// Commit message; the checkpoint id is appended in parentheses
    pub commit_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Ordered Backup Set, relative to the project root
    pub items: Vec<BackupItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupItem {
    pub name: String,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Dir,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VcsConfig {
    /// Attempt a safety commit after the backup
    pub enabled: bool,
}

const DEFAULT_DIRS: &[&str] = &["components", "scripts", "ansible", "public", "docs", "contexts"];

const DEFAULT_FILES: &[&str] = &[
    "App.tsx",
    "index.tsx",
    "index.html",
    "constants.tsx",
    "types.ts",
    "vite.config.ts",
    "tsconfig.json",
    "package.json",
    "metadata.json",
    "README.md",
];

const DEFAULT_PLANNED_UPGRADES: &[&str] = &[
    "UI improvements (theme toggle bar, live system status)",
    "Help page professional styling",
    "Project rename (StackBill → StackWatch)",
    "Ansible playbook conversion for deployment scripts",
    "Health API endpoint implementation",
];

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "StackWatch".to_string(),
            backup_prefix: "backup_checkpoint_".to_string(),
            rebuild_command: "npm run build".to_string(),
            planned_upgrades: DEFAULT_PLANNED_UPGRADES.iter().map(|s| s.to_string()).collect(),
            commit_message: "Checkpoint: Before major upgrades".to_string(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        let dirs = DEFAULT_DIRS.iter().map(|name| BackupItem::dir(name));
        let files = DEFAULT_FILES.iter().map(|name| BackupItem::file(name));
        Self {
            items: dirs.chain(files).collect(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl BackupItem {
    pub fn dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ItemKind::Dir,
        }
    }

    pub fn file(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ItemKind::File,
        }
    }
}

impl BackupConfig {
    /// Names of directory items, in configured order
    pub fn dir_names(&self) -> impl Iterator<Item = &str> {
        self.items_of(ItemKind::Dir)
    }

    /// Names of file items, in configured order
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.items_of(ItemKind::File)
    }

    fn items_of(&self, kind: ItemKind) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter(move |item| item.kind == kind)
            .map(|item| item.name.as_str())
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject Backup Sets that could escape the project root or clash with
    /// the generated files.
    pub fn validate(&self) -> Result<()> {
        if self.backup.items.is_empty() {
            return Err(CheckpointError::Config("backup.items is empty".to_string()));
        }
        if self.project.backup_prefix.is_empty() || self.project.backup_prefix.contains(['/', '\\']) {
            return Err(CheckpointError::Config(format!(
                "invalid backup_prefix '{}'",
                self.project.backup_prefix
            )));
        }

        let mut seen = HashSet::new();
        for item in &self.backup.items {
            validate_item_name(&item.name)?;
            if !seen.insert(item.name.as_str()) {
                return Err(invalid(&item.name, "listed more than once"));
            }
        }
        Ok(())
    }
}

fn validate_item_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "empty name"));
    }
    if name.contains(['/', '\\', '\n', '\0']) {
        return Err(invalid(name, "must be a single path component"));
    }
    let mut components = Path::new(name).components();
    if !matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) {
        return Err(invalid(name, "must be a single path component"));
    }
    if name == RESTORE_SCRIPT_NAME || name == MANIFEST_NAME {
        return Err(invalid(name, "reserved for generated files"));
    }
    Ok(())
}

fn invalid(name: &str, reason: &str) -> CheckpointError {
    CheckpointError::InvalidItem {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
