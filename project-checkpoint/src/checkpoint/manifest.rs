//! MANIFEST.txt: the human-readable record of one checkpoint.
//!
//! Everything except the "Files Backed Up" section is static text. That
//! section is the only part read back (by `list`).

use crate::config::{Config, RESTORE_SCRIPT_NAME};
use chrono::NaiveDateTime;
use std::fmt;
use std::path::{Path, PathBuf};

const BACKED_UP_HEADING: &str = "Files Backed Up:";

/// Contents of a checkpoint manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    pub project_name: String,
    pub created: NaiveDateTime,
    pub checkpoint_id: String,
    pub backup_dir: PathBuf,
    /// Items actually copied, in Backup Set order
    pub backed_up: Vec<String>,
    pub planned_upgrades: Vec<String>,
    pub rebuild_command: String,
}

impl Manifest {
    pub fn new(
        config: &Config,
        created: NaiveDateTime,
        checkpoint_id: String,
        backup_dir: &Path,
        backed_up: Vec<String>,
    ) -> Self {
        Self {
            project_name: config.project.name.clone(),
            created,
            checkpoint_id,
            backup_dir: backup_dir.to_path_buf(),
            backed_up,
            planned_upgrades: config.project.planned_upgrades.clone(),
            rebuild_command: config.project.rebuild_command.clone(),
        }
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!("{} Project Checkpoint", self.project_name);
        let dir = self.backup_dir.display();

        writeln!(f, "{title}")?;
        writeln!(f, "{}", "=".repeat(title.chars().count()))?;
        writeln!(f, "Created: {}", self.created.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Timestamp: {}", self.checkpoint_id)?;
        writeln!(f, "Backup Directory: {dir}")?;
        writeln!(f)?;

        writeln!(f, "{BACKED_UP_HEADING}")?;
        for item in &self.backed_up {
            writeln!(f, "- {item}")?;
        }
        writeln!(f)?;

        writeln!(f, "Purpose:")?;
        writeln!(
            f,
            "This checkpoint was created before applying major upgrades and improvements to {}.",
            self.project_name
        )?;
        writeln!(f, "If upgrades cause issues, use {RESTORE_SCRIPT_NAME} to revert all changes.")?;
        writeln!(f)?;

        writeln!(f, "To Restore:")?;
        writeln!(f, "1. cd to the backup directory: {dir}")?;
        writeln!(f, "2. Run: ./{RESTORE_SCRIPT_NAME}")?;
        writeln!(f, "3. Follow the prompts")?;
        writeln!(f)?;

        if !self.planned_upgrades.is_empty() {
            writeln!(f, "Upgrades Planned:")?;
            for upgrade in &self.planned_upgrades {
                writeln!(f, "- {upgrade}")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Note: Runtime data and build artifacts are NOT backed up.")?;
        writeln!(f, "After restore, rebuild the frontend with: {}", self.rebuild_command)
    }
}

/// Read the "Files Backed Up" list back out of a rendered manifest
pub fn parse_backed_up(text: &str) -> Vec<String> {
    text.lines()
        .skip_while(|line| line.trim_end() != BACKED_UP_HEADING)
        .skip(1)
        .map_while(|line| line.strip_prefix("- "))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(backed_up: &[&str]) -> Manifest {
        let created = NaiveDate::from_ymd_opt(2026, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap();
        Manifest::new(
            &Config::default(),
            created,
            "20260304_050607".to_string(),
            Path::new("/srv/app/backup_checkpoint_20260304_050607"),
            backed_up.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_render_contains_record() {
        let text = sample(&["components", "README.md"]).to_string();

        assert!(text.starts_with("StackWatch Project Checkpoint\n=============================\n"));
        assert!(text.contains("Created: 2026-03-04 05:06:07\n"));
        assert!(text.contains("Timestamp: 20260304_050607\n"));
        assert!(text.contains("Backup Directory: /srv/app/backup_checkpoint_20260304_050607\n"));
        assert!(text.contains("Files Backed Up:\n- components\n- README.md\n\n"));
        assert!(text.contains("1. cd to the backup directory: /srv/app/backup_checkpoint_20260304_050607\n"));
        assert!(text.contains("2. Run: ./RESTORE.sh\n"));
        assert!(text.contains("- Health API endpoint implementation\n"));
        assert!(text.ends_with("After restore, rebuild the frontend with: npm run build\n"));
    }

    #[test]
    fn test_parse_backed_up_matches_render() {
        let text = sample(&["components", "docs", "README.md"]).to_string();
        assert_eq!(parse_backed_up(&text), vec!["components", "docs", "README.md"]);
    }

    #[test]
    fn test_parse_empty_list() {
        let text = sample(&[]).to_string();
        assert!(parse_backed_up(&text).is_empty());
        assert!(parse_backed_up("no heading here").is_empty());
    }
}
