//! RESTORE.sh generation.
//!
//! The script locates itself at run time and restores into its parent
//! directory, so a checkpoint keeps working after it has been moved.

use crate::config::{Config, RESTORE_SCRIPT_NAME};
use std::path::{Path, PathBuf};

/// Script template. Placeholders are substituted with shell-quoted words.
pub const RESTORE_TEMPLATE: &str = r#"#!/bin/bash
# Restore from {{PROJECT_NAME}} Project Checkpoint
# Usage: ./RESTORE.sh

set -e

SCRIPT_DIR="$(cd "$(dirname "${BASH_SOURCE[0]}")" && pwd)"
BACKUP_DIR="${SCRIPT_DIR}"
PARENT_DIR="$(dirname "${BACKUP_DIR}")"

echo "========================================="
echo "  Restoring from Checkpoint"
echo "========================================="
echo "Backup Directory: ${BACKUP_DIR}"
echo "Target Directory: ${PARENT_DIR}"
echo ""
echo "WARNING: This will overwrite current files!"
read -p "Are you sure you want to restore? (yes/no): " confirm

if [ "$confirm" != "yes" ]; then
    echo "Restore cancelled."
    exit 1
fi

echo ""
echo "Restoring files..."

# Restore directories
for dir in {{DIRECTORIES}}; do
    if [ -d "${BACKUP_DIR}/$dir" ]; then
        echo "  Restoring $dir/..."
        rm -rf "${PARENT_DIR:?}/$dir"
        cp -Rp "${BACKUP_DIR}/$dir" "${PARENT_DIR}/"
        echo "  ✓ Restored $dir/"
    fi
done

# Restore files
for file in {{FILES}}; do
    if [ -f "${BACKUP_DIR}/$file" ]; then
        echo "  Restoring $file..."
        cp -fp "${BACKUP_DIR}/$file" "${PARENT_DIR}/"
        echo "  ✓ Restored $file"
    fi
done

echo ""
echo "========================================="
echo "  Restore Complete!"
echo "========================================="
echo "All files have been restored from checkpoint."
echo "You may need to rebuild the frontend: "{{REBUILD_COMMAND}}
"#;

/// Render the restore script for the configured Backup Set
pub fn render_restore_script(config: &Config) -> String {
    let directories = join_quoted(config.backup.dir_names());
    let files = join_quoted(config.backup.file_names());
    let project_name = config.project.name.replace(['\n', '\r'], " ");

    RESTORE_TEMPLATE
        .replace("{{PROJECT_NAME}}", &project_name)
        .replace("{{DIRECTORIES}}", &directories)
        .replace("{{FILES}}", &files)
        .replace("{{REBUILD_COMMAND}}", &shell_quote(&config.project.rebuild_command))
}

/// Write the script into `backup_dir` with mode 0755
pub fn write_restore_script(backup_dir: &Path, contents: &str) -> std::io::Result<PathBuf> {
    let path = backup_dir.join(RESTORE_SCRIPT_NAME);
    std::fs::write(&path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    }

    Ok(path)
}

/// Quote a word for POSIX shells
pub fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

fn join_quoted<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words.map(shell_quote).collect::<Vec<_>>().join(" ")
}
