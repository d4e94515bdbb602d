//! create-checkpoint - Main entry point
//!
//! Backs up the project before an upgrade and prints how to roll back.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use project_checkpoint::checkpoint::list_checkpoints;
use project_checkpoint::config::RESTORE_SCRIPT_NAME;
use project_checkpoint::{utils, Checkpoint, CheckpointRunner, Config};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Project root (defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    project_root: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Skip the version-control commit
    #[arg(long)]
    no_vcs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List existing checkpoints, newest first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)
            .with_context(|| format!("loading {}", config_path.display()))?
    } else {
        Config::default()
    };
    if args.no_vcs {
        config.vcs.enabled = false;
    }

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    let project_root = match args.project_root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let project_root = project_root
        .canonicalize()
        .with_context(|| format!("project root {}", project_root.display()))?;

    tracing::debug!(
        "create-checkpoint v{} in {}",
        env!("CARGO_PKG_VERSION"),
        project_root.display()
    );

    match args.command {
        Some(Command::List { json }) => list(&project_root, &config, json),
        None => {
            let runner = CheckpointRunner::new(config, project_root);
            let checkpoint = runner.create_checkpoint()?;
            report(&checkpoint);
            if !checkpoint.is_restorable() {
                bail!("checkpoint {} is incomplete", checkpoint.backup_dir.display());
            }
            Ok(())
        }
    }
}

fn report(checkpoint: &Checkpoint) {
    let rule = "=".repeat(50);
    let dir = checkpoint.backup_dir.display();

    println!();
    println!("{rule}");
    if checkpoint.is_restorable() {
        println!("  Checkpoint Created Successfully!");
    } else {
        println!("  Checkpoint Created With Errors");
    }
    println!("{rule}");
    println!("Backup Location: {dir}");
    println!("Items backed up: {}", checkpoint.backed_up.len());
    for failure in &checkpoint.failures {
        println!("  not backed up: {} ({})", failure.name, failure.reason);
    }
    println!();
    println!("To restore from this checkpoint:");
    println!("  cd {dir}");
    println!("  ./{RESTORE_SCRIPT_NAME}");
    println!();
    println!("You can now proceed with major upgrades and improvements.");
    println!("If anything breaks, use the restore script to revert.");
}

fn list(project_root: &std::path::Path, config: &Config, json: bool) -> Result<()> {
    let checkpoints = list_checkpoints(project_root, &config.project.backup_prefix)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&checkpoints)?);
        return Ok(());
    }

    if checkpoints.is_empty() {
        println!("No checkpoints in {}", project_root.display());
        return Ok(());
    }

    for checkpoint in &checkpoints {
        let items = match &checkpoint.items {
            Some(items) => format!("{} items", items.len()),
            None => "no manifest".to_string(),
        };
        let restore = if checkpoint.restorable { "" } else { " (no restore script)" };
        println!(
            "{}  {}  {}{}",
            checkpoint.id,
            checkpoint.created.format("%Y-%m-%d %H:%M:%S"),
            items,
            restore
        );
    }
    Ok(())
}
