//! Command implementations.
//!
//! Each command returns a one-line summary for the caller to print.

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use crate::cli::{Commands, GenerateWorkflowArgs};
use miette::Diagnostic;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use xrepo_artifacts::ChunkCodec;
use xrepo_ci::{CompilerOptions, DirectoryTemplates, WorkflowCompiler};
use xrepo_config::{RepoConfig, TriggerConfig};
use xrepo_github::{Emitter, EmitterError, GitHubActionsEmitter};

/// Errors surfaced by the CLI
#[derive(Error, Debug, Diagnostic)]
pub enum CommandError {
    /// A configuration document was rejected
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] xrepo_config::Error),

    /// The workflow could not be compiled
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] xrepo_ci::Error),

    /// The workflow could not be written
    #[error(transparent)]
    #[diagnostic(transparent)]
    Emit(#[from] EmitterError),

    /// An artifact operation failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Artifacts(#[from] xrepo_artifacts::Error),
}

/// Result type for commands
pub type Result<T> = std::result::Result<T, CommandError>;

/// Run a parsed command
///
/// # Errors
///
/// Returns the first error of the underlying operation.
pub fn run(command: Commands) -> Result<String> {
    match command {
        Commands::GenerateWorkflow(args) => {
            let path = generate_workflow(&args)?;
            Ok(format!("Wrote {}", path.display()))
        }
        Commands::BackupMavenArtifacts {
            root_pom,
            maven_repo,
            backup_dir,
        } => {
            let report =
                xrepo_artifacts::backup(&root_pom, &maven_repo, &backup_dir, ChunkCodec::default())?;
            Ok(format!(
                "Backed up {} projects to {} ({} not installed)",
                report.copied.len(),
                backup_dir.display(),
                report.skipped.len()
            ))
        }
        Commands::OverlayBackedUpMavenArtifacts {
            maven_repo,
            backups_root,
        } => {
            ensure_dir(&maven_repo)?;
            let applied =
                xrepo_artifacts::overlay(&maven_repo, &backups_root, ChunkCodec::default())?;
            Ok(format!(
                "Overlaid {} component backups onto {}",
                applied.len(),
                maven_repo.display()
            ))
        }
        Commands::SplitLargeFiles { dir, threshold } => {
            let count = xrepo_artifacts::split_large_files(&dir, ChunkCodec::new(threshold))?;
            Ok(format!("Split {count} files in {}", dir.display()))
        }
        Commands::MergeLargeFiles { dir } => {
            let count = xrepo_artifacts::merge_large_files(&dir, ChunkCodec::default())?;
            Ok(format!("Merged {count} files in {}", dir.display()))
        }
        Commands::CopyLogs { input, output } => {
            let copied = xrepo_artifacts::copy_logs(&input, &output)?;
            Ok(format!("Copied {} log files to {}", copied.len(), output.display()))
        }
    }
}

/// Compile the workflow and write it to `<workflow-dir>/ci-<issue>.yml`
///
/// # Errors
///
/// Returns configuration, compile and write errors.
pub fn generate_workflow(args: &GenerateWorkflowArgs) -> Result<PathBuf> {
    let trigger = TriggerConfig::load(&args.yaml)?;
    let repo = RepoConfig::load_or_default(&args.repo_config)?;
    let templates = DirectoryTemplates::new(&args.component_jobs_dir);
    let options = CompilerOptions::new(&args.branch, args.issue)
        .with_tool_command(&args.tool_command);

    let workflow = WorkflowCompiler::new(&trigger, &repo, &templates, options).compile()?;
    let path = GitHubActionsEmitter::new().write(
        &workflow,
        &args.workflow_dir,
        &format!("ci-{}", args.issue),
    )?;
    info!(path = %path.display(), jobs = workflow.jobs.len(), "Workflow written");
    Ok(path)
}

/// A fresh runner without a cache hit has no local repository yet
fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| xrepo_artifacts::Error::io(e, dir, "create directory"))?;
    Ok(())
}
