//! Command-line interface definition.

use crate::tracing::{LogLevel, TracingFormat};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use xrepo_artifacts::DEFAULT_THRESHOLD;

/// Default location of the repository config
pub const DEFAULT_REPO_CONFIG: &str = ".repo-config/config.yml";

/// Multi-repository CI workflow generator and artifact hand-off tool.
#[derive(Parser, Debug)]
#[command(name = "xrepo")]
#[command(about = "Generate multi-repository CI workflows and move build state between their jobs")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(long, global = true, default_value = "compact", value_enum)]
    pub log_format: TracingFormat,

    /// Filter directive replacing `--level` and `RUST_LOG`, e.g. `xrepo_artifacts=trace`.
    #[arg(long, global = true, env = "XREPO_LOG_FILTER")]
    pub log_filter: Option<String>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a trigger document into a GitHub Actions workflow.
    #[command(name = "generate-workflow")]
    GenerateWorkflow(GenerateWorkflowArgs),

    /// Back up the artifacts a Maven build installed into the local repository.
    #[command(name = "backup-maven-artifacts")]
    BackupMavenArtifacts {
        /// Root pom.xml of the project that was built
        root_pom: PathBuf,
        /// Local Maven repository
        maven_repo: PathBuf,
        /// Backup folder for this component; cleared first
        backup_dir: PathBuf,
    },

    /// Replace local repository entries with every component backup.
    #[command(name = "overlay-backed-up-maven-artifacts")]
    OverlayBackedUpMavenArtifacts {
        /// Local Maven repository
        maven_repo: PathBuf,
        /// Folder holding one backup folder per component
        backups_root: PathBuf,
    },

    /// Split every file above the threshold into parts.
    #[command(name = "split-large-files-in-directory")]
    SplitLargeFiles {
        /// Directory to process recursively
        dir: PathBuf,
        /// Largest file size in bytes kept whole
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: u64,
    },

    /// Reassemble every split file.
    #[command(name = "merge-large-files-in-directory")]
    MergeLargeFiles {
        /// Directory to process recursively
        dir: PathBuf,
    },

    /// Collect build logs and failed test reports.
    #[command(name = "copy-logs")]
    CopyLogs {
        /// Directory searched for logs
        input: PathBuf,
        /// Directory receiving the copies
        output: PathBuf,
    },
}

/// Arguments of `generate-workflow`
#[derive(Args, Debug, Clone)]
pub struct GenerateWorkflowArgs {
    /// Directory the workflow file is written to
    #[arg(long)]
    pub workflow_dir: PathBuf,

    /// Trigger document
    #[arg(long)]
    pub yaml: PathBuf,

    /// Issue that requested the run
    #[arg(long)]
    pub issue: u64,

    /// Branch the workflow runs on
    #[arg(long)]
    pub branch: String,

    /// Repository config; defaults apply if the file is missing
    #[arg(long, default_value = DEFAULT_REPO_CONFIG)]
    pub repo_config: PathBuf,

    /// Directory holding `<component>.yml` job templates
    #[arg(long, default_value = xrepo_ci::DEFAULT_TEMPLATE_DIR)]
    pub component_jobs_dir: PathBuf,

    /// How generated steps invoke this tool
    #[arg(long, default_value = xrepo_ci::DEFAULT_TOOL_COMMAND)]
    pub tool_command: String,
}
