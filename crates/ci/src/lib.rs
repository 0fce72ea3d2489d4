//! Job graph compiler for multi-repository builds.
//!
//! [`WorkflowCompiler`] takes a parsed trigger document, the repository
//! config and a [`TemplateSource`] for per-component job templates, and
//! produces a [`Workflow`](xrepo_github::workflow::Workflow) whose jobs are
//! in dependency order.
//!
//! ```
//! use xrepo_ci::{CompilerOptions, InMemoryTemplates, WorkflowCompiler};
//! use xrepo_config::{RepoConfig, TriggerConfig};
//!
//! let trigger = TriggerConfig::from_yaml(
//!     "name: Feature X\ncomponents:\n  - name: core\n    org: acme\n    branch: main\n",
//! )?;
//! let repo = RepoConfig::default();
//! let templates = InMemoryTemplates::new();
//! let workflow =
//!     WorkflowCompiler::new(&trigger, &repo, &templates, CompilerOptions::new("feature-x", 42))
//!         .compile()?;
//! assert!(workflow.jobs.contains_key("core-build"));
//! # Ok::<(), xrepo_ci::Error>(())
//! ```

pub mod compiler;
pub mod error;
pub mod graph;
pub mod templates;

pub use compiler::{
    CANCEL_JOB, CLEANUP_JOB, CompilerOptions, DEFAULT_JAVA_VERSION, DEFAULT_TOOL_COMMAND, END_JOB,
    REPORT_FAILURE_JOB, REPORT_SUCCESS_JOB, STATUS_READ_JOB, WorkflowCompiler,
};
pub use error::{Error, Result};
pub use graph::JobGraph;
pub use templates::{
    DEFAULT_TEMPLATE_DIR, DirectoryTemplates, InMemoryTemplates, Template, TemplateSource,
};
