//! GitHub Actions Workflow Generator
//!
//! Schema types for a workflow document and the emitter that writes them out.
//!
//! # Example
//!
//! ```
//! use xrepo_github::emitter::Emitter;
//! use xrepo_github::workflow::{GitHubActionsEmitter, Job, RunsOn, Step, Workflow, WorkflowTriggers};
//!
//! let mut workflow = Workflow {
//!     name: "Feature X".to_string(),
//!     on: WorkflowTriggers::push_to("feature-x"),
//!     env: Default::default(),
//!     jobs: Default::default(),
//! };
//! let mut job = Job::new(RunsOn::Label("ubuntu-latest".to_string()));
//! job.steps.push(Step::run("mvn -B install"));
//! workflow.jobs.insert("core-build".to_string(), job);
//!
//! let yaml = GitHubActionsEmitter::new().emit(&workflow).unwrap();
//! assert!(yaml.contains("core-build:"));
//! ```

pub mod emitter;
pub mod schema;

pub use emitter::{GitHubActionsEmitter, sanitize_name};
pub use schema::*;
