//! Error types for workflow compilation

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Error type for workflow compilation.
///
/// Compilation either produces a complete job graph or fails; no partial
/// graph is returned.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A configuration document was rejected
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] xrepo_config::Error),

    /// Two jobs were assigned the same key
    #[error("Job '{name}' is defined more than once")]
    #[diagnostic(
        code(xrepo::ci::duplicate_job),
        help("Component names and job template keys must produce unique job names")
    )]
    DuplicateJob {
        /// The repeated job key
        name: String,
    },

    /// A job waits for a job that has not been added before it
    #[error("Job '{job}' needs '{dependency}', which is not defined before it")]
    #[diagnostic(code(xrepo::ci::missing_dependency))]
    MissingDependency {
        /// The job declaring the edge
        job: String,
        /// The unknown job
        dependency: String,
    },

    /// `mavenOpts` only applies to the default build job
    #[error("Component '{component}' has a job template in {template} and so cannot use 'mavenOpts'")]
    #[diagnostic(
        code(xrepo::ci::maven_opts_with_template),
        help("Move the Maven options into the template's run entries")
    )]
    MavenOptsWithTemplate {
        /// The component
        component: String,
        /// Where the template was found
        template: String,
    },

    /// A user-written step could not be read as a workflow step
    #[error("Step {index} of {context} is not a valid workflow step: {source}")]
    #[diagnostic(code(xrepo::ci::invalid_step))]
    InvalidStep {
        /// Job the step belongs to
        context: String,
        /// Zero-based position in the step list
        index: usize,
        /// The underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },
}

/// Result type for workflow compilation
pub type Result<T> = std::result::Result<T, Error>;
