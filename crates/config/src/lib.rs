//! Configuration documents for xrepo.
//!
//! Three documents drive a workflow compile:
//!
//! - the workflow trigger ([`TriggerConfig`]): the components to build, where
//!   they live and which component versions feed into which build property
//! - the repository config ([`RepoConfig`]): env, runner and toolchain defaults,
//!   issue reporting policy and an optional trailing job
//! - per-component job templates ([`ComponentJobsConfig`]): replace the default
//!   single build job of a component with a set of ordered jobs
//!
//! All parsers work in a single pass over the YAML document. A name can only
//! be referenced after its own entry has been parsed, which keeps every
//! dependency graph acyclic without a separate validation step.

pub mod component;
pub mod env;
pub mod error;
mod fields;
pub mod repo;
pub mod trigger;

pub use component::{
    ComponentEndJobConfig, ComponentJobConfig, ComponentJobsConfig, MAVEN_COMMAND_PREFIX,
    RunElement,
};
pub use env::{Env, merge_env, overridden_keys};
pub use error::{Error, Result};
pub use repo::{DEFAULT_RUNS_ON, EndJobTemplate, IssueReporting, RepoConfig, StatusLabels};
pub use trigger::{Component, DEFAULT_MAVEN_OPTS, Dependency, TriggerConfig};
