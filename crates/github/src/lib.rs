//! GitHub Actions output for xrepo.
//!
//! This crate provides:
//! - [`workflow`] schema types mirroring the workflow file syntax
//! - the [`Emitter`] trait for turning a workflow into text
//! - [`GitHubActionsEmitter`], which writes block-style YAML with jobs in
//!   insertion order

#![warn(missing_docs)]

pub mod emitter;
pub mod workflow;

// Re-exports for convenience
pub use emitter::{Emitter, EmitterError, EmitterResult};
pub use workflow::GitHubActionsEmitter;
