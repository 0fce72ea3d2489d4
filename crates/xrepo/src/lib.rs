//! xrepo
//!
//! Command-line front end for the multi-repository CI tooling. The binary
//! compiles trigger documents into GitHub Actions workflows and exposes the
//! artifact hand-off operations those workflows call back into.

pub mod cli;
pub mod commands;
pub mod tracing;

pub use commands::{CommandError, generate_workflow, run};
