//! Workflow Emitter Trait
//!
//! Defines the interface for turning an assembled [`Workflow`] into the text
//! a CI platform reads. Emitters never reorder jobs: the output follows the
//! insertion order of [`Workflow::jobs`].

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use crate::workflow::Workflow;
use miette::Diagnostic;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for emitter operations
#[derive(Debug, Error, Diagnostic)]
pub enum EmitterError {
    /// YAML/JSON serialization failed
    #[error("Serialization failed: {0}")]
    #[diagnostic(code(xrepo::emitter::serialization))]
    Serialization(String),

    /// Writing the generated document failed
    #[error("Failed to write {}", path.display())]
    #[diagnostic(
        code(xrepo::emitter::io),
        help("Check that the output directory is writable")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The file or directory being written
        path: PathBuf,
    },
}

/// Result type for emitter operations
pub type EmitterResult<T> = std::result::Result<T, EmitterError>;

/// Trait for workflow emitters
///
/// # Example
///
/// ```
/// use xrepo_github::emitter::{Emitter, EmitterResult};
/// use xrepo_github::workflow::Workflow;
///
/// struct NameOnly;
///
/// impl Emitter for NameOnly {
///     fn emit(&self, workflow: &Workflow) -> EmitterResult<String> {
///         Ok(format!("# {}\n", workflow.name))
///     }
///
///     fn format_name(&self) -> &'static str {
///         "name-only"
///     }
///
///     fn file_extension(&self) -> &'static str {
///         "txt"
///     }
/// }
/// ```
pub trait Emitter {
    /// Render the workflow as text.
    ///
    /// # Errors
    /// Returns `EmitterError` if the workflow cannot be serialized
    fn emit(&self, workflow: &Workflow) -> EmitterResult<String>;

    /// Get the format identifier for this emitter
    fn format_name(&self) -> &'static str;

    /// Get the file extension for output files (without the dot)
    fn file_extension(&self) -> &'static str;

    /// Emit the workflow and write it to `<dir>/<stem>.<extension>`,
    /// creating `dir` if needed. Returns the written path.
    ///
    /// # Errors
    /// Returns `EmitterError` on serialization or I/O failure
    fn write(&self, workflow: &Workflow, dir: &Path, stem: &str) -> EmitterResult<PathBuf> {
        let content = self.emit(workflow)?;
        fs::create_dir_all(dir).map_err(|source| EmitterError::Io {
            source,
            path: dir.to_path_buf(),
        })?;
        let path = dir.join(format!("{stem}.{}", self.file_extension()));
        fs::write(&path, content).map_err(|source| EmitterError::Io {
            source,
            path: path.clone(),
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::WorkflowTriggers;
    use indexmap::IndexMap;
    use tempfile::TempDir;

    struct TestEmitter;

    impl Emitter for TestEmitter {
        fn emit(&self, workflow: &Workflow) -> EmitterResult<String> {
            Ok(format!("# {} ({} jobs)", workflow.name, workflow.jobs.len()))
        }

        fn format_name(&self) -> &'static str {
            "test"
        }

        fn file_extension(&self) -> &'static str {
            "txt"
        }
    }

    fn workflow() -> Workflow {
        Workflow {
            name: "test".to_string(),
            on: WorkflowTriggers::push_to("main"),
            env: IndexMap::new(),
            jobs: IndexMap::new(),
        }
    }

    #[test]
    fn test_emitter_trait() {
        let emitter = TestEmitter;
        assert_eq!(emitter.format_name(), "test");
        assert_eq!(emitter.file_extension(), "txt");
        assert_eq!(emitter.emit(&workflow()).unwrap(), "# test (0 jobs)");
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join(".github/workflows");
        let path = TestEmitter.write(&workflow(), &target, "ci-42").unwrap();
        assert_eq!(path, target.join("ci-42.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "# test (0 jobs)");
    }

    #[test]
    fn test_write_reports_path_on_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let err = TestEmitter
            .write(&workflow(), &blocker.join("sub"), "ci-1")
            .unwrap_err();
        assert!(matches!(err, EmitterError::Io { .. }));
    }
}
