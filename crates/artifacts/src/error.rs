//! Error types for the artifacts crate

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for artifact operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error during copy, split or merge
    #[error("I/O {operation} failed: {}", path.display())]
    #[diagnostic(
        code(xrepo::artifacts::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error
        path: PathBuf,
        /// Operation that failed (e.g., "read", "copy", "remove_dir_all")
        operation: String,
    },

    /// A file needs more parts than the chunk naming scheme can address
    #[error(
        "{} is too large to split: {size} bytes needs {parts} parts, at most {max_parts} are supported",
        path.display()
    )]
    #[diagnostic(
        code(xrepo::artifacts::capacity),
        help("Raise the chunk threshold or keep the file out of the backed up tree")
    )]
    Capacity {
        /// The oversized file
        path: PathBuf,
        /// Its size in bytes
        size: u64,
        /// Number of parts it would need
        parts: u64,
        /// The part limit
        max_parts: usize,
    },

    /// A split directory lacks a part that later parts depend on
    #[error("Part xx.{missing:02} is missing from {}, but xx.{found:02} exists", dir.display())]
    #[diagnostic(
        code(xrepo::artifacts::missing_part),
        help("Restore the missing part; merging now would produce a truncated file")
    )]
    MissingPart {
        /// The split directory
        dir: PathBuf,
        /// Index of the first missing part
        missing: u64,
        /// Index of a part found after the gap
        found: u64,
    },

    /// A `pom.xml` could not be parsed
    #[error("Failed to parse project manifest {}", path.display())]
    #[diagnostic(code(xrepo::artifacts::manifest_xml))]
    ManifestXml {
        /// The manifest path
        path: PathBuf,
        /// The underlying XML error
        #[source]
        source: roxmltree::Error,
    },

    /// A `pom.xml` lacks a coordinate
    #[error("Project manifest {} has no {element}, neither directly nor in <parent>", path.display())]
    #[diagnostic(code(xrepo::artifacts::manifest))]
    Manifest {
        /// The manifest path
        path: PathBuf,
        /// The missing element name
        element: &'static str,
    },

    /// A required input path is missing or has the wrong kind
    #[error("{message}: {}", path.display())]
    #[diagnostic(code(xrepo::artifacts::invalid_path))]
    InvalidPath {
        /// What was expected
        message: &'static str,
        /// The offending path
        path: PathBuf,
    },
}

impl Error {
    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: path.as_ref().to_path_buf(),
            operation: operation.into(),
        }
    }

    /// Create an invalid path error
    #[must_use]
    pub fn invalid_path(message: &'static str, path: impl AsRef<Path>) -> Self {
        Self::InvalidPath {
            message,
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Result type for artifact operations
pub type Result<T> = std::result::Result<T, Error>;
