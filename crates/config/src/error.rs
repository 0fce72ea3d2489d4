//! Error types for configuration parsing

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration parsing.
///
/// Every variant is fatal: a malformed document aborts the whole compile.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The document could not be read from disk
    #[error("Failed to read {}", path.display())]
    #[diagnostic(
        code(xrepo::config::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The document path
        path: PathBuf,
    },

    /// The document is not valid YAML
    #[error("Invalid YAML in {document}: {source}")]
    #[diagnostic(code(xrepo::config::yaml))]
    Yaml {
        /// Human-readable document description (usually the path)
        document: String,
        /// The underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// Keys that the parser does not recognise
    #[error("Unknown entries in {context}: {}", keys.join(", "))]
    #[diagnostic(
        code(xrepo::config::unknown_keys),
        help("Remove or correct the misspelled keys")
    )]
    UnknownKeys {
        /// Where the keys were found
        context: String,
        /// The unrecognised keys, in document order
        keys: Vec<String>,
    },

    /// A required key is absent
    #[error("Missing '{key}' for {context}")]
    #[diagnostic(code(xrepo::config::missing_key))]
    MissingKey {
        /// The missing key
        key: String,
        /// Where the key was expected
        context: String,
    },

    /// A value has the wrong type
    #[error("'{key}' for {context} was not {expected}: {found}")]
    #[diagnostic(code(xrepo::config::invalid_type))]
    InvalidType {
        /// The key holding the value
        key: String,
        /// Where the key was found
        context: String,
        /// Description of the expected type
        expected: &'static str,
        /// Rendering of the actual value
        found: String,
    },

    /// A `needs` or `dependencies` entry names something not declared earlier
    #[error("{referrer} references unknown {kind} '{name}'")]
    #[diagnostic(
        code(xrepo::config::unresolved_reference),
        help("References resolve in declaration order: declare '{name}' before the entry that refers to it")
    )]
    UnresolvedReference {
        /// The entry holding the reference
        referrer: String,
        /// What kind of thing was referenced ("component", "job")
        kind: &'static str,
        /// The unresolved name
        name: String,
    },

    /// Any other semantic violation
    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(xrepo::config::invalid))]
    Invalid {
        /// Description of the violation
        message: String,
    },
}

impl Error {
    /// Create an I/O error with path context
    #[must_use]
    pub fn io(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::Io {
            source,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a semantic validation error
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_type(
        key: impl Into<String>,
        context: impl Into<String>,
        expected: &'static str,
        found: &serde_yaml::Value,
    ) -> Self {
        Self::InvalidType {
            key: key.into(),
            context: context.into(),
            expected,
            found: render_value(found),
        }
    }
}

/// Render a YAML value compactly for error messages
pub(crate) fn render_value(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().replace('\n', " "))
        .unwrap_or_else(|_| format!("{value:?}"))
}

/// Result type for configuration parsing
pub type Result<T> = std::result::Result<T, Error>;
