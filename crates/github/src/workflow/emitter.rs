//! GitHub Actions Workflow Emitter
//!
//! Serializes a [`Workflow`] to block-style YAML for `.github/workflows/`.

use crate::emitter::{Emitter, EmitterError, EmitterResult};
use crate::workflow::schema::Workflow;

const DEFAULT_HEADER: &str =
    "# Generated by xrepo - do not edit manually\n# Regenerate with: xrepo generate-workflow\n\n";

/// GitHub Actions workflow emitter
///
/// Output is deterministic: the same workflow always produces the same text,
/// with jobs, env entries and step inputs in insertion order.
#[derive(Debug, Clone)]
pub struct GitHubActionsEmitter {
    /// Comment block prepended to the document
    pub header: String,
}

impl Default for GitHubActionsEmitter {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
        }
    }
}

impl GitHubActionsEmitter {
    /// Create a new GitHub Actions emitter with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the generated-file header; an empty string disables it
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    fn serialize_workflow(&self, workflow: &Workflow) -> EmitterResult<String> {
        let yaml = serde_yaml::to_string(workflow)
            .map_err(|e| EmitterError::Serialization(e.to_string()))?;
        Ok(format!("{}{yaml}", self.header))
    }
}

impl Emitter for GitHubActionsEmitter {
    fn emit(&self, workflow: &Workflow) -> EmitterResult<String> {
        self.serialize_workflow(workflow)
    }

    fn format_name(&self) -> &'static str {
        "github"
    }

    fn file_extension(&self) -> &'static str {
        "yml"
    }
}

/// Reduce a display name to characters safe in file and artifact names
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
