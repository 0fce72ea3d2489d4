//! GitHub Actions Workflow Schema Types
//!
//! Defines the data structures for GitHub Actions workflow YAML generation.
//! Every map is an [`IndexMap`] so that the emitted document keeps the order
//! in which jobs, env entries and inputs were added.
//! See: <https://docs.github.com/en/actions/using-workflows/workflow-syntax-for-github-actions>

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A GitHub Actions workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workflow {
    /// Workflow name displayed in GitHub UI
    pub name: String,

    /// Trigger configuration
    #[serde(rename = "on")]
    pub on: WorkflowTriggers,

    /// Environment variables available to all jobs
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,

    /// Job definitions, in emission order
    pub jobs: IndexMap<String, Job>,
}

/// Workflow trigger configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowTriggers {
    /// Trigger on push events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<PushTrigger>,
}

impl WorkflowTriggers {
    /// Trigger on pushes to a single branch
    #[must_use]
    pub fn push_to(branch: impl Into<String>) -> Self {
        Self {
            push: Some(PushTrigger {
                branches: vec![branch.into()],
            }),
        }
    }
}

/// Push event trigger configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PushTrigger {
    /// Branch patterns to trigger on
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
}

/// A job in a GitHub Actions workflow.
///
/// Jobs run in parallel by default unless `needs` dependencies are specified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Job {
    /// Job display name (shown in GitHub UI)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Runner label(s) specifying where to run
    pub runs_on: RunsOn,

    /// Job dependencies (these jobs must complete first)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,

    /// Conditional execution expression
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_condition: Option<String>,

    /// Job-level environment variables
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,

    /// Values exposed to dependent jobs as `needs.<job>.outputs.<key>`
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, String>,

    /// Job steps (executed sequentially)
    pub steps: Vec<Step>,
}

impl Job {
    /// An empty job on the given runner
    #[must_use]
    pub fn new(runs_on: RunsOn) -> Self {
        Self {
            name: None,
            runs_on,
            needs: Vec::new(),
            if_condition: None,
            env: IndexMap::new(),
            outputs: IndexMap::new(),
            steps: Vec::new(),
        }
    }

    /// Set the display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the condition
    #[must_use]
    pub fn with_if(mut self, condition: impl Into<String>) -> Self {
        self.if_condition = Some(condition.into());
        self
    }
}

/// Runner specification for where a job runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RunsOn {
    /// Single runner label (e.g., "ubuntu-latest")
    Label(String),
    /// Multiple runner labels (job runs on runner matching all labels)
    Labels(Vec<String>),
}

impl RunsOn {
    /// A single label is emitted as a scalar, anything else as a list
    #[must_use]
    pub fn from_labels(labels: Vec<String>) -> Self {
        match <[String; 1]>::try_from(labels) {
            Ok([label]) => Self::Label(label),
            Err(labels) => Self::Labels(labels),
        }
    }
}

/// A step in a job.
///
/// Steps can either `uses` an action or `run` a shell command. Keys this type
/// does not model (e.g. `timeout-minutes`) are kept in `extra` so user-written
/// steps pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    /// Step display name (shown in GitHub UI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Unique identifier for referencing step outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Conditional execution expression
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub if_condition: Option<String>,

    /// Action to use (e.g., "actions/checkout@v4")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,

    /// Shell command(s) to run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,

    /// Working directory for run commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    /// Action inputs (for `uses` steps)
    #[serde(rename = "with", default, skip_serializing_if = "IndexMap::is_empty")]
    pub with_inputs: IndexMap<String, serde_yaml::Value>,

    /// Step environment variables
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, serde_yaml::Value>,

    /// Any other step keys, emitted after the modelled ones
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Step {
    /// Create a step that uses an action
    pub fn uses(action: impl Into<String>) -> Self {
        Self {
            uses: Some(action.into()),
            ..Default::default()
        }
    }

    /// Create a step that runs a shell command
    pub fn run(command: impl Into<String>) -> Self {
        Self {
            run: Some(command.into()),
            ..Default::default()
        }
    }

    /// Build a step from a user-written YAML mapping
    ///
    /// # Errors
    ///
    /// Returns an error if a modelled key has the wrong type.
    pub fn from_yaml(value: serde_yaml::Value) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_value(value)
    }

    /// Set the step name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the step ID
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a with input
    #[must_use]
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<serde_yaml::Value>) -> Self {
        self.with_inputs.insert(key.into(), value.into());
        self
    }

    /// Add an environment variable
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .insert(key.into(), serde_yaml::Value::String(value.into()));
        self
    }

    /// Set a condition
    #[must_use]
    pub fn with_if(mut self, condition: impl Into<String>) -> Self {
        self.if_condition = Some(condition.into());
        self
    }

    /// Set working directory
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_builder() {
        let step = Step::uses("actions/checkout@v4")
            .with_name("Checkout")
            .with_input("fetch-depth", 0);

        assert_eq!(step.name, Some("Checkout".to_string()));
        assert_eq!(step.uses, Some("actions/checkout@v4".to_string()));
        assert!(step.with_inputs.contains_key("fetch-depth"));
    }

    #[test]
    fn test_workflow_serialization() {
        let workflow = Workflow {
            name: "CI".to_string(),
            on: WorkflowTriggers::push_to("feature-x"),
            env: IndexMap::new(),
            jobs: IndexMap::new(),
        };

        let yaml = serde_yaml::to_string(&workflow).unwrap();
        assert!(yaml.contains("name: CI"));
        assert!(yaml.contains("push:"));
        assert!(yaml.contains("- feature-x"));
        assert!(!yaml.contains("env:"));
    }

    #[test]
    fn test_job_with_needs_and_outputs() {
        let mut job = Job::new(RunsOn::Label("ubuntu-latest".to_string())).with_name("Test");
        job.needs.push("build".to_string());
        job.outputs
            .insert("git-sha".to_string(), "${{ steps.git-rev-parse.outputs.git-sha }}".to_string());

        let yaml = serde_yaml::to_string(&job).unwrap();
        assert!(yaml.contains("name: Test"));
        assert!(yaml.contains("runs-on: ubuntu-latest"));
        assert!(yaml.contains("- build"));
        assert!(yaml.contains("outputs:"));
        assert!(yaml.contains("git-sha:"));
    }

    #[test]
    fn test_runs_on_from_labels() {
        assert_eq!(
            RunsOn::from_labels(vec!["ubuntu-latest".into()]),
            RunsOn::Label("ubuntu-latest".into())
        );
        assert_eq!(
            RunsOn::from_labels(vec!["self-hosted".into(), "linux".into()]),
            RunsOn::Labels(vec!["self-hosted".into(), "linux".into()])
        );
    }

    #[test]
    fn test_user_step_keeps_unknown_keys() {
        let value: serde_yaml::Value = serde_yaml::from_str(
            "name: Notify\nrun: ./notify.sh\ntimeout-minutes: 5\nenv:\n  RETRIES: 3\n",
        )
        .unwrap();
        let step = Step::from_yaml(value).unwrap();
        assert_eq!(step.run.as_deref(), Some("./notify.sh"));
        assert!(step.extra.contains_key("timeout-minutes"));

        let yaml = serde_yaml::to_string(&step).unwrap();
        assert!(yaml.contains("timeout-minutes: 5"));
        assert!(yaml.contains("RETRIES: 3"));
    }
}
