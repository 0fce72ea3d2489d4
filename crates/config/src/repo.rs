//! Repository-wide defaults (`.repo-config/config.yml`).

use crate::env::Env;
use crate::error::{Error, Result};
use crate::fields::{Fields, parse_document, read_document};
use serde_yaml::Value;
use std::path::Path;
use tracing::info;

/// Runner label used when nothing else is configured
pub const DEFAULT_RUNS_ON: &str = "ubuntu-latest";

/// Repository-wide defaults applied to every generated job
#[derive(Debug, Clone, PartialEq)]
pub struct RepoConfig {
    /// Env shared by all jobs, overridden by the trigger env
    pub env: Env,
    /// Default toolchain version
    pub java_version: Option<String>,
    /// Default runner labels
    pub runs_on: Vec<String>,
    /// How results are reported back to the triggering issue
    pub issue_reporting: IssueReporting,
    /// Job appended after all component jobs
    pub end_job: Option<EndJobTemplate>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            env: Env::new(),
            java_version: None,
            runs_on: vec![DEFAULT_RUNS_ON.to_string()],
            issue_reporting: IssueReporting::default(),
            end_job: None,
        }
    }
}

/// Issue comment and label policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueReporting {
    /// Post a comment with the outcome
    pub comments: bool,
    /// Labels toggled on the issue according to the outcome
    pub labels: Option<StatusLabels>,
}

impl Default for IssueReporting {
    fn default() -> Self {
        Self {
            comments: true,
            labels: None,
        }
    }
}

impl IssueReporting {
    /// Whether any reporting job needs to be generated.
    ///
    /// Comments and labels are independent: either one is enough.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.comments || self.labels.is_some()
    }
}

/// Label pair applied on success or failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabels {
    /// Added on success, removed on failure
    pub success: String,
    /// Added on failure, removed on success
    pub failure: String,
}

/// User-supplied trailing job.
///
/// `name`, `needs` and `runs-on` are assigned by the compiler and so are not
/// accepted here. Steps are kept as raw YAML and passed through verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct EndJobTemplate {
    /// Job env
    pub env: Env,
    /// Optional `if` condition
    pub if_condition: Option<String>,
    /// Raw step list
    pub steps: Vec<Value>,
}

impl RepoConfig {
    /// Load the repository config, falling back to defaults when the file does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                path = %path.display(),
                "No repository config found, proceeding with defaults"
            );
            return Ok(Self::default());
        }
        info!(path = %path.display(), "Parsing repository config");
        Self::parse(&read_document(path)?)
    }

    /// Parse a repository config from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid repository config.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Self::parse(&parse_document(text, "repository config")?)
    }

    /// Parse an already loaded document. An empty document yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown keys or mistyped values.
    pub fn parse(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let mut fields = Fields::new(value, "repository config")?;
        let env = fields.optional_env("env")?.unwrap_or_default();
        let java_version = fields.java_version()?;
        let runs_on = fields
            .runs_on()?
            .unwrap_or_else(|| vec![DEFAULT_RUNS_ON.to_string()]);
        let issue_reporting = fields
            .take("issue-reporting")
            .map(|v| parse_issue_reporting(&v))
            .transpose()?
            .unwrap_or_default();
        let end_job = fields
            .take("end-job")
            .map(|v| parse_end_job(&v))
            .transpose()?;
        fields.finish()?;

        Ok(Self {
            env,
            java_version,
            runs_on,
            issue_reporting,
            end_job,
        })
    }
}

fn parse_issue_reporting(value: &Value) -> Result<IssueReporting> {
    let mut fields = Fields::new(value, "'issue-reporting'")?;
    let comments = fields.optional_bool("comments")?.unwrap_or(true);
    let labels = fields
        .take("labels")
        .map(|v| {
            let mut labels = Fields::new(&v, "'labels'")?;
            let success = labels.required_str("success")?;
            let failure = labels.required_str("failure")?;
            labels.finish()?;
            Ok::<_, Error>(StatusLabels { success, failure })
        })
        .transpose()?;
    fields.finish()?;
    Ok(IssueReporting { comments, labels })
}

fn parse_end_job(value: &Value) -> Result<EndJobTemplate> {
    let mut fields = Fields::new(value, "end-job")?;
    fields.forbid("name")?;
    fields.forbid("needs")?;
    fields.forbid("runs-on")?;
    let env = fields.optional_env("env")?.unwrap_or_default();
    let if_condition = fields.optional_str("if")?;
    let steps = parse_steps(&mut fields)?;
    fields.finish()?;
    Ok(EndJobTemplate {
        env,
        if_condition,
        steps,
    })
}

/// A required, non-empty list of step mappings
pub(crate) fn parse_steps(fields: &mut Fields) -> Result<Vec<Value>> {
    let steps = fields.optional_list("steps")?.ok_or_else(|| Error::MissingKey {
        key: "steps".to_string(),
        context: fields.context().to_string(),
    })?;
    if steps.is_empty() {
        return Err(Error::invalid(format!(
            "'steps' of {} is empty",
            fields.context()
        )));
    }
    if let Some(bad) = steps.iter().find(|s| !s.is_mapping()) {
        return Err(Error::invalid_type(
            "steps",
            fields.context(),
            "a list of mappings",
            bad,
        ));
    }
    Ok(steps)
}
