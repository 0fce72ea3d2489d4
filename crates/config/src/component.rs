//! Per-component job templates (`.repo-config/component-jobs/<component>.yml`).

use crate::env::{Env, merge_env};
use crate::error::{Error, Result};
use crate::fields::{Fields, parse_document, read_document};
use crate::repo::parse_steps;
use serde_yaml::Value;
use std::path::Path;
use tracing::info;

/// Prefix rejected inside run elements; the compiler adds it for `mvn` entries
pub const MAVEN_COMMAND_PREFIX: &str = "mvn ";

/// Job template for one component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentJobsConfig {
    /// Component the template belongs to
    pub component: String,
    /// Generated name of the designated build job
    pub build_job: String,
    /// Jobs in declaration order
    pub jobs: Vec<ComponentJobConfig>,
    /// Optional job run after every other job of the component
    pub end_job: Option<ComponentEndJobConfig>,
}

/// One templated job
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentJobConfig {
    /// Key in the `jobs` mapping
    pub key: String,
    /// Generated job name, `<component>-<key>`
    pub name: String,
    /// Whether this is the designated build job
    pub build_job: bool,
    /// Template env merged with the job's own env
    pub env: Env,
    /// Job override, else the template default
    pub java_version: Option<String>,
    /// Job override, else the template default
    pub runs_on: Option<Vec<String>>,
    /// Generated names of sibling jobs this one waits for
    pub needs: Vec<String>,
    /// Build steps
    pub run: Vec<RunElement>,
}

/// A single entry of a job's `run` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunElement {
    /// Maven goals and options, without the `mvn` command itself
    Maven(String),
    /// Opaque shell command
    Shell(String),
}

/// The per-component trailing job
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentEndJobConfig {
    /// Generated name, `<component>-end-job`
    pub name: String,
    /// Template env merged with the end job's env
    pub env: Env,
    /// Toolchain override
    pub java_version: Option<String>,
    /// Runner override
    pub runs_on: Option<Vec<String>>,
    /// Every job of the component
    pub needs: Vec<String>,
    /// Optional `if` condition
    pub if_condition: Option<String>,
    /// Raw step list
    pub steps: Vec<Value>,
}

impl ComponentJobsConfig {
    /// Read and parse the template of `component`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid template.
    pub fn load(component: &str, path: &Path) -> Result<Self> {
        info!(component, path = %path.display(), "Parsing component job config");
        Self::parse(component, &read_document(path)?)
    }

    /// Parse a template from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid template.
    pub fn from_yaml(component: &str, text: &str) -> Result<Self> {
        Self::parse(
            component,
            &parse_document(text, &format!("component jobs of '{component}'"))?,
        )
    }

    /// Parse an already loaded document
    ///
    /// # Errors
    ///
    /// Returns an error on unknown keys, mistyped values, a `build-job` that
    /// names no declared job, or `needs` that reference a job not declared
    /// before the referring one.
    pub fn parse(component: &str, value: &Value) -> Result<Self> {
        let context = format!("component jobs of '{component}'");
        let mut fields = Fields::new(value, context.as_str())?;
        let build_job_key = fields.required_str("build-job")?;
        let jobs_value = fields.required("jobs")?;
        let env = fields.optional_env("env")?.unwrap_or_default();
        let java_version = fields.java_version()?;
        let runs_on = fields.runs_on()?;
        let end_job_value = fields.take("end-job");
        fields.finish()?;

        let defaults = JobDefaults {
            component,
            env: &env,
            java_version: java_version.as_deref(),
            runs_on: runs_on.as_deref(),
        };

        let Value::Mapping(entries) = &jobs_value else {
            return Err(Error::invalid_type(
                "jobs",
                context,
                "a mapping",
                &jobs_value,
            ));
        };
        if entries.is_empty() {
            return Err(Error::invalid(format!("'jobs' of {context} is empty")));
        }

        let mut jobs: Vec<ComponentJobConfig> = Vec::with_capacity(entries.len());
        for (key, entry) in entries {
            let Value::String(key) = key else {
                return Err(Error::invalid_type("jobs", context, "a string key", key));
            };
            let job = defaults.parse_job(key, key == &build_job_key, entry, &jobs)?;
            jobs.push(job);
        }

        let build_job = jobs
            .iter()
            .find(|j| j.build_job)
            .map(|j| j.name.clone())
            .ok_or_else(|| {
                Error::invalid(format!(
                    "No job called '{build_job_key}' referenced by 'build-job' in {context}"
                ))
            })?;

        let end_job = end_job_value
            .map(|v| defaults.parse_end_job(&v, &jobs))
            .transpose()?;

        Ok(Self {
            component: component.to_string(),
            build_job,
            jobs,
            end_job,
        })
    }

    /// The designated build job
    #[must_use]
    pub fn build_job(&self) -> Option<&ComponentJobConfig> {
        self.jobs.iter().find(|j| j.build_job)
    }
}

/// Template-level values every job inherits
struct JobDefaults<'a> {
    component: &'a str,
    env: &'a Env,
    java_version: Option<&'a str>,
    runs_on: Option<&'a [String]>,
}

impl JobDefaults<'_> {
    fn job_name(&self, key: &str) -> String {
        format!("{}-{key}", self.component)
    }

    fn parse_job(
        &self,
        key: &str,
        build_job: bool,
        value: &Value,
        earlier: &[ComponentJobConfig],
    ) -> Result<ComponentJobConfig> {
        let mut fields = Fields::new(value, format!("job '{key}'"))?;
        let job_env = fields.optional_env("env")?.unwrap_or_default();
        let needs = fields
            .optional_list("needs")?
            .unwrap_or_default()
            .iter()
            .map(|need| {
                let Value::String(need) = need else {
                    return Err(Error::invalid_type(
                        "needs",
                        format!("job '{key}'"),
                        "a list of strings",
                        need,
                    ));
                };
                if !earlier.iter().any(|j| &j.key == need) {
                    return Err(Error::UnresolvedReference {
                        referrer: format!("'needs' of job '{key}'"),
                        kind: "job",
                        name: need.clone(),
                    });
                }
                Ok(self.job_name(need))
            })
            .collect::<Result<Vec<_>>>()?;
        let run = fields
            .optional_list("run")?
            .ok_or_else(|| Error::MissingKey {
                key: "run".to_string(),
                context: format!("job '{key}'"),
            })?
            .iter()
            .map(parse_run_element)
            .collect::<Result<Vec<_>>>()?;
        let java_version = fields
            .java_version()?
            .or_else(|| self.java_version.map(str::to_string));
        let runs_on = fields
            .runs_on()?
            .or_else(|| self.runs_on.map(<[String]>::to_vec));
        fields.finish()?;

        Ok(ComponentJobConfig {
            key: key.to_string(),
            name: self.job_name(key),
            build_job,
            env: merge_env(self.env, &job_env),
            java_version,
            runs_on,
            needs,
            run,
        })
    }

    fn parse_end_job(
        &self,
        value: &Value,
        jobs: &[ComponentJobConfig],
    ) -> Result<ComponentEndJobConfig> {
        let mut fields = Fields::new(value, format!("end-job of '{}'", self.component))?;
        fields.forbid("name")?;
        fields.forbid("needs")?;
        let env = fields.optional_env("env")?.unwrap_or_default();
        let if_condition = fields.optional_str("if")?;
        let java_version = fields
            .java_version()?
            .or_else(|| self.java_version.map(str::to_string));
        let runs_on = fields
            .runs_on()?
            .or_else(|| self.runs_on.map(<[String]>::to_vec));
        let steps = parse_steps(&mut fields)?;
        fields.finish()?;

        Ok(ComponentEndJobConfig {
            name: self.job_name("end-job"),
            env: merge_env(self.env, &env),
            java_version,
            runs_on,
            needs: jobs.iter().map(|j| j.name.clone()).collect(),
            if_condition,
            steps,
        })
    }
}

fn parse_run_element(value: &Value) -> Result<RunElement> {
    let Value::Mapping(mapping) = value else {
        return Err(Error::invalid_type("run", "a run element", "a mapping", value));
    };
    let mut entries = mapping.iter();
    let (Some((key, command)), None) = (entries.next(), entries.next()) else {
        return Err(Error::invalid(
            "Only one entry is allowed per 'run' element",
        ));
    };
    let Value::String(command) = command else {
        return Err(Error::invalid_type("run", "a run element", "a string", command));
    };
    let prefixed = command.trim_start().starts_with(MAVEN_COMMAND_PREFIX);
    match key.as_str() {
        Some("mvn") if prefixed => Err(Error::invalid(format!(
            "In a 'mvn' run entry, leave out the mvn command itself: use `mvn: install` rather than `mvn: mvn install` (got '{command}')"
        ))),
        Some("mvn") => Ok(RunElement::Maven(command.clone())),
        Some("shell") if prefixed => Err(Error::invalid(format!(
            "Maven commands belong in a 'mvn' run entry, not 'shell': '{command}'"
        ))),
        Some("shell") => Ok(RunElement::Shell(command.clone())),
        _ => Err(Error::invalid_type(
            "run",
            "a run element",
            "either 'mvn' or 'shell'",
            key,
        )),
    }
}
