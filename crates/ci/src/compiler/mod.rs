//! Compiler from xrepo configuration to a GitHub Actions workflow
//!
//! Components are processed strictly in declaration order. Each one becomes
//! either a single default build job or the jobs of its template, wrapped in
//! the checkout, cache, artifact hand-off and log capture steps every job
//! needs. Workflow-level jobs (end job, status read-back, issue reports and
//! cleanup) are appended once all components are in the graph.

pub mod context;
pub mod steps;
mod trailing;

pub use trailing::{
    CLEANUP_JOB, END_JOB, REPORT_FAILURE_JOB, REPORT_SUCCESS_JOB, STATUS_READ_JOB,
    STATUS_TEXT_DIR, STATUS_TEXT_FILE, STATUS_TEXT_FILE_ENV,
};

use crate::error::{Error, Result};
use crate::graph::JobGraph;
use crate::templates::{Template, TemplateSource};
use context::{
    BuildJobs, DependencyBinding, default_build_command, template_build_command, version_env,
};
use serde_yaml::Value;
use steps::{
    BACKUPS_ROOT, CI_TOOLS_DIR, Condition, GIT_SHA_OUTPUT, MAVEN_REPO, PROJECT_LOGS_DIR,
    REV_PARSE_STEP_ID, VERSION_STEP_ID, expression, version_var_name,
};
use tracing::{debug, info, warn};
use xrepo_config::{
    Component, ComponentEndJobConfig, ComponentJobConfig, Env, RepoConfig, TriggerConfig,
    merge_env, overridden_keys,
};
use xrepo_github::workflow::{Job, RunsOn, Step, Workflow, WorkflowTriggers, sanitize_name};

/// Id of the bootstrap job every build job waits for
pub const CANCEL_JOB: &str = "cancel-previous-runs";

/// Tool invocation used by generated steps
pub const DEFAULT_TOOL_COMMAND: &str = ".ci-tools/xrepo";

/// Toolchain version when nothing else is configured
pub const DEFAULT_JAVA_VERSION: &str = "11";

/// Compiler configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Branch the workflow is triggered by; also the artifact side branch
    pub branch: String,
    /// Issue that requested the run
    pub issue_number: u64,
    /// How generated steps invoke the xrepo tool
    pub tool_command: String,
    /// Toolchain version used when no config sets one
    pub default_java_version: String,
}

impl CompilerOptions {
    /// Options with the default tool location and toolchain version
    #[must_use]
    pub fn new(branch: impl Into<String>, issue_number: u64) -> Self {
        Self {
            branch: branch.into(),
            issue_number,
            tool_command: DEFAULT_TOOL_COMMAND.to_string(),
            default_java_version: DEFAULT_JAVA_VERSION.to_string(),
        }
    }

    /// Override the tool invocation
    #[must_use]
    pub fn with_tool_command(mut self, tool_command: impl Into<String>) -> Self {
        self.tool_command = tool_command.into();
        self
    }
}

/// Compiler for turning configuration into a workflow
pub struct WorkflowCompiler<'a, T: TemplateSource> {
    trigger: &'a TriggerConfig,
    repo: &'a RepoConfig,
    templates: &'a T,
    options: CompilerOptions,
}

/// Everything that differs between the component jobs of a workflow
struct ComponentJob<'c> {
    component: &'c Component,
    id: String,
    display_name: String,
    build_job: bool,
    java_version: String,
    runs_on: Vec<String>,
    needs: Vec<String>,
    restore_artifacts: bool,
    env: Env,
    build_command: String,
}

impl<'a, T: TemplateSource> WorkflowCompiler<'a, T> {
    /// Create a compiler over already parsed configuration
    pub fn new(
        trigger: &'a TriggerConfig,
        repo: &'a RepoConfig,
        templates: &'a T,
        options: CompilerOptions,
    ) -> Self {
        Self {
            trigger,
            repo,
            templates,
            options,
        }
    }

    /// Compile the full workflow.
    ///
    /// # Errors
    ///
    /// Returns an error if a job template is invalid, a component with a
    /// template also sets `mavenOpts`, a user step is malformed, or two jobs
    /// end up with the same id.
    pub fn compile(&self) -> Result<Workflow> {
        info!(
            workflow = %self.trigger.name,
            components = self.trigger.components.len(),
            "Compiling workflow"
        );
        let mut graph = JobGraph::new();
        let mut build_jobs = BuildJobs::default();

        graph.insert(CANCEL_JOB, self.cancel_job())?;

        for component in &self.trigger.components {
            let bindings = build_jobs.bindings_for(component);
            let build_job = match self.templates.load(&component.name)? {
                Some(template) => {
                    self.add_template_jobs(component, &template, &bindings, &mut graph)?
                }
                None => self.add_default_job(component, &bindings, &mut graph)?,
            };
            build_jobs.record(&component.name, &build_job);
        }

        self.add_trailing_jobs(&mut graph, &build_jobs)?;

        info!(jobs = graph.len(), "Workflow compiled");
        Ok(Workflow {
            name: self.trigger.name.clone(),
            on: WorkflowTriggers::push_to(&self.options.branch),
            env: self.workflow_env(),
            jobs: graph.into_jobs(),
        })
    }

    /// Repo env overridden by the trigger env
    fn workflow_env(&self) -> Env {
        for key in overridden_keys(&self.repo.env, &self.trigger.env) {
            warn!(key, "Trigger env overrides repository config env");
        }
        merge_env(&self.repo.env, &self.trigger.env)
    }

    fn cancel_job(&self) -> Job {
        let mut job = Job::new(self.default_runs_on());
        job.steps.push(steps::checkout_self(&self.options.branch, None));
        job.steps.push(steps::cancel_previous_runs());
        job
    }

    fn add_default_job(
        &self,
        component: &Component,
        bindings: &[DependencyBinding],
        graph: &mut JobGraph,
    ) -> Result<String> {
        let id = format!("{}-build", component.name);
        debug!(component = %component.name, job = %id, "Adding default build job");

        let mut needs = vec![CANCEL_JOB.to_string()];
        needs.extend(bindings.iter().map(|b| b.build_job.clone()));

        let job = self.component_job(ComponentJob {
            component,
            id: id.clone(),
            display_name: component.name.clone(),
            build_job: true,
            java_version: self.java_version(component, None),
            runs_on: self.repo.runs_on.clone(),
            restore_artifacts: !bindings.is_empty(),
            needs,
            env: version_env(bindings),
            build_command: default_build_command(component, bindings),
        });
        graph.insert(id.clone(), job)?;
        Ok(id)
    }

    fn add_template_jobs(
        &self,
        component: &Component,
        template: &Template,
        bindings: &[DependencyBinding],
        graph: &mut JobGraph,
    ) -> Result<String> {
        if component.maven_opts.is_some() {
            return Err(Error::MavenOptsWithTemplate {
                component: component.name.clone(),
                template: template.origin.clone(),
            });
        }
        let config = &template.config;
        debug!(component = %component.name, template = %template.origin, jobs = config.jobs.len(), "Adding template jobs");

        for job_config in &config.jobs {
            if component.debug && !job_config.build_job {
                debug!(job = %job_config.name, "Skipping job in debug mode");
                continue;
            }
            let job = self.template_job(component, job_config, &config.build_job, bindings);
            graph.insert(job_config.name.clone(), job)?;
        }

        if let Some(end_job) = &config.end_job
            && !component.debug
        {
            let job = self.component_end_job(component, end_job, &config.build_job, bindings)?;
            graph.insert(end_job.name.clone(), job)?;
        }
        Ok(config.build_job.clone())
    }

    fn template_job(
        &self,
        component: &Component,
        job_config: &ComponentJobConfig,
        build_job: &str,
        bindings: &[DependencyBinding],
    ) -> Job {
        let mut needs = Vec::new();
        if job_config.build_job {
            needs.push(CANCEL_JOB.to_string());
        }
        needs.extend(bindings.iter().map(|b| b.build_job.clone()));
        // In debug mode only the build job exists, so its sibling edges are dropped
        if !component.debug {
            needs.extend(job_config.needs.iter().cloned());
        }

        let mut env = job_config.env.clone();
        env.extend(version_env(bindings));
        if job_config.needs.iter().any(|n| n == build_job) {
            env.extend(own_version_env(component, build_job));
        }

        self.component_job(ComponentJob {
            component,
            id: job_config.name.clone(),
            display_name: job_config.name.clone(),
            build_job: job_config.build_job,
            java_version: self.java_version(component, job_config.java_version.as_deref()),
            runs_on: job_config
                .runs_on
                .clone()
                .unwrap_or_else(|| self.repo.runs_on.clone()),
            restore_artifacts: needs.iter().any(|n| n != CANCEL_JOB),
            needs,
            env,
            build_command: template_build_command(&job_config.run, bindings),
        })
    }

    /// Assemble a component job with the fixed step boilerplate around the build
    fn component_job(&self, spec: ComponentJob<'_>) -> Job {
        let component = spec.component;
        let mut job = Job::new(RunsOn::from_labels(spec.runs_on)).with_name(spec.display_name);
        job.needs = spec.needs;
        job.env = spec.env;

        if spec.build_job {
            let version_var = version_var_name(&component.name);
            job.outputs.insert(
                version_var.clone(),
                expression(&format!("steps.{VERSION_STEP_ID}.outputs.{version_var}")),
            );
            job.outputs.insert(
                GIT_SHA_OUTPUT.to_string(),
                expression(&format!("steps.{REV_PARSE_STEP_ID}.outputs.{GIT_SHA_OUTPUT}")),
            );
        }

        let job_steps = &mut job.steps;
        self.push_setup_steps(job_steps, component, &spec.java_version, spec.restore_artifacts);

        if spec.build_job {
            job_steps.push(steps::grab_version(&version_var_name(&component.name)));
            job_steps.push(steps::rev_parse());
        }
        job_steps.push(steps::ipv6_localhost());
        job_steps.push(steps::maven_build(spec.build_command));

        if component.debug {
            job_steps.push(steps::tmate_debug());
        }

        if spec.build_job {
            let backup_dir = format!("{BACKUPS_ROOT}/{}", component.name);
            job_steps.push(
                steps::tool_command(
                    &self.options.tool_command,
                    "backup-maven-artifacts",
                    &["pom.xml", MAVEN_REPO, &backup_dir],
                )
                .with_if(Condition::Success.expression()),
            );
            job_steps.push(steps::git_commit_and_push(
                CI_TOOLS_DIR,
                &format!("Back up the maven artifacts created by {}", component.name),
                Condition::Success,
            ));
        }

        self.push_log_capture_steps(job_steps, &spec.id);
        job
    }

    fn component_end_job(
        &self,
        component: &Component,
        end_job: &ComponentEndJobConfig,
        build_job: &str,
        bindings: &[DependencyBinding],
    ) -> Result<Job> {
        let runs_on = end_job
            .runs_on
            .clone()
            .unwrap_or_else(|| self.repo.runs_on.clone());
        let mut job = Job::new(RunsOn::from_labels(runs_on)).with_name(end_job.name.clone());
        job.needs.clone_from(&end_job.needs);
        // Outputs are only visible to jobs that need the producer directly
        for binding in bindings {
            if !job.needs.contains(&binding.build_job) {
                job.needs.push(binding.build_job.clone());
            }
        }
        job.if_condition.clone_from(&end_job.if_condition);
        job.env = end_job.env.clone();
        job.env.extend(version_env(bindings));
        job.env.extend(own_version_env(component, build_job));

        let java_version = self.java_version(component, end_job.java_version.as_deref());
        self.push_setup_steps(&mut job.steps, component, &java_version, true);
        job.steps.extend(user_steps(&end_job.name, &end_job.steps)?);
        Ok(job)
    }

    /// Checkout, cache and toolchain, then artifact restore when requested
    fn push_setup_steps(
        &self,
        out: &mut Vec<Step>,
        component: &Component,
        java_version: &str,
        restore_artifacts: bool,
    ) {
        out.push(steps::checkout_repository(
            &component.org,
            &component.name,
            &component.branch,
        ));
        out.push(steps::checkout_self(&self.options.branch, Some(CI_TOOLS_DIR)));
        out.push(steps::cache_maven_repository());
        out.push(steps::setup_java(java_version));
        if restore_artifacts {
            out.push(steps::git_rebase(CI_TOOLS_DIR));
            out.push(steps::tool_command(
                &self.options.tool_command,
                "overlay-backed-up-maven-artifacts",
                &[MAVEN_REPO, BACKUPS_ROOT],
            ));
        }
    }

    fn push_log_capture_steps(&self, out: &mut Vec<Step>, job_id: &str) {
        let job_logs_dir = format!("{PROJECT_LOGS_DIR}/{job_id}");
        let failure = Condition::Failure.expression();
        out.push(
            steps::tool_command(&self.options.tool_command, "copy-logs", &[".", &job_logs_dir])
                .with_if(failure),
        );
        out.push(steps::zip_folder(PROJECT_LOGS_DIR, job_id).with_if(failure));
        out.push(
            steps::upload_artifact(&self.log_artifact_name(job_id), PROJECT_LOGS_DIR)
                .with_if(failure),
        );
    }

    /// `<workflow>-logs-<issue>-<job>`; artifact names must be unique per run
    fn log_artifact_name(&self, job_id: &str) -> String {
        format!(
            "{}-logs-{}-{job_id}",
            sanitize_name(&self.trigger.name),
            self.options.issue_number
        )
    }

    /// Component override, then job, then repository, then the built-in default
    fn java_version(&self, component: &Component, job: Option<&str>) -> String {
        component
            .java_version
            .as_deref()
            .or(job)
            .or(self.repo.java_version.as_deref())
            .unwrap_or(&self.options.default_java_version)
            .to_string()
    }

    /// Runner of the workflow-level jobs
    fn default_runs_on(&self) -> RunsOn {
        RunsOn::from_labels(self.repo.runs_on.clone())
    }
}

/// Env entry for a component's own version, read from its build job
fn own_version_env(component: &Component, build_job: &str) -> Env {
    let var = version_var_name(&component.name);
    let value = expression(&format!("needs.{build_job}.outputs.{var}"));
    Env::from([(var, value)])
}

/// Convert raw YAML steps, keeping keys the schema does not model
fn user_steps(context: &str, raw: &[Value]) -> Result<Vec<Step>> {
    raw.iter()
        .enumerate()
        .map(|(index, value)| {
            Step::from_yaml(value.clone()).map_err(|source| Error::InvalidStep {
                context: context.to_string(),
                index,
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::InMemoryTemplates;
    use xrepo_config::Dependency;

    fn component(name: &str, deps: &[&str]) -> Component {
        Component {
            name: name.into(),
            org: "acme".into(),
            branch: "main".into(),
            maven_opts: None,
            debug: false,
            java_version: None,
            dependencies: deps
                .iter()
                .map(|d| Dependency {
                    name: (*d).into(),
                    property: format!("{d}.version"),
                })
                .collect(),
        }
    }

    fn trigger(components: Vec<Component>) -> TriggerConfig {
        TriggerConfig {
            name: "Feature X".into(),
            env: Env::new(),
            components,
        }
    }

    fn compile(trigger: &TriggerConfig, repo: &RepoConfig, templates: &InMemoryTemplates) -> Workflow {
        WorkflowCompiler::new(trigger, repo, templates, CompilerOptions::new("feature-x", 7))
            .compile()
            .unwrap()
    }

    #[test]
    fn test_java_version_precedence() {
        let trigger = trigger(vec![]);
        let templates = InMemoryTemplates::new();
        let mut repo = RepoConfig::default();
        let mut c = component("core", &[]);
        let options = CompilerOptions::new("b", 1);

        let compiler = WorkflowCompiler::new(&trigger, &repo, &templates, options.clone());
        assert_eq!(compiler.java_version(&c, None), "11");
        assert_eq!(compiler.java_version(&c, Some("17")), "17");

        repo.java_version = Some("8".into());
        let compiler = WorkflowCompiler::new(&trigger, &repo, &templates, options.clone());
        assert_eq!(compiler.java_version(&c, None), "8");
        assert_eq!(compiler.java_version(&c, Some("17")), "17");

        c.java_version = Some("21".into());
        assert_eq!(compiler.java_version(&c, Some("17")), "21");
    }

    #[test]
    fn test_default_job_step_order() {
        let trigger = trigger(vec![component("core", &[]), component("app", &["core"])]);
        let workflow = compile(&trigger, &RepoConfig::default(), &InMemoryTemplates::new());

        let names: Vec<_> = workflow.jobs["app-build"]
            .steps
            .iter()
            .map(|s| s.name.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(
            names,
            vec![
                "Checkout acme/app",
                "Checkout CI tools",
                "Cache Maven repository",
                "Set up JDK 11",
                "Update CI tools checkout",
                "Run xrepo 'overlay-backed-up-maven-artifacts'",
                "Grab project version",
                "Parse SHA-1 into output variable",
                "Add '::1 localhost' to hosts file",
                "Maven Build",
                "Run xrepo 'backup-maven-artifacts'",
                "Commit and push",
                "Run xrepo 'copy-logs'",
                "Zip build logs",
                "Upload build logs",
            ]
        );

        // Nothing to restore for a component without dependencies
        let core_steps = &workflow.jobs["core-build"].steps;
        assert!(core_steps.iter().all(|s| s.name.as_deref() != Some("Update CI tools checkout")));
    }

    #[test]
    fn test_build_job_outputs() {
        let trigger = trigger(vec![component("wildfly-core", &[])]);
        let workflow = compile(&trigger, &RepoConfig::default(), &InMemoryTemplates::new());
        let outputs = &workflow.jobs["wildfly-core-build"].outputs;
        assert_eq!(
            outputs.get("version_wildfly_core").map(String::as_str),
            Some("${{ steps.grab-version.outputs.version_wildfly_core }}")
        );
        assert_eq!(
            outputs.get("git-sha").map(String::as_str),
            Some("${{ steps.git-rev-parse.outputs.git-sha }}")
        );
    }

    #[test]
    fn test_log_artifact_name_is_deterministic() {
        let trigger = trigger(vec![component("core", &[])]);
        let workflow = compile(&trigger, &RepoConfig::default(), &InMemoryTemplates::new());
        let upload = workflow.jobs["core-build"]
            .steps
            .iter()
            .find(|s| s.uses.as_deref() == Some("actions/upload-artifact@v4"))
            .unwrap();
        assert_eq!(
            upload.with_inputs.get("name").and_then(|v| v.as_str()),
            Some("feature-x-logs-7-core-build")
        );
        assert_eq!(upload.if_condition.as_deref(), Some("failure()"));
    }

    #[test]
    fn test_workflow_env_merges_repo_and_trigger() {
        let mut trigger = trigger(vec![]);
        trigger.env = Env::from([
            ("MAVEN_OPTS".to_string(), "-Xmx2g".to_string()),
            ("EXTRA".to_string(), "1".to_string()),
        ]);
        let mut repo = RepoConfig::default();
        repo.env = Env::from([
            ("MAVEN_OPTS".to_string(), "-Xmx1g".to_string()),
            ("REPO".to_string(), "x".to_string()),
        ]);
        let workflow = compile(&trigger, &repo, &InMemoryTemplates::new());
        let keys: Vec<_> = workflow.env.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["MAVEN_OPTS", "REPO", "EXTRA"]);
        assert_eq!(workflow.env["MAVEN_OPTS"], "-Xmx2g");
    }

    #[test]
    fn test_invalid_user_step() {
        let raw = vec![serde_yaml::from_str::<Value>("name: [not, a, string]").unwrap()];
        let err = user_steps("end-job", &raw).unwrap_err();
        assert!(matches!(err, Error::InvalidStep { index: 0, .. }));
    }
}
