//! Workflow-level jobs appended after every component job.
//!
//! Each one needs every job added before it, so they run in this order:
//! repository end job, status read-back, issue reports, cleanup.

use super::WorkflowCompiler;
use super::context::BuildJobs;
use super::steps::{
    self, BACKUPS_ROOT, CI_TOOLS_DIR, Condition, GIT_SHA_OUTPUT, MAVEN_REPO, TOKEN, expression,
    version_var_name,
};
use super::user_steps;
use crate::error::Result;
use crate::graph::JobGraph;
use crate::templates::TemplateSource;
use tracing::debug;
use xrepo_config::{EndJobTemplate, StatusLabels};
use xrepo_github::workflow::{Job, Step};

/// Id of the repository end job
pub const END_JOB: &str = "end-job";
/// Id of the job surfacing the status file
pub const STATUS_READ_JOB: &str = "status-read";
/// Id of the success report job
pub const REPORT_SUCCESS_JOB: &str = "issue-report-success";
/// Id of the failure report job
pub const REPORT_FAILURE_JOB: &str = "issue-report-failure";
/// Id of the side branch cleanup job
pub const CLEANUP_JOB: &str = "cleanup";

/// Env var naming the file the end job may write a status text to
pub const STATUS_TEXT_FILE_ENV: &str = "XREPO_STATUS_TEXT_FILE";
/// Folder holding the status file
pub const STATUS_TEXT_DIR: &str = ".ci-tools/.status";
/// Status file location inside the tools checkout
pub const STATUS_TEXT_FILE: &str = ".ci-tools/.status/status-text.md";
/// Output of the read-back job and env var of the report jobs
pub const STATUS_TEXT_OUTPUT: &str = "status-text";

const STATUS_STEP_ID: &str = "read-status";
const STATUS_TEXT_ENV: &str = "STATUS_TEXT";
const SUCCESS_MESSAGE: &str = "The job passed!";
const FAILURE_MESSAGE: &str = "The job failed";

impl<T: TemplateSource> WorkflowCompiler<'_, T> {
    pub(super) fn add_trailing_jobs(
        &self,
        graph: &mut JobGraph,
        build_jobs: &BuildJobs,
    ) -> Result<()> {
        if let Some(template) = &self.repo.end_job {
            let job = self.end_job(template, graph.job_names(), build_jobs)?;
            graph.insert(END_JOB, job)?;
        }

        graph.insert(STATUS_READ_JOB, self.status_read_job(graph.job_names()))?;

        let reporting = &self.repo.issue_reporting;
        if reporting.is_enabled() {
            let needs = graph.job_names();
            let labels = reporting.labels.as_ref();
            let comments = reporting.comments;
            graph.insert(
                REPORT_SUCCESS_JOB,
                self.report_job(true, needs.clone(), build_jobs, labels, comments),
            )?;
            graph.insert(
                REPORT_FAILURE_JOB,
                self.report_job(false, needs, build_jobs, labels, comments),
            )?;
        } else {
            debug!("Issue reporting disabled");
        }

        graph.insert(CLEANUP_JOB, self.cleanup_job(graph.job_names()))?;
        Ok(())
    }

    fn end_job(
        &self,
        template: &EndJobTemplate,
        needs: Vec<String>,
        build_jobs: &BuildJobs,
    ) -> Result<Job> {
        let mut job = Job::new(self.default_runs_on()).with_name("End Job");
        job.needs = needs;
        job.if_condition.clone_from(&template.if_condition);
        job.env = template.env.clone();
        for (component, build_job) in build_jobs.iter() {
            let var = version_var_name(component);
            let value = expression(&format!("needs.{build_job}.outputs.{var}"));
            job.env.insert(var, value);
        }
        job.env.insert(
            STATUS_TEXT_FILE_ENV.to_string(),
            format!("${{{{ github.workspace }}}}/{STATUS_TEXT_FILE}"),
        );

        let java_version = self
            .repo
            .java_version
            .as_deref()
            .unwrap_or(&self.options.default_java_version);
        job.steps.push(steps::checkout_self(&self.options.branch, Some(CI_TOOLS_DIR)));
        job.steps.push(steps::cache_maven_repository());
        job.steps.push(steps::setup_java(java_version));
        job.steps.push(steps::git_rebase(CI_TOOLS_DIR));
        job.steps.push(steps::tool_command(
            &self.options.tool_command,
            "overlay-backed-up-maven-artifacts",
            &[MAVEN_REPO, BACKUPS_ROOT],
        ));
        job.steps.push(steps::make_directory(STATUS_TEXT_DIR));
        job.steps.extend(user_steps(END_JOB, &template.steps)?);
        job.steps.push(steps::git_commit_and_push(
            CI_TOOLS_DIR,
            "Store the end job status text",
            Condition::Always,
        ));
        Ok(job)
    }

    fn status_read_job(&self, needs: Vec<String>) -> Job {
        let mut job = Job::new(self.default_runs_on())
            .with_name("Read Status")
            .with_if(Condition::Always.expression());
        job.needs = needs;
        job.outputs.insert(
            STATUS_TEXT_OUTPUT.to_string(),
            expression(&format!("steps.{STATUS_STEP_ID}.outputs.{STATUS_TEXT_OUTPUT}")),
        );
        job.steps.push(steps::checkout_self(&self.options.branch, Some(CI_TOOLS_DIR)));
        let run = format!(
            "{{\n  echo '{STATUS_TEXT_OUTPUT}<<XREPO_STATUS_EOF'\n  \
             if [ -f {STATUS_TEXT_FILE} ]; then cat {STATUS_TEXT_FILE}; fi\n  \
             echo 'XREPO_STATUS_EOF'\n}} >> \"$GITHUB_OUTPUT\"\n"
        );
        job.steps.push(
            Step::run(run)
                .with_name("Read status text")
                .with_id(STATUS_STEP_ID),
        );
        job
    }

    fn report_job(
        &self,
        success: bool,
        needs: Vec<String>,
        build_jobs: &BuildJobs,
        labels: Option<&StatusLabels>,
        comments: bool,
    ) -> Job {
        let (name, condition, message) = if success {
            ("Issue Status Report - Success", Condition::Success, SUCCESS_MESSAGE)
        } else {
            ("Issue Status Report - Failure", Condition::Failure, FAILURE_MESSAGE)
        };
        let mut job = Job::new(self.default_runs_on())
            .with_name(name)
            .with_if(condition.expression());
        job.needs = needs;

        // Job ids contain '-', which JavaScript cannot read from process.env by name
        let mut sha_vars = Vec::new();
        for (_, build_job) in build_jobs.iter() {
            let var = format!("{}_git_sha", build_job.replace('-', "_"));
            job.env.insert(
                var.clone(),
                expression(&format!("needs.{build_job}.outputs.{GIT_SHA_OUTPUT}")),
            );
            sha_vars.push((build_job.to_string(), var));
        }
        job.env.insert(
            STATUS_TEXT_ENV.to_string(),
            expression(&format!("needs.{STATUS_READ_JOB}.outputs.{STATUS_TEXT_OUTPUT}")),
        );

        let issue = self.options.issue_number;
        let mut script = String::new();
        if let Some(labels) = labels {
            let (add, remove) = if success {
                (&labels.success, &labels.failure)
            } else {
                (&labels.failure, &labels.success)
            };
            script.push_str(&add_label_script(issue, add));
            script.push_str(&remove_label_script(issue, remove));
        }
        if comments {
            script.push_str(&comment_script(issue, message, &sha_vars));
        }

        job.steps.push(
            Step::uses("actions/github-script@v7")
                .with_name("Report status")
                .with_input("github-token", TOKEN)
                .with_input("script", script),
        );
        job
    }

    fn cleanup_job(&self, needs: Vec<String>) -> Job {
        let mut job = Job::new(self.default_runs_on())
            .with_name("Cleanup")
            .with_if(Condition::Always.expression());
        job.needs = needs;
        job.steps.push(
            steps::checkout_self(&self.options.branch, None).with_input("token", TOKEN),
        );
        job.steps
            .push(steps::git_delete_remote_branch(&self.options.branch));
        job
    }
}

/// A JavaScript string literal
fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

fn add_label_script(issue: u64, label: &str) -> String {
    format!(
        "await github.rest.issues.addLabels({{\n  \
         issue_number: {issue},\n  \
         owner: context.repo.owner,\n  \
         repo: context.repo.repo,\n  \
         labels: [{}]\n\
         }})\n",
        js_string(label)
    )
}

fn remove_label_script(issue: u64, label: &str) -> String {
    format!(
        "const labelsOnIssue = await github.paginate(github.rest.issues.listLabelsOnIssue, {{\n  \
         issue_number: {issue},\n  \
         owner: context.repo.owner,\n  \
         repo: context.repo.repo,\n\
         }})\n\
         for (const label of labelsOnIssue) {{\n  \
         if (label.name === {label}) {{\n    \
         await github.rest.issues.removeLabel({{\n      \
         issue_number: {issue},\n      \
         owner: context.repo.owner,\n      \
         repo: context.repo.repo,\n      \
         name: label.name\n    \
         }})\n  \
         }}\n\
         }}\n",
        label = js_string(label)
    )
}

fn comment_script(issue: u64, message: &str, sha_vars: &[(String, String)]) -> String {
    let mut body = js_string(&format!("{message}\n\n"));
    if !sha_vars.is_empty() {
        body.push_str(&format!(
            "\n    + {}",
            js_string("These are the job names and their respective SHA-1 hashes:\n\n")
        ));
        for (job, var) in sha_vars {
            body.push_str(&format!(
                "\n    + {} + process.env.{var} + '\\n'",
                js_string(&format!("{job}: "))
            ));
        }
    }
    body.push_str(&format!("\n    + '\\n' + process.env.{STATUS_TEXT_ENV} + '\\n'"));
    format!(
        "await github.rest.issues.createComment({{\n  \
         issue_number: {issue},\n  \
         owner: context.repo.owner,\n  \
         repo: context.repo.repo,\n  \
         body: {body}\n\
         }})\n"
    )
}
