//! Step factories for generated jobs.
//!
//! Each function returns one finished [`Step`]; jobs are assembled by calling
//! them in order.

use xrepo_github::workflow::Step;

/// Checkout folder of the tooling repository inside every job
pub const CI_TOOLS_DIR: &str = ".ci-tools";
/// Where component builds back up their Maven artifacts, one folder per component
pub const BACKUPS_ROOT: &str = ".ci-tools/repo-backups";
/// Local Maven repository on the runner
pub const MAVEN_REPO: &str = "${HOME}/.m2/repository";
/// Staging folder for collected build logs
pub const PROJECT_LOGS_DIR: &str = ".project-build-logs";
/// Id of the step exposing the project version
pub const VERSION_STEP_ID: &str = "grab-version";
/// Id of the step exposing the commit hash
pub const REV_PARSE_STEP_ID: &str = "git-rev-parse";
/// Output name of the commit hash
pub const GIT_SHA_OUTPUT: &str = "git-sha";
/// Env var holding the project version for later steps of a build job
pub const PROJECT_VERSION_ENV: &str = "XREPO_PROJECT_VERSION";
/// Token allowed to push to the side branch and report on issues
pub const TOKEN: &str = "${{ secrets.MULTI_REPO_CI_PAT }}";

const GIT_USER: &str = "CI Action";
const GIT_EMAIL: &str = "ci@example.com";
const CURRENT_BRANCH: &str = "TMP=$(git branch | sed -n -e 's/^\\* \\(.*\\)/\\1/p')\n";

/// Step and job conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Every previous step succeeded
    Success,
    /// A previous step failed
    Failure,
    /// Regardless of earlier results
    Always,
}

impl Condition {
    /// The GitHub Actions expression
    #[must_use]
    pub const fn expression(self) -> &'static str {
        match self {
            Self::Success => "success()",
            Self::Failure => "failure()",
            Self::Always => "always()",
        }
    }
}

/// Env/output name for the version of `component`
#[must_use]
pub fn version_var_name(component: &str) -> String {
    format!("version_{}", component.replace('-', "_"))
}

/// `${{ <expr> }}`
#[must_use]
pub fn expression(expr: &str) -> String {
    format!("${{{{ {expr} }}}}")
}

/// Check out `org/repo` at `branch`
#[must_use]
pub fn checkout_repository(org: &str, repo: &str, branch: &str) -> Step {
    Step::uses("actions/checkout@v4")
        .with_name(format!("Checkout {org}/{repo}"))
        .with_input("repository", format!("{org}/{repo}"))
        .with_input("ref", branch)
}

/// Check out the workflow's own repository at `branch`, optionally into `path`
#[must_use]
pub fn checkout_self(branch: &str, path: Option<&str>) -> Step {
    let step = Step::uses("actions/checkout@v4")
        .with_name("Checkout CI tools")
        .with_input("ref", branch);
    match path {
        Some(path) => step.with_input("path", path),
        None => step,
    }
}

/// Restore and save the local Maven repository
#[must_use]
pub fn cache_maven_repository() -> Step {
    Step::uses("actions/cache@v4")
        .with_name("Cache Maven repository")
        .with_input("path", "~/.m2/repository")
        .with_input("key", "${{ runner.os }}-maven-${{ hashFiles('**/pom.xml') }}")
        .with_input("restore-keys", "${{ runner.os }}-maven-")
}

/// Install a JDK
#[must_use]
pub fn setup_java(version: &str) -> Step {
    Step::uses("actions/setup-java@v4")
        .with_name(format!("Set up JDK {version}"))
        .with_input("distribution", "temurin")
        .with_input("java-version", version)
}

/// Bring the side folder up to date with its remote branch
#[must_use]
pub fn git_rebase(dir: &str) -> Step {
    Step::run(format!(
        "{CURRENT_BRANCH}git fetch origin ${{TMP}}\ngit rebase origin/${{TMP}}\n"
    ))
    .with_name("Update CI tools checkout")
    .with_working_directory(dir)
}

/// Commit everything in `dir` and push it, rebasing onto the remote first
#[must_use]
pub fn git_commit_and_push(dir: &str, message: &str, condition: Condition) -> Step {
    let run = format!(
        "git config --local user.name \"{GIT_USER}\"\n\
         git config --local user.email \"{GIT_EMAIL}\"\n\
         git add -A\n\
         branch_status=$(git status --porcelain)\n\
         [[ ! -z \"${{branch_status}}\" ]] && git commit -m \"{message}\" || echo \"No changes\"\n\
         {CURRENT_BRANCH}\
         git fetch origin ${{TMP}}\n\
         git rebase origin/${{TMP}}\n\
         git push origin ${{TMP}}\n"
    );
    Step::run(run)
        .with_name("Commit and push")
        .with_working_directory(dir)
        .with_if(condition.expression())
}

/// Create `dir` and any missing parents
#[must_use]
pub fn make_directory(dir: &str) -> Step {
    Step::run(format!("mkdir -p {dir}\n")).with_name(format!("Create {dir}"))
}

/// Delete `branch` from the remote
#[must_use]
pub fn git_delete_remote_branch(branch: &str) -> Step {
    Step::run(format!("git push origin :{branch}\n")).with_name("Delete side branch")
}

/// Run one of the xrepo tool sub-commands
#[must_use]
pub fn tool_command(tool: &str, command: &str, args: &[&str]) -> Step {
    let mut run = format!("{tool} {command}");
    for arg in args {
        run.push(' ');
        run.push_str(arg);
    }
    run.push('\n');
    Step::run(run).with_name(format!("Run xrepo '{command}'"))
}

/// Evaluate the project version and expose it as `version_<component>`
#[must_use]
pub fn grab_version(version_var: &str) -> Step {
    // The first run downloads the help plugin, whose log lines would pollute the value
    let run = format!(
        "mvn -B help:evaluate -Dexpression=project.version -pl .\n\
         TMP=\"$(mvn -B help:evaluate -Dexpression=project.version -pl . | grep -v '^\\[')\"\n\
         echo \"version: ${{TMP}}\"\n\
         echo \"{version_var}=${{TMP}}\" >> \"$GITHUB_OUTPUT\"\n\
         echo \"{PROJECT_VERSION_ENV}=${{TMP}}\" >> \"$GITHUB_ENV\"\n"
    );
    Step::run(run)
        .with_name("Grab project version")
        .with_id(VERSION_STEP_ID)
}

/// Expose the checked out commit hash as `git-sha`
#[must_use]
pub fn rev_parse() -> Step {
    let run = format!(
        "TMP=$(git rev-parse HEAD)\necho \"{GIT_SHA_OUTPUT}=${{TMP}}\" >> \"$GITHUB_OUTPUT\"\n"
    );
    Step::run(run)
        .with_name("Parse SHA-1 into output variable")
        .with_id(REV_PARSE_STEP_ID)
}

/// Make `localhost` resolve for IPv6 as well
#[must_use]
pub fn ipv6_localhost() -> Step {
    Step::run("sudo bash -c 'echo ::1 localhost >> /etc/hosts'")
        .with_name("Add '::1 localhost' to hosts file")
}

/// The component build itself
#[must_use]
pub fn maven_build(run: impl Into<String>) -> Step {
    Step::run(run).with_name("Maven Build")
}

/// Pause the job with an SSH session
#[must_use]
pub fn tmate_debug() -> Step {
    Step::uses("mxschmitt/action-tmate@v3").with_name("Set up tmate for SSH debugging")
}

/// Zip `<containing>/<child>` into `<containing>/<child>.zip` and remove the folder
#[must_use]
pub fn zip_folder(containing: &str, child: &str) -> Step {
    Step::run(format!(
        "cd {containing}\nzip -r {child}.zip {child}\nrm -rf {child}\n"
    ))
    .with_name("Zip build logs")
}

/// Upload `path` as a workflow artifact
#[must_use]
pub fn upload_artifact(name: &str, path: &str) -> Step {
    Step::uses("actions/upload-artifact@v4")
        .with_name("Upload build logs")
        .with_input("name", name)
        .with_input("path", path)
}

/// Cancel earlier runs of this workflow on the same branch
#[must_use]
pub fn cancel_previous_runs() -> Step {
    Step::uses("n1hility/cancel-previous-runs@v2")
        .with_name("Cancel previous runs")
        .with_input("token", "${{ secrets.GITHUB_TOKEN }}")
}
