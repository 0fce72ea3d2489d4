//! Per-job compile context: which job builds each dependency, and how its
//! version is referenced.

use super::steps::{expression, version_var_name};
use indexmap::IndexMap;
use xrepo_config::{Component, Dependency, Env, RunElement};

/// A dependency resolved against the build jobs recorded so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyBinding {
    /// Component depended upon
    pub component: String,
    /// Maven property receiving the version
    pub property: String,
    /// Job that builds the dependency
    pub build_job: String,
    /// Output and env name of the dependency's version
    pub version_var: String,
}

impl DependencyBinding {
    /// Bind `dependency` to the build job of its component
    #[must_use]
    pub fn new(dependency: &Dependency, build_job: impl Into<String>) -> Self {
        Self {
            component: dependency.name.clone(),
            property: dependency.property.clone(),
            build_job: build_job.into(),
            version_var: version_var_name(&dependency.name),
        }
    }

    /// `needs.<build job>.outputs.version_<component>`
    #[must_use]
    pub fn output_ref(&self) -> String {
        format!("needs.{}.outputs.{}", self.build_job, self.version_var)
    }

    /// `-D<property>="${{ needs.<build job>.outputs.version_<component> }}"`
    #[must_use]
    pub fn maven_property(&self) -> String {
        format!("-D{}=\"{}\"", self.property, expression(&self.output_ref()))
    }
}

/// Build jobs recorded so far, keyed by component
#[derive(Debug, Clone, Default)]
pub struct BuildJobs {
    jobs: IndexMap<String, String>,
}

impl BuildJobs {
    /// Record the build job of `component`
    pub fn record(&mut self, component: &str, job: &str) {
        self.jobs.insert(component.to_string(), job.to_string());
    }

    /// Build job of `component`, if already recorded
    #[must_use]
    pub fn get(&self, component: &str) -> Option<&str> {
        self.jobs.get(component).map(String::as_str)
    }

    /// `(component, build job)` pairs in recording order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.jobs.iter().map(|(c, j)| (c.as_str(), j.as_str()))
    }

    /// Bindings for every dependency of `component`.
    ///
    /// Dependencies are validated to precede their dependents, so every one
    /// has a recorded build job; any that does not is skipped.
    #[must_use]
    pub fn bindings_for(&self, component: &Component) -> Vec<DependencyBinding> {
        component
            .dependencies
            .iter()
            .filter_map(|dep| self.get(&dep.name).map(|job| DependencyBinding::new(dep, job)))
            .collect()
    }
}

/// Join the Maven properties of `bindings`, each preceded by a space
#[must_use]
pub fn maven_properties(bindings: &[DependencyBinding]) -> String {
    bindings
        .iter()
        .map(|b| format!(" {}", b.maven_property()))
        .collect()
}

/// Env entries exposing each dependency's version
#[must_use]
pub fn version_env(bindings: &[DependencyBinding]) -> Env {
    bindings
        .iter()
        .map(|b| (b.version_var.clone(), expression(&b.output_ref())))
        .collect()
}

/// The `run` script of the default build job
#[must_use]
pub fn default_build_command(component: &Component, bindings: &[DependencyBinding]) -> String {
    let mut command = String::from("mvn -B install");
    if let Some(opts) = &component.maven_opts {
        command.push(' ');
        command.push_str(opts);
    }
    command.push_str(&maven_properties(bindings));
    command
}

/// The `run` script of a templated job, one line per run element
#[must_use]
pub fn template_build_command(run: &[RunElement], bindings: &[DependencyBinding]) -> String {
    let properties = maven_properties(bindings);
    run.iter()
        .map(|element| match element {
            RunElement::Maven(goals) => format!("mvn -B {goals}{properties}\n"),
            RunElement::Shell(command) => format!("{command}\n"),
        })
        .collect()
}
