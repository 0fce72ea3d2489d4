//! Insertion-ordered job graph
//!
//! Jobs are added one at a time and every `needs` edge must point at a job
//! that is already in the graph. Insertion order is therefore a valid
//! topological order, and it is also the order in which jobs are emitted.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use xrepo_github::workflow::Job;

/// Jobs keyed by workflow job id, in emission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobGraph {
    jobs: IndexMap<String, Job>,
}

impl JobGraph {
    /// Create an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateJob`] if `name` is already present and
    /// [`Error::MissingDependency`] if a `needs` entry names a job that has
    /// not been added yet.
    pub fn insert(&mut self, name: impl Into<String>, job: Job) -> Result<()> {
        let name = name.into();
        if self.jobs.contains_key(&name) {
            return Err(Error::DuplicateJob { name });
        }
        if let Some(missing) = job.needs.iter().find(|n| !self.jobs.contains_key(*n)) {
            return Err(Error::MissingDependency {
                job: name,
                dependency: missing.clone(),
            });
        }
        self.jobs.insert(name, job);
        Ok(())
    }

    /// Whether a job with this id exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    /// Look up a job
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Job> {
        self.jobs.get(name)
    }

    /// Number of jobs
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the graph has no jobs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Every job id added so far, in insertion order
    #[must_use]
    pub fn job_names(&self) -> Vec<String> {
        self.jobs.keys().cloned().collect()
    }

    /// Consume the graph, yielding the jobs in insertion order
    #[must_use]
    pub fn into_jobs(self) -> IndexMap<String, Job> {
        self.jobs
    }
}
