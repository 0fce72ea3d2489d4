//! Where per-component job templates come from.

use crate::error::Result;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use xrepo_config::ComponentJobsConfig;

/// Default template directory, relative to the repository root
pub const DEFAULT_TEMPLATE_DIR: &str = ".repo-config/component-jobs";

/// File extensions tried in order when looking up a template
pub const TEMPLATE_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// A parsed template together with a description of where it was found
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Path or other human-readable origin
    pub origin: String,
    /// The parsed template
    pub config: ComponentJobsConfig,
}

/// Lookup of job templates by component name
pub trait TemplateSource {
    /// Load the template for `component`, or `None` if it has none.
    ///
    /// # Errors
    ///
    /// Returns an error if a template exists but cannot be read or parsed.
    fn load(&self, component: &str) -> Result<Option<Template>>;
}

/// Templates stored as `<dir>/<component>.yml` (or `.yaml`)
#[derive(Debug, Clone)]
pub struct DirectoryTemplates {
    dir: PathBuf,
}

impl DirectoryTemplates {
    /// Look for templates in `dir`; the directory does not need to exist
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The searched directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The first existing template file for `component`
    #[must_use]
    pub fn path_for(&self, component: &str) -> Option<PathBuf> {
        TEMPLATE_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{component}.{ext}")))
            .find(|path| path.is_file())
    }
}

impl TemplateSource for DirectoryTemplates {
    fn load(&self, component: &str) -> Result<Option<Template>> {
        let Some(path) = self.path_for(component) else {
            debug!(component, dir = %self.dir.display(), "No job template, using default build job");
            return Ok(None);
        };
        let config = ComponentJobsConfig::load(component, &path)?;
        Ok(Some(Template {
            origin: path.display().to_string(),
            config,
        }))
    }
}

/// Templates held as YAML text, keyed by component
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplates {
    documents: IndexMap<String, String>,
}

impl InMemoryTemplates {
    /// No templates
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the template text for `component`
    #[must_use]
    pub fn with_template(mut self, component: impl Into<String>, yaml: impl Into<String>) -> Self {
        self.documents.insert(component.into(), yaml.into());
        self
    }
}

impl TemplateSource for InMemoryTemplates {
    fn load(&self, component: &str) -> Result<Option<Template>> {
        self.documents
            .get(component)
            .map(|yaml| -> Result<Template> {
                Ok(Template {
                    origin: format!("in-memory template for '{component}'"),
                    config: ComponentJobsConfig::from_yaml(component, yaml)?,
                })
            })
            .transpose()
    }
}
