//! The workflow trigger document: which components to build, from where,
//! and how their versions feed into each other.

use crate::env::Env;
use crate::error::{Error, Result};
use crate::fields::{Fields, parse_document, read_document};
use serde_yaml::Value;
use std::path::Path;
use tracing::info;

/// Env applied when the trigger document has no `env` entry
pub const DEFAULT_MAVEN_OPTS: &str = "-Xms756M -Xmx1g";

/// Root of one compiler run
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerConfig {
    /// Workflow name
    pub name: String,
    /// Workflow-level env
    pub env: Env,
    /// Components in declaration order
    pub components: Vec<Component>,
}

/// One repository taking part in the build
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Unique name; alphabetic characters and `-` only
    pub name: String,
    /// GitHub organisation (or user) owning the repository
    pub org: String,
    /// Branch to check out
    pub branch: String,
    /// Extra options for the default maven invocation
    pub maven_opts: Option<String>,
    /// Run only the build job and attach an interactive debug session
    pub debug: bool,
    /// Toolchain version override
    pub java_version: Option<String>,
    /// Components whose versions this one consumes
    pub dependencies: Vec<Dependency>,
}

/// A version edge to an earlier component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Name of the component depended upon
    pub name: String,
    /// Build property receiving that component's version
    pub property: String,
}

impl TriggerConfig {
    /// Read and parse a trigger document
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid trigger document.
    pub fn load(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "Parsing workflow trigger");
        Self::parse(&read_document(path)?)
    }

    /// Parse a trigger document from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid trigger document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Self::parse(&parse_document(text, "workflow trigger")?)
    }

    /// Parse an already loaded document
    ///
    /// # Errors
    ///
    /// Returns an error on unknown keys, missing or mistyped values, and
    /// dependencies on components that have not been declared yet.
    pub fn parse(value: &Value) -> Result<Self> {
        let mut fields = Fields::new(value, "workflow trigger")?;
        let name = fields.required_str("name")?;
        let env = fields.optional_env("env")?.unwrap_or_else(default_env);
        let components_value = fields.required("components")?;
        fields.finish()?;

        let Value::Sequence(entries) = components_value else {
            return Err(Error::invalid_type(
                "components",
                "workflow trigger",
                "a list",
                &components_value,
            ));
        };

        let mut components: Vec<Component> = Vec::with_capacity(entries.len());
        for entry in &entries {
            let component = parse_component(entry)?;
            for dependency in &component.dependencies {
                if !components.iter().any(|c| c.name == dependency.name) {
                    return Err(Error::UnresolvedReference {
                        referrer: format!("Component '{}'", component.name),
                        kind: "component",
                        name: dependency.name.clone(),
                    });
                }
            }
            if components.iter().any(|c| c.name == component.name) {
                return Err(Error::invalid(format!(
                    "Component '{}' is declared more than once",
                    component.name
                )));
            }
            components.push(component);
        }

        Ok(Self {
            name,
            env,
            components,
        })
    }

    /// Look up a component by name
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }
}

fn default_env() -> Env {
    Env::from([("MAVEN_OPTS".to_string(), DEFAULT_MAVEN_OPTS.to_string())])
}

fn parse_component(value: &Value) -> Result<Component> {
    let mut fields = Fields::new(value, "a components entry")?;
    let name = fields.required_str("name")?;
    validate_component_name(&name)?;
    let org = fields.required_str("org")?;
    let branch = fields.required_str("branch")?;
    let maven_opts = fields.optional_str("mavenOpts")?;
    let debug = fields.optional_bool("debug")?.unwrap_or(false);
    let java_version = fields.java_version()?;
    let dependencies = fields
        .optional_list("dependencies")?
        .unwrap_or_default()
        .iter()
        .map(parse_dependency)
        .collect::<Result<Vec<_>>>()?;
    fields.finish()?;

    Ok(Component {
        name,
        org,
        branch,
        maven_opts,
        debug,
        java_version,
        dependencies,
    })
}

fn parse_dependency(value: &Value) -> Result<Dependency> {
    let mut fields = Fields::new(value, "a dependencies entry")?;
    let name = fields.required_str("name")?;
    let property = fields.required_str("property")?;
    fields.finish()?;
    Ok(Dependency { name, property })
}

fn validate_component_name(name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_alphabetic() || c == '-') {
        return Err(Error::invalid(format!(
            "Illegal component name '{name}'. Only alphabetic characters or '-' are allowed"
        )));
    }
    Ok(())
}
