//! Maven project manifest (`pom.xml`) reading.

use crate::error::{Error, Result};
use roxmltree::{Document, Node};
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest file name inside every module directory
pub const MANIFEST_FILE: &str = "pom.xml";

/// Group/artifact/version of one project
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinates {
    /// `groupId`
    pub group_id: String,
    /// `artifactId`
    pub artifact_id: String,
    /// `version`
    pub version: String,
}

impl Coordinates {
    /// Location of the project inside a local maven repository:
    /// `group/segments/artifact/segments/version`
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        self.group_id
            .split('.')
            .chain(self.artifact_id.split('.'))
            .chain(std::iter::once(self.version.as_str()))
            .collect()
    }
}

/// The parts of a manifest backup needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectManifest {
    /// Where the manifest was read from
    pub path: PathBuf,
    /// Effective coordinates, after `<parent>` fallback
    pub coordinates: Coordinates,
    /// Entries of `<modules>`, relative to the manifest's directory
    pub modules: Vec<String>,
}

impl ProjectManifest {
    /// Read a manifest from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not XML, or lacks a
    /// coordinate that `<parent>` does not supply either.
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(e, path, "read"))?;
        Self::parse(&text, path)
    }

    /// Parse manifest text; `path` is recorded and used in errors
    ///
    /// # Errors
    ///
    /// See [`ProjectManifest::read`].
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let document = Document::parse(text).map_err(|source| Error::ManifestXml {
            path: path.to_path_buf(),
            source,
        })?;
        let project = document.root_element();
        let parent = child(project, "parent");

        let coordinate = |element: &'static str| {
            child_text(project, element)
                .or_else(|| parent.and_then(|p| child_text(p, element)))
                .ok_or_else(|| Error::Manifest {
                    path: path.to_path_buf(),
                    element,
                })
        };
        let coordinates = Coordinates {
            group_id: coordinate("groupId")?,
            artifact_id: coordinate("artifactId")?,
            version: coordinate("version")?,
        };

        let modules = child(project, "modules")
            .map(|modules| {
                modules
                    .children()
                    .filter(|n| n.has_tag_name("module"))
                    .filter_map(|n| n.text())
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            coordinates,
            modules,
        })
    }

    /// Manifest paths of the direct child modules
    #[must_use]
    pub fn module_manifests(&self) -> Vec<PathBuf> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        self.modules
            .iter()
            .map(|m| dir.join(m).join(MANIFEST_FILE))
            .collect()
    }
}

/// Coordinates of `root_pom` and, recursively, of all its modules, parents
/// before children.
///
/// # Errors
///
/// Returns the first manifest that cannot be read.
pub fn collect_coordinates(root_pom: &Path) -> Result<Vec<Coordinates>> {
    let mut found = Vec::new();
    let mut pending = vec![root_pom.to_path_buf()];
    while let Some(path) = pending.pop() {
        let manifest = ProjectManifest::read(&path)?;
        // reversed so the first module is read next
        pending.extend(manifest.module_manifests().into_iter().rev());
        found.push(manifest.coordinates);
    }
    Ok(found)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <parent>
        <groupId>org.acme</groupId>
        <artifactId>acme-parent</artifactId>
        <version>7</version>
    </parent>
    <artifactId>acme.core</artifactId>
    <version>1.0.0-SNAPSHOT</version>
    <dependencies>
        <dependency>
            <groupId>junit</groupId>
            <artifactId>junit</artifactId>
            <version>4.13</version>
        </dependency>
    </dependencies>
    <modules>
        <module>api</module>
        <module> impl </module>
    </modules>
</project>
"#;

    #[test]
    fn test_parent_fallback_and_modules() {
        let manifest = ProjectManifest::parse(POM, Path::new("/src/pom.xml")).unwrap();
        assert_eq!(
            manifest.coordinates,
            Coordinates {
                group_id: "org.acme".into(),
                artifact_id: "acme.core".into(),
                version: "1.0.0-SNAPSHOT".into(),
            }
        );
        assert_eq!(manifest.modules, vec!["api", "impl"]);
        assert_eq!(
            manifest.module_manifests(),
            vec![
                PathBuf::from("/src/api/pom.xml"),
                PathBuf::from("/src/impl/pom.xml"),
            ]
        );
    }

    #[test]
    fn test_relative_path_splits_group_and_artifact() {
        let manifest = ProjectManifest::parse(POM, Path::new("pom.xml")).unwrap();
        assert_eq!(
            manifest.coordinates.relative_path(),
            PathBuf::from("org/acme/acme/core/1.0.0-SNAPSHOT")
        );
    }

    #[test]
    fn test_missing_coordinate() {
        let err = ProjectManifest::parse(
            "<project><artifactId>x</artifactId></project>",
            Path::new("pom.xml"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Manifest { element: "groupId", .. }));
    }

    #[test]
    fn test_not_xml() {
        let err = ProjectManifest::parse("<project>", Path::new("pom.xml")).unwrap_err();
        assert!(matches!(err, Error::ManifestXml { .. }));
    }
}
