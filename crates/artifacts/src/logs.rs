//! Collecting build logs and failed test reports for upload.

use crate::error::{Error, Result};
use roxmltree::Document;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const SUREFIRE_DIR: &str = "surefire-reports";

/// Copy `*.log` files and failed surefire reports from `input` into `output`,
/// keeping their relative layout. `output` may live inside `input`; it is not
/// walked. Returns the copied files' new paths.
///
/// # Errors
///
/// Fails if `input` is not a directory or on I/O errors.
pub fn copy_logs(input: &Path, output: &Path) -> Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Err(Error::invalid_path(
            "Input path does not exist or is not a directory",
            input,
        ));
    }
    let input = std::path::absolute(input).map_err(|e| Error::io(e, input, "absolute"))?;
    let output = std::path::absolute(output).map_err(|e| Error::io(e, output, "absolute"))?;
    fs::create_dir_all(&output).map_err(|e| Error::io(e, &output, "create_dir_all"))?;

    let mut copied = Vec::new();
    let walker = WalkDir::new(&input)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.path() != output);
    for entry in walker.filter_map(std::result::Result::ok) {
        if !entry.file_type().is_file() || !wanted(entry.path()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&input) else {
            continue;
        };
        let target = output.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create_dir_all"))?;
        }
        debug!(from = %entry.path().display(), to = %target.display(), "Copying log");
        fs::copy(entry.path(), &target).map_err(|e| Error::io(e, &target, "copy"))?;
        copied.push(target);
    }
    Ok(copied)
}

fn wanted(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.ends_with(".log") {
        return true;
    }
    let in_surefire = path
        .parent()
        .and_then(|p| p.file_name())
        .is_some_and(|n| n == SUREFIRE_DIR);
    in_surefire
        && name.starts_with("TEST-")
        && name.ends_with(".xml")
        && report_failed(path)
}

/// A report counts as failed unless it is a readable `<testsuite>` with zero
/// failures and zero errors.
fn report_failed(path: &Path) -> bool {
    let Ok(text) = fs::read_to_string(path) else {
        warn!(path = %path.display(), "Unreadable test report, copying it anyway");
        return true;
    };
    let Ok(document) = Document::parse(&text) else {
        warn!(path = %path.display(), "Test report is not valid XML, copying it anyway");
        return true;
    };
    let suite = document.root_element();
    if !suite.has_tag_name("testsuite") {
        warn!(path = %path.display(), "Not a surefire report, copying it anyway");
        return true;
    }
    let count = |attr: &str| suite.attribute(attr).map(str::trim);
    !(count("failures") == Some("0") && count("errors") == Some("0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PASSED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="https://maven.apache.org/surefire/maven-surefire-plugin/xsd/surefire-test-report.xsd" name="a.BTest" tests="3" errors="0" skipped="0" failures="0">
</testsuite>
"#;

    const FAILED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="a.CTest" tests="3" errors="0" skipped="0" failures="1">
  <testcase name="x"><failure message="boom"/></testcase>
</testsuite>
"#;

    #[test]
    fn test_report_classification() {
        let dir = TempDir::new().unwrap();
        let passed = dir.path().join("TEST-pass.xml");
        let failed = dir.path().join("TEST-fail.xml");
        let garbage = dir.path().join("TEST-garbage.xml");
        fs::write(&passed, PASSED).unwrap();
        fs::write(&failed, FAILED).unwrap();
        fs::write(&garbage, "not xml <").unwrap();

        assert!(!report_failed(&passed));
        assert!(report_failed(&failed));
        assert!(report_failed(&garbage));
    }

    #[test]
    fn test_copy_logs_selects_files_and_skips_output() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let reports = root.join("module/target/surefire-reports");
        fs::create_dir_all(&reports).unwrap();
        fs::write(root.join("build.log"), "log").unwrap();
        fs::write(root.join("module/target/notes.txt"), "no").unwrap();
        fs::write(reports.join("TEST-pass.xml"), PASSED).unwrap();
        fs::write(reports.join("TEST-fail.xml"), FAILED).unwrap();
        fs::write(reports.join("other.xml"), FAILED).unwrap();

        let output = root.join(".project-build-logs/job");
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("previous.log"), "old").unwrap();

        let copied = copy_logs(root, &output).unwrap();

        let mut relative: Vec<_> = copied
            .iter()
            .map(|p| p.strip_prefix(&output).unwrap().to_path_buf())
            .collect();
        relative.sort();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("build.log"),
                PathBuf::from("module/target/surefire-reports/TEST-fail.xml"),
            ]
        );
    }

    #[test]
    fn test_copy_logs_requires_directory() {
        let dir = TempDir::new().unwrap();
        let err = copy_logs(&dir.path().join("missing"), dir.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }
}
