//! Moving built artifacts between a local maven repository and a backup
//! tree that travels through git.
//!
//! A backup holds one subdirectory per component, each mirroring the
//! coordinate paths of the projects that component built. Files above the
//! chunk threshold are stored split, and reassembled on overlay.

use crate::chunk::{ChunkCodec, SPLIT_DIR_SUFFIX};
use crate::copy::{LargeFileAction, copy_tree};
use crate::error::{Error, Result};
use crate::pom::{Coordinates, collect_coordinates};
use crate::walk::sorted_entries;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Outcome of [`backup`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupReport {
    /// Projects copied into the backup
    pub copied: Vec<Coordinates>,
    /// Projects with no directory in the maven repository
    pub skipped: Vec<Coordinates>,
}

/// Copy everything the project rooted at `root_pom` installed into
/// `maven_repo` over to `backup_dir`, which is cleared first.
///
/// # Errors
///
/// Fails if `root_pom` or `maven_repo` do not exist, if a manifest cannot be
/// read, or on I/O and chunking errors. Missing module directories are
/// skipped with a warning.
pub fn backup(
    root_pom: &Path,
    maven_repo: &Path,
    backup_dir: &Path,
    codec: ChunkCodec,
) -> Result<BackupReport> {
    if !root_pom.is_file() {
        return Err(Error::invalid_path("Root pom does not exist", root_pom));
    }
    if !maven_repo.is_dir() {
        return Err(Error::invalid_path(
            "Maven repository does not exist or is not a directory",
            maven_repo,
        ));
    }

    let coordinates = collect_coordinates(root_pom)?;
    info!(
        root_pom = %root_pom.display(),
        projects = coordinates.len(),
        backup = %backup_dir.display(),
        "Backing up maven artifacts"
    );

    if backup_dir.exists() {
        fs::remove_dir_all(backup_dir).map_err(|e| Error::io(e, backup_dir, "remove_dir_all"))?;
    }
    fs::create_dir_all(backup_dir).map_err(|e| Error::io(e, backup_dir, "create_dir_all"))?;

    let mut report = BackupReport::default();
    for coordinate in coordinates {
        let relative = coordinate.relative_path();
        let source = maven_repo.join(&relative);
        if !source.is_dir() {
            warn!(path = %source.display(), "Cannot find module directory, skipping");
            report.skipped.push(coordinate);
            continue;
        }
        let target = backup_dir.join(&relative);
        fs::create_dir_all(&target).map_err(|e| Error::io(e, &target, "create_dir_all"))?;
        copy_tree(&source, &target, LargeFileAction::Split, codec)?;
        report.copied.push(coordinate);
    }
    Ok(report)
}

/// Replace the matching parts of `maven_repo` with every component backup
/// found under `backups_root`.
///
/// Each directory the backup writes into is deleted from the repository
/// before copying, so stale files from an earlier build of the same
/// coordinate do not survive. Running it twice gives the same result as
/// running it once. Returns the component backups applied, in name order.
///
/// # Errors
///
/// Fails if either root is missing, or on I/O and chunking errors.
pub fn overlay(maven_repo: &Path, backups_root: &Path, codec: ChunkCodec) -> Result<Vec<PathBuf>> {
    if !maven_repo.is_dir() {
        return Err(Error::invalid_path(
            "Maven repository does not exist or is not a directory",
            maven_repo,
        ));
    }
    if !backups_root.is_dir() {
        return Err(Error::invalid_path(
            "Backups folder does not exist or is not a directory",
            backups_root,
        ));
    }

    let mut applied = Vec::new();
    for component in sorted_entries(backups_root)? {
        if !component.is_dir() {
            continue;
        }
        info!(backup = %component.display(), "Overlaying backed up artifacts");
        for stale in directories_written_by(&component, maven_repo)? {
            if stale.exists() {
                debug!(path = %stale.display(), "Removing stale artifacts");
                fs::remove_dir_all(&stale).map_err(|e| Error::io(e, &stale, "remove_dir_all"))?;
            }
        }
        copy_tree(&component, maven_repo, LargeFileAction::Merge, codec)?;
        applied.push(component);
    }
    Ok(applied)
}

/// Repository directories that hold a file from `backup`. Files inside a
/// split directory count for the directory the merged file lands in.
fn directories_written_by(backup: &Path, maven_repo: &Path) -> Result<BTreeSet<PathBuf>> {
    let mut dirs = BTreeSet::new();
    for entry in WalkDir::new(backup).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(backup).to_path_buf();
            Error::io(e.into(), path, "walk")
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        let Some(mut parent) = entry.path().parent() else {
            continue;
        };
        if parent
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(SPLIT_DIR_SUFFIX))
        {
            parent = parent.parent().unwrap_or(parent);
        }
        let Ok(relative) = parent.strip_prefix(backup) else {
            continue;
        };
        // never wipe the repository root itself
        if relative.as_os_str().is_empty() {
            continue;
        }
        dirs.insert(maven_repo.join(relative));
    }
    Ok(dirs)
}
