//! Depth-first directory traversal with per-entry callbacks.
//!
//! Entries are visited in file-name order. A directory's
//! [`TreeVisitor::post_directory`] runs after all of its children, which is
//! what lets split and merge act on a directory whose contents are already in
//! place.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// What to do after [`TreeVisitor::pre_directory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Descend into the directory
    Continue,
    /// Skip its children and its `post_directory` callback
    SkipSubtree,
}

/// Callbacks for [`walk_tree`]. All default to no-ops.
pub trait TreeVisitor {
    /// Called before a directory's children
    ///
    /// # Errors
    ///
    /// Any error aborts the walk.
    fn pre_directory(&mut self, _dir: &Path) -> Result<Visit> {
        Ok(Visit::Continue)
    }

    /// Called for every non-directory entry
    ///
    /// # Errors
    ///
    /// Any error aborts the walk.
    fn visit_file(&mut self, _file: &Path) -> Result<()> {
        Ok(())
    }

    /// Called after a directory's children
    ///
    /// # Errors
    ///
    /// Any error aborts the walk.
    fn post_directory(&mut self, _dir: &Path) -> Result<()> {
        Ok(())
    }
}

/// Walk `root`, which must be a directory.
///
/// # Errors
///
/// Returns the first error raised by reading a directory or by a callback.
pub fn walk_tree<V: TreeVisitor + ?Sized>(root: &Path, visitor: &mut V) -> Result<()> {
    if visitor.pre_directory(root)? == Visit::SkipSubtree {
        return Ok(());
    }
    for entry in sorted_entries(root)? {
        if entry.is_dir() {
            walk_tree(&entry, visitor)?;
        } else {
            visitor.visit_file(&entry)?;
        }
    }
    visitor.post_directory(root)
}

/// Direct children of `dir`, sorted by name
pub(crate) fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| Error::io(e, dir, "read_dir"))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::io(e, dir, "read_dir"))?;
    entries.sort();
    Ok(entries)
}
