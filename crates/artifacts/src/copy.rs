//! Recursive copy with optional large-file handling.

use crate::chunk::{ChunkCodec, is_split_dir};
use crate::error::{Error, Result};
use crate::walk::{TreeVisitor, Visit, sorted_entries, walk_tree};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What happens to large files while copying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LargeFileAction {
    /// Plain copy
    #[default]
    None,
    /// Split files above the threshold once their directory is copied
    Split,
    /// Reassemble split directories once their parts are copied
    Merge,
}

/// Copy the contents of `source` into `target`, creating directories as
/// needed and replacing files that already exist.
///
/// # Errors
///
/// Returns the first I/O or chunking error.
pub fn copy_tree(
    source: &Path,
    target: &Path,
    action: LargeFileAction,
    codec: ChunkCodec,
) -> Result<()> {
    let mut visitor = CopyVisitor {
        source,
        target,
        action,
        codec,
    };
    walk_tree(source, &mut visitor)
}

struct CopyVisitor<'a> {
    source: &'a Path,
    target: &'a Path,
    action: LargeFileAction,
    codec: ChunkCodec,
}

impl CopyVisitor<'_> {
    fn target_for(&self, path: &Path) -> Result<PathBuf> {
        let relative = path
            .strip_prefix(self.source)
            .map_err(|_| Error::invalid_path("Path escapes the copy source", path))?;
        Ok(self.target.join(relative))
    }
}

impl TreeVisitor for CopyVisitor<'_> {
    fn pre_directory(&mut self, dir: &Path) -> Result<Visit> {
        let target = self.target_for(dir)?;
        fs::create_dir_all(&target).map_err(|e| Error::io(e, &target, "create_dir_all"))?;
        Ok(Visit::Continue)
    }

    fn visit_file(&mut self, file: &Path) -> Result<()> {
        let target = self.target_for(file)?;
        debug!(from = %file.display(), to = %target.display(), "Copying");
        if target.exists() {
            fs::remove_file(&target).map_err(|e| Error::io(e, &target, "remove_file"))?;
        }
        fs::copy(file, &target).map_err(|e| Error::io(e, &target, "copy"))?;
        Ok(())
    }

    fn post_directory(&mut self, dir: &Path) -> Result<()> {
        let target = self.target_for(dir)?;
        match self.action {
            LargeFileAction::None => {}
            LargeFileAction::Merge => {
                if is_split_dir(dir) {
                    self.codec.merge(&target)?;
                }
            }
            LargeFileAction::Split => {
                for entry in sorted_entries(&target)? {
                    if entry.is_file() {
                        self.codec.split(&entry)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::split_dir_for;
    use tempfile::TempDir;

    #[test]
    fn test_plain_copy_replaces_existing() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("a/b")).unwrap();
        fs::write(src.path().join("a/b/f.txt"), "new").unwrap();
        fs::create_dir_all(dst.path().join("a/b")).unwrap();
        fs::write(dst.path().join("a/b/f.txt"), "old").unwrap();
        fs::write(dst.path().join("a/keep.txt"), "keep").unwrap();

        copy_tree(
            src.path(),
            dst.path(),
            LargeFileAction::None,
            ChunkCodec::default(),
        )
        .unwrap();

        assert_eq!(fs::read_to_string(dst.path().join("a/b/f.txt")).unwrap(), "new");
        assert!(dst.path().join("a/keep.txt").exists());
    }

    #[test]
    fn test_split_then_merge_copy() {
        let src = TempDir::new().unwrap();
        let mid = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let codec = ChunkCodec::new(16);
        fs::create_dir_all(src.path().join("g/a/1.0")).unwrap();
        fs::write(src.path().join("g/a/1.0/a.jar"), vec![7u8; 40]).unwrap();
        fs::write(src.path().join("g/a/1.0/a.pom"), "pom").unwrap();

        copy_tree(src.path(), mid.path(), LargeFileAction::Split, codec).unwrap();
        let jar = mid.path().join("g/a/1.0/a.jar");
        assert!(!jar.exists());
        assert!(split_dir_for(&jar).is_dir());
        assert!(mid.path().join("g/a/1.0/a.pom").is_file());
        // source is never modified
        assert!(src.path().join("g/a/1.0/a.jar").is_file());

        copy_tree(mid.path(), dst.path(), LargeFileAction::Merge, codec).unwrap();
        assert_eq!(fs::read(dst.path().join("g/a/1.0/a.jar")).unwrap(), vec![7u8; 40]);
        assert!(!split_dir_for(&dst.path().join("g/a/1.0/a.jar")).exists());
    }
}
