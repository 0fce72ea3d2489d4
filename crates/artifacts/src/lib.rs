//! Build state hand-off between isolated CI jobs.
//!
//! Jobs share nothing but a git side branch. A build job backs up what it
//! installed into the local maven repository ([`backup`]), the backup is
//! committed, and downstream jobs overlay every component backup onto their
//! own repository before building ([`overlay`]). Files too large to commit are
//! split into parts on the way in and merged on the way out ([`ChunkCodec`]).

pub mod backup;
pub mod chunk;
pub mod copy;
pub mod error;
pub mod logs;
pub mod pom;
pub mod walk;

pub use backup::{BackupReport, backup, overlay};
pub use chunk::{
    ChunkCodec, DEFAULT_THRESHOLD, MAX_PARTS, REASSEMBLE_SCRIPT, SPLIT_DIR_SUFFIX, is_split_dir,
    split_dir_for,
};
pub use copy::{LargeFileAction, copy_tree};
pub use error::{Error, Result};
pub use logs::copy_logs;
pub use pom::{Coordinates, MANIFEST_FILE, ProjectManifest, collect_coordinates};
pub use walk::{TreeVisitor, Visit, walk_tree};

use std::path::Path;

/// Split every oversized file below `dir`.
///
/// # Errors
///
/// Returns the first I/O or capacity error.
pub fn split_large_files(dir: &Path, codec: ChunkCodec) -> Result<usize> {
    struct Splitter {
        codec: ChunkCodec,
        count: usize,
    }
    impl TreeVisitor for Splitter {
        fn pre_directory(&mut self, dir: &Path) -> Result<Visit> {
            // already split
            if is_split_dir(dir) {
                return Ok(Visit::SkipSubtree);
            }
            Ok(Visit::Continue)
        }

        fn visit_file(&mut self, file: &Path) -> Result<()> {
            if self.codec.split(file)?.is_some() {
                self.count += 1;
            }
            Ok(())
        }
    }

    let mut splitter = Splitter { codec, count: 0 };
    walk_tree(dir, &mut splitter)?;
    Ok(splitter.count)
}

/// Merge every split directory below `dir`.
///
/// # Errors
///
/// Returns the first I/O error.
pub fn merge_large_files(dir: &Path, codec: ChunkCodec) -> Result<usize> {
    struct Merger {
        codec: ChunkCodec,
        count: usize,
    }
    impl TreeVisitor for Merger {
        fn post_directory(&mut self, dir: &Path) -> Result<()> {
            if self.codec.merge(dir)?.is_some() {
                self.count += 1;
            }
            Ok(())
        }
    }

    let mut merger = Merger { codec, count: 0 };
    walk_tree(dir, &mut merger)?;
    Ok(merger.count)
}
