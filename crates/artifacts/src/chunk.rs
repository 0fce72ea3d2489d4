//! Splitting large files into size-bounded parts and putting them back
//! together.
//!
//! A file `name` above the threshold is replaced by a directory
//! `name.split.file.dir/` holding parts `xx.00`, `xx.01`, ... and a
//! `reassemble.sh` script. Merging concatenates the parts in index order into
//! `name` next to the directory and removes the directory.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix marking a directory of parts
pub const SPLIT_DIR_SUFFIX: &str = ".split.file.dir";

/// Part size used by generated jobs: 49 MiB, below the 50 MiB soft limit git
/// hosting applies to committed files
pub const DEFAULT_THRESHOLD: u64 = 49 * 1024 * 1024;

/// Two-digit part indices address at most this many parts
pub const MAX_PARTS: usize = 100;

/// Name of the script written into every split directory
pub const REASSEMBLE_SCRIPT: &str = "reassemble.sh";

/// Splits and merges files around a size threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkCodec {
    threshold: u64,
}

impl Default for ChunkCodec {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ChunkCodec {
    /// Codec with a custom part size. A zero threshold is treated as one byte.
    #[must_use]
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    /// Maximum size of a file left intact, and of every part
    #[must_use]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Split `file` if it is larger than the threshold.
    ///
    /// Returns the split directory, or `None` when the file was small enough
    /// to be left alone. A stale split directory for the same file is
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capacity`] before touching the filesystem if the file
    /// would need more than [`MAX_PARTS`] parts, and I/O errors otherwise.
    pub fn split(&self, file: &Path) -> Result<Option<PathBuf>> {
        let size = fs::metadata(file)
            .map_err(|e| Error::io(e, file, "metadata"))?
            .len();
        if size <= self.threshold {
            return Ok(None);
        }

        let parts = size.div_ceil(self.threshold);
        if parts > MAX_PARTS as u64 {
            return Err(Error::Capacity {
                path: file.to_path_buf(),
                size,
                parts,
                max_parts: MAX_PARTS,
            });
        }

        let split_dir = split_dir_for(file);
        debug!(file = %file.display(), dir = %split_dir.display(), parts, "Splitting file");
        if split_dir.exists() {
            fs::remove_dir_all(&split_dir)
                .map_err(|e| Error::io(e, &split_dir, "remove_dir_all"))?;
        }
        fs::create_dir_all(&split_dir).map_err(|e| Error::io(e, &split_dir, "create_dir_all"))?;
        write_reassemble_script(&split_dir, &file_name(file))?;

        let mut source = File::open(file).map_err(|e| Error::io(e, file, "open"))?;
        for index in 0..parts {
            let part_path = split_dir.join(part_name(index));
            let mut part = File::create(&part_path).map_err(|e| Error::io(e, &part_path, "create"))?;
            io::copy(&mut (&mut source).take(self.threshold), &mut part)
                .map_err(|e| Error::io(e, &part_path, "write"))?;
        }
        drop(source);

        fs::remove_file(file).map_err(|e| Error::io(e, file, "remove_file"))?;
        Ok(Some(split_dir))
    }

    /// Reassemble the file held by `dir`.
    ///
    /// Returns the reassembled file, or `None` if `dir` is not an existing
    /// split directory. Merging an already merged directory is therefore a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPart`] without writing anything if a part is
    /// missing while a later one exists, and I/O errors from reading parts or
    /// writing the target.
    pub fn merge(&self, dir: &Path) -> Result<Option<PathBuf>> {
        if !is_split_dir(dir) {
            return Ok(None);
        }
        let Some(target) = merged_path_for(dir) else {
            return Ok(None);
        };

        let present: Vec<bool> = (0..MAX_PARTS as u64)
            .map(|index| dir.join(part_name(index)).is_file())
            .collect();
        let parts = present.iter().position(|p| !p).unwrap_or(MAX_PARTS);
        if let Some(offset) = present[parts..].iter().position(|p| *p) {
            return Err(Error::MissingPart {
                dir: dir.to_path_buf(),
                missing: parts as u64,
                found: (parts + offset) as u64,
            });
        }
        debug!(dir = %dir.display(), file = %target.display(), parts, "Merging split file");

        let mut out = File::create(&target).map_err(|e| Error::io(e, &target, "create"))?;
        for index in 0..parts as u64 {
            let part_path = dir.join(part_name(index));
            let mut part = File::open(&part_path).map_err(|e| Error::io(e, &part_path, "open"))?;
            io::copy(&mut part, &mut out).map_err(|e| Error::io(e, &target, "write"))?;
        }
        drop(out);

        fs::remove_dir_all(dir).map_err(|e| Error::io(e, dir, "remove_dir_all"))?;
        Ok(Some(target))
    }
}

/// Whether `path` is an existing directory carrying the split suffix
#[must_use]
pub fn is_split_dir(path: &Path) -> bool {
    path.is_dir()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.len() > SPLIT_DIR_SUFFIX.len() && n.ends_with(SPLIT_DIR_SUFFIX))
}

/// The split directory that would hold the parts of `file`
#[must_use]
pub fn split_dir_for(file: &Path) -> PathBuf {
    let mut name = file.file_name().unwrap_or_default().to_os_string();
    name.push(SPLIT_DIR_SUFFIX);
    file.with_file_name(name)
}

/// The file a split directory reassembles into
#[must_use]
pub fn merged_path_for(dir: &Path) -> Option<PathBuf> {
    let name = dir.file_name()?.to_str()?;
    let base = name.strip_suffix(SPLIT_DIR_SUFFIX)?;
    (!base.is_empty()).then(|| dir.with_file_name(base))
}

fn part_name(index: u64) -> String {
    format!("xx.{index:02}")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn write_reassemble_script(dir: &Path, original: &str) -> Result<()> {
    let script = dir.join(REASSEMBLE_SCRIPT);
    let content = format!(
        "#!/bin/sh\n\
         # {original} was split because of its size. Run this script to reassemble it.\n\
         WORKING_DIR=$(dirname \"$0\")\n\
         cat \"${{WORKING_DIR}}\"/xx.?? > \"${{WORKING_DIR}}/../{original}\"\n\
         echo \"Reassembled ${{WORKING_DIR}}/../{original}\"\n"
    );
    fs::write(&script, content).map_err(|e| Error::io(e, &script, "write"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
            .map_err(|e| Error::io(e, &script, "set_permissions"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bytes(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_small_file_untouched() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("small.jar");
        fs::write(&file, bytes(10)).unwrap();

        assert!(ChunkCodec::new(10).split(&file).unwrap().is_none());
        assert_eq!(fs::read(&file).unwrap(), bytes(10));
        assert!(!split_dir_for(&file).exists());
    }

    #[test]
    fn test_split_layout() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("big.jar");
        fs::write(&file, bytes(120)).unwrap();

        let split = ChunkCodec::new(49).split(&file).unwrap().unwrap();

        assert_eq!(split, dir.path().join("big.jar.split.file.dir"));
        assert!(!file.exists());
        assert_eq!(fs::metadata(split.join("xx.00")).unwrap().len(), 49);
        assert_eq!(fs::metadata(split.join("xx.01")).unwrap().len(), 49);
        assert_eq!(fs::metadata(split.join("xx.02")).unwrap().len(), 22);
        assert!(!split.join("xx.03").exists());
        assert!(split.join(REASSEMBLE_SCRIPT).is_file());
    }

    #[test]
    fn test_exact_multiple_has_no_empty_part() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("even.bin");
        fs::write(&file, bytes(100)).unwrap();

        let split = ChunkCodec::new(50).split(&file).unwrap().unwrap();
        assert!(split.join("xx.01").exists());
        assert!(!split.join("xx.02").exists());
    }

    #[test]
    fn test_too_many_parts_is_fatal_and_leaves_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("huge.bin");
        fs::write(&file, bytes(101)).unwrap();

        let err = ChunkCodec::new(1).split(&file).unwrap_err();
        assert!(matches!(err, Error::Capacity { parts: 101, .. }), "{err}");
        assert!(file.exists());
        assert!(!split_dir_for(&file).exists());
    }

    #[test]
    fn test_merge_restores_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("big.jar");
        fs::write(&file, bytes(300)).unwrap();

        let codec = ChunkCodec::new(64);
        let split = codec.split(&file).unwrap().unwrap();
        assert_eq!(codec.merge(&split).unwrap(), Some(file.clone()));
        assert_eq!(fs::read(&file).unwrap(), bytes(300));
        assert!(!split.exists());

        assert_eq!(codec.merge(&split).unwrap(), None);
        assert_eq!(fs::read(&file).unwrap(), bytes(300));
    }

    #[test]
    fn test_merge_ignores_plain_directories() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("plain");
        fs::create_dir(&plain).unwrap();
        assert_eq!(ChunkCodec::default().merge(&plain).unwrap(), None);
        assert!(plain.exists());
    }

    #[test]
    fn test_merge_with_missing_part_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("big.jar");
        fs::write(&file, bytes(150)).unwrap();

        let codec = ChunkCodec::new(50);
        let split = codec.split(&file).unwrap().unwrap();
        fs::remove_file(split.join("xx.01")).unwrap();

        let err = codec.merge(&split).unwrap_err();
        assert!(
            matches!(err, Error::MissingPart { missing: 1, found: 2, .. }),
            "{err}"
        );
        assert!(!file.exists());
        assert!(split.join("xx.00").exists());
    }

    #[test]
    fn test_resplit_replaces_stale_parts() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("big.jar");
        let stale = split_dir_for(&file);
        fs::create_dir(&stale).unwrap();
        fs::write(stale.join("xx.05"), "stale").unwrap();
        fs::write(&file, bytes(20)).unwrap();

        ChunkCodec::new(8).split(&file).unwrap();
        assert!(!stale.join("xx.05").exists());
    }

    #[test]
    fn test_merged_path_for() {
        assert_eq!(
            merged_path_for(Path::new("/r/a.jar.split.file.dir")),
            Some(PathBuf::from("/r/a.jar"))
        );
        assert_eq!(merged_path_for(Path::new("/r/.split.file.dir")), None);
        assert_eq!(merged_path_for(Path::new("/r/a.jar")), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_reassemble_script_rebuilds_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("big.jar");
        fs::write(&file, bytes(130)).unwrap();
        let split = ChunkCodec::new(40).split(&file).unwrap().unwrap();
        let script = split.join(REASSEMBLE_SCRIPT);

        let mode = fs::metadata(&script).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        assert!(fs::read_to_string(&script).unwrap().starts_with("#!/bin/sh\n"));

        let status = std::process::Command::new("sh")
            .arg(&script)
            .status()
            .unwrap();
        assert!(status.success());
        assert_eq!(fs::read(&file).unwrap(), bytes(130));
    }
}
