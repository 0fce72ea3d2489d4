//! Backup, overlay and chunking working together

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;
use xrepo_artifacts::{
    ChunkCodec, Coordinates, backup, merge_large_files, overlay, split_dir_for,
    split_large_files,
};

const ROOT_POM: &str = r"<project>
  <groupId>org.acme</groupId>
  <artifactId>core-parent</artifactId>
  <version>1.0</version>
  <modules>
    <module>api</module>
    <module>missing</module>
  </modules>
</project>
";

const API_POM: &str = r"<project>
  <parent>
    <groupId>org.acme</groupId>
    <artifactId>core-parent</artifactId>
    <version>1.0</version>
  </parent>
  <artifactId>core-api</artifactId>
</project>
";

const MISSING_POM: &str = r"<project>
  <parent>
    <groupId>org.acme</groupId>
    <artifactId>core-parent</artifactId>
    <version>1.0</version>
  </parent>
  <artifactId>never-installed</artifactId>
</project>
";

/// Relative path -> content of every file below `root`
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            (
                e.path().strip_prefix(root).unwrap().to_path_buf(),
                fs::read(e.path()).unwrap(),
            )
        })
        .collect()
}

struct Fixture {
    _dir: TempDir,
    source: PathBuf,
    built_repo: PathBuf,
    backups: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    fs::create_dir_all(source.join("api")).unwrap();
    fs::create_dir_all(source.join("missing")).unwrap();
    fs::write(source.join("pom.xml"), ROOT_POM).unwrap();
    fs::write(source.join("api/pom.xml"), API_POM).unwrap();
    fs::write(source.join("missing/pom.xml"), MISSING_POM).unwrap();

    let built_repo = dir.path().join("built-repo");
    let parent = built_repo.join("org/acme/core-parent/1.0");
    let api = built_repo.join("org/acme/core-api/1.0");
    fs::create_dir_all(&parent).unwrap();
    fs::create_dir_all(&api).unwrap();
    fs::write(parent.join("core-parent-1.0.pom"), "parent pom").unwrap();
    fs::write(api.join("core-api-1.0.pom"), "api pom").unwrap();
    fs::write(api.join("core-api-1.0.jar"), vec![42u8; 100]).unwrap();
    // unrelated artifact that must not be backed up
    fs::create_dir_all(built_repo.join("junit/junit/4.13")).unwrap();
    fs::write(built_repo.join("junit/junit/4.13/junit-4.13.jar"), "junit").unwrap();

    let backups = dir.path().join("repo-backups");
    Fixture {
        _dir: dir,
        source,
        built_repo,
        backups,
    }
}

#[test]
fn backup_copies_module_coordinates_and_splits_large_files() {
    let f = fixture();
    let codec = ChunkCodec::new(32);
    let target = f.backups.join("core");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("stale.txt"), "from a previous run").unwrap();

    let report = backup(&f.source.join("pom.xml"), &f.built_repo, &target, codec).unwrap();

    assert_eq!(report.copied.len(), 2);
    assert_eq!(
        report.skipped,
        vec![Coordinates {
            group_id: "org.acme".into(),
            artifact_id: "never-installed".into(),
            version: "1.0".into(),
        }]
    );
    assert!(!target.join("stale.txt").exists());
    assert!(!target.join("junit").exists());
    assert!(target.join("org/acme/core-parent/1.0/core-parent-1.0.pom").is_file());

    let jar = target.join("org/acme/core-api/1.0/core-api-1.0.jar");
    assert!(!jar.exists());
    assert!(split_dir_for(&jar).join("xx.03").is_file());
}

#[test]
fn overlay_restores_backup_and_is_idempotent() {
    let f = fixture();
    let codec = ChunkCodec::new(32);
    backup(
        &f.source.join("pom.xml"),
        &f.built_repo,
        &f.backups.join("core"),
        codec,
    )
    .unwrap();

    // A downstream runner: its own repository with a stale build of core-api
    let dir = TempDir::new().unwrap();
    let repo = dir.path();
    let stale_api = repo.join("org/acme/core-api/1.0");
    fs::create_dir_all(&stale_api).unwrap();
    fs::write(stale_api.join("core-api-1.0.jar"), "old jar").unwrap();
    fs::write(stale_api.join("leftover.sha1"), "old").unwrap();
    fs::create_dir_all(repo.join("junit/junit/4.13")).unwrap();
    fs::write(repo.join("junit/junit/4.13/junit-4.13.jar"), "junit").unwrap();

    let applied = overlay(repo, &f.backups, codec).unwrap();
    assert_eq!(applied, vec![f.backups.join("core")]);

    assert_eq!(
        fs::read(stale_api.join("core-api-1.0.jar")).unwrap(),
        vec![42u8; 100]
    );
    assert!(!stale_api.join("leftover.sha1").exists());
    assert!(!split_dir_for(&stale_api.join("core-api-1.0.jar")).exists());
    assert!(repo.join("junit/junit/4.13/junit-4.13.jar").exists());

    let once = snapshot(repo);
    overlay(repo, &f.backups, codec).unwrap();
    assert_eq!(snapshot(repo), once);

    // The backup itself is left split
    assert!(
        split_dir_for(&f.backups.join("core/org/acme/core-api/1.0/core-api-1.0.jar")).is_dir()
    );
}

#[test]
fn backup_requires_existing_inputs() {
    let f = fixture();
    assert!(
        backup(
            &f.source.join("nope.xml"),
            &f.built_repo,
            &f.backups,
            ChunkCodec::default()
        )
        .is_err()
    );
    assert!(overlay(&f.built_repo, &f.backups.join("absent"), ChunkCodec::default()).is_err());
}

#[test]
fn split_and_merge_whole_directory() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("a/b")).unwrap();
    fs::write(dir.path().join("a/big.bin"), vec![1u8; 70]).unwrap();
    fs::write(dir.path().join("a/b/bigger.bin"), vec![2u8; 90]).unwrap();
    fs::write(dir.path().join("a/b/small.bin"), vec![3u8; 5]).unwrap();
    let before = snapshot(dir.path());
    let codec = ChunkCodec::new(30);

    assert_eq!(split_large_files(dir.path(), codec).unwrap(), 2);
    assert!(!dir.path().join("a/big.bin").exists());
    // already split trees are left alone
    assert_eq!(split_large_files(dir.path(), codec).unwrap(), 0);

    assert_eq!(merge_large_files(dir.path(), codec).unwrap(), 2);
    assert_eq!(snapshot(dir.path()), before);
}

#[test]
fn split_120_mib_with_default_threshold_yields_three_parts() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("dist.zip");
    let size: u64 = 120 * 1024 * 1024;
    let handle = fs::File::create(&file).unwrap();
    handle.set_len(size).unwrap();
    drop(handle);

    let split = ChunkCodec::default().split(&file).unwrap().unwrap();
    let part = |i: &str| fs::metadata(split.join(i)).unwrap().len();
    assert_eq!(part("xx.00"), 49 * 1024 * 1024);
    assert_eq!(part("xx.01"), 49 * 1024 * 1024);
    assert_eq!(part("xx.02"), 22 * 1024 * 1024);
    assert!(!split.join("xx.03").exists());

    let merged = ChunkCodec::default().merge(&split).unwrap().unwrap();
    assert_eq!(fs::metadata(merged).unwrap().len(), size);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn merge_of_split_reproduces_bytes(
        content in proptest::collection::vec(any::<u8>(), 0..2048),
        threshold in 21u64..512,
    ) {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("payload.bin");
        fs::write(&file, &content).unwrap();
        let codec = ChunkCodec::new(threshold);

        match codec.split(&file).unwrap() {
            None => prop_assert!(content.len() as u64 <= threshold),
            Some(split) => {
                prop_assert!(content.len() as u64 > threshold);
                prop_assert_eq!(codec.merge(&split).unwrap(), Some(file.clone()));
            }
        }
        prop_assert_eq!(fs::read(&file).unwrap(), content);
    }
}
