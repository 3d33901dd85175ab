use clap::Parser;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use xattrsum::cli::Cli;
use xattrsum::error::ExitCode;
use xattrsum::scanner::Hasher;
use xattrsum::store::{AttributeStore, MemoryStore};

/// A tree plus an empty config file so the user's own config is not read.
fn fixture(files: &[(&str, &[u8])]) -> TempDir {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("config.toml"), "").unwrap();
    for (name, content) in files {
        fs::write(dir.path().join("data").join(name), content).unwrap();
    }
    dir
}

fn run(dir: &Path, store: &MemoryStore, args: &[&str]) -> (ExitCode, String) {
    let config = dir.join("config.toml");
    let mut argv = vec![
        "xattrsum".to_string(),
        "--config".to_string(),
        config.display().to_string(),
    ];
    argv.extend(args.iter().map(|a| a.to_string()));
    let cli = Cli::try_parse_from(argv).unwrap();

    yansi::disable();
    let mut out = Vec::new();
    let code = xattrsum::execute(&cli, store, None, &mut out).unwrap();
    (code, String::from_utf8(out).unwrap())
}

fn data(dir: &Path) -> String {
    dir.join("data").display().to_string()
}

#[test]
fn test_compute_then_verify() {
    let dir = fixture(&[("a.txt", b"alpha"), ("b.txt", b"beta")]);
    let store = MemoryStore::new();
    let root = data(dir.path());

    let (code, out) = run(dir.path(), &store, &["compute", "--no-progress", &root]);
    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("Total files   : 2"));
    assert!(out.contains("Computed files: 2"));
    assert_eq!(store.len(), 4);

    let (code, out) = run(dir.path(), &store, &["verify", "--max-age", "0", "--no-progress", &root]);
    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("Verified files: 2"));
    assert!(out.contains("Errors        : 0"));
}

#[test]
fn test_verify_reports_corruption() {
    let dir = fixture(&[("a.txt", b"alpha"), ("b.txt", b"beta")]);
    let store = MemoryStore::new();
    let root = data(dir.path());
    run(dir.path(), &store, &["compute", "--no-progress", &root]);

    let corrupted = dir.path().join("data/b.txt");
    fs::write(&corrupted, b"beta!").unwrap();

    let (code, out) = run(dir.path(), &store, &["verify", "--max-age", "0", "--no-progress", &root]);
    assert_eq!(code, ExitCode::IntegrityFailure);
    assert!(out.contains("Errors        : 1"));
    assert!(out.contains("Faulty files"));
    assert!(out.contains(&corrupted.display().to_string()));

    // Within the window neither file is read again.
    let (code, out) = run(dir.path(), &store, &["verify", "--no-progress", &root]);
    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("Verified files: 0"));
}

#[test]
fn test_update_accepts_changes_of_stale_files() {
    let dir = fixture(&[("a.txt", b"alpha")]);
    let store = MemoryStore::new();
    let root = data(dir.path());
    let path = dir.path().join("data/a.txt");
    store.set(&path, "user.sha1", b"0000").unwrap();
    store.set(&path, "user.sha1date", b"2001-01-01").unwrap();

    let (code, out) = run(dir.path(), &store, &["update", "--no-progress", &root]);
    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("Computed files: 1"));
    assert_eq!(
        store.get(&path, "user.sha1").unwrap().unwrap(),
        Hasher::default().digest(&path).unwrap().into_bytes()
    );
}

#[test]
fn test_quiet_run_prints_nothing_on_success() {
    let dir = fixture(&[("a.txt", b"alpha")]);
    let store = MemoryStore::new();
    let (code, out) = run(dir.path(), &store, &["-q", "compute", &data(dir.path())]);
    assert_eq!(code, ExitCode::Success);
    assert!(out.is_empty());
}

#[test]
fn test_interrupted_run() {
    let dir = fixture(&[("a.txt", b"alpha")]);
    fs::write(dir.path().join("config.toml"), "progress = false\n").unwrap();
    let store = MemoryStore::new();
    let cli = Cli::try_parse_from([
        "xattrsum".to_string(),
        "--config".to_string(),
        dir.path().join("config.toml").display().to_string(),
        "compute".to_string(),
        data(dir.path()),
    ])
    .unwrap();

    let mut out = Vec::new();
    let flag = Arc::new(AtomicBool::new(true));
    let code = xattrsum::execute(&cli, &store, Some(flag), &mut out).unwrap();

    assert_eq!(code, ExitCode::Interrupted);
    assert!(store.is_empty());
    assert!(String::from_utf8(out).unwrap().contains("Interrupted after 0 of 1 files"));
}

#[test]
fn test_duplicates_and_dedup_script() {
    let dir = fixture(&[
        ("a.txt", b"same"),
        ("b.txt", b"other"),
        ("it's a file.txt", b"same"),
    ]);
    let store = MemoryStore::new();
    let root = data(dir.path());
    let a = dir.path().join("data/a.txt");
    let quoted = dir.path().join("data/it's a file.txt");

    let (_, report) = run(dir.path(), &store, &["duplicates", &root]);
    assert!(report.is_empty());

    run(dir.path(), &store, &["compute", "--no-progress", &root]);
    let digest = Hasher::default().digest(&a).unwrap();

    let (code, report) = run(dir.path(), &store, &["duplicates", &root]);
    assert_eq!(code, ExitCode::Success);
    assert_eq!(
        report,
        format!("{} {} --> {}\n", digest, a.display(), quoted.display())
    );

    let (code, script) = run(dir.path(), &store, &["dedup-script", &root]);
    assert_eq!(code, ExitCode::Success);
    let target = quoted.display().to_string().replace('\'', r"'\''");
    assert_eq!(
        script,
        format!("#!/bin/sh\nln -f '{}' '{}'\n", a.display(), target)
    );
}

#[test]
fn test_overlapping_roots_process_each_file_once() {
    let dir = fixture(&[]);
    let sub = dir.path().join("data/sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("a.txt"), b"alpha").unwrap();
    let store = MemoryStore::new();
    let root = data(dir.path());
    let nested = sub.display().to_string();

    let (code, out) = run(dir.path(), &store, &["compute", "--no-progress", &root, &nested]);
    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("Total files   : 1"));
    assert!(out.contains("Computed files: 1"));

    let (code, script) = run(dir.path(), &store, &["dedup-script", &root, &nested, &root]);
    assert_eq!(code, ExitCode::Success);
    assert_eq!(script, "#!/bin/sh\n");
}

#[test]
fn test_hash_does_not_touch_store() {
    let dir = fixture(&[("abc.txt", b"abc")]);
    let store = MemoryStore::new();
    let path = dir.path().join("data/abc.txt");

    let (code, out) = run(dir.path(), &store, &["hash", &path.display().to_string()]);
    assert_eq!(code, ExitCode::Success);
    assert_eq!(
        out,
        format!("{} a9993e364706816aba3e25717850c26c9cd0d89d\n", path.display())
    );
    assert!(store.is_empty());
}

#[test]
fn test_algorithm_override_changes_attribute_names() {
    let dir = fixture(&[("a.txt", b"alpha")]);
    let store = MemoryStore::new();
    let path = dir.path().join("data/a.txt");
    run(
        dir.path(),
        &store,
        &["--algorithm", "sha256", "compute", "--no-progress", &data(dir.path())],
    );

    assert!(store.get(&path, "user.sha1").unwrap().is_none());
    assert_eq!(store.get(&path, "user.sha256").unwrap().unwrap().len(), 64);
    assert!(store.get(&path, "user.sha256date").unwrap().is_some());
}

#[test]
fn test_config_command_prints_effective_settings() {
    let dir = fixture(&[]);
    fs::write(dir.path().join("config.toml"), "max_age_days = 42\n").unwrap();
    let store = MemoryStore::new();

    let (code, out) = run(dir.path(), &store, &["--algorithm", "blake3", "config"]);
    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("max_age_days = 42"));
    assert!(out.contains("algorithm = \"blake3\""));
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = fixture(&[]);
    let cli = Cli::try_parse_from([
        "xattrsum".to_string(),
        "--config".to_string(),
        dir.path().join("config.toml").display().to_string(),
        "compute".to_string(),
        dir.path().join("nope").display().to_string(),
    ])
    .unwrap();

    let mut out = Vec::new();
    let err = xattrsum::execute(&cli, &MemoryStore::new(), None, &mut out).unwrap_err();
    assert!(format!("{err:#}").contains("root does not exist"));
}
