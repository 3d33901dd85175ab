use std::fs;
use std::path::Path;
use tempfile::tempdir;
use xattrsum::duplicates::find_duplicates;
use xattrsum::entry::{EntryContext, FileEntry};
use xattrsum::orchestrator::{Mode, Orchestrator};
use xattrsum::output::DedupScript;
use xattrsum::scanner::{hardlink, Hasher, Walker, WalkerConfig};
use xattrsum::store::{AttributeKeys, MemoryStore};

fn scan(root: &Path) -> Vec<FileEntry> {
    Walker::new(vec![root.to_path_buf()], WalkerConfig::default())
        .scan()
        .unwrap()
}

#[test]
fn test_unhashed_files_are_never_grouped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"same").unwrap();
    fs::write(dir.path().join("b.txt"), b"same").unwrap();

    let (store, keys, hasher) = (MemoryStore::new(), AttributeKeys::default(), Hasher::default());
    let ctx = EntryContext::new(&store, &keys, &hasher);
    assert!(find_duplicates(&scan(dir.path()), &ctx).is_empty());
}

#[test]
fn test_duplicates_after_compute() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"same").unwrap();
    fs::write(dir.path().join("b.txt"), b"same").unwrap();
    fs::write(dir.path().join("c.txt"), b"different").unwrap();
    fs::write(dir.path().join("d.txt"), b"same").unwrap();

    let (store, keys, hasher) = (MemoryStore::new(), AttributeKeys::default(), Hasher::default());
    let orch = Orchestrator::new(scan(dir.path()), EntryContext::new(&store, &keys, &hasher));
    orch.run(Mode::Compute);

    let groups = orch.duplicates();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].digest, hasher.digest(&dir.path().join("a.txt")).unwrap());
    assert_eq!(groups[0].representative, dir.path().join("a.txt"));
    assert_eq!(
        groups[0].duplicates,
        vec![dir.path().join("b.txt"), dir.path().join("d.txt")]
    );
}

#[test]
fn test_existing_hard_links_are_not_relinked() {
    if !hardlink::is_supported() {
        return;
    }
    let dir = tempdir().unwrap();
    let original = dir.path().join("a.txt");
    fs::write(&original, b"identical content").unwrap();
    if let Err(e) = fs::hard_link(&original, dir.path().join("c.txt")) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {}", e);
        return;
    }

    let (store, keys, hasher) = (MemoryStore::new(), AttributeKeys::default(), Hasher::default());
    let orch = Orchestrator::new(scan(dir.path()), EntryContext::new(&store, &keys, &hasher));
    orch.run(Mode::Compute);

    assert_eq!(orch.entries()[0].link_count(), 2);
    assert!(orch.duplicates().is_empty());
}

#[test]
fn test_late_hard_link_becomes_link_source() {
    if !hardlink::is_supported() {
        return;
    }
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    fs::write(&a, b"identical content").unwrap();
    fs::write(&b, b"identical content").unwrap();
    if let Err(e) = fs::hard_link(&a, &c) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {}", e);
        return;
    }

    let (store, keys, hasher) = (MemoryStore::new(), AttributeKeys::default(), Hasher::default());
    let orch = Orchestrator::new(scan(dir.path()), EntryContext::new(&store, &keys, &hasher));
    orch.run(Mode::Compute);

    let groups = orch.duplicates();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].representative, c);
    assert_eq!(groups[0].duplicates, vec![b.clone()]);

    let script = DedupScript::new(&groups);
    let mut buffer = Vec::new();
    script.write_to(&mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(
        text,
        format!("#!/bin/sh\nln -f '{}' '{}'\n", c.display(), b.display())
    );
}

#[test]
fn test_link_counts_are_read_at_grouping_time() {
    if !hardlink::is_supported() {
        return;
    }
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, b"same").unwrap();
    fs::write(&b, b"same").unwrap();

    let (store, keys, hasher) = (MemoryStore::new(), AttributeKeys::default(), Hasher::default());
    let entries = scan(dir.path());
    let orch = Orchestrator::new(entries, EntryContext::new(&store, &keys, &hasher));
    orch.run(Mode::Compute);
    assert_eq!(orch.duplicates().len(), 1);

    // Linking b elsewhere after the scan takes it out of the candidates.
    if fs::hard_link(&b, dir.path().join("elsewhere")).is_err() {
        return;
    }
    assert_eq!(orch.entries()[1].link_count(), 1);
    assert_eq!(orch.entries()[1].current_link_count(), 2);
    assert!(orch.duplicates().is_empty());
}
