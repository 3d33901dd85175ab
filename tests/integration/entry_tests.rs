use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use tempfile::tempdir;
use xattrsum::entry::{EntryContext, EntryError, EntryState, FileEntry, Outcome};
use xattrsum::scanner::{HashAlgorithm, Hasher};
use xattrsum::store::{AttributeKeys, AttributeStore, MemoryStore};

fn june_first() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[test]
fn test_compute_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    fs::write(&path, b"quarterly numbers").unwrap();

    let (store, keys, hasher) = (MemoryStore::new(), AttributeKeys::default(), Hasher::default());
    let ctx = EntryContext::new(&store, &keys, &hasher).with_clock(june_first);
    let entry = FileEntry::new(path.clone(), 1);

    assert!(matches!(entry.compute(&ctx, false), Outcome::Computed));
    let digest = entry.stored_digest(&ctx).unwrap().unwrap();
    assert_eq!(digest, hasher.digest(&path).unwrap());
    assert_eq!(digest.len(), 40);
    assert_eq!(
        store.get(&path, "user.sha1date").unwrap().unwrap(),
        b"2024-06-01 12:00:00".to_vec()
    );

    // Content changes are not noticed by compute.
    fs::write(&path, b"restated numbers").unwrap();
    assert!(matches!(entry.compute(&ctx, false), Outcome::Unchanged));
    assert_eq!(entry.stored_digest(&ctx).unwrap().unwrap(), digest);
}

#[test]
fn test_corruption_is_reported_until_recomputed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("photo.jpg");
    fs::write(&path, b"pixels").unwrap();

    let (store, keys, hasher) = (MemoryStore::new(), AttributeKeys::default(), Hasher::default());
    let ctx = EntryContext::new(&store, &keys, &hasher).with_clock(june_first);
    let entry = FileEntry::new(path.clone(), 1);
    entry.compute(&ctx, false);
    let original = entry.stored_digest(&ctx).unwrap().unwrap();

    fs::write(&path, b"pixelz").unwrap();
    for _ in 0..2 {
        match entry.verify(&ctx) {
            Outcome::Failed(EntryError::Mismatch { stored, actual, .. }) => {
                assert_eq!(stored, original);
                assert_ne!(actual, original);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }
    assert_eq!(entry.stored_digest(&ctx).unwrap().unwrap(), original);

    assert!(matches!(entry.compute(&ctx, true), Outcome::Computed));
    assert!(matches!(entry.verify(&ctx), Outcome::Verified));
}

#[test]
fn test_staleness_window() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("old.txt");
    fs::write(&path, b"kept for years").unwrap();

    let (store, keys, hasher) = (MemoryStore::new(), AttributeKeys::default(), Hasher::default());
    let ctx = EntryContext::new(&store, &keys, &hasher).with_clock(june_first);
    let entry = FileEntry::new(path.clone(), 1);

    assert_eq!(entry.state(&ctx, 180).unwrap(), EntryState::Unhashed);
    assert!(entry.is_older_than(&ctx, 180).unwrap());

    store
        .set(&path, &keys.digest, hasher.digest(&path).unwrap().as_bytes())
        .unwrap();
    store
        .set(&path, &keys.timestamp, b"2024-01-01 00:00:00")
        .unwrap();

    assert_eq!(entry.state(&ctx, 180).unwrap(), EntryState::Hashed);
    assert_eq!(entry.state(&ctx, 100).unwrap(), EntryState::Stale);
    assert!(matches!(entry.verify_if_older_than(&ctx, 180), Outcome::Unchanged));
    assert!(matches!(entry.verify_if_older_than(&ctx, 100), Outcome::Verified));
    assert_eq!(
        entry.last_verified(&ctx).unwrap(),
        Some(june_first())
    );
}

#[test]
fn test_legacy_and_malformed_timestamps() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.txt");
    fs::write(&path, b"data").unwrap();

    let (store, keys, hasher) = (MemoryStore::new(), AttributeKeys::default(), Hasher::default());
    let ctx = EntryContext::new(&store, &keys, &hasher).with_clock(june_first);
    let entry = FileEntry::new(path.clone(), 1);

    store.set(&path, &keys.timestamp, b"2024-05-31").unwrap();
    let midnight = NaiveDate::from_ymd_opt(2024, 5, 31)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(entry.last_verified(&ctx).unwrap(), Some(midnight));
    assert!(entry.is_older_than(&ctx, 1).unwrap());
    assert!(!entry.is_older_than(&ctx, 2).unwrap());

    store.set(&path, &keys.timestamp, b"last tuesday").unwrap();
    assert_eq!(entry.last_verified(&ctx).unwrap(), None);
    assert!(entry.is_older_than(&ctx, 10_000).unwrap());
}

#[test]
fn test_missing_file_fails_without_writing() {
    let dir = tempdir().unwrap();
    let (store, keys, hasher) = (MemoryStore::new(), AttributeKeys::default(), Hasher::default());
    let ctx = EntryContext::new(&store, &keys, &hasher);
    let entry = FileEntry::new(dir.path().join("gone.txt"), 1);

    let outcome = entry.compute(&ctx, false);
    assert!(matches!(outcome, Outcome::Failed(EntryError::Read(_))));
    assert!(store.is_empty());
}

#[test]
fn test_algorithm_selects_attribute_names() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file.bin");
    fs::write(&path, b"abc").unwrap();

    let store = MemoryStore::new();
    let keys = AttributeKeys::new("user", HashAlgorithm::Blake3);
    let hasher = Hasher::new(HashAlgorithm::Blake3);
    let ctx = EntryContext::new(&store, &keys, &hasher);
    FileEntry::new(path.clone(), 1).compute(&ctx, false);

    assert_eq!(keys.digest, "user.blake3");
    assert_eq!(keys.timestamp, "user.blake3date");
    assert_eq!(
        store.get(&path, "user.blake3").unwrap().unwrap().len(),
        64
    );
    assert!(store.get(&path, "user.sha1").unwrap().is_none());
}

#[test]
fn test_timestamp_write_failure_keeps_digest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file.bin");
    fs::write(&path, b"abc").unwrap();

    let (store, keys, hasher) = (MemoryStore::new(), AttributeKeys::default(), Hasher::default());
    store.fail_writes_to(&keys.timestamp);
    let ctx = EntryContext::new(&store, &keys, &hasher);
    let entry = FileEntry::new(path, 1);

    assert!(matches!(
        entry.compute(&ctx, false),
        Outcome::Failed(EntryError::Store(_))
    ));
    assert_eq!(entry.state(&ctx, 180).unwrap(), EntryState::Stale);
}
