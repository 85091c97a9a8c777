use std::error::Error;
use std::fs;

use tempfile::tempdir;

use siteforge::pipeline::stamp::{StampStore, compute_hash_for_paths};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn compute_hash_is_order_insensitive_and_tracks_content_changes() -> TestResult {
    let dir = tempdir()?;
    let f1 = dir.path().join("a.txt");
    let f2 = dir.path().join("b.txt");

    fs::write(&f1, "hello")?;
    fs::write(&f2, "world")?;

    let h1 = compute_hash_for_paths([&f1, &f2])?;
    let h2 = compute_hash_for_paths([&f2, &f1])?;
    assert_eq!(h1, h2);

    fs::write(&f1, "HELLO")?;
    let h3 = compute_hash_for_paths([&f1, &f2])?;
    assert_ne!(h1, h3);

    Ok(())
}

#[test]
fn renaming_an_input_changes_the_hash() -> TestResult {
    let dir = tempdir()?;
    let f1 = dir.path().join("a.txt");
    fs::write(&f1, "same bytes")?;
    let h1 = compute_hash_for_paths([&f1])?;

    let f2 = dir.path().join("renamed.txt");
    fs::rename(&f1, &f2)?;
    let h2 = compute_hash_for_paths([&f2])?;

    assert_ne!(h1, h2);
    Ok(())
}

#[test]
fn stamp_store_round_trips_and_merges_entries() -> TestResult {
    let dir = tempdir()?;
    let store = StampStore::for_output_root(dir.path());

    assert_eq!(store.load("compile-styles@build")?, None);

    store.save("compile-styles@build", "abc123")?;
    store.save("bundle-scripts@build", "def456")?;
    store.save("compile-styles@build", "abc999")?;

    assert_eq!(
        store.load("compile-styles@build")?.as_deref(),
        Some("abc999")
    );
    assert_eq!(
        store.load("bundle-scripts@build")?.as_deref(),
        Some("def456")
    );

    Ok(())
}
