// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 winnyboy5

//! Integration tests for the upload store
//!
//! Exercises the public API the server relies on: round trips, overwrite
//! semantics, size accounting under concurrency, and filename rules.

use catbox_storage::{upload_basename, validate_filename, LocalStore};
use proptest::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_round_trip_identity() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalStore::new(temp_dir.path()).await.unwrap();

    let content: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    store.save("blob.bin", content.as_slice()).await.unwrap();

    let path = store.locate("blob.bin").await.unwrap();
    assert_eq!(tokio::fs::read(path).await.unwrap(), content);
}

#[tokio::test]
async fn test_last_write_wins() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalStore::new(temp_dir.path()).await.unwrap();

    store.save("notes.txt", &b"draft"[..]).await.unwrap();
    store.save("notes.txt", &b"final"[..]).await.unwrap();

    let path = store.locate("notes.txt").await.unwrap();
    assert_eq!(tokio::fs::read(path).await.unwrap(), b"final");
    assert_eq!(store.compute_total_bytes().await.unwrap(), 5);
}

#[tokio::test]
async fn test_total_bytes_after_sequential_uploads() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalStore::new(temp_dir.path()).await.unwrap();

    let sizes = [1usize, 10, 100, 1000, 4096];
    for (i, size) in sizes.iter().enumerate() {
        let data = vec![b'x'; *size];
        store.save(&format!("file-{}.bin", i), data.as_slice()).await.unwrap();
    }

    let expected: u64 = sizes.iter().map(|s| *s as u64).sum();
    assert_eq!(store.compute_total_bytes().await.unwrap(), expected);
}

#[tokio::test]
async fn test_concurrent_uploads_distinct_names() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::new(temp_dir.path()).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..16u64 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let data = vec![b'a'; (i as usize + 1) * 10];
            store.save(&format!("upload-{}.txt", i), data.as_slice()).await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let expected: u64 = (1..=16u64).map(|i| i * 10).sum();
    assert_eq!(store.compute_total_bytes().await.unwrap(), expected);
}

#[tokio::test]
async fn test_concurrent_uploads_same_name() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::new(temp_dir.path()).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..8u8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let data = vec![b'0' + i; 32];
            store.save("contested.txt", data.as_slice()).await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Exactly one complete version wins
    let path = store.locate("contested.txt").await.unwrap();
    let content = tokio::fs::read(path).await.unwrap();
    assert_eq!(content.len(), 32);
    assert!(content.iter().all(|b| *b == content[0]));
    assert_eq!(store.compute_total_bytes().await.unwrap(), 32);
}

proptest! {
    #[test]
    fn prop_names_with_separators_are_rejected(
        prefix in "[a-z]{0,8}",
        sep in prop::sample::select(vec!['/', '\\']),
        suffix in "[a-z]{0,8}",
    ) {
        let name = format!("{}{}{}", prefix, sep, suffix);
        prop_assert!(validate_filename(&name).is_err());
    }

    #[test]
    fn prop_plain_names_are_accepted(name in "[A-Za-z0-9_-][A-Za-z0-9_. -]{0,40}") {
        prop_assert!(validate_filename(&name).is_ok());
    }

    #[test]
    fn prop_basename_has_no_separators(raw in "[a-z/\\\\.]{0,30}") {
        let base = upload_basename(&raw);
        prop_assert!(!base.contains('/'));
        prop_assert!(!base.contains('\\'));
        prop_assert!(raw.ends_with(base));
    }
}
