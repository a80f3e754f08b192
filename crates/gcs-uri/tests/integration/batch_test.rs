use std::fs;

use gcs_uri::{copy_batch, uri, Address, Destinations, Error, RemoteRef};
use gcs_uri_test::{init_logging, list_files, test_dir, write_fixture_tree, MemoryStore, TEST_BUCKET};

#[tokio::test]
async fn test_batch_download_into_directory() {
    init_logging();
    let store = MemoryStore::new();
    store.insert(TEST_BUCKET, "x/a.txt", "alpha");
    store.insert(TEST_BUCKET, "y/a.txt", "other alpha");
    let dir = test_dir();
    let dst = dir.path().join("flat");

    copy_batch(
        store.handle(),
        vec![
            format!("gs://{}/x/a.txt", TEST_BUCKET),
            format!("gs://{}/y/a.txt", TEST_BUCKET),
        ],
        Destinations::directory(&dst),
        false,
    )
    .await
    .unwrap();

    assert_eq!(
        list_files(&dst),
        vec![
            format!("gs-{}-x-a.txt", TEST_BUCKET),
            format!("gs-{}-y-a.txt", TEST_BUCKET)
        ]
    );
    assert_eq!(
        fs::read_to_string(dst.join(format!("gs-{}-y-a.txt", TEST_BUCKET))).unwrap(),
        "other alpha"
    );
}

#[tokio::test]
async fn test_batch_upload_into_prefix() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    let files = write_fixture_tree(dir.path());

    copy_batch(
        store.handle(),
        files.clone(),
        Destinations::directory(RemoteRef::new(TEST_BUCKET, "flat")),
        true,
    )
    .await
    .unwrap();

    let mut expected: Vec<String> = files
        .iter()
        .map(|path| format!("flat/{}", uri::flatten(&Address::from(path)).unwrap()))
        .collect();
    expected.sort();
    assert_eq!(store.names(TEST_BUCKET), expected);
}

#[tokio::test]
async fn test_batch_pairs_sources_with_destinations() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    store.insert(TEST_BUCKET, "remote.txt", "remote");
    let dir = test_dir();
    let local = dir.path().join("local.txt");
    fs::write(&local, "local").unwrap();

    copy_batch(
        store.handle(),
        vec![
            Address::from(&local),
            Address::from(format!("gs://{}/remote.txt", TEST_BUCKET)),
        ],
        Destinations::each(vec![
            Address::from(format!("gs://{}/uploaded.txt", TEST_BUCKET)),
            Address::from(dir.path().join("nested/downloaded.txt")),
        ]),
        false,
    )
    .await
    .unwrap();

    assert_eq!(store.get(TEST_BUCKET, "uploaded.txt").unwrap(), "local");
    assert_eq!(
        fs::read_to_string(dir.path().join("nested/downloaded.txt")).unwrap(),
        "remote"
    );
}

#[tokio::test]
async fn test_batch_length_mismatch() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    let files = write_fixture_tree(dir.path());

    let res = copy_batch(
        store.handle(),
        files,
        Destinations::each([format!("gs://{}/only-one.txt", TEST_BUCKET)]),
        false,
    )
    .await;

    assert!(matches!(res, Err(Error::LengthMismatch { .. })));
    assert_eq!(store.uploads(), 0);
}

#[tokio::test]
async fn test_batch_drains_all_tasks_after_failure() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    let mut files = write_fixture_tree(dir.path());
    files.insert(1, dir.path().join("does-not-exist.txt"));

    let res = copy_batch(
        store.handle(),
        files.clone(),
        Destinations::directory(format!("gs://{}/flat/", TEST_BUCKET)),
        false,
    )
    .await;

    assert!(res.unwrap_err().is_not_found());
    assert_eq!(store.uploads(), files.len() - 1);
}

#[tokio::test]
async fn test_empty_batch() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    copy_batch(
        store.handle(),
        Vec::<Address>::new(),
        Destinations::directory("gs://anything/"),
        false,
    )
    .await
    .unwrap();
    assert_eq!(store.uploads(), 0);
}
