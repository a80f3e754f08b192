use std::fs;

use gcs_uri::{copy_item, Address, Error, ObjectStore, RemoteRef};
use gcs_uri_test::{init_logging, test_dir, MemoryStore, TEST_BUCKET};

fn gs(name: &str) -> String {
    format!("gs://{}/{}", TEST_BUCKET, name)
}

#[tokio::test]
async fn test_upload() {
    init_logging();
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    let src = dir.path().join("a.txt");
    fs::write(&src, "alpha").unwrap();

    copy_item(store.handle(), &src, gs("data/a.txt"), false)
        .await
        .unwrap();

    assert_eq!(store.get(TEST_BUCKET, "data/a.txt").unwrap(), "alpha");
}

#[tokio::test]
async fn test_upload_into_prefix_keeps_file_name() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    let src = dir.path().join("a.txt");
    fs::write(&src, "alpha").unwrap();

    copy_item(store.handle(), &src, gs("data/"), true)
        .await
        .unwrap();

    assert_eq!(store.names(TEST_BUCKET), vec!["data/a.txt".to_string()]);
}

#[tokio::test]
async fn test_upload_to_bucket_root_keeps_file_name() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    let src = dir.path().join("a.txt");
    fs::write(&src, "alpha").unwrap();

    copy_item(store.handle(), &src, format!("gs://{}/", TEST_BUCKET), true)
        .await
        .unwrap();

    assert_eq!(store.names(TEST_BUCKET), vec!["a.txt".to_string()]);
}

#[tokio::test]
async fn test_object_exists_after_upload() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    let src = dir.path().join("a.txt");
    fs::write(&src, "alpha").unwrap();

    copy_item(store.handle(), &src, gs("a.txt"), true)
        .await
        .unwrap();

    assert!(store
        .object_exists(&RemoteRef::new(TEST_BUCKET, "a.txt"))
        .await
        .unwrap());
    assert!(!store
        .object_exists(&RemoteRef::new(TEST_BUCKET, "b.txt"))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_upload_to_missing_bucket() {
    let store = MemoryStore::new();
    let dir = test_dir();
    let src = dir.path().join("a.txt");
    fs::write(&src, "alpha").unwrap();

    let res = copy_item(store.handle(), &src, "gs://nope/a.txt", true).await;
    assert!(matches!(res, Err(Error::RemoteNotFound(_))));
}

#[tokio::test]
async fn test_upload_generation_precondition() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let generation = store.insert(TEST_BUCKET, "a.txt", "old");
    let dir = test_dir();
    let src = dir.path().join("a.txt");
    fs::write(&src, "new").unwrap();

    let stale = RemoteRef::new(TEST_BUCKET, "a.txt").with_generation(generation + 100);
    assert!(copy_item(store.handle(), &src, stale, true).await.is_err());
    assert_eq!(store.get(TEST_BUCKET, "a.txt").unwrap(), "old");

    let current = RemoteRef::new(TEST_BUCKET, "a.txt").with_generation(generation);
    copy_item(store.handle(), &src, current, true).await.unwrap();
    assert_eq!(store.get(TEST_BUCKET, "a.txt").unwrap(), "new");
}

#[tokio::test]
async fn test_download() {
    let store = MemoryStore::new();
    store.insert(TEST_BUCKET, "data/a.txt", "alpha");
    let dir = test_dir();
    let dst = dir.path().join("out.txt");

    copy_item(store.handle(), gs("data/a.txt"), &dst, false)
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(dst).unwrap(), "alpha");
}

#[tokio::test]
async fn test_download_into_directory_keeps_object_name() {
    let store = MemoryStore::new();
    store.insert(TEST_BUCKET, "data/a.txt", "alpha");
    let dir = test_dir();

    copy_item(store.handle(), gs("data/a.txt"), dir.path(), true)
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "alpha"
    );
}

#[tokio::test]
async fn test_download_from_file_uri_destination() {
    let store = MemoryStore::new();
    store.insert(TEST_BUCKET, "a.txt", "alpha");
    let dir = test_dir();
    let dst = format!("file://{}/with%20space+plus.txt", dir.path().display());

    copy_item(store.handle(), gs("a.txt"), dst, true)
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("with space plus.txt")).unwrap(),
        "alpha"
    );
}

#[tokio::test]
async fn test_download_missing_object() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    let dst = dir.path().join("out.txt");

    let res = copy_item(store.handle(), gs("missing.txt"), &dst, true).await;

    assert!(res.unwrap_err().is_not_found());
    assert!(!dst.exists());
}

#[tokio::test]
async fn test_remote_copy() {
    let store = MemoryStore::new();
    store.insert(TEST_BUCKET, "src/a.txt", "alpha");

    copy_item(store.handle(), gs("src/a.txt"), gs("dst/b.txt"), false)
        .await
        .unwrap();

    assert_eq!(store.get(TEST_BUCKET, "dst/b.txt").unwrap(), "alpha");
    assert_eq!(store.server_side_copies(), 1);
    assert_eq!(store.downloads(), 0);
}

#[tokio::test]
async fn test_remote_copy_into_prefix_keeps_object_name() {
    let store = MemoryStore::new();
    store.insert(TEST_BUCKET, "src/a.txt", "alpha");
    store.insert(TEST_BUCKET, "src/dir/", "");

    copy_item(
        store.handle(),
        RemoteRef::new(TEST_BUCKET, "src/a.txt"),
        gs("dst/"),
        true,
    )
    .await
    .unwrap();
    assert!(store.get(TEST_BUCKET, "dst/a.txt").is_some());

    // a placeholder copied onto a prefix keeps the destination name
    copy_item(store.handle(), gs("src/dir/"), gs("other/"), true)
        .await
        .unwrap();
    assert!(store.get(TEST_BUCKET, "other/").is_some());
}

#[tokio::test]
async fn test_remote_copy_to_bucket_root_keeps_object_name() {
    let store = MemoryStore::new().with_bucket("other-bucket");
    store.insert(TEST_BUCKET, "src/a.txt", "alpha");

    copy_item(store.handle(), gs("src/a.txt"), "gs://other-bucket/", true)
        .await
        .unwrap();

    assert_eq!(store.names("other-bucket"), vec!["a.txt".to_string()]);
    assert_eq!(store.get("other-bucket", "a.txt").unwrap(), "alpha");
}

#[tokio::test]
async fn test_round_trip_is_idempotent() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    let src = dir.path().join("a.bin");
    let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    fs::write(&src, &data).unwrap();
    let dst = dir.path().join("b.bin");

    for _ in 0..2 {
        copy_item(store.handle(), Address::from(&src), gs("a.bin"), true)
            .await
            .unwrap();
        copy_item(store.handle(), gs("a.bin"), &dst, true)
            .await
            .unwrap();
    }

    assert_eq!(fs::read(&dst).unwrap(), data);
    assert_eq!(store.names(TEST_BUCKET), vec!["a.bin".to_string()]);
}

#[tokio::test]
async fn test_local_copy_into_directory() {
    let dir = test_dir();
    let src = dir.path().join("a.txt");
    fs::write(&src, "alpha").unwrap();
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();

    copy_item(None, src.to_str().unwrap(), &out, false)
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(out.join("a.txt")).unwrap(), "alpha");
}
