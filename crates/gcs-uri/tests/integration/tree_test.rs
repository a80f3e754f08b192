use std::fs;

use gcs_uri::{copy_tree, RemoteRef, TEMP_FILE_PREFIX};
use gcs_uri_test::{
    fixture_key_hash_pairs, init_logging, insert_fixture_objects, list_files, test_dir,
    validate_key_hash_pairs, write_fixture_tree, MemoryStore, FIXTURE_FILES, TEST_BUCKET,
};

fn gs(name: &str) -> String {
    format!("gs://{}/{}", TEST_BUCKET, name)
}

fn fixture_names(prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = FIXTURE_FILES
        .iter()
        .map(|(name, _)| format!("{}{}", prefix, name))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_upload_tree() {
    init_logging();
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    write_fixture_tree(dir.path());

    copy_tree(store.handle(), dir.path(), gs("out"), false)
        .await
        .unwrap();

    assert_eq!(store.names(TEST_BUCKET), fixture_names("out/"));
    assert_eq!(store.get(TEST_BUCKET, "out/c/d.txt").unwrap(), "delta\n");
}

#[tokio::test]
async fn test_upload_tree_to_bucket_root() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    write_fixture_tree(dir.path());

    copy_tree(store.handle(), dir.path(), RemoteRef::new(TEST_BUCKET, ""), true)
        .await
        .unwrap();

    assert_eq!(store.names(TEST_BUCKET), fixture_names(""));
}

#[tokio::test]
async fn test_upload_tree_skips_partial_downloads() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    write_fixture_tree(dir.path());
    fs::write(dir.path().join(format!("{}abc", TEMP_FILE_PREFIX)), "partial").unwrap();

    copy_tree(store.handle(), dir.path(), gs("out/"), true)
        .await
        .unwrap();

    assert_eq!(store.names(TEST_BUCKET), fixture_names("out/"));
}

#[tokio::test]
async fn test_download_tree() {
    let store = MemoryStore::new();
    insert_fixture_objects(&store, TEST_BUCKET, "in/");
    store.insert(TEST_BUCKET, "in/", "");
    store.insert(TEST_BUCKET, "in/c/", "");
    store.insert(TEST_BUCKET, "inside/not-in-tree.txt", "x");
    let dir = test_dir();
    let dst = dir.path().join("dst");

    copy_tree(store.handle(), gs("in"), &dst, false)
        .await
        .unwrap();

    validate_key_hash_pairs(&dst, &fixture_key_hash_pairs());
}

#[tokio::test]
async fn test_download_empty_prefix_is_a_no_op() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    let dst = dir.path().join("dst");

    copy_tree(store.handle(), gs("nothing/here/"), &dst, false)
        .await
        .unwrap();

    assert!(!dst.exists());
    assert_eq!(store.downloads(), 0);
}

#[tokio::test]
async fn test_download_tree_drains_after_failure() {
    let store = MemoryStore::new();
    insert_fixture_objects(&store, TEST_BUCKET, "in/");
    store.fail_on("in/b.txt");
    let dir = test_dir();

    let res = copy_tree(store.handle(), gs("in/"), dir.path(), true).await;

    assert!(res.is_err());
    assert_eq!(store.downloads(), FIXTURE_FILES.len() - 1);
    assert_eq!(
        list_files(dir.path()),
        vec!["a.txt".to_string(), "c/d.txt".into(), "c/e.txt".into()]
    );
}

#[tokio::test]
async fn test_remote_tree() {
    let store = MemoryStore::new();
    insert_fixture_objects(&store, TEST_BUCKET, "src/");
    store.insert(TEST_BUCKET, "src-other/x.txt", "x");

    copy_tree(store.handle(), gs("src"), gs("dst/"), false)
        .await
        .unwrap();

    let names: Vec<String> = store
        .names(TEST_BUCKET)
        .into_iter()
        .filter(|name| name.starts_with("dst/"))
        .collect();
    assert_eq!(names, fixture_names("dst/"));
    assert_eq!(store.server_side_copies(), FIXTURE_FILES.len());
    assert_eq!(store.downloads(), 0);
}

#[tokio::test]
async fn test_local_tree() {
    let dir = test_dir();
    let src = dir.path().join("src");
    write_fixture_tree(&src);
    let dst = dir.path().join("dst");

    copy_tree(None, &src, &dst, false).await.unwrap();
    // a second copy over the first succeeds and changes nothing
    copy_tree(None, &src, &dst, true).await.unwrap();

    validate_key_hash_pairs(&dst, &fixture_key_hash_pairs());
}

#[tokio::test]
async fn test_tree_round_trip() {
    let store = MemoryStore::new().with_bucket(TEST_BUCKET);
    let dir = test_dir();
    let src = dir.path().join("src");
    write_fixture_tree(&src);
    let dst = dir.path().join("dst");

    copy_tree(store.handle(), &src, gs("trip"), true)
        .await
        .unwrap();
    copy_tree(store.handle(), gs("trip"), &dst, true)
        .await
        .unwrap();

    assert_eq!(list_files(&src), list_files(&dst));
    validate_key_hash_pairs(&dst, &fixture_key_hash_pairs());
}

#[cfg(unix)]
#[tokio::test]
async fn test_local_tree_skips_dangling_symlink() {
    let dir = test_dir();
    let src = dir.path().join("src");
    write_fixture_tree(&src);
    std::os::unix::fs::symlink(dir.path().join("nowhere"), src.join("dangling")).unwrap();
    let dst = dir.path().join("dst");

    copy_tree(None, &src, &dst, true).await.unwrap();

    validate_key_hash_pairs(&dst, &fixture_key_hash_pairs());
    assert!(!dst.join("dangling").exists());
    assert!(fs::symlink_metadata(dst.join("dangling")).is_err());
}
