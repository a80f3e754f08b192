use std::fs;

use gcs_uri::{blocking, Destinations};
use gcs_uri_test::{
    fixture_key_hash_pairs, insert_fixture_objects, test_dir, validate_key_hash_pairs,
    MemoryStore, TEST_BUCKET,
};

#[test]
fn test_blocking_copy_item() {
    let store = MemoryStore::new();
    store.insert(TEST_BUCKET, "a.txt", "alpha");
    let dir = test_dir();
    let dst = dir.path().join("a.txt");

    blocking::copy_item(store.handle(), format!("gs://{}/a.txt", TEST_BUCKET), &dst, true)
        .unwrap();

    assert_eq!(fs::read_to_string(dst).unwrap(), "alpha");
}

#[test]
fn test_blocking_copy_tree() {
    let store = MemoryStore::new();
    insert_fixture_objects(&store, TEST_BUCKET, "tree/");
    let dir = test_dir();

    blocking::copy_tree(store.handle(), format!("gs://{}/tree", TEST_BUCKET), dir.path(), true)
        .unwrap();

    validate_key_hash_pairs(dir.path(), &fixture_key_hash_pairs());
}

#[test]
fn test_blocking_copy_batch_list_and_delete() {
    let store = MemoryStore::new();
    store.insert(TEST_BUCKET, "a.txt", "alpha");
    store.insert(TEST_BUCKET, "b.txt", "bravo");

    blocking::copy_batch(
        store.handle(),
        [
            format!("gs://{}/a.txt", TEST_BUCKET),
            format!("gs://{}/b.txt", TEST_BUCKET),
        ],
        Destinations::directory(format!("gs://{}/copies", TEST_BUCKET)),
        true,
    )
    .unwrap();

    let listed = blocking::list_objects(store.handle(), format!("gs://{}/copies/", TEST_BUCKET))
        .unwrap();
    let names: Vec<_> = listed.iter().map(|object| object.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            format!("copies/gs-{}-a.txt", TEST_BUCKET),
            format!("copies/gs-{}-b.txt", TEST_BUCKET)
        ]
    );

    blocking::delete_object(store.handle(), format!("gs://{}/a.txt", TEST_BUCKET)).unwrap();
    assert!(store.get(TEST_BUCKET, "a.txt").is_none());
    assert!(blocking::delete_object(store.handle(), format!("gs://{}/a.txt", TEST_BUCKET))
        .unwrap_err()
        .is_not_found());
}
