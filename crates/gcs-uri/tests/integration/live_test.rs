//! Runs against a real bucket when `GCS_URI_TEST_STORAGE_URI` names a writable prefix,
//! e.g. `gs://my-bucket/gcs-uri-tests/`.

use gcs_uri::{copy_item, copy_tree, delete_object, list_objects, GcsClient, ObjectStore};
use gcs_uri_test::{
    fixture_key_hash_pairs, init_logging, live_storage_root, randomised_name, test_dir,
    validate_key_hash_pairs, write_fixture_tree,
};

#[tokio::test]
async fn test_live_round_trip() {
    let root = match live_storage_root() {
        Some(root) => root,
        None => return,
    };
    init_logging();
    let client = GcsClient::from_env().await;
    let client: &dyn ObjectStore = &client;
    let prefix = root.join(&randomised_name("round-trip"));

    let src = test_dir();
    write_fixture_tree(src.path());
    copy_tree(Some(client), src.path(), prefix.clone(), false)
        .await
        .unwrap();

    let dst = test_dir();
    copy_tree(Some(client), prefix.clone(), dst.path(), false)
        .await
        .unwrap();
    validate_key_hash_pairs(dst.path(), &fixture_key_hash_pairs());

    let single = dst.path().join("single.txt");
    copy_item(Some(client), prefix.join("c/d.txt"), &single, true)
        .await
        .unwrap();
    assert_eq!(std::fs::read_to_string(single).unwrap(), "delta\n");
    assert!(client.object_exists(&prefix.join("c/d.txt")).await.unwrap());

    for object in list_objects(Some(client), prefix.clone()).await.unwrap() {
        delete_object(Some(client), object.object_ref()).await.unwrap();
    }
    assert!(!client.object_exists(&prefix.join("c/d.txt")).await.unwrap());
}
