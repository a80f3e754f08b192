#![cfg_attr(feature = "aggressive_lint", deny(warnings))]

mod batch_test;
mod blocking_test;
mod item_test;
mod live_test;
mod tree_test;

use gcs_uri::{Address, Error};

#[tokio::test]
async fn test_unsupported_scheme_is_rejected_before_any_transfer() {
    gcs_uri_test::init_logging();
    let store = gcs_uri_test::MemoryStore::new().with_bucket(gcs_uri_test::TEST_BUCKET);
    let res = gcs_uri::copy_item(store.handle(), "s3://bucket/a.txt", "/tmp/a.txt", false).await;
    assert!(matches!(res, Err(Error::InvalidAddress(_))));
    assert_eq!(store.downloads(), 0);
}

#[tokio::test]
async fn test_local_copy_without_client() {
    let dir = gcs_uri_test::test_dir();
    let src = dir.path().join("a.txt");
    std::fs::write(&src, "alpha").unwrap();
    let dst = dir.path().join("b.txt");
    gcs_uri::copy_item(None, Address::from(&src), &dst, false)
        .await
        .unwrap();
    assert_eq!(std::fs::read_to_string(dst).unwrap(), "alpha");
}
