#![cfg_attr(feature = "aggressive_lint", deny(warnings))]

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tempdir::TempDir;
use uuid::Uuid;

use gcs_uri::{Error, ObjectDescriptor, ObjectStore, RemoteRef, Result, TransferParams};

pub const TEST_BUCKET: &str = "gcs-uri-test";

/// Relative path and contents of every file in the fixture tree.
pub const FIXTURE_FILES: &[(&str, &str)] = &[
    ("a.txt", "alpha\n"),
    ("b.txt", "bravo\n"),
    ("c/d.txt", "delta\n"),
    ("c/e.txt", "echo\n"),
];

static LIVE_STORAGE_ROOT: Lazy<Option<RemoteRef>> = Lazy::new(|| {
    std::env::var("GCS_URI_TEST_STORAGE_URI")
        .ok()
        .map(|uri| gcs_uri::uri::parse_remote(&uri).expect("GCS_URI_TEST_STORAGE_URI is not gs://"))
});

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn randomised_name(name: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), name)
}

pub fn test_dir() -> TempDir {
    TempDir::new("gcs_uri_tmp").expect("creating temporary directory")
}

/// The bucket and prefix live tests may write below, when configured.
pub fn live_storage_root() -> Option<RemoteRef> {
    LIVE_STORAGE_ROOT.clone()
}

pub fn md5_hex(data: impl AsRef<[u8]>) -> String {
    format!("{:x}", Md5::new().chain_update(data).finalize())
}

pub struct KeyHashPair(pub &'static str, pub String);

pub fn fixture_key_hash_pairs() -> Vec<KeyHashPair> {
    FIXTURE_FILES
        .iter()
        .map(|(name, contents)| KeyHashPair(*name, md5_hex(contents)))
        .collect()
}

/// Writes [FIXTURE_FILES] below `root`, returning the path of every file written.
pub fn write_fixture_tree(root: impl AsRef<Path>) -> Vec<PathBuf> {
    let root = root.as_ref();
    FIXTURE_FILES
        .iter()
        .map(|(name, contents)| {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, contents).unwrap();
            path
        })
        .collect()
}

/// Stores [FIXTURE_FILES] as objects named `prefix` + relative path.
pub fn insert_fixture_objects(store: &MemoryStore, bucket: &str, prefix: &str) {
    for (name, contents) in FIXTURE_FILES {
        store.insert(bucket, format!("{}{}", prefix, name), *contents);
    }
}

/// Every regular file below `dir`, relative to it and `/` separated, sorted.
pub fn list_files(dir: impl AsRef<Path>) -> Vec<String> {
    fn visit(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                visit(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap();
                let rel: Vec<_> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(rel.join("/"));
            }
        }
    }
    let dir = dir.as_ref();
    let mut out = Vec::new();
    visit(dir, dir, &mut out);
    out.sort();
    out
}

pub fn validate_key_hash_pairs(local_directory: impl AsRef<Path>, key_hash_pairs: &[KeyHashPair]) {
    let local_directory = local_directory.as_ref();
    for key_hash_pair in key_hash_pairs {
        let path = local_directory.join(key_hash_pair.0);
        let data = fs::read(&path).unwrap();
        assert_eq!(
            md5_hex(data),
            key_hash_pair.1,
            "md5 digest did not match: {}",
            path.display(),
        );
    }

    // Ensure there aren't any extra unexpected files in the directory
    assert_eq!(list_files(local_directory).len(), key_hash_pairs.len());
}

struct StoredObject {
    data: Bytes,
    generation: i64,
}

/// An [ObjectStore] keeping objects in memory.
///
/// Buckets exist once [MemoryStore::with_bucket] or [MemoryStore::insert] named them,
/// operations on other buckets fail with [Error::RemoteNotFound].  Names registered with
/// [MemoryStore::fail_on] make every transfer touching them fail.
#[derive(Default)]
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, StoredObject>>>,
    failing: Mutex<HashSet<String>>,
    next_generation: AtomicI64,
    copies: AtomicUsize,
    downloads: AtomicUsize,
    uploads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(self, bucket: &str) -> Self {
        self.buckets.lock().entry(bucket.to_owned()).or_default();
        self
    }

    pub fn handle(&self) -> Option<&dyn ObjectStore> {
        Some(self)
    }

    /// Stores `data` as `bucket`/`name`, returning the new generation.
    pub fn insert(&self, bucket: &str, name: impl Into<String>, data: impl Into<Bytes>) -> i64 {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.buckets
            .lock()
            .entry(bucket.to_owned())
            .or_default()
            .insert(
                name.into(),
                StoredObject {
                    data: data.into(),
                    generation,
                },
            );
        generation
    }

    pub fn get(&self, bucket: &str, name: &str) -> Option<Bytes> {
        self.buckets
            .lock()
            .get(bucket)
            .and_then(|objects| objects.get(name))
            .map(|object| object.data.clone())
    }

    pub fn generation(&self, bucket: &str, name: &str) -> Option<i64> {
        self.buckets
            .lock()
            .get(bucket)
            .and_then(|objects| objects.get(name))
            .map(|object| object.generation)
    }

    pub fn names(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn fail_on(&self, name: &str) {
        self.failing.lock().insert(name.to_owned());
    }

    pub fn server_side_copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    fn check_failure(&self, object: &RemoteRef) -> Result<()> {
        if self.failing.lock().contains(&object.name) {
            return Err(Error::Transient(format!("injected failure for {}", object)));
        }
        Ok(())
    }

    fn read(&self, object: &RemoteRef) -> Result<Bytes> {
        self.check_failure(object)?;
        let buckets = self.buckets.lock();
        let objects = buckets
            .get(&object.bucket)
            .ok_or_else(|| Error::RemoteNotFound(object.uri()))?;
        objects
            .get(&object.name)
            .map(|stored| stored.data.clone())
            .ok_or_else(|| Error::RemoteNotFound(object.uri()))
    }

    fn write(&self, object: &RemoteRef, data: Bytes) -> Result<()> {
        self.check_failure(object)?;
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut buckets = self.buckets.lock();
        let objects = buckets
            .get_mut(&object.bucket)
            .ok_or_else(|| Error::RemoteNotFound(object.uri()))?;
        if let Some(expected) = object.generation {
            let current = objects.get(&object.name).map_or(0, |o| o.generation);
            if current != expected {
                return Err(Error::UploadFailed {
                    uri: object.uri(),
                    message: format!("generation {} does not match {}", current, expected),
                });
            }
        }
        objects.insert(object.name.clone(), StoredObject { data, generation });
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn download(
        &self,
        object: &RemoteRef,
        path: &Path,
        _params: &TransferParams,
    ) -> Result<()> {
        let data = self.read(object)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, &data).await?;
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upload(&self, path: &Path, object: &RemoteRef, _params: &TransferParams) -> Result<()> {
        let data = tokio::fs::read(path).await?;
        self.write(object, Bytes::from(data))?;
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectDescriptor>> {
        let buckets = self.buckets.lock();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| Error::RemoteNotFound(format!("gs://{}", bucket)))?;
        Ok(objects
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, stored)| ObjectDescriptor {
                bucket: bucket.to_owned(),
                name: name.clone(),
                size: Some(stored.data.len() as u64),
                generation: Some(stored.generation),
            })
            .collect())
    }

    async fn server_side_copy(&self, source: &RemoteRef, bucket: &str, name: &str) -> Result<()> {
        let data = self.read(source)?;
        self.write(&RemoteRef::new(bucket, name), data)?;
        self.copies.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn object_exists(&self, object: &RemoteRef) -> Result<bool> {
        Ok(self.get(&object.bucket, &object.name).is_some())
    }

    async fn delete(&self, object: &RemoteRef) -> Result<()> {
        let mut buckets = self.buckets.lock();
        buckets
            .get_mut(&object.bucket)
            .and_then(|objects| objects.remove(&object.name))
            .map(|_| ())
            .ok_or_else(|| Error::RemoteNotFound(object.uri()))
    }
}
