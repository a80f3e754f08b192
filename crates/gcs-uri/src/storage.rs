/*
* Copyright (C) 2024 Swift Navigation Inc.
* Contact: Swift Navigation <dev@swiftnav.com>
*
* This source is subject to the license found in the file 'LICENSE' which must
* be be distributed together with this source. All other rights reserved.
*
* THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
* EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
* WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
*/

use std::path::Path;

use async_trait::async_trait;

use crate::config::Config;
use crate::errors::Result;
use crate::retry::RetryPolicy;
use crate::types::{ObjectDescriptor, RemoteRef};

/// Per-transfer tuning passed down to the object store.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferParams {
    pub chunk_size: u64,
    pub retry: RetryPolicy,
}

impl TransferParams {
    pub fn download() -> Self {
        TransferParams {
            chunk_size: Config::global().chunk_size(),
            retry: RetryPolicy::read(),
        }
    }

    pub fn upload() -> Self {
        TransferParams {
            chunk_size: Config::global().chunk_size(),
            retry: RetryPolicy::write(),
        }
    }
}

/// The operations copies need from a remote object store.
///
/// Implementations are shared between the workers of a tree or batch copy, so they must be
/// usable concurrently through a shared reference.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes the contents of `object` to `path`, replacing any existing file.
    async fn download(&self, object: &RemoteRef, path: &Path, params: &TransferParams)
        -> Result<()>;

    /// Stores the file at `path` as `object`.  When `object.generation` is set the write only
    /// succeeds if the stored object still has that generation.
    async fn upload(&self, path: &Path, object: &RemoteRef, params: &TransferParams)
        -> Result<()>;

    /// Every object in `bucket` whose name starts with `prefix`, in name order.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectDescriptor>>;

    /// Copies `source` to `bucket`/`name` without moving the data through this host.
    async fn server_side_copy(&self, source: &RemoteRef, bucket: &str, name: &str) -> Result<()>;

    async fn object_exists(&self, object: &RemoteRef) -> Result<bool>;

    async fn delete(&self, object: &RemoteRef) -> Result<()>;
}
