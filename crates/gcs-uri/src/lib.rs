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

//! Copy files, objects and whole trees between the local filesystem and Cloud Storage.
//!
//! Both ends of a copy are addresses: a `gs://bucket/name` URI or [RemoteRef] for remote
//! objects, and a `file:` URI, bare path string or [std::path::Path] for local files.  The
//! domains of the two ends pick how the copy is carried out, see [Strategy].
//!
//! ```no_run
//! # async fn run() -> gcs_uri::Result<()> {
//! gcs_uri::copy_item(None, "gs://bucket/data/a.csv", "/tmp/a.csv", false).await?;
//! gcs_uri::copy_tree(None, "/tmp/results", "gs://bucket/results", false).await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(feature = "aggressive_lint", deny(warnings))]

#[cfg(feature = "blocking")]
pub mod blocking;
pub mod errors;
pub mod uri;

pub(crate) mod tempfile;

mod aws_sdk;
mod config;
mod ops;
mod retry;
mod storage;
mod types;

use log::info;
use log_derive::logfn;

pub use crate::aws_sdk::GcsClient;
pub use crate::config::Config;
pub use crate::errors::{Error, Result};
pub use crate::ops::batch::Destinations;
pub use crate::ops::strategy::{Shape, Strategy};
pub use crate::retry::{Backoff, RetryPolicy};
pub use crate::storage::{ObjectStore, TransferParams};
pub use crate::tempfile::TEMP_FILE_PREFIX;
pub use crate::types::{
    Address, Domain, Location, ObjectDescriptor, RemoteRef, TransferResult, TransferTask,
};

use crate::ops::{batch, Session};

/// Copies a single file or object from `source` to `destination`.
///
/// A destination naming an existing local directory, or a remote name ending in `/`,
/// receives the source under its base name.  `client` is only consulted when one end is
/// remote; when it is `None` a [GcsClient] is built from the environment.
#[logfn(err = "ERROR")]
pub async fn copy_item(
    client: Option<&dyn ObjectStore>,
    source: impl Into<Address>,
    destination: impl Into<Address>,
    quiet: bool,
) -> Result<()> {
    let session = Session::new(client);
    ops::copy_item(&session, &source.into(), &destination.into(), quiet).await
}

/// Copies everything below the directory or prefix `source` to `destination`, keeping
/// relative paths.  An empty source copies nothing and succeeds.
#[logfn(err = "ERROR")]
pub async fn copy_tree(
    client: Option<&dyn ObjectStore>,
    source: impl Into<Address>,
    destination: impl Into<Address>,
    quiet: bool,
) -> Result<()> {
    let session = Session::new(client);
    ops::copy_tree(&session, &source.into(), &destination.into(), quiet).await
}

/// Copies many sources concurrently.
///
/// With [Destinations::Directory] each source lands in the directory under its flattened
/// name (see [uri::flatten]).  With [Destinations::Each] sources and destinations are paired
/// by position and must have the same length.  Every copy is attempted, then the first
/// failure (in completion order) is returned.
#[logfn(err = "ERROR")]
pub async fn copy_batch<I, A>(
    client: Option<&dyn ObjectStore>,
    sources: I,
    destinations: impl Into<Destinations>,
    quiet: bool,
) -> Result<()>
where
    I: IntoIterator<Item = A>,
    A: Into<Address>,
{
    let sources: Vec<Address> = sources.into_iter().map(Into::into).collect();
    let tasks = batch::plan(sources, destinations.into())?;
    info!("copy_batch: {} files", tasks.len());
    batch::prepare_local_destinations(&tasks).await?;
    let session = Session::new(client);
    batch::execute(&session, tasks, quiet, true).await
}

/// Lists the objects whose names start with the name of `prefix`.
#[logfn(err = "ERROR")]
pub async fn list_objects(
    client: Option<&dyn ObjectStore>,
    prefix: impl Into<Address>,
) -> Result<Vec<ObjectDescriptor>> {
    let object = remote_ref(prefix.into())?;
    let session = Session::new(client);
    session
        .client()
        .await
        .list(&object.bucket, &object.name)
        .await
}

/// Deletes a single remote object.
#[logfn(err = "ERROR")]
pub async fn delete_object(
    client: Option<&dyn ObjectStore>,
    object: impl Into<Address>,
) -> Result<()> {
    let object = remote_ref(object.into())?;
    let session = Session::new(client);
    session.client().await.delete(&object).await
}

fn remote_ref(address: Address) -> Result<RemoteRef> {
    match address.resolve()? {
        Location::Remote(object) => Ok(object),
        Location::Local { .. } => Err(Error::InvalidAddress(address.to_string())),
    }
}
