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

//! Synchronous wrappers, each call runs on its own runtime.

use crate::{Address, Destinations, ObjectDescriptor, ObjectStore, Result};

#[tokio::main]
pub async fn copy_item(
    client: Option<&dyn ObjectStore>,
    source: impl Into<Address>,
    destination: impl Into<Address>,
    quiet: bool,
) -> Result<()> {
    crate::copy_item(client, source, destination, quiet).await
}

#[tokio::main]
pub async fn copy_tree(
    client: Option<&dyn ObjectStore>,
    source: impl Into<Address>,
    destination: impl Into<Address>,
    quiet: bool,
) -> Result<()> {
    crate::copy_tree(client, source, destination, quiet).await
}

#[tokio::main]
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
    crate::copy_batch(client, sources, destinations, quiet).await
}

#[tokio::main]
pub async fn list_objects(
    client: Option<&dyn ObjectStore>,
    prefix: impl Into<Address>,
) -> Result<Vec<ObjectDescriptor>> {
    crate::list_objects(client, prefix).await
}

#[tokio::main]
pub async fn delete_object(
    client: Option<&dyn ObjectStore>,
    object: impl Into<Address>,
) -> Result<()> {
    crate::delete_object(client, object).await
}
