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

use std::future::Future;
use std::time::Instant;

use log::{debug, error, info, warn};
use tokio::sync::OnceCell;

use crate::aws_sdk::GcsClient;
use crate::errors::{Error, Result};
use crate::storage::ObjectStore;
use crate::types::{Address, Location};

pub mod batch;
pub mod item;
pub mod strategy;
pub mod tree;

use strategy::{Shape, Strategy};

/// The object store used by one public call.  A caller supplied store is used as is,
/// otherwise a [GcsClient] is built the first time a remote endpoint needs one and shared
/// by every transfer of the call.
pub struct Session<'a> {
    injected: Option<&'a dyn ObjectStore>,
    default: OnceCell<GcsClient>,
}

impl<'a> Session<'a> {
    pub fn new(client: Option<&'a dyn ObjectStore>) -> Self {
        Session {
            injected: client,
            default: OnceCell::new(),
        }
    }

    pub async fn client(&self) -> &dyn ObjectStore {
        match self.injected {
            Some(client) => client,
            None => self.default.get_or_init(GcsClient::from_env).await,
        }
    }

    /// The object store `strategy` talks to, `None` for purely local strategies.
    async fn client_for(&self, strategy: Strategy) -> Option<&dyn ObjectStore> {
        if strategy.requires_client() {
            Some(self.client().await)
        } else {
            None
        }
    }
}

/// Classifies both ends and looks up the strategy for copying between them.
fn select(
    shape: Shape,
    source: &Address,
    destination: &Address,
) -> Result<(Strategy, Location, Location)> {
    let src = source.resolve()?;
    let dst = destination.resolve()?;
    let strategy = Strategy::select(shape, src.domain(), dst.domain());
    debug!("{}: {} -> {}", strategy, source, destination);
    Ok((strategy, src, dst))
}

/// Copies one object or file, logging how long the attempt took when it fails.
pub async fn copy_item(
    session: &Session<'_>,
    source: &Address,
    destination: &Address,
    quiet: bool,
) -> Result<()> {
    let (strategy, src, dst) = select(Shape::Item, source, destination)?;
    log_elapsed_on_error(source, run_item(session, strategy, src, dst, quiet)).await
}

/// [copy_item] without the failure line, for the members of a tree copy.
pub async fn transfer_item(
    session: &Session<'_>,
    source: &Address,
    destination: &Address,
    quiet: bool,
) -> Result<()> {
    let (strategy, src, dst) = select(Shape::Item, source, destination)?;
    run_item(session, strategy, src, dst, quiet).await
}

async fn run_item(
    session: &Session<'_>,
    strategy: Strategy,
    src: Location,
    dst: Location,
    quiet: bool,
) -> Result<()> {
    match (strategy, src, dst, session.client_for(strategy).await) {
        (Strategy::LocalCopy, Location::Local { path: src }, Location::Local { path: dst }, _) => {
            item::copy_local(&src, &dst, quiet).await
        }
        (Strategy::Download, Location::Remote(src), Location::Local { path: dst }, Some(client)) => {
            item::download(client, &src, &dst, quiet).await
        }
        (Strategy::Upload, Location::Local { path: src }, Location::Remote(dst), Some(client)) => {
            item::upload(client, &src, &dst, quiet).await
        }
        (Strategy::RemoteCopy, Location::Remote(src), Location::Remote(dst), Some(client)) => {
            item::copy_remote(client, &src, &dst, quiet).await
        }
        (strategy, ..) => Err(Error::StrategyMismatch(strategy)),
    }
}

/// Copies everything under a directory or prefix.  A failure is logged once for the whole
/// tree, members are not logged individually.
pub async fn copy_tree(
    session: &Session<'_>,
    source: &Address,
    destination: &Address,
    quiet: bool,
) -> Result<()> {
    let (strategy, src, dst) = select(Shape::Tree, source, destination)?;
    log_elapsed_on_error(source, async {
        match (strategy, src, dst, session.client_for(strategy).await) {
            (Strategy::LocalTree, Location::Local { path: src }, Location::Local { path: dst }, _) => {
                tree::copy_local(&src, &dst, quiet).await
            }
            (
                Strategy::DownloadTree,
                Location::Remote(src),
                Location::Local { path: dst },
                Some(client),
            ) => tree::download(session, client, &src, &dst, quiet).await,
            (
                Strategy::UploadTree,
                Location::Local { path: src },
                Location::Remote(dst),
                Some(_),
            ) => tree::upload(session, &src, &dst, quiet).await,
            (Strategy::RemoteTree, Location::Remote(src), Location::Remote(dst), Some(client)) => {
                tree::copy_remote(session, client, &src, &dst, quiet).await
            }
            (strategy, ..) => Err(Error::StrategyMismatch(strategy)),
        }
    })
    .await
}

async fn log_elapsed_on_error<F>(source: &Address, copy: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let start = Instant::now();
    let res = copy.await;
    if res.is_err() {
        error!(
            "Failed to copy '{}' (attempt took {:.6}s)",
            source,
            start.elapsed().as_secs_f64()
        );
    }
    res
}

pub(crate) fn display_uri(address: &Address) -> String {
    address
        .to_uri_string()
        .unwrap_or_else(|_| address.to_string())
}

fn progress_prefix(position: Option<(usize, usize)>) -> String {
    match position {
        Some((n, total)) => format!("[{}/{}] - ", n, total),
        None => String::new(),
    }
}

pub(crate) fn log_copied(uri: &str, position: Option<(usize, usize)>) {
    info!("{}Copied '{}'", progress_prefix(position), uri);
}

pub(crate) fn log_skipped(uri: &str, position: Option<(usize, usize)>) {
    warn!("{}Skipping '{}'", progress_prefix(position), uri);
}
