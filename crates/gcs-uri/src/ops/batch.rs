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

use futures::{stream, StreamExt};
use log::{debug, info};
use tokio::fs;

use super::{display_uri, log_copied, Session};
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::types::{Address, Location, TransferResult, TransferTask};

/// Where the sources of a batch copy go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destinations {
    /// Every source is copied into this directory (or prefix) under its flattened name.
    Directory(Address),
    /// Sources are paired with destinations by position.
    Each(Vec<Address>),
}

impl Destinations {
    pub fn directory(address: impl Into<Address>) -> Self {
        Destinations::Directory(address.into())
    }

    pub fn each<I, A>(addresses: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Address>,
    {
        Destinations::Each(addresses.into_iter().map(Into::into).collect())
    }
}

impl From<Address> for Destinations {
    fn from(address: Address) -> Self {
        Destinations::Directory(address)
    }
}

impl From<Vec<Address>> for Destinations {
    fn from(addresses: Vec<Address>) -> Self {
        Destinations::Each(addresses)
    }
}

/// Pairs every source with its destination.  Fails before anything is copied when a name
/// cannot be derived or the two sequences differ in length.
pub fn plan(sources: Vec<Address>, destinations: Destinations) -> Result<Vec<TransferTask>> {
    match destinations {
        Destinations::Directory(directory) => sources
            .into_iter()
            .map(|source| {
                let name = source.flatten()?;
                let destination = directory.join(&name);
                Ok(TransferTask {
                    source,
                    destination,
                })
            })
            .collect(),
        Destinations::Each(destinations) => {
            if sources.len() != destinations.len() {
                return Err(Error::LengthMismatch {
                    sources: sources.len(),
                    destinations: destinations.len(),
                });
            }
            Ok(sources
                .into_iter()
                .zip(destinations)
                .map(|(source, destination)| TransferTask {
                    source,
                    destination,
                })
                .collect())
        }
    }
}

/// Creates the parent directory of every local destination so that concurrent transfers
/// never race to create it.
pub async fn prepare_local_destinations(tasks: &[TransferTask]) -> Result<()> {
    for task in tasks {
        if let Location::Local { path } = task.destination.resolve()? {
            match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    fs::create_dir_all(parent).await?
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Runs every task on a pool of [Config::concurrent_tasks()] workers.
///
/// Each completion is logged as `[n/N] - Copied '<source>'` in completion order.  Every task
/// runs to completion even after one fails, then the first failure observed is returned.
/// With `log_failures` each failed task also logs its own `Failed to copy` line.
pub async fn execute(
    session: &Session<'_>,
    tasks: Vec<TransferTask>,
    quiet: bool,
    log_failures: bool,
) -> Result<()> {
    let total = tasks.len();
    if total == 0 {
        debug!("nothing to copy");
        return Ok(());
    }

    let mut results = stream::iter(tasks)
        .map(|task| async move {
            let outcome = if log_failures {
                super::copy_item(session, &task.source, &task.destination, true).await
            } else {
                super::transfer_item(session, &task.source, &task.destination, true).await
            };
            TransferResult {
                source: task.source,
                outcome,
            }
        })
        .buffer_unordered(Config::global().concurrent_tasks());

    let mut completed = 0;
    let mut failures = 0;
    let mut first_error: Option<Error> = None;
    while let Some(result) = results.next().await {
        completed += 1;
        match result.outcome {
            Ok(()) => {
                if !quiet {
                    log_copied(&display_uri(&result.source), Some((completed, total)));
                }
            }
            Err(err) => {
                failures += 1;
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    debug!("copy of {} also failed: {}", result.source, err);
                }
            }
        }
    }

    match first_error {
        Some(err) => {
            info!("{} of {} copies failed", failures, total);
            Err(err)
        }
        None => Ok(()),
    }
}
