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

use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use tokio::{fs, task};
use walkdir::WalkDir;

use super::{batch, item, log_copied, log_skipped, Session};
use crate::errors::{Error, Result};
use crate::storage::ObjectStore;
use crate::tempfile::is_temp_file;
use crate::types::{Address, RemoteRef, TransferTask};
use crate::uri;

/// Every entry below `root`, parents before children.
async fn walk(root: &Path) -> Result<Vec<PathBuf>> {
    let root = root.to_owned();
    task::spawn_blocking(move || {
        WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| entry.map(walkdir::DirEntry::into_path).map_err(Error::from))
            .collect::<Result<Vec<_>>>()
    })
    .await?
}

/// A relative path as `/` separated object name suffix.
fn object_suffix(relpath: &Path) -> String {
    relpath
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Local directory to local directory.  Subdirectories are recreated, regular files (and
/// symlinks to them) are copied, anything else is skipped.
pub async fn copy_local(source: &Path, destination: &Path, quiet: bool) -> Result<()> {
    let entries = walk(source).await?;
    fs::create_dir_all(destination).await?;

    let total = entries.len();
    for (i, path) in entries.iter().enumerate() {
        let target = destination.join(path.strip_prefix(source)?);
        let position = Some((i + 1, total));
        match fs::metadata(path).await {
            Ok(metadata) if metadata.is_dir() => fs::create_dir_all(&target).await?,
            Ok(metadata) if metadata.is_file() => {
                item::copy_local(path, &target, true).await?;
                if !quiet {
                    log_copied(&uri::path_uri(path), position);
                }
            }
            _ => {
                if !quiet {
                    log_skipped(&uri::path_uri(path), position);
                }
            }
        }
    }
    Ok(())
}

/// Remote prefix to local directory.  Each object lands at its name relative to the prefix,
/// with parent directories created before any transfer starts.
pub async fn download(
    session: &Session<'_>,
    client: &dyn ObjectStore,
    source: &RemoteRef,
    destination: &Path,
    quiet: bool,
) -> Result<()> {
    let prefix = source.dir_prefix();
    let objects = client.list(&source.bucket, &prefix).await?;

    let mut tasks = Vec::with_capacity(objects.len());
    for object in objects {
        let relpath = object.name.strip_prefix(&prefix).unwrap_or(&object.name);
        if relpath.is_empty() || relpath.ends_with('/') {
            debug!("skipping directory placeholder {}", object.object_ref());
            continue;
        }
        let relpath = Path::new(relpath);
        if relpath
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            warn!("skipping {}: name escapes the destination", object.object_ref());
            continue;
        }
        let target = destination.join(relpath);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        tasks.push(TransferTask::new(object.object_ref(), target));
    }

    batch::execute(session, tasks, quiet, false).await
}

/// Local directory to remote prefix.  Every regular file below `source` becomes an object
/// named by its relative path under the destination.
pub async fn upload(
    session: &Session<'_>,
    source: &Path,
    destination: &RemoteRef,
    quiet: bool,
) -> Result<()> {
    let mut tasks = Vec::new();
    for path in walk(source).await? {
        if is_temp_file(&path) {
            continue;
        }
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {
                let name = object_suffix(path.strip_prefix(source)?);
                tasks.push(TransferTask::new(
                    Address::Path(path),
                    destination.join(&name),
                ));
            }
            _ => continue,
        }
    }

    batch::execute(session, tasks, quiet, false).await
}

/// Remote prefix to remote prefix, server side.
pub async fn copy_remote(
    session: &Session<'_>,
    client: &dyn ObjectStore,
    source: &RemoteRef,
    destination: &RemoteRef,
    quiet: bool,
) -> Result<()> {
    let prefix = source.dir_prefix();
    let objects = client.list(&source.bucket, &prefix).await?;

    let tasks = objects
        .into_iter()
        .filter_map(|object| {
            let relpath = object.name.strip_prefix(&prefix).unwrap_or(&object.name);
            if relpath.is_empty() {
                return None;
            }
            let target = destination.join(relpath);
            Some(TransferTask::new(object.object_ref(), target))
        })
        .collect();

    batch::execute(session, tasks, quiet, false).await
}
