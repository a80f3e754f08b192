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

use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tokio::{fs, task};

use super::log_copied;
use crate::errors::{Error, Result};
use crate::storage::{ObjectStore, TransferParams};
use crate::types::RemoteRef;
use crate::uri;

pub(crate) async fn is_dir(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false)
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name()
        .ok_or_else(|| Error::CouldNotParseFilename(path.display().to_string()))
}

/// Local file to local file.  Contents, permissions and access/modification times are
/// carried over.  Copying into an existing directory keeps the source file name.
pub async fn copy_local(source: &Path, destination: &Path, quiet: bool) -> Result<()> {
    let target = if is_dir(destination).await {
        destination.join(file_name(source)?)
    } else {
        destination.to_owned()
    };

    if let (Ok(src), Ok(dst)) = (fs::canonicalize(source).await, fs::canonicalize(&target).await)
    {
        if src == dst {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} and {} are the same file", source.display(), target.display()),
            )
            .into());
        }
    }

    let metadata = fs::metadata(source).await?;
    fs::copy(source, &target).await?;
    preserve_times(&metadata, target).await?;

    if !quiet {
        log_copied(&uri::path_uri(source), None);
    }
    Ok(())
}

async fn preserve_times(metadata: &std::fs::Metadata, target: PathBuf) -> Result<()> {
    let atime = FileTime::from_last_access_time(metadata);
    let mtime = FileTime::from_last_modification_time(metadata);
    task::spawn_blocking(move || filetime::set_file_times(target, atime, mtime)).await??;
    Ok(())
}

/// Remote object to local file.  Downloading into an existing directory keeps the object's
/// base name.
pub async fn download(
    client: &dyn ObjectStore,
    source: &RemoteRef,
    destination: &Path,
    quiet: bool,
) -> Result<()> {
    let target = if is_dir(destination).await {
        destination.join(source.basename()?)
    } else {
        destination.to_owned()
    };
    client
        .download(source, &target, &TransferParams::download())
        .await?;
    if !quiet {
        log_copied(&source.uri(), None);
    }
    Ok(())
}

/// Local file to remote object.  A destination name ending in `/` receives the file's base
/// name.
pub async fn upload(
    client: &dyn ObjectStore,
    source: &Path,
    destination: &RemoteRef,
    quiet: bool,
) -> Result<()> {
    let target = if destination.is_dir_marker() {
        destination.join(&file_name(source)?.to_string_lossy())
    } else {
        destination.clone()
    };
    client
        .upload(source, &target, &TransferParams::upload())
        .await?;
    if !quiet {
        log_copied(&uri::path_uri(source), None);
    }
    Ok(())
}

/// Remote object to remote object without moving data through this host.  A destination
/// ending in `/` receives the source's base name unless the source itself ends in `/`.
pub async fn copy_remote(
    client: &dyn ObjectStore,
    source: &RemoteRef,
    destination: &RemoteRef,
    quiet: bool,
) -> Result<()> {
    let target = if destination.is_dir_marker() && !source.is_dir_marker() {
        destination.join(source.basename()?)
    } else {
        destination.clone()
    };
    client
        .server_side_copy(source, &target.bucket, &target.name)
        .await?;
    if !quiet {
        log_copied(&target.uri(), None);
    }
    Ok(())
}
