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

use std::path::{Path, PathBuf};

use tokio::{
    fs::{File, OpenOptions},
    task,
};

use crate::Result;

/// A file that only appears at its final path once it has been completely written.
pub struct TempFile {
    path: tempfile::TempPath,
    file: File,
}

/// Files with this prefix are partial downloads and are never uploaded.
pub const TEMP_FILE_PREFIX: &str = ".gcs_uri_temp";

impl TempFile {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        if !dir.exists() {
            tokio::fs::create_dir_all(&dir).await?;
        }
        let path = task::spawn_blocking(move || {
            let f = tempfile::Builder::new()
                .prefix(TEMP_FILE_PREFIX)
                .tempfile_in(dir)?;
            Result::Ok(f.into_temp_path())
        })
        .await??;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .await?;
        Ok(Self { path, file })
    }

    /// Atomically moves the file to `path`.  Dropping a `TempFile` without persisting it
    /// removes it.
    pub async fn persist(self, path: PathBuf) -> Result<()> {
        let TempFile { path: temp, file } = self;
        drop(file);
        task::spawn_blocking(move || temp.persist(path)).await??;
        Ok(())
    }

    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with(TEMP_FILE_PREFIX))
        .unwrap_or(false)
}
