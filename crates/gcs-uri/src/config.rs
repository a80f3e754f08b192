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

//! Configuration module for the library, allows sizing of the per-call worker pool,
//! transfer chunk sizes and the retry schedule used against the object store.

use std::{path::PathBuf, time::Duration};

use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::retry::Backoff;

/// The default chunk size for uploads and downloads.  Kept well below the usual
/// object-store defaults so that transfers over slow links finish each request
/// before the server side times out.
pub const CHUNK_SIZE: u64 = 10 * 1024 * 1024;
/// The default number of concurrent ranged requests made while downloading one object.
pub const CONCURRENT_DOWNLOADER_TASKS: u16 = 8;
/// Upper bound for the default size of the worker pool used by tree and batch copies.
pub const MAX_DEFAULT_CONCURRENT_TASKS: usize = 32;
/// The delay before the first retry of a failed request.
pub const RETRY_INITIAL_DELAY_MS: u64 = 1000;
/// The factor applied to the delay after every retry.
pub const RETRY_MULTIPLIER: f64 = 1.2;
/// The longest delay between two retries.
pub const RETRY_MAX_DELAY_SECS: u64 = 60;
/// The total time a request may spend being retried.  Longer than the usual client
/// default of two minutes to tolerate slow links.
pub const RETRY_DEADLINE_SECS: u64 = 600;
/// The Cloud Storage endpoint speaking the S3-compatible XML API.
pub const ENDPOINT: &str = "https://storage.googleapis.com";

/// Holds configuration information for the library.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    chunk_size: ChunkSize,
    #[serde(default)]
    concurrent_tasks: ConcurrentTasks,
    #[serde(default)]
    concurrent_downloader_tasks: ConcurrentDownloaderTasks,
    #[serde(default)]
    retry_initial_delay_ms: RetryInitialDelayMs,
    #[serde(default)]
    retry_multiplier: RetryMultiplier,
    #[serde(default)]
    retry_max_delay_secs: RetryMaxDelaySecs,
    #[serde(default)]
    retry_deadline_secs: RetryDeadlineSecs,
    #[serde(default)]
    endpoint: Endpoint,
    #[serde(default)]
    temp_dir_path: TempDirPath,
}

/// Wrapper type for [CHUNK_SIZE] which allows [Config::chunk_size()] to bind a default value.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct ChunkSize(u64);

impl Default for ChunkSize {
    fn default() -> Self {
        ChunkSize(CHUNK_SIZE)
    }
}

/// Wrapper type for the worker pool size, defaults to the host parallelism plus four,
/// capped at [MAX_DEFAULT_CONCURRENT_TASKS].
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct ConcurrentTasks(usize);

impl Default for ConcurrentTasks {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        ConcurrentTasks(usize::min(MAX_DEFAULT_CONCURRENT_TASKS, cpus + 4))
    }
}

/// Wrapper type for [CONCURRENT_DOWNLOADER_TASKS] which allows
/// [Config::concurrent_downloader_tasks()] to bind a default value.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct ConcurrentDownloaderTasks(u16);

impl Default for ConcurrentDownloaderTasks {
    fn default() -> Self {
        ConcurrentDownloaderTasks(CONCURRENT_DOWNLOADER_TASKS)
    }
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RetryInitialDelayMs(u64);

impl Default for RetryInitialDelayMs {
    fn default() -> Self {
        RetryInitialDelayMs(RETRY_INITIAL_DELAY_MS)
    }
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RetryMultiplier(f64);

impl Default for RetryMultiplier {
    fn default() -> Self {
        RetryMultiplier(RETRY_MULTIPLIER)
    }
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RetryMaxDelaySecs(u64);

impl Default for RetryMaxDelaySecs {
    fn default() -> Self {
        RetryMaxDelaySecs(RETRY_MAX_DELAY_SECS)
    }
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RetryDeadlineSecs(u64);

impl Default for RetryDeadlineSecs {
    fn default() -> Self {
        RetryDeadlineSecs(RETRY_DEADLINE_SECS)
    }
}

/// Wrapper type for [ENDPOINT] which allows [Config::endpoint()] to bind a default value.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct Endpoint(String);

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint(ENDPOINT.to_owned())
    }
}

/// Wrapper type for the temp file directory which allows [Config::temp_dir_path()] to bind a
/// default value.
#[derive(Debug, Deserialize, Default)]
#[serde(transparent)]
struct TempDirPath(Option<PathBuf>);

static CONFIG: OnceCell<Config> = OnceCell::new();

const EXPECT_GLOBAL_CONFIG: &str = "failed to parse config from environment";

impl Config {
    /// Fetches the global config object, values are either defaulted or populated
    /// from the environment:
    ///
    /// - `GCS_URI_CHUNK_SIZE` - [Config::chunk_size()]
    /// - `GCS_URI_CONCURRENT_TASKS` - [Config::concurrent_tasks()]
    /// - `GCS_URI_CONCURRENT_DOWNLOADER_TASKS` - [Config::concurrent_downloader_tasks()]
    /// - `GCS_URI_RETRY_INITIAL_DELAY_MS`, `GCS_URI_RETRY_MULTIPLIER`,
    ///   `GCS_URI_RETRY_MAX_DELAY_SECS`, `GCS_URI_RETRY_DEADLINE_SECS` - [Config::backoff()]
    /// - `GCS_URI_ENDPOINT` - [Config::endpoint()]
    /// - `GCS_URI_TEMP_DIR_PATH` - [Config::temp_dir_path()]
    pub fn global() -> &'static Config {
        CONFIG.get_or_init(|| {
            envy::prefixed("GCS_URI_")
                .from_env::<Config>()
                .expect(EXPECT_GLOBAL_CONFIG)
        })
    }

    /// The size of each ranged request when downloading and of each part when uploading.
    /// Defaults to [CHUNK_SIZE].
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size.0
    }

    /// The number of transfers a tree or batch copy runs at once.  Every multi-item call
    /// builds its own pool of this size.
    pub fn concurrent_tasks(&self) -> usize {
        usize::max(1, self.concurrent_tasks.0)
    }

    /// The number of ranged requests in flight while downloading a single object.
    /// Defaults to [CONCURRENT_DOWNLOADER_TASKS].
    pub fn concurrent_downloader_tasks(&self) -> usize {
        usize::max(1, self.concurrent_downloader_tasks.0 as usize)
    }

    /// The retry schedule applied to requests made against the object store.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            initial: Duration::from_millis(self.retry_initial_delay_ms.0),
            maximum: Duration::from_secs(self.retry_max_delay_secs.0),
            multiplier: self.retry_multiplier.0,
            deadline: Duration::from_secs(self.retry_deadline_secs.0),
        }
    }

    /// The URL of the storage endpoint.  Defaults to [ENDPOINT].
    pub fn endpoint(&self) -> &str {
        &self.endpoint.0
    }

    /// Where partially downloaded files are staged.  Uses the destination directory if unset.
    pub fn temp_dir_path(&self) -> Option<PathBuf> {
        self.temp_dir_path.0.clone()
    }
}
