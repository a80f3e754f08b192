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

pub use std::error::Error as StdError;
use std::path::StripPrefixError;

use tokio::task::JoinError;

use crate::ops::strategy::Strategy;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to determine scheme for {0:?}")]
    InvalidAddress(String),

    #[error("remote object not found: {0}")]
    RemoteNotFound(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    WalkDirFailed(#[from] walkdir::Error),

    #[error(transparent)]
    StripPrefixFailed(#[from] StripPrefixError),

    #[error(transparent)]
    JoinError(#[from] JoinError),

    #[error(transparent)]
    PersistError(#[from] tempfile::PathPersistError),

    #[error("could not determine a file name for {0:?}")]
    CouldNotParseFilename(String),

    #[error("flattening {0:?} produced an empty name")]
    EmptyFlattenedName(String),

    #[error("got {sources} sources but {destinations} destinations")]
    LengthMismatch { sources: usize, destinations: usize },

    #[error("list objects failed on prefix {prefix}: {message}")]
    ListObjectsFailed { prefix: String, message: String },

    #[error("download of {uri} failed: {message}")]
    DownloadFailed { uri: String, message: String },

    #[error("upload to {uri} failed: {message}")]
    UploadFailed { uri: String, message: String },

    #[error("copy of {uri} failed: {message}")]
    CopyFailed { uri: String, message: String },

    #[error("delete of {uri} failed: {message}")]
    DeleteFailed { uri: String, message: String },

    #[error("strategy {0} does not apply to these addresses")]
    StrategyMismatch(Strategy),

    #[error("create_multipart_upload upload_id was none")]
    UploadIdNone,

    #[error("remote object size changed while reading")]
    ObjectSizeChanged,

    #[error("transient storage error: {0}")]
    Transient(String),

    #[error("sdk error: {0}")]
    SdkError(String),
}

impl Error {
    /// Whether a request that failed with this error may succeed if sent again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient(_))
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Error::RemoteNotFound(_) => true,
            Error::IoError(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(_: std::convert::Infallible) -> Self {
        unreachable!()
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::IoError(e) => e,
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}
