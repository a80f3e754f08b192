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

//! [ObjectStore] backed by Cloud Storage's S3-compatible XML API.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_types::region::Region;
use bytes::Bytes;
use futures::{stream, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::retry::{handle_transient_error, RetryPolicy};
use crate::storage::{ObjectStore, TransferParams};
use crate::tempfile::TempFile;
use crate::types::{ObjectDescriptor, RemoteRef};

pub use aws_sdk_s3::Client;

/// Cloud Storage ignores the signing region, but the SDK requires one.
const GCS_REGION: &str = "auto";

/// Header carrying the generation a write expects to replace.  Generation `0` means the
/// object must not exist yet.
const GENERATION_MATCH_HEADER: &str = "x-goog-if-generation-match";

/// The smallest part size the multipart API accepts for every part but the last.
const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Characters left unescaped in the `x-amz-copy-source` header.
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone)]
pub struct GcsClient {
    s3: Client,
    read_retry: RetryPolicy,
    write_retry: RetryPolicy,
}

impl GcsClient {
    /// Builds a client from the ambient environment.  Credentials are HMAC keys taken from
    /// the usual `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` chain and requests go to
    /// [Config::endpoint()].
    pub async fn from_env() -> Self {
        let config = Config::global();
        debug!("building storage client for {}", config.endpoint());
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(config.endpoint())
            .region(Region::new(GCS_REGION))
            .retry_config(RetryConfig::disabled())
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();
        Self::new(Client::from_conf(s3_config))
    }

    pub fn new(s3: Client) -> Self {
        GcsClient {
            s3,
            read_retry: RetryPolicy::read(),
            write_retry: RetryPolicy::write(),
        }
    }

    /// Overrides the policies used for listings, existence checks, deletes and copies.
    pub fn with_retry_policies(mut self, read: RetryPolicy, write: RetryPolicy) -> Self {
        self.read_retry = read;
        self.write_retry = write;
        self
    }

    pub fn inner(&self) -> &Client {
        &self.s3
    }

    async fn head_size(&self, object: &RemoteRef, retry: &RetryPolicy) -> Result<Option<u64>> {
        let uri = object.uri();
        let res = handle_transient_error(retry, None, || async {
            self.s3
                .head_object()
                .bucket(&object.bucket)
                .key(&object.name)
                .send()
                .await
                .map_err(|e| {
                    from_sdk_error(e, &uri, |message| Error::DownloadFailed {
                        uri: uri.clone(),
                        message,
                    })
                })
        })
        .await;
        match res {
            Ok(hoo) => Ok(Some(hoo.content_length().unwrap_or_default().max(0) as u64)),
            Err(Error::RemoteNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_range(
        &self,
        object: &RemoteRef,
        (start, end): (u64, u64),
        retry: &RetryPolicy,
    ) -> Result<Bytes> {
        let uri = object.uri();
        debug!("get range={}-{} uri={}", start, end, uri);
        handle_transient_error(retry, None, || async {
            let goo = self
                .s3
                .get_object()
                .bucket(&object.bucket)
                .key(&object.name)
                .range(format!("bytes={}-{}", start, end))
                .send()
                .await
                .map_err(|e| {
                    from_sdk_error(e, &uri, |message| Error::DownloadFailed {
                        uri: uri.clone(),
                        message,
                    })
                })?;
            let data = goo
                .body
                .collect()
                .await
                .map_err(|e| Error::Transient(format!("{}: {}", uri, e)))?;
            Ok(data.into_bytes())
        })
        .await
    }

    async fn put(&self, path: &Path, object: &RemoteRef, retry: &RetryPolicy) -> Result<()> {
        let body = Bytes::from(tokio::fs::read(path).await?);
        let uri = object.uri();
        handle_transient_error(retry, object.generation, || async {
            let request = self
                .s3
                .put_object()
                .bucket(&object.bucket)
                .key(&object.name)
                .body(ByteStream::from(body.clone()));
            let res = match object.generation {
                Some(generation) => {
                    request
                        .customize()
                        .mutate_request(move |req| {
                            req.headers_mut()
                                .insert(GENERATION_MATCH_HEADER, generation.to_string());
                        })
                        .send()
                        .await
                }
                None => request.send().await,
            };
            res.map(|_| ()).map_err(|e| {
                from_sdk_error(e, &uri, |message| Error::UploadFailed {
                    uri: uri.clone(),
                    message,
                })
            })
        })
        .await
    }

    async fn multipart_upload(
        &self,
        path: &Path,
        object: &RemoteRef,
        size: u64,
        part_size: u64,
        retry: &RetryPolicy,
    ) -> Result<()> {
        let uri = object.uri();
        let cmuo = handle_transient_error(retry, object.generation, || async {
            let request = self
                .s3
                .create_multipart_upload()
                .bucket(&object.bucket)
                .key(&object.name);
            let res = match object.generation {
                Some(generation) => {
                    request
                        .customize()
                        .mutate_request(move |req| {
                            req.headers_mut()
                                .insert(GENERATION_MATCH_HEADER, generation.to_string());
                        })
                        .send()
                        .await
                }
                None => request.send().await,
            };
            res.map_err(|e| {
                from_sdk_error(e, &uri, |message| Error::UploadFailed {
                    uri: uri.clone(),
                    message,
                })
            })
        })
        .await?;
        let upload_id = cmuo.upload_id().ok_or(Error::UploadIdNone)?.to_owned();

        let result = async {
            let mut parts: Vec<CompletedPart> = stream::iter(chunk_ranges(size, part_size))
                .enumerate()
                .map(|(index, range)| {
                    self.upload_part(path, object, &upload_id, index as i32 + 1, range, retry)
                })
                .buffer_unordered(Config::global().concurrent_downloader_tasks())
                .try_collect()
                .await?;
            parts.sort_by_key(|part| part.part_number());
            self.complete_multipart_upload(object, &upload_id, parts, retry)
                .await
        }
        .await;

        if result.is_err() {
            if let Err(e) = self
                .s3
                .abort_multipart_upload()
                .bucket(&object.bucket)
                .key(&object.name)
                .upload_id(&upload_id)
                .send()
                .await
            {
                warn!(
                    "failed to abort multipart upload of {}: {}",
                    uri,
                    DisplayErrorContext(&e)
                );
            }
        }
        result
    }

    async fn upload_part(
        &self,
        path: &Path,
        object: &RemoteRef,
        upload_id: &str,
        part_number: i32,
        (start, end): (u64, u64),
        retry: &RetryPolicy,
    ) -> Result<CompletedPart> {
        let mut buf = vec![0u8; (end - start + 1) as usize];
        let mut file = File::open(path).await?;
        file.seek(SeekFrom::Start(start)).await?;
        file.read_exact(&mut buf).await?;
        let body = Bytes::from(buf);

        let uri = object.uri();
        debug!("upload part={} uri={}", part_number, uri);
        let upo = handle_transient_error(retry, object.generation, || async {
            self.s3
                .upload_part()
                .bucket(&object.bucket)
                .key(&object.name)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(body.clone()))
                .send()
                .await
                .map_err(|e| {
                    from_sdk_error(e, &uri, |message| Error::UploadFailed {
                        uri: uri.clone(),
                        message,
                    })
                })
        })
        .await?;
        Ok(CompletedPart::builder()
            .set_e_tag(upo.e_tag().map(str::to_owned))
            .part_number(part_number)
            .build())
    }

    async fn complete_multipart_upload(
        &self,
        object: &RemoteRef,
        upload_id: &str,
        parts: Vec<CompletedPart>,
        retry: &RetryPolicy,
    ) -> Result<()> {
        let uri = object.uri();
        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();
        handle_transient_error(retry, object.generation, || async {
            self.s3
                .complete_multipart_upload()
                .bucket(&object.bucket)
                .key(&object.name)
                .upload_id(upload_id)
                .multipart_upload(completed.clone())
                .send()
                .await
                .map(|_| ())
                .map_err(|e| {
                    from_sdk_error(e, &uri, |message| Error::UploadFailed {
                        uri: uri.clone(),
                        message,
                    })
                })
        })
        .await
    }
}

#[async_trait]
impl ObjectStore for GcsClient {
    async fn download(
        &self,
        object: &RemoteRef,
        path: &Path,
        params: &TransferParams,
    ) -> Result<()> {
        info!("download: uri={}, file={}", object, path.display());
        let size = self
            .head_size(object, &params.retry)
            .await?
            .ok_or_else(|| Error::RemoteNotFound(object.uri()))?;

        let mut dest = TempFile::new(staging_dir(path)).await?;
        let mut chunks = stream::iter(chunk_ranges(size, params.chunk_size))
            .map(|range| self.get_range(object, range, &params.retry))
            .buffered(Config::global().concurrent_downloader_tasks());

        let file = dest.file_mut();
        let mut written = 0u64;
        while let Some(bytes) = chunks.try_next().await? {
            written += bytes.len() as u64;
            file.write_all(&bytes).await?;
        }
        file.flush().await?;
        if written != size {
            return Err(Error::ObjectSizeChanged);
        }

        dest.persist(path.to_owned()).await
    }

    async fn upload(&self, path: &Path, object: &RemoteRef, params: &TransferParams) -> Result<()> {
        info!("upload: file={}, uri={}", path.display(), object);
        let size = tokio::fs::metadata(path).await?.len();
        let part_size = u64::max(params.chunk_size, MIN_PART_SIZE);
        if size <= part_size {
            self.put(path, object, &params.retry).await
        } else {
            self.multipart_upload(path, object, size, part_size, &params.retry)
                .await
        }
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectDescriptor>> {
        let uri = RemoteRef::new(bucket, prefix).uri();
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = handle_transient_error(&self.read_retry, None, || async {
                self.s3
                    .list_objects_v2()
                    .bucket(bucket)
                    .prefix(prefix)
                    .set_continuation_token(continuation.clone())
                    .send()
                    .await
                    .map_err(|e| {
                        from_sdk_error(e, &uri, |message| Error::ListObjectsFailed {
                            prefix: uri.clone(),
                            message,
                        })
                    })
            })
            .await?;
            for object in page.contents() {
                match object.key() {
                    Some(key) => objects.push(ObjectDescriptor {
                        bucket: bucket.to_owned(),
                        name: key.to_owned(),
                        size: object.size().map(|size| size.max(0) as u64),
                        generation: None,
                    }),
                    None => warn!("listing of {} returned an object without a name", uri),
                }
            }
            continuation = page.next_continuation_token().map(str::to_owned);
            if continuation.is_none() {
                break;
            }
        }
        debug!("listed {} objects under {}", objects.len(), uri);
        Ok(objects)
    }

    async fn server_side_copy(&self, source: &RemoteRef, bucket: &str, name: &str) -> Result<()> {
        info!("copy: source={}, destination=gs://{}/{}", source, bucket, name);
        let copy_source = copy_source(source);
        let uri = source.uri();
        handle_transient_error(&self.write_retry, None, || async {
            self.s3
                .copy_object()
                .copy_source(&copy_source)
                .bucket(bucket)
                .key(name)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| {
                    from_sdk_error(e, &uri, |message| Error::CopyFailed {
                        uri: uri.clone(),
                        message,
                    })
                })
        })
        .await
    }

    async fn object_exists(&self, object: &RemoteRef) -> Result<bool> {
        Ok(self.head_size(object, &self.read_retry).await?.is_some())
    }

    async fn delete(&self, object: &RemoteRef) -> Result<()> {
        info!("delete: uri={}", object);
        let uri = object.uri();
        handle_transient_error(&self.read_retry, None, || async {
            self.s3
                .delete_object()
                .bucket(&object.bucket)
                .key(&object.name)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| {
                    from_sdk_error(e, &uri, |message| Error::DeleteFailed {
                        uri: uri.clone(),
                        message,
                    })
                })
        })
        .await
    }
}

/// Maps a failed request onto the error taxonomy: missing objects and buckets become
/// [Error::RemoteNotFound], connection failures, timeouts, `408`, `429` and `5xx` responses
/// become [Error::Transient], and anything else is reported through `failed`.
fn from_sdk_error<E>(
    err: SdkError<E, HttpResponse>,
    uri: &str,
    failed: impl FnOnce(String) -> Error,
) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            Error::Transient(format!("{}: {}", uri, message))
        }
        SdkError::ServiceError(service) => {
            let status = service.raw().status().as_u16();
            let code = service.err().code();
            if status == 404 || matches!(code, Some("NoSuchKey" | "NoSuchBucket" | "NotFound")) {
                Error::RemoteNotFound(uri.to_owned())
            } else if status == 408 || status == 429 || status >= 500 {
                Error::Transient(format!("{}: {}", uri, message))
            } else {
                failed(message)
            }
        }
        _ => Error::SdkError(message),
    }
}

/// Inclusive byte ranges covering `size` bytes in pieces of at most `chunk_size`.
fn chunk_ranges(size: u64, chunk_size: u64) -> Vec<(u64, u64)> {
    let chunk_size = u64::max(1, chunk_size);
    (0..size.div_ceil(chunk_size))
        .map(|i| {
            let start = i * chunk_size;
            (start, u64::min(start + chunk_size, size) - 1)
        })
        .collect()
}

fn copy_source(source: &RemoteRef) -> String {
    let encoded = format!(
        "{}/{}",
        source.bucket,
        utf8_percent_encode(&source.name, COPY_SOURCE)
    );
    match source.generation {
        Some(generation) => format!("{}?versionId={}", encoded, generation),
        None => encoded,
    }
}

fn staging_dir(path: &Path) -> PathBuf {
    Config::global().temp_dir_path().unwrap_or_else(|| {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_owned(),
            _ => PathBuf::from("."),
        }
    })
}
