//! S3 adapter: maps the striper's object operations onto an S3-compatible
//! bucket (the pool).
//!
//! S3 objects cannot be patched in place, so `write_at` is a
//! read-modify-write of the whole backing object; backing objects are
//! bounded by the layout's object size, which keeps this affordable.
//! Attributes live in user metadata and are updated with a self-copy.

use crate::cadapter::client::{ObjectBackend, StoreError, StoreResult};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::MetadataDirective;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use std::collections::{HashMap, VecDeque};
use tokio::time::{Duration, sleep};

/// S3 backend options
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Custom endpoint (MinIO, rustfs, ...); `None` uses AWS
    pub endpoint: Option<String>,
    pub region: String,
    /// Path-style addressing, required by most self-hosted endpoints
    pub force_path_style: bool,
    /// Transport-level retries inside the adapter
    pub max_retries: u32,
    /// Initial retry delay (milliseconds), doubled on every attempt
    pub initial_retry_delay_ms: u64,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: "us-east-1".to_string(),
            force_path_style: true,
            max_retries: 3,
            initial_retry_delay_ms: 100,
        }
    }
}

type Metadata = HashMap<String, String>;

pub struct S3Backend {
    client: Client,
    bucket: String,
    config: S3Config,
}

fn backend_err<E>(e: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::Backend(Box::new(e))
}

/// Percent-encode a key for the `x-amz-copy-source` header.
fn encode_copy_source(bucket: &str, key: &str) -> String {
    let mut out = format!("{bucket}/");
    for b in key.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

impl S3Backend {
    pub async fn new(bucket: impl Into<String>, config: S3Config) -> StoreResult<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(
                aws_config::environment::EnvironmentVariableCredentialsProvider::new(),
            )
            .region(aws_config::Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let shared = loader.load().await;
        let s3_conf = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();
        Ok(Self {
            client: Client::from_conf(s3_conf),
            bucket: bucket.into(),
            config,
        })
    }

    fn md5_base64(data: &[u8]) -> String {
        let sum = md5::compute(data);
        B64.encode(sum.0)
    }

    async fn execute_with_retry<T, F, Fut>(
        &self,
        operation: F,
        operation_name: &'static str,
    ) -> StoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = StoreResult<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(result) => return Ok(result),
                // absence is an answer, not a transient failure
                Err(e) if e.is_not_found() => return Err(e),
                Err(e) if attempt > self.config.max_retries => {
                    tracing::warn!("{operation_name} failed after {attempt} attempts: {e}");
                    return Err(e);
                }
                Err(e) => {
                    let delay_ms = self.config.initial_retry_delay_ms * 2u64.pow(attempt - 1);
                    tracing::debug!("{operation_name} attempt {attempt} failed: {e}, retrying");
                    sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    /// Whole object plus its user metadata, `None` if it does not exist.
    async fn get_full(&self, name: &str) -> StoreResult<Option<(Vec<u8>, Metadata)>> {
        let operation = || async {
            match self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(name)
                .send()
                .await
            {
                Ok(o) => {
                    let metadata = o.metadata().cloned().unwrap_or_default();
                    let body = o.body.collect().await.map_err(backend_err)?.into_bytes();
                    Ok(Some((body.to_vec(), metadata)))
                }
                Err(e)
                    if e.as_service_error()
                        .map(|se| se.is_no_such_key())
                        .unwrap_or(false) =>
                {
                    Ok(None)
                }
                Err(e) => Err(backend_err(e)),
            }
        };
        self.execute_with_retry(operation, "get_object").await
    }

    async fn put_full(&self, name: &str, data: Bytes, metadata: Metadata) -> StoreResult<()> {
        let checksum = Self::md5_base64(&data);
        let operation = || async {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(name)
                .content_md5(checksum.clone())
                .set_metadata(Some(metadata.clone()))
                .body(ByteStream::from(data.clone()))
                .send()
                .await
                .map(|_| ())
                .map_err(backend_err)
        };
        self.execute_with_retry(operation, "put_object").await
    }

    /// Swap the user metadata of an existing object by copying it onto itself.
    async fn replace_metadata(&self, name: &str, metadata: Metadata) -> StoreResult<()> {
        let source = encode_copy_source(&self.bucket, name);
        let operation = || async {
            self.client
                .copy_object()
                .bucket(&self.bucket)
                .key(name)
                .copy_source(source.clone())
                .metadata_directive(MetadataDirective::Replace)
                .set_metadata(Some(metadata.clone()))
                .send()
                .await
                .map(|_| ())
                .map_err(backend_err)
        };
        self.execute_with_retry(operation, "copy_object").await
    }

    /// User metadata of an object, `None` if it does not exist.
    async fn head(&self, name: &str) -> StoreResult<Option<Metadata>> {
        let operation = || async {
            match self
                .client
                .head_object()
                .bucket(&self.bucket)
                .key(name)
                .send()
                .await
            {
                Ok(o) => Ok(Some(o.metadata().cloned().unwrap_or_default())),
                Err(e)
                    if e.as_service_error()
                        .map(|se| se.is_not_found())
                        .unwrap_or(false) =>
                {
                    Ok(None)
                }
                Err(e) => Err(backend_err(e)),
            }
        };
        self.execute_with_retry(operation, "head_object").await
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn write_at(&self, name: &str, offset: u64, data: &[u8]) -> StoreResult<()> {
        let (mut buf, metadata) = self.get_full(name).await?.unwrap_or_default();
        let start = offset as usize;
        let end = start + data.len();
        if buf.len() < end {
            buf.resize(end, 0);
        }
        buf[start..end].copy_from_slice(data);
        self.put_full(name, Bytes::from(buf), metadata).await
    }

    async fn read_at(&self, name: &str, offset: u64, len: usize) -> StoreResult<Bytes> {
        if len == 0 {
            return Ok(Bytes::new());
        }
        let range = format!("bytes={}-{}", offset, offset + len as u64 - 1);
        let operation = || async {
            match self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(name)
                .range(range.clone())
                .send()
                .await
            {
                Ok(o) => Ok(o.body.collect().await.map_err(backend_err)?.into_bytes()),
                Err(e) => {
                    let service = e.as_service_error();
                    if service.map(|se| se.is_no_such_key()).unwrap_or(false) {
                        return Err(StoreError::NotFound(name.to_string()));
                    }
                    // S3 answers 416 for a range starting at or past the end
                    if service.and_then(|se| se.code()) == Some("InvalidRange") {
                        return Ok(Bytes::new());
                    }
                    Err(backend_err(e))
                }
            }
        };
        self.execute_with_retry(operation, "get_object_range").await
    }

    async fn get_xattr(&self, name: &str, attr: &str) -> StoreResult<Bytes> {
        let metadata = self
            .head(name)
            .await?
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        metadata
            .get(attr)
            .map(|v| Bytes::from(v.clone().into_bytes()))
            .ok_or_else(|| StoreError::NoSuchAttr {
                name: name.to_string(),
                attr: attr.to_string(),
            })
    }

    async fn set_xattr(&self, name: &str, attr: &str, value: &[u8]) -> StoreResult<()> {
        let value = std::str::from_utf8(value)
            .map_err(|e| StoreError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?
            .to_string();

        let Some(mut metadata) = self.head(name).await? else {
            let metadata = HashMap::from([(attr.to_string(), value)]);
            return self.put_full(name, Bytes::new(), metadata).await;
        };

        metadata.insert(attr.to_string(), value);
        self.replace_metadata(name, metadata).await
    }

    async fn remove_xattr(&self, name: &str, attr: &str) -> StoreResult<()> {
        let Some(mut metadata) = self.head(name).await? else {
            return Ok(());
        };
        if metadata.remove(attr).is_none() {
            return Ok(());
        }
        self.replace_metadata(name, metadata).await
    }

    fn list_objects(&self) -> BoxStream<'_, StoreResult<String>> {
        let pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();
        stream::unfold(
            (pages, VecDeque::new(), false),
            |(mut pages, mut pending, done)| async move {
                loop {
                    if let Some(name) = pending.pop_front() {
                        return Some((Ok(name), (pages, pending, done)));
                    }
                    if done {
                        return None;
                    }
                    match pages.next().await {
                        Some(Ok(page)) => pending.extend(
                            page.contents()
                                .iter()
                                .filter_map(|o| o.key().map(str::to_string)),
                        ),
                        Some(Err(e)) => return Some((Err(backend_err(e)), (pages, pending, true))),
                        None => return None,
                    }
                }
            },
        )
        .boxed()
    }
}
