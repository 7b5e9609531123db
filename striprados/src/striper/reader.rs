//! StripeReader: resolves a logical file from its head object and gathers
//! its bytes back from the backing objects, zero-filling holes.

use super::layout::{LayoutError, LayoutPolicy};
use super::progress::Progress;
use super::util::{head_object_name, object_name, split_range};
use super::{
    DEFAULT_BUFFER_SIZE, OBJECT_SIZE_ATTR, SIZE_ATTR, STRIPE_COUNT_ATTR, STRIPE_UNIT_ATTR,
    parse_decimal,
};
use crate::cadapter::client::{ObjectBackend, ObjectClient, StoreError};
use crate::error::{Result, StriperError};
use bytes::{Bytes, BytesMut};
use indicatif::ProgressBar;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Head object metadata of a logical file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub key: String,
    pub size: u64,
    pub layout: LayoutPolicy,
}

pub struct StripeReader<'a, B: ObjectBackend> {
    layout: LayoutPolicy,
    client: &'a ObjectClient<B>,
    buffer_size: usize,
    progress: Option<ProgressBar>,
}

impl<'a, B: ObjectBackend> StripeReader<'a, B> {
    /// `layout` is used for files whose head object records no layout.
    pub fn new(layout: LayoutPolicy, client: &'a ObjectClient<B>) -> Self {
        Self {
            layout,
            client,
            buffer_size: DEFAULT_BUFFER_SIZE,
            progress: None,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Look up size and layout of `key`.
    ///
    /// Any failure to obtain a parsable size is reported as `NotFound`: a
    /// file without a finalized size is not trusted to exist.
    pub async fn stat(&self, key: &str) -> Result<FileStat> {
        let head = head_object_name(key);
        let not_found = || StriperError::NotFound {
            key: key.to_string(),
        };
        let raw = match self.client.get_xattr(&head, SIZE_ATTR).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("cannot get {SIZE_ATTR} of {head}: {e}");
                return Err(not_found());
            }
        };
        let size = parse_decimal(&raw).ok_or_else(|| {
            tracing::warn!("unparsable {SIZE_ATTR} on {head}: {raw:?}");
            not_found()
        })?;
        let layout = self.file_layout(key, &head).await?;
        Ok(FileStat {
            key: key.to_string(),
            size,
            layout,
        })
    }

    /// Read up to `len` bytes at logical `offset`; empty at or past the end.
    pub async fn read_at(&self, stat: &FileStat, offset: u64, len: usize) -> Result<Bytes> {
        if offset >= stat.size {
            return Ok(Bytes::new());
        }
        let len = (stat.size - offset).min(len as u64) as usize;
        let mut out = BytesMut::with_capacity(len);
        let mut logical = offset;
        for span in split_range(stat.layout, offset, len) {
            let name = object_name(&stat.key, span.object_index);
            match self.client.read_at(&name, span.object_offset, span.len).await {
                Ok(data) => {
                    let n = data.len().min(span.len);
                    out.extend_from_slice(&data[..n]);
                    // short object inside the recorded size: a hole
                    out.resize(out.len() + span.len - n, 0);
                }
                Err(e) if e.is_not_found() => out.resize(out.len() + span.len, 0),
                Err(source) => {
                    return Err(StriperError::Read {
                        key: stat.key.clone(),
                        object: Some(name),
                        offset: logical,
                        source,
                    });
                }
            }
            logical += span.len as u64;
        }
        Ok(out.freeze())
    }

    /// Copy the whole file into `sink`. Nothing is written when `key` does
    /// not exist.
    pub async fn read_into<W>(&self, key: &str, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let stat = self.stat(key).await?;
        self.read_stat_into(&stat, sink).await
    }

    /// Like `read_into` for a file already resolved with `stat`.
    pub async fn read_stat_into<W>(&self, stat: &FileStat, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut progress = Progress::new("get", &stat.key, stat.size, self.progress.clone());
        match self.copy_out(stat, sink, &mut progress).await {
            Ok(n) => {
                progress.finish();
                Ok(n)
            }
            Err(e) => {
                progress.abandon();
                Err(e)
            }
        }
    }

    pub async fn read(&self, key: &str) -> Result<Bytes> {
        let mut out = Vec::new();
        self.read_into(key, &mut out).await?;
        Ok(Bytes::from(out))
    }

    async fn copy_out<W>(&self, stat: &FileStat, sink: &mut W, progress: &mut Progress) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let sink_err = |offset: u64, e: std::io::Error| StriperError::Read {
            key: stat.key.clone(),
            object: None,
            offset,
            source: StoreError::Io(e),
        };
        let mut offset = 0u64;
        loop {
            let chunk = self.read_at(stat, offset, self.buffer_size).await?;
            if chunk.is_empty() {
                break;
            }
            sink.write_all(&chunk).await.map_err(|e| sink_err(offset, e))?;
            offset += chunk.len() as u64;
            progress.advance(chunk.len() as u64);
        }
        sink.flush().await.map_err(|e| sink_err(offset, e))?;
        Ok(offset)
    }

    async fn file_layout(&self, key: &str, head: &str) -> Result<LayoutPolicy> {
        let stripe_unit = self.layout_attr(key, head, STRIPE_UNIT_ATTR).await?;
        let stripe_count = self.layout_attr(key, head, STRIPE_COUNT_ATTR).await?;
        let object_size = self.layout_attr(key, head, OBJECT_SIZE_ATTR).await?;
        match (stripe_unit, stripe_count, object_size) {
            (None, None, None) => Ok(self.layout),
            (Some(su), Some(sc), Some(os)) => Ok(LayoutPolicy::new(su, os, sc)?),
            (su, sc, _) => {
                let attr = if su.is_none() {
                    STRIPE_UNIT_ATTR
                } else if sc.is_none() {
                    STRIPE_COUNT_ATTR
                } else {
                    OBJECT_SIZE_ATTR
                };
                Err(LayoutError::BadAttribute {
                    attr,
                    value: "<missing>".to_string(),
                }
                .into())
            }
        }
    }

    async fn layout_attr(&self, key: &str, head: &str, attr: &'static str) -> Result<Option<u64>> {
        match self.client.get_xattr(head, attr).await {
            Ok(raw) => parse_decimal(&raw).map(Some).ok_or_else(|| {
                LayoutError::BadAttribute {
                    attr,
                    value: String::from_utf8_lossy(&raw).into_owned(),
                }
                .into()
            }),
            Err(e) if e.is_not_found() => Ok(None),
            Err(source) => Err(StriperError::Read {
                key: key.to_string(),
                object: Some(head.to_string()),
                offset: 0,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cadapter::memory::InMemoryBackend;
    use crate::striper::writer::StripeWriter;

    #[tokio::test]
    async fn test_reader_zero_fills_holes() {
        let client = ObjectClient::new(InMemoryBackend::new());
        let layout = LayoutPolicy::new(4, 8, 2).unwrap();
        // only the second stripe unit (object 1) was ever written
        StripeWriter::new(layout, &client)
            .write_extent("sparse", 4, b"abcd")
            .await
            .unwrap();
        client
            .set_xattr("sparse.0000000000000000", SIZE_ATTR, b"10")
            .await
            .unwrap();

        let reader = StripeReader::new(layout, &client);
        let out = reader.read("sparse").await.unwrap();
        assert_eq!(&out[..], b"\0\0\0\0abcd\0\0");
    }

    #[tokio::test]
    async fn test_reader_missing_key_writes_nothing() {
        let client = ObjectClient::new(InMemoryBackend::new());
        let reader = StripeReader::new(LayoutPolicy::default(), &client);
        let mut sink = Vec::new();
        let err = reader.read_into("nonexistent", &mut sink).await.unwrap_err();
        assert!(matches!(err, StriperError::NotFound { ref key } if key == "nonexistent"));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_reader_unparsable_size_is_not_found() {
        let client = ObjectClient::new(InMemoryBackend::new());
        client
            .set_xattr("bad.0000000000000000", SIZE_ATTR, b"lots")
            .await
            .unwrap();
        let reader = StripeReader::new(LayoutPolicy::default(), &client);
        let err = reader.stat("bad").await.unwrap_err();
        assert!(matches!(err, StriperError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_reader_uses_recorded_layout() {
        let client = ObjectClient::new(InMemoryBackend::new());
        let written_with = LayoutPolicy::new(8, 16, 3).unwrap();
        let data: Vec<u8> = (0..100u8).collect();
        StripeWriter::new(written_with, &client)
            .write("odd", &data[..], 100)
            .await
            .unwrap();

        // reader default differs; the head object's layout must win
        let reader = StripeReader::new(LayoutPolicy::default(), &client).with_buffer_size(7);
        let stat = reader.stat("odd").await.unwrap();
        assert_eq!(stat.layout, written_with);
        assert_eq!(stat.size, 100);
        assert_eq!(&reader.read("odd").await.unwrap()[..], &data[..]);

        let mid = reader.read_at(&stat, 95, 64).await.unwrap();
        assert_eq!(&mid[..], &data[95..]);
        assert!(reader.read_at(&stat, 100, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reader_rejects_partial_layout() {
        let client = ObjectClient::new(InMemoryBackend::new());
        let head = "p.0000000000000000";
        client.set_xattr(head, SIZE_ATTR, b"1").await.unwrap();
        client.set_xattr(head, STRIPE_UNIT_ATTR, b"4").await.unwrap();
        let reader = StripeReader::new(LayoutPolicy::default(), &client);
        let err = reader.stat("p").await.unwrap_err();
        assert!(matches!(
            err,
            StriperError::Configuration(LayoutError::BadAttribute {
                attr: STRIPE_COUNT_ATTR,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_reader_zero_size() {
        let client = ObjectClient::new(InMemoryBackend::new());
        client
            .set_xattr("z.0000000000000000", SIZE_ATTR, b"0")
            .await
            .unwrap();
        let reader = StripeReader::new(LayoutPolicy::default(), &client);
        let mut sink = Vec::new();
        assert_eq!(reader.read_into("z", &mut sink).await.unwrap(), 0);
        assert!(sink.is_empty());
    }
}
