//! StripeWriter: reads a byte stream in bounded chunks and scatters each
//! chunk over the backing objects.

use super::layout::LayoutPolicy;
use super::progress::Progress;
use super::util::{head_object_name, object_name, split_range};
use super::{
    DEFAULT_BUFFER_SIZE, OBJECT_SIZE_ATTR, SIZE_ATTR, STRIPE_COUNT_ATTR, STRIPE_UNIT_ATTR,
};
use crate::cadapter::client::{ObjectBackend, ObjectClient, StoreError};
use crate::error::{Result, StriperError};
use indicatif::ProgressBar;
use tokio::io::{AsyncRead, AsyncReadExt};

pub struct StripeWriter<'a, B: ObjectBackend> {
    layout: LayoutPolicy,
    client: &'a ObjectClient<B>,
    buffer_size: usize,
    progress: Option<ProgressBar>,
}

impl<'a, B: ObjectBackend> StripeWriter<'a, B> {
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

    /// Stripe everything `source` yields under `key` and finalize the size
    /// attribute. Returns the number of bytes written.
    ///
    /// `total_len` only drives progress reporting; the recorded size is
    /// what was actually read. A size left by an earlier write is cleared
    /// before anything else is touched, so on failure nothing is rolled
    /// back and the file stays unfinalized.
    pub async fn write<R>(&self, key: &str, mut source: R, total_len: u64) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        self.invalidate(key).await?;
        self.write_layout(key).await?;

        let mut progress = Progress::new("put", key, total_len, self.progress.clone());
        let written = match self.copy_in(key, &mut source, &mut progress).await {
            Ok(n) => n,
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };
        if written != total_len {
            tracing::warn!("{key}: expected {total_len} bytes, source yielded {written}");
        }

        self.finalize(key, written).await?;
        progress.finish();
        tracing::info!(
            "wrote {written} bytes to {key} across {} objects",
            self.layout.object_count(written)
        );
        Ok(written)
    }

    /// Write `data` at logical `offset` of `key`, one store write per
    /// stripe span. Does not touch the size attribute.
    pub async fn write_extent(&self, key: &str, offset: u64, data: &[u8]) -> Result<()> {
        let mut cursor = 0usize;
        for span in split_range(self.layout, offset, data.len()) {
            let name = object_name(key, span.object_index);
            let chunk = &data[cursor..cursor + span.len];
            self.client
                .write_at(&name, span.object_offset, chunk)
                .await
                .map_err(|source| StriperError::Write {
                    key: key.to_string(),
                    object: Some(name.clone()),
                    offset: offset + cursor as u64,
                    source,
                })?;
            cursor += span.len;
        }
        Ok(())
    }

    async fn copy_in<R>(&self, key: &str, source: &mut R, progress: &mut Progress) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; self.buffer_size];
        let mut offset = 0u64;
        loop {
            let n = source
                .read(&mut buf)
                .await
                .map_err(|e| StriperError::Write {
                    key: key.to_string(),
                    object: None,
                    offset,
                    source: StoreError::Io(e),
                })?;
            if n == 0 {
                return Ok(offset);
            }
            self.write_extent(key, offset, &buf[..n]).await?;
            offset += n as u64;
            progress.advance(n as u64);
        }
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        let head = head_object_name(key);
        self.client
            .remove_xattr(&head, SIZE_ATTR)
            .await
            .map_err(|source| StriperError::Write {
                key: key.to_string(),
                object: Some(head),
                offset: 0,
                source,
            })
    }

    async fn write_layout(&self, key: &str) -> Result<()> {
        let attrs = [
            (STRIPE_UNIT_ATTR, self.layout.stripe_unit()),
            (STRIPE_COUNT_ATTR, self.layout.stripe_count()),
            (OBJECT_SIZE_ATTR, self.layout.object_size()),
        ];
        for (attr, value) in attrs {
            self.set_head_attr(key, attr, value, 0).await?;
        }
        Ok(())
    }

    async fn finalize(&self, key: &str, size: u64) -> Result<()> {
        self.set_head_attr(key, SIZE_ATTR, size, size).await
    }

    async fn set_head_attr(&self, key: &str, attr: &str, value: u64, offset: u64) -> Result<()> {
        let head = head_object_name(key);
        self.client
            .set_xattr(&head, attr, value.to_string().as_bytes())
            .await
            .map_err(|source| StriperError::Write {
                key: key.to_string(),
                object: Some(head),
                offset,
                source,
            })
    }
}
