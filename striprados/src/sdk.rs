//! SDK interface: one object client plus one default layout, exposing the
//! three striped operations.

use crate::cadapter::client::{ObjectBackend, ObjectClient};
use crate::cadapter::localfs::LocalFsBackend;
use crate::cadapter::memory::InMemoryBackend;
use crate::error::Result;
use crate::striper::layout::LayoutPolicy;
use crate::striper::reader::{FileStat, StripeReader};
use crate::striper::scanner::{DirectoryScanner, FileEntry};
use crate::striper::writer::StripeWriter;
use bytes::Bytes;
use futures::Stream;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncWrite};

/// Striped object client (generic backend).
pub struct StripedClient<B: ObjectBackend> {
    client: ObjectClient<B>,
    layout: LayoutPolicy,
}

impl<B: ObjectBackend> StripedClient<B> {
    pub fn new(backend: B, layout: LayoutPolicy) -> Self {
        Self {
            client: ObjectClient::new(backend),
            layout,
        }
    }

    pub fn layout(&self) -> LayoutPolicy {
        self.layout
    }

    pub fn object_client(&self) -> &ObjectClient<B> {
        &self.client
    }

    pub fn writer(&self) -> StripeWriter<'_, B> {
        StripeWriter::new(self.layout, &self.client)
    }

    pub fn reader(&self) -> StripeReader<'_, B> {
        StripeReader::new(self.layout, &self.client)
    }

    pub fn scanner(&self) -> DirectoryScanner<'_, B> {
        DirectoryScanner::new(&self.client)
    }

    pub async fn write<R>(&self, key: &str, source: R, total_len: u64) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        self.writer().write(key, source, total_len).await
    }

    pub async fn stat(&self, key: &str) -> Result<FileStat> {
        self.reader().stat(key).await
    }

    pub async fn read(&self, key: &str) -> Result<Bytes> {
        self.reader().read(key).await
    }

    pub async fn read_into<W>(&self, key: &str, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        self.reader().read_into(key, sink).await
    }

    pub fn list(&self) -> impl Stream<Item = Result<FileEntry>> + '_ {
        // the scanner only borrows the client, so it can be rebuilt per call
        DirectoryScanner::new(&self.client).list()
    }
}

pub type LocalClient = StripedClient<LocalFsBackend>;
pub type MemoryClient = StripedClient<InMemoryBackend>;

impl LocalClient {
    pub fn new_local<P: AsRef<Path>>(root: P, layout: LayoutPolicy) -> Self {
        StripedClient::new(LocalFsBackend::new(root), layout)
    }
}

impl MemoryClient {
    pub fn new_memory(layout: LayoutPolicy) -> Self {
        StripedClient::new(InMemoryBackend::new(), layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sdk_local_basic() {
        let tmp = tempdir().unwrap();
        let layout = LayoutPolicy::new(1024, 4096, 3).unwrap();
        let cli = LocalClient::new_local(tmp.path(), layout);

        let data: Vec<u8> = (0..20_000).map(|i| (i % 251) as u8).collect();
        cli.write("dir/hello.bin", &data[..], data.len() as u64)
            .await
            .unwrap();

        let st = cli.stat("dir/hello.bin").await.unwrap();
        assert_eq!(st.size, data.len() as u64);
        assert_eq!(st.layout, layout);
        assert_eq!(&cli.read("dir/hello.bin").await.unwrap()[..], &data[..]);

        let ent: Vec<FileEntry> = cli.list().try_collect().await.unwrap();
        assert_eq!(
            ent,
            vec![FileEntry {
                name: "dir/hello.bin".into(),
                size: 20_000
            }]
        );
    }
}
