//! DirectoryScanner: lists logical files by walking head objects.

use super::util::head_key;
use super::{SIZE_ATTR, parse_decimal};
use crate::cadapter::client::{ObjectBackend, ObjectClient, StoreError};
use crate::error::{Result, StriperError};
use futures::{Stream, StreamExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
}

pub struct DirectoryScanner<'a, B: ObjectBackend> {
    client: &'a ObjectClient<B>,
}

impl<'a, B: ObjectBackend> DirectoryScanner<'a, B> {
    pub fn new(client: &'a ObjectClient<B>) -> Self {
        Self { client }
    }

    /// Enumerate logical files in store order (unspecified).
    ///
    /// Every call starts a fresh enumeration. A head object whose size
    /// cannot be read is logged and skipped; only a failing enumeration
    /// surfaces as an error item.
    pub fn list(&self) -> impl Stream<Item = Result<FileEntry>> + use<'a, B> {
        let client = self.client;
        client.list_objects().filter_map(move |item| async move {
            let object = match item {
                Ok(object) => object,
                Err(e) => return Some(Err(StriperError::List(e))),
            };
            let name = head_key(&object)?.to_string();
            match head_entry(client, &object, name).await {
                Ok(entry) => Some(Ok(entry)),
                Err(e) => {
                    tracing::warn!("{e}, skipping");
                    None
                }
            }
        })
    }
}

async fn head_entry<B: ObjectBackend>(
    client: &ObjectClient<B>,
    object: &str,
    name: String,
) -> Result<FileEntry> {
    let attr_err = |source: StoreError| StriperError::Attribute {
        object: object.to_string(),
        attr: SIZE_ATTR.to_string(),
        source,
    };
    let raw = client
        .get_xattr(object, SIZE_ATTR)
        .await
        .map_err(attr_err)?;
    let size = parse_decimal(&raw).ok_or_else(|| {
        attr_err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unparsable value {:?}", String::from_utf8_lossy(&raw)),
        )))
    })?;
    Ok(FileEntry { name, size })
}
