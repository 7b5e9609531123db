//! Local directory backend (implements ObjectBackend).
//!
//! One directory stands in for one pool:
//!
//! ```text
//! <root>/objects/<hex(name)>              object bytes
//! <root>/xattrs/<hex(name)>/<hex(attr)>   attribute values
//! ```
//!
//! Names are hex encoded so keys containing `/` or other awkward bytes map
//! to a single flat file.

use crate::cadapter::client::{ObjectBackend, StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use std::ffi::OsStr;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

const OBJECTS_DIR: &str = "objects";
const XATTRS_DIR: &str = "xattrs";
// hex doubles the length; keep encoded names under the usual 255 byte limit
const MAX_NAME_LEN: usize = 127;

pub struct LocalFsBackend {
    root: PathBuf,
}

enum ListState {
    Start(PathBuf),
    Reading(fs::ReadDir),
    Done,
}

impl LocalFsBackend {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn encode(name: &str) -> StoreResult<String> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(hex::encode(name))
    }

    fn decode(file_name: &OsStr) -> Option<String> {
        let raw = hex::decode(file_name.to_str()?).ok()?;
        String::from_utf8(raw).ok()
    }

    fn object_path(&self, name: &str) -> StoreResult<PathBuf> {
        Ok(self.root.join(OBJECTS_DIR).join(Self::encode(name)?))
    }

    fn xattr_path(&self, name: &str, attr: &str) -> StoreResult<PathBuf> {
        Ok(self
            .root
            .join(XATTRS_DIR)
            .join(Self::encode(name)?)
            .join(hex::encode(attr)))
    }

    async fn open_for_write(path: &Path) -> StoreResult<fs::File> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let f = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .await?;
        Ok(f)
    }
}

#[async_trait]
impl ObjectBackend for LocalFsBackend {
    async fn write_at(&self, name: &str, offset: u64, data: &[u8]) -> StoreResult<()> {
        let path = self.object_path(name)?;
        let mut f = Self::open_for_write(&path).await?;
        f.seek(SeekFrom::Start(offset)).await?;
        f.write_all(data).await?;
        f.flush().await?;
        Ok(())
    }

    async fn read_at(&self, name: &str, offset: u64, len: usize) -> StoreResult<Bytes> {
        let path = self.object_path(name)?;
        let mut f = match fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        f.seek(SeekFrom::Start(offset)).await?;
        let mut buf = Vec::with_capacity(len);
        f.take(len as u64).read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }

    async fn get_xattr(&self, name: &str, attr: &str) -> StoreResult<Bytes> {
        let path = self.xattr_path(name, attr)?;
        match fs::read(path).await {
            Ok(buf) => Ok(Bytes::from(buf)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NoSuchAttr {
                name: name.to_string(),
                attr: attr.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_xattr(&self, name: &str, attr: &str, value: &[u8]) -> StoreResult<()> {
        // setting an attribute materializes the object, as a store would
        Self::open_for_write(&self.object_path(name)?).await?;

        let path = self.xattr_path(name, attr)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let mut f = fs::File::create(path).await?;
        f.write_all(value).await?;
        f.flush().await?;
        Ok(())
    }

    async fn remove_xattr(&self, name: &str, attr: &str) -> StoreResult<()> {
        match fs::remove_file(self.xattr_path(name, attr)?).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn list_objects(&self) -> BoxStream<'_, StoreResult<String>> {
        let dir = self.root.join(OBJECTS_DIR);
        stream::unfold(ListState::Start(dir), |state| async move {
            let mut entries = match state {
                ListState::Start(dir) => match fs::read_dir(&dir).await {
                    Ok(rd) => rd,
                    // an untouched pool has no objects yet
                    Err(e) if e.kind() == ErrorKind::NotFound => return None,
                    Err(e) => return Some((Err(e.into()), ListState::Done)),
                },
                ListState::Reading(rd) => rd,
                ListState::Done => return None,
            };
            loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => match Self::decode(&entry.file_name()) {
                        Some(name) => return Some((Ok(name), ListState::Reading(entries))),
                        None => {
                            tracing::debug!("skipping foreign file {:?}", entry.path());
                        }
                    },
                    Ok(None) => return None,
                    Err(e) => return Some((Err(e.into()), ListState::Done)),
                }
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_localfs_write_read_at_offset() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalFsBackend::new(tmp.path());

        backend.write_at("a/b.0000000000000000", 4, b"tail").await.unwrap();
        backend.write_at("a/b.0000000000000000", 0, b"head").await.unwrap();

        let all = backend.read_at("a/b.0000000000000000", 0, 64).await.unwrap();
        assert_eq!(&all[..], b"headtail");
        let mid = backend.read_at("a/b.0000000000000000", 2, 4).await.unwrap();
        assert_eq!(&mid[..], b"adta");
        let past = backend.read_at("a/b.0000000000000000", 100, 4).await.unwrap();
        assert!(past.is_empty());
    }

    #[tokio::test]
    async fn test_localfs_missing_object_and_attr() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalFsBackend::new(tmp.path());

        let err = backend.read_at("nope", 0, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let err = backend.get_xattr("nope", "striper.size").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_localfs_xattr_creates_object_and_lists() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalFsBackend::new(tmp.path());

        let empty: Vec<String> = backend.list_objects().try_collect().await.unwrap();
        assert!(empty.is_empty());

        backend.set_xattr("k.0000000000000000", "striper.size", b"0").await.unwrap();
        backend.write_at("k.0000000000000001", 0, b"x").await.unwrap();

        let value = backend.get_xattr("k.0000000000000000", "striper.size").await.unwrap();
        assert_eq!(&value[..], b"0");
        let head = backend.read_at("k.0000000000000000", 0, 8).await.unwrap();
        assert!(head.is_empty());

        let mut names: Vec<String> = backend.list_objects().try_collect().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["k.0000000000000000", "k.0000000000000001"]);
    }

    #[tokio::test]
    async fn test_localfs_remove_xattr() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalFsBackend::new(tmp.path());

        backend.remove_xattr("k.0000000000000000", "striper.size").await.unwrap();
        backend.set_xattr("k.0000000000000000", "striper.size", b"7").await.unwrap();
        backend.remove_xattr("k.0000000000000000", "striper.size").await.unwrap();
        let err = backend.get_xattr("k.0000000000000000", "striper.size").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_localfs_rejects_empty_name() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalFsBackend::new(tmp.path());
        let err = backend.write_at("", 0, b"x").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }
}
