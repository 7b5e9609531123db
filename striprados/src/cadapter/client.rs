//! High-level client API for the object store.
//!
//! `ObjectBackend` is the narrow surface the striper needs from a store:
//! offset writes and reads, a small attribute set per object and an
//! unordered listing. `ObjectClient` wraps a backend and is what the
//! writer/reader/scanner hold on to.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {0} not found")]
    NotFound(String),

    #[error("attribute {attr} not set on {name}")]
    NoSuchAttr { name: String, attr: String },

    #[error("invalid object name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_) | StoreError::NoSuchAttr { .. }
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Object store operations used by the striper.
///
/// `read_at` returns an empty buffer at or past the end of an object and
/// `StoreError::NotFound` when the object does not exist at all.
/// `set_xattr` creates the object when it is missing.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    async fn write_at(&self, name: &str, offset: u64, data: &[u8]) -> StoreResult<()>;

    async fn read_at(&self, name: &str, offset: u64, len: usize) -> StoreResult<Bytes>;

    async fn get_xattr(&self, name: &str, attr: &str) -> StoreResult<Bytes>;

    async fn set_xattr(&self, name: &str, attr: &str, value: &[u8]) -> StoreResult<()>;

    /// Drop `attr` from `name`. Not an error when either is missing.
    async fn remove_xattr(&self, name: &str, attr: &str) -> StoreResult<()>;

    fn list_objects(&self) -> BoxStream<'_, StoreResult<String>>;
}

pub struct ObjectClient<B: ObjectBackend> {
    backend: B,
}

impl<B: ObjectBackend> ObjectClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[tracing::instrument(level = "trace", skip(self, data), fields(len = data.len()))]
    pub async fn write_at(&self, name: &str, offset: u64, data: &[u8]) -> StoreResult<()> {
        self.backend.write_at(name, offset, data).await
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub async fn read_at(&self, name: &str, offset: u64, len: usize) -> StoreResult<Bytes> {
        self.backend.read_at(name, offset, len).await
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub async fn get_xattr(&self, name: &str, attr: &str) -> StoreResult<Bytes> {
        self.backend.get_xattr(name, attr).await
    }

    #[tracing::instrument(level = "trace", skip(self, value))]
    pub async fn set_xattr(&self, name: &str, attr: &str, value: &[u8]) -> StoreResult<()> {
        self.backend.set_xattr(name, attr, value).await
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub async fn remove_xattr(&self, name: &str, attr: &str) -> StoreResult<()> {
        self.backend.remove_xattr(name, attr).await
    }

    pub fn list_objects(&self) -> BoxStream<'_, StoreResult<String>> {
        self.backend.list_objects()
    }
}
