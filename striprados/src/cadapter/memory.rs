//! In-memory backend: for local development and tests.

use crate::cadapter::client::{ObjectBackend, StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemObject {
    data: Vec<u8>,
    xattrs: HashMap<String, Vec<u8>>,
}

#[derive(Default)]
pub struct InMemoryBackend {
    objects: Mutex<HashMap<String, MemObject>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<String, MemObject>> {
        // a poisoned map is still structurally valid
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current length of an object, `None` if it does not exist.
    pub fn object_len(&self, name: &str) -> Option<usize> {
        self.objects().get(name).map(|o| o.data.len())
    }

    pub fn object_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.objects().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ObjectBackend for InMemoryBackend {
    async fn write_at(&self, name: &str, offset: u64, data: &[u8]) -> StoreResult<()> {
        if name.is_empty() {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        let mut objects = self.objects();
        let obj = objects.entry(name.to_string()).or_default();
        let start = offset as usize;
        let end = start + data.len();
        if obj.data.len() < end {
            obj.data.resize(end, 0);
        }
        obj.data[start..end].copy_from_slice(data);
        Ok(())
    }

    async fn read_at(&self, name: &str, offset: u64, len: usize) -> StoreResult<Bytes> {
        let objects = self.objects();
        let obj = objects
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let start = (offset as usize).min(obj.data.len());
        let end = start.saturating_add(len).min(obj.data.len());
        Ok(Bytes::copy_from_slice(&obj.data[start..end]))
    }

    async fn get_xattr(&self, name: &str, attr: &str) -> StoreResult<Bytes> {
        let objects = self.objects();
        objects
            .get(name)
            .and_then(|o| o.xattrs.get(attr))
            .map(|v| Bytes::copy_from_slice(v))
            .ok_or_else(|| StoreError::NoSuchAttr {
                name: name.to_string(),
                attr: attr.to_string(),
            })
    }

    async fn set_xattr(&self, name: &str, attr: &str, value: &[u8]) -> StoreResult<()> {
        if name.is_empty() {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        let mut objects = self.objects();
        objects
            .entry(name.to_string())
            .or_default()
            .xattrs
            .insert(attr.to_string(), value.to_vec());
        Ok(())
    }

    async fn remove_xattr(&self, name: &str, attr: &str) -> StoreResult<()> {
        if let Some(obj) = self.objects().get_mut(name) {
            obj.xattrs.remove(attr);
        }
        Ok(())
    }

    fn list_objects(&self) -> BoxStream<'_, StoreResult<String>> {
        // snapshot, so the lock is not held across the consumer's awaits
        let names: Vec<StoreResult<String>> = self.objects().keys().cloned().map(Ok).collect();
        stream::iter(names).boxed()
    }
}
