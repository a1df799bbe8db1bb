//! Scoped exclusive access
//!
//! A `StoreGuard` holds the store's write lock until it is dropped, so a
//! sequence such as "check the key exists, then delete it" cannot interleave
//! with other callers.

use std::ops::ControlFlow;

use parking_lot::RwLockWriteGuard;

use crate::error::Result;

use super::db::Inner;
use super::index::FileRef;
use super::Value;

/// Exclusive access to a [`Store`](super::Store), released on drop
pub struct StoreGuard<'a> {
    inner: RwLockWriteGuard<'a, Inner>,
}

impl<'a> StoreGuard<'a> {
    pub(crate) fn new(inner: RwLockWriteGuard<'a, Inner>) -> Self {
        Self { inner }
    }

    pub fn put(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        self.inner.put(key, value)
    }

    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.inner.delete(key)
    }

    pub fn get(&self, key: &[u8]) -> Result<Value> {
        self.inner.get(key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.inner.index.contains(key)
    }

    pub fn file_ref(&self, key: &[u8]) -> Option<FileRef> {
        self.inner.index.get(key)
    }

    pub fn len(&self) -> usize {
        self.inner.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.index.is_empty()
    }

    pub fn for_each_key<F>(&self, visitor: F)
    where
        F: FnMut(&[u8]) -> ControlFlow<()>,
    {
        self.inner.for_each_key(visitor);
    }

    /// Next append position
    pub fn offset(&self) -> u64 {
        self.inner.offset
    }
}
