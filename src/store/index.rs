//! In-memory offset index
//!
//! Maps every live key to the byte range of its most recent row.

use std::collections::hash_map::{self, HashMap};

/// Location of a row in the data file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileRef {
    /// Byte offset of the row's first byte
    pub offset: u64,

    /// Row length in bytes, terminator included
    pub size: usize,
}

impl FileRef {
    /// Offset one past the row's last byte
    pub fn end(&self) -> u64 {
        self.offset + self.size as u64
    }
}

/// Key -> FileRef mapping, rebuilt by replaying the log
///
/// Iteration order is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    refs: HashMap<Vec<u8>, FileRef>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            refs: HashMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<FileRef> {
        self.refs.get(key).copied()
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.refs.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, Vec<u8>, FileRef> {
        self.refs.iter()
    }

    /// Upsert the location of a key's latest row
    pub(crate) fn insert(&mut self, key: Vec<u8>, file_ref: FileRef) {
        self.refs.insert(key, file_ref);
    }

    pub(crate) fn remove(&mut self, key: &[u8]) -> Option<FileRef> {
        self.refs.remove(key)
    }
}

impl<'a> IntoIterator for &'a Index {
    type Item = (&'a Vec<u8>, &'a FileRef);
    type IntoIter = hash_map::Iter<'a, Vec<u8>, FileRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
