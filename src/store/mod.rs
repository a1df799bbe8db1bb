//! Store Module
//!
//! Durable key-value storage on a single append-only data file.
//!
//! ## Responsibilities
//! - Append encoded rows for every put and delete
//! - Keep an in-memory index of where each live key's latest row is
//! - Rebuild the index on open by replaying the file
//! - Compute compacted file contents (live rows only)
//!
//! ## State
//! ```text
//! ┌────────────────────────────┐        ┌──────────────────────────────┐
//! │ Index (HashMap)            │        │ Data file (append-only)      │
//! │  "a" → {offset: 0,  size: 6} ──────▶│ = a 1\n                      │
//! │  "b" → {offset: 10, size: 6} ──┐    │ ! c\n   (tombstone)          │
//! │                            │   │    │                              │
//! └────────────────────────────┘   └───▶│ = b 2\n                      │
//!                                       └──────────────────────────────┘
//! ```

mod compaction;
mod db;
mod file;
mod guard;
mod index;
mod replay;

pub use compaction::CompactionResult;
pub use db::Store;
pub use guard::StoreGuard;
pub use index::{FileRef, Index};
pub use replay::{verify, ReplayResult};

/// Result of a successful lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// The key was put without a value
    KeyOnly,

    /// The key maps to these bytes (possibly empty)
    Bytes(Vec<u8>),
}

impl Value {
    /// The value bytes, or `None` for a key-only entry
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::KeyOnly => None,
            Value::Bytes(bytes) => Some(bytes),
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Value::KeyOnly => None,
            Value::Bytes(bytes) => Some(bytes),
        }
    }

    pub fn is_key_only(&self) -> bool {
        matches!(self, Value::KeyOnly)
    }
}
