//! # LineKV
//!
//! A minimal embedded key-value store with:
//! - A single append-only data file of human-readable rows
//! - An in-memory index from key to the byte range of its latest row
//! - Index rebuild by replaying the file on open
//! - Compaction that keeps only live rows
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                               │
//! │            (RwLock: exclusive writes, shared reads)          │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │                               │
//!                ▼                               ▼
//!         ┌─────────────┐                 ┌─────────────┐
//!         │   Format    │                 │    Index    │
//!         │ (row codec) │                 │  (HashMap)  │
//!         └──────┬──────┘                 └─────────────┘
//!                │
//!                ▼
//!         ┌─────────────┐
//!         │  Data file  │
//!         │  (append)   │
//!         └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use linekv::{Store, Value};
//!
//! # fn main() -> linekv::Result<()> {
//! let store = Store::open_path("data.db")?;
//! store.put(b"name", Some(b"linekv"))?;
//! store.put(b"flag", None)?;
//!
//! assert_eq!(store.get(b"name")?, Value::Bytes(b"linekv".to_vec()));
//! assert!(store.get(b"flag")?.is_key_only());
//! store.close()
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod format;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, SyncStrategy, TailPolicy};
pub use error::{ErrorKind, KvError, Result};
pub use format::{Format, Operation, Row};
pub use store::{CompactionResult, FileRef, Index, ReplayResult, Store, StoreGuard, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LineKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
