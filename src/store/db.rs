//! Store implementation
//!
//! One data file, two handles, one index behind a RwLock.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::ops::{ControlFlow, Range};
use std::path::Path;

use parking_lot::RwLock;
use tracing::{debug, info, trace, warn};

use crate::config::{Config, SyncStrategy, TailPolicy};
use crate::error::{KvError, Result};
use crate::format::{Format, Operation};

use super::compaction::CompactionResult;
use super::file::{compaction_path, create_private, open_handles, read_exact_at};
use super::guard::StoreGuard;
use super::index::{FileRef, Index};
use super::replay::replay;
use super::Value;

/// Embedded key-value store over a single append-only log file
///
/// ## Concurrency
///
/// - **Writes** (put/delete): exclusive lock on the file + index state
/// - **Reads** (get/for_each_key/compact_to): shared lock; rows are read
///   with positional reads so readers never contend on a file cursor
/// - **Compound operations**: [`Store::lock`] or [`Store::atomically`] hold
///   the exclusive lock across several operations
///
/// Every method takes `&self`, so a `Store` can be shared behind an `Arc`.
pub struct Store {
    /// Configuration the store was opened with
    config: Config,

    /// File handles, append offset and index
    inner: RwLock<Inner>,
}

/// State guarded by the store's lock
pub(crate) struct Inner {
    pub(crate) format: Format,
    sync_strategy: SyncStrategy,

    /// Positional reads only
    reader: File,

    /// Opened in append mode
    writer: File,

    /// Next append position
    pub(crate) offset: u64,

    pub(crate) index: Index,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Validate the row format
    /// 2. Open the read and append handles (creating the file)
    /// 3. Replay the file to rebuild the index
    /// 4. Apply the tail policy to a partial final row
    pub fn open(config: Config) -> Result<Self> {
        config.format.validate()?;

        let (reader, writer) = open_handles(&config.path)?;

        let (index, result) = replay(&reader, &config.format, config.tail_policy)?;

        if result.partial_tail_bytes > 0 {
            // Only reachable under TailPolicy::Truncate
            warn!(
                path = %config.path.display(),
                offset = result.end_offset,
                bytes = result.partial_tail_bytes,
                "truncating partial row at end of data file"
            );
            writer.set_len(result.end_offset)?;
            writer.sync_all()?;
        }

        info!(
            path = %config.path.display(),
            rows = result.rows_replayed,
            tombstones = result.tombstones,
            live_keys = result.live_keys,
            offset = result.end_offset,
            "opened store"
        );

        let inner = Inner {
            format: config.format,
            sync_strategy: config.sync_strategy,
            reader,
            writer,
            offset: result.end_offset,
            index,
        };

        Ok(Self {
            config,
            inner: RwLock::new(inner),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses the default config with the specified data file
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(Config::builder().path(path.as_ref()).build())
    }

    /// Open with a path and a row format
    pub fn open_with_format(path: impl AsRef<Path>, format: Format) -> Result<Self> {
        Self::open(Config::builder().path(path.as_ref()).format(format).build())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Put a key, with or without a value
    ///
    /// `None` writes a key-only row, `Some(b"")` an explicit empty value.
    pub fn put(&self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        self.inner.write().put(key, value)
    }

    /// Delete a key
    ///
    /// Always appends a tombstone, even for an absent key.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.inner.write().delete(key)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get the value of a key
    pub fn get(&self, key: &[u8]) -> Result<Value> {
        self.inner.read().get(key)
    }

    /// Whether a key is live
    pub fn contains(&self, key: &[u8]) -> bool {
        self.inner.read().index.contains(key)
    }

    /// Location of a key's latest row
    pub fn file_ref(&self, key: &[u8]) -> Option<FileRef> {
        self.inner.read().index.get(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.inner.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().index.is_empty()
    }

    /// Visit every live key in unspecified order until the visitor breaks
    ///
    /// Holds the shared lock for the whole iteration, so the visitor must not
    /// write to this store.
    pub fn for_each_key<F>(&self, visitor: F)
    where
        F: FnMut(&[u8]) -> ControlFlow<()>,
    {
        self.inner.read().for_each_key(visitor);
    }

    /// Collect every live key
    pub fn keys(&self) -> Vec<Vec<u8>> {
        let inner = self.inner.read();
        inner.index.iter().map(|(key, _)| key.clone()).collect()
    }

    // =========================================================================
    // Compaction
    // =========================================================================

    /// Write the live rows to `dest` and return the index of the new layout
    ///
    /// The live file and index are not modified; replacing the data file
    /// with the output is up to the caller (see [`Store::compact`]).
    pub fn compact_to<W: Write>(&self, dest: &mut W) -> Result<CompactionResult> {
        let result = self.inner.read().compact_to(dest)?;
        debug!(
            keys = result.index.len(),
            bytes = result.bytes_written,
            "compacted rows"
        );
        Ok(result)
    }

    /// Write the live rows to `dest`, returning the number of bytes written
    pub fn write_to<W: Write>(&self, dest: &mut W) -> Result<u64> {
        Ok(self.compact_to(dest)?.bytes_written)
    }

    /// Compact the data file in place and reopen it
    ///
    /// Steps:
    /// 1. Write live rows to a sibling `<path>.compact` file and fsync it
    /// 2. Close this store
    /// 3. Rename the compacted file over the data file
    /// 4. Reopen with the same config
    pub fn compact(self) -> Result<Store> {
        let config = self.config.clone();
        let tmp_path = compaction_path(&config.path);
        let before = self.offset();

        let written = self.write_compacted(&tmp_path);
        let bytes_written = match written {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(e);
            }
        };

        if let Err(e) = self.close() {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        fs::rename(&tmp_path, &config.path)?;

        info!(
            path = %config.path.display(),
            before,
            after = bytes_written,
            "replaced data file with compacted copy"
        );

        Store::open(config)
    }

    fn write_compacted(&self, tmp_path: &Path) -> Result<u64> {
        let file = create_private(tmp_path)?;
        let mut dest = BufWriter::new(file);
        let bytes_written = self.write_to(&mut dest)?;
        let file = dest.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(bytes_written)
    }

    // =========================================================================
    // Locking
    // =========================================================================

    /// Acquire the exclusive lock for a sequence of operations
    ///
    /// Other readers and writers block until the guard is dropped.
    pub fn lock(&self) -> StoreGuard<'_> {
        StoreGuard::new(self.inner.write())
    }

    /// Run `f` while holding the exclusive lock
    ///
    /// Writes made by `f` before it fails stay applied; this is an exclusive
    /// section, not a rollback scope.
    pub fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut StoreGuard<'_>) -> Result<T>,
    {
        let mut guard = self.lock();
        f(&mut guard)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// fsync the append handle
    pub fn sync(&self) -> Result<()> {
        self.inner
            .read()
            .writer
            .sync_data()
            .map_err(|source| KvError::Write { source })
    }

    /// Close the store
    ///
    /// Flushes appended rows to disk, then releases both handles.
    pub fn close(self) -> Result<()> {
        let inner = self.inner.into_inner();
        inner
            .writer
            .sync_all()
            .map_err(|source| KvError::Close { source })?;
        let Inner { reader, writer, .. } = inner;
        drop(reader);
        drop(writer);

        debug!(path = %self.config.path.display(), "closed store");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path of the data file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Next append position (current file length)
    pub fn offset(&self) -> u64 {
        self.inner.read().offset
    }

    pub fn format(&self) -> &Format {
        &self.config.format
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replay policy in effect for this store
    pub fn tail_policy(&self) -> TailPolicy {
        self.config.tail_policy
    }
}

/// A row read back for a live key
pub(crate) struct LiveRow {
    /// The whole encoded row, terminator included
    pub(crate) bytes: Vec<u8>,

    /// Position of the value within `bytes`, if the row has one
    pub(crate) value: Option<Range<usize>>,
}

impl Inner {
    pub(crate) fn put(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        let op = match value {
            None => Operation::PutKey,
            Some(_) => Operation::PutKeyValue,
        };
        let row = self.format.encode(op, key, value)?;
        let offset = self.append(&row)?;

        self.index.insert(
            key.to_vec(),
            FileRef {
                offset,
                size: row.len(),
            },
        );
        trace!(op = %op, offset, size = row.len(), "appended row");
        Ok(())
    }

    pub(crate) fn delete(&mut self, key: &[u8]) -> Result<()> {
        let row = self.format.encode(Operation::Delete, key, None)?;
        let offset = self.append(&row)?;

        self.index.remove(key);
        trace!(op = %Operation::Delete, offset, size = row.len(), "appended row");
        Ok(())
    }

    /// Append a row, returning the offset it was written at
    fn append(&mut self, row: &[u8]) -> Result<u64> {
        let sync = self.sync_strategy == SyncStrategy::EveryWrite;
        self.append_with(row, |writer, row| {
            writer.write_all(row)?;
            if sync {
                writer.sync_data()?;
            }
            Ok(())
        })
    }

    /// Append a row through `write`
    ///
    /// On failure the file is cut back to the previous append position, so
    /// a partially written or unsynced row never reaches the next replay.
    fn append_with<F>(&mut self, row: &[u8], write: F) -> Result<u64>
    where
        F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
    {
        let offset = self.offset;

        if let Err(source) = write(&mut self.writer, row) {
            self.rollback(offset);
            return Err(KvError::Write { source });
        }

        self.offset += row.len() as u64;
        Ok(offset)
    }

    /// Truncate the file back to `offset` after a failed append
    fn rollback(&mut self, offset: u64) {
        match self.writer.set_len(offset) {
            Ok(()) => self.offset = offset,
            Err(e) => {
                warn!(offset, error = %e, "cannot truncate failed append");
                self.resync_offset();
            }
        }
    }

    /// Re-read the append position when a failed append could not be undone
    fn resync_offset(&mut self) {
        match self.writer.metadata() {
            Ok(meta) => {
                if meta.len() != self.offset {
                    warn!(
                        expected = self.offset,
                        actual = meta.len(),
                        "partial row left in data file after failed append"
                    );
                }
                self.offset = meta.len();
            }
            Err(e) => warn!(error = %e, "cannot resync append offset"),
        }
    }

    pub(crate) fn get(&self, key: &[u8]) -> Result<Value> {
        let file_ref = self.index.get(key).ok_or_else(|| KvError::KeyNotFound {
            key: key.to_vec(),
        })?;

        let LiveRow { mut bytes, value } = self.read_live_row(key, file_ref)?;
        Ok(match value {
            Some(range) => {
                bytes.truncate(range.end);
                bytes.drain(..range.start);
                Value::Bytes(bytes)
            }
            None => Value::KeyOnly,
        })
    }

    /// Read a live key's row and check that it still describes that key
    pub(crate) fn read_live_row(&self, key: &[u8], file_ref: FileRef) -> Result<LiveRow> {
        let mut bytes = vec![0u8; file_ref.size];
        read_exact_at(&self.reader, &mut bytes, file_ref.offset).map_err(|source| {
            KvError::Read {
                key: key.to_vec(),
                offset: file_ref.offset,
                size: file_ref.size,
                source,
            }
        })?;

        let desync = |source: KvError| KvError::Decode {
            key: key.to_vec(),
            offset: file_ref.offset,
            source: Box::new(source),
        };
        let decoded = self.format.decode(&bytes).map_err(desync)?;
        if decoded.key != key {
            return Err(desync(KvError::malformed("row belongs to another key")));
        }
        if decoded.op == Operation::Delete {
            return Err(desync(KvError::malformed("live key points at a tombstone")));
        }

        // The value always sits directly before the terminator
        let end = bytes.len() - 1;
        let value = decoded.value.map(|v| end - v.len()..end);

        Ok(LiveRow { bytes, value })
    }

    pub(crate) fn for_each_key<F>(&self, mut visitor: F)
    where
        F: FnMut(&[u8]) -> ControlFlow<()>,
    {
        for (key, _) in &self.index {
            if visitor(key.as_slice()).is_break() {
                break;
            }
        }
    }
}
