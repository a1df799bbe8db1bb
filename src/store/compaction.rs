//! Compaction
//!
//! Copies only the live rows of a data file into a new destination.

use std::io::Write;

use crate::error::{KvError, Result};

use super::db::Inner;
use super::index::{FileRef, Index};

/// Output of a compaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionResult {
    /// Total bytes written to the destination
    pub bytes_written: u64,

    /// Index describing the destination's layout
    pub index: Index,
}

impl Inner {
    /// Write every live row to `dest` in index order
    ///
    /// Leaves the live file and index untouched.
    pub(crate) fn compact_to<W: Write>(&self, dest: &mut W) -> Result<CompactionResult> {
        let mut offset = 0u64;
        let mut index = Index::with_capacity(self.index.len());

        for (key, file_ref) in &self.index {
            let row = self.read_live_row(key, *file_ref)?.bytes;
            dest.write_all(&row)
                .map_err(|source| KvError::Write { source })?;
            index.insert(
                key.clone(),
                FileRef {
                    offset,
                    size: row.len(),
                },
            );
            offset += row.len() as u64;
        }

        Ok(CompactionResult {
            bytes_written: offset,
            index,
        })
    }
}
