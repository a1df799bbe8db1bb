//! Log replay
//!
//! Rebuilds the index by reading the data file from offset 0, in order.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::config::TailPolicy;
use crate::error::{KvError, Result};
use crate::format::{Format, Operation};

use super::index::{FileRef, Index};

/// Outcome of replaying a data file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayResult {
    /// Number of complete rows read
    pub rows_replayed: u64,

    /// Number of delete rows among them
    pub tombstones: u64,

    /// Number of keys live after the last row
    pub live_keys: usize,

    /// Offset one past the last complete row
    pub end_offset: u64,

    /// Length of an unterminated fragment found after `end_offset` (0 if none)
    pub partial_tail_bytes: u64,
}

/// Replay rows from `reader`, applying puts as upserts and deletes as removals
///
/// A terminated row that fails to decode is always `CorruptLog`. An
/// unterminated final fragment is `CorruptLog` under `TailPolicy::Fail`, and
/// reported in `partial_tail_bytes` under `TailPolicy::Truncate`.
pub(crate) fn replay<R: Read>(
    reader: R,
    format: &Format,
    policy: TailPolicy,
) -> Result<(Index, ReplayResult)> {
    let mut reader = BufReader::new(reader);
    let mut index = Index::new();
    let mut result = ReplayResult::default();
    let mut offset = 0u64;
    let mut row = Vec::new();

    loop {
        row.clear();
        let n = reader.read_until(format.row_terminator, &mut row)?;
        if n == 0 {
            break;
        }

        if row.last() != Some(&format.row_terminator) && policy == TailPolicy::Truncate {
            result.partial_tail_bytes = n as u64;
            break;
        }

        let decoded = format.decode(&row).map_err(|e| KvError::CorruptLog {
            offset,
            source: Box::new(e),
        })?;

        match decoded.op {
            Operation::PutKey | Operation::PutKeyValue => {
                index.insert(decoded.key.to_vec(), FileRef { offset, size: n });
            }
            Operation::Delete => {
                index.remove(decoded.key);
                result.tombstones += 1;
            }
        }

        offset += n as u64;
        result.rows_replayed += 1;
    }

    result.live_keys = index.len();
    result.end_offset = offset;
    Ok((index, result))
}

/// Check a data file without opening it for writes
///
/// Reports a partial tail instead of failing on it, and never modifies the file.
pub fn verify(path: &Path, format: &Format) -> Result<ReplayResult> {
    format.validate()?;
    let file = File::open(path)?;
    let (_, result) = replay(file, format, TailPolicy::Truncate)?;
    Ok(result)
}
