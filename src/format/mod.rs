//! Row Format Module
//!
//! Textual wire format of one log row.
//!
//! ## Responsibilities
//! - Hold the configurable delimiter bytes
//! - Encode a logical write into row bytes
//! - Parse row bytes back into operation, key and value
//!
//! ## Row Layout (default delimiters)
//! ```text
//! - <key>\n              put key (no value)
//! = <key> <value>\n      put key-value (value may be empty)
//! ! <key>\n              delete (tombstone)
//! ```
//!
//! Delimiter bytes are not allowed inside keys and values. Single-byte
//! delimiters keep the log line-oriented and readable with a text editor.

mod codec;

use std::fmt;

use crate::error::{KvError, Result};

/// Minimum length of a valid row: marker + key prefix + 1-byte key + terminator
pub const MIN_ROW_SIZE: usize = 4;

/// The three kinds of row found in a log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Key exists with no associated value
    PutKey,

    /// Key maps to a value
    PutKeyValue,

    /// Tombstone: key removed as of this row
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::PutKey => "put key",
            Operation::PutKeyValue => "put key-value",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A decoded row, borrowing from the row bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row<'a> {
    pub op: Operation,
    pub key: &'a [u8],

    /// `None` for put-key and delete rows, `Some` (possibly empty) for put-key-value
    pub value: Option<&'a [u8]>,
}

/// Delimiter bytes used to encode and decode rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Default: '-'
    pub put_key_marker: u8,

    /// Default: '='
    pub put_key_value_marker: u8,

    /// Default: '!'
    pub delete_marker: u8,

    /// Default: ' '
    pub key_prefix: u8,

    /// Default: ' '
    pub value_separator: u8,

    /// Default: '\n'
    pub row_terminator: u8,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            put_key_marker: b'-',
            put_key_value_marker: b'=',
            delete_marker: b'!',
            key_prefix: b' ',
            value_separator: b' ',
            row_terminator: b'\n',
        }
    }
}

impl Format {
    /// Check that rows written with this format can be parsed back unambiguously
    pub fn validate(&self) -> Result<()> {
        let markers = [
            self.put_key_marker,
            self.put_key_value_marker,
            self.delete_marker,
        ];
        if markers[0] == markers[1] || markers[0] == markers[2] || markers[1] == markers[2] {
            return Err(KvError::InvalidFormat(format!(
                "operation markers must be distinct: {:?}",
                markers.map(char::from)
            )));
        }
        if markers.contains(&self.row_terminator) {
            return Err(KvError::InvalidFormat(format!(
                "row terminator {:?} is also an operation marker",
                char::from(self.row_terminator)
            )));
        }
        if self.key_prefix == self.row_terminator {
            return Err(KvError::InvalidFormat(format!(
                "key prefix and row terminator are both {:?}",
                char::from(self.row_terminator)
            )));
        }
        if self.value_separator == self.row_terminator {
            return Err(KvError::InvalidFormat(format!(
                "value separator and row terminator are both {:?}",
                char::from(self.row_terminator)
            )));
        }
        Ok(())
    }

    /// Map an operation to its marker byte
    pub fn marker(&self, op: Operation) -> u8 {
        match op {
            Operation::PutKey => self.put_key_marker,
            Operation::PutKeyValue => self.put_key_value_marker,
            Operation::Delete => self.delete_marker,
        }
    }

    /// Map a marker byte back to its operation
    pub fn operation(&self, marker: u8) -> Option<Operation> {
        if marker == self.put_key_marker {
            Some(Operation::PutKey)
        } else if marker == self.put_key_value_marker {
            Some(Operation::PutKeyValue)
        } else if marker == self.delete_marker {
            Some(Operation::Delete)
        } else {
            None
        }
    }
}
