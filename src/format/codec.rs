//! Row codec
//!
//! Encoding and decoding of single rows.

use crate::error::{KvError, Result};

use super::{Format, Operation, Row, MIN_ROW_SIZE};

impl Format {
    // =========================================================================
    // Encoding
    // =========================================================================

    /// Encode a row
    ///
    /// Format: marker (1) + key prefix (1) + key + [separator (1) + value] + terminator (1)
    ///
    /// The value segment is only emitted for `PutKeyValue`, where a `None`
    /// value is written as an empty one.
    pub fn encode(&self, op: Operation, key: &[u8], value: Option<&[u8]>) -> Result<Vec<u8>> {
        self.check_row(op, key, value)?;

        let value = match op {
            Operation::PutKeyValue => value.unwrap_or_default(),
            Operation::PutKey | Operation::Delete => &[],
        };

        let mut row = Vec::with_capacity(key.len() + value.len() + MIN_ROW_SIZE);
        row.push(self.marker(op));
        row.push(self.key_prefix);
        row.extend_from_slice(key);
        if op == Operation::PutKeyValue {
            row.push(self.value_separator);
            row.extend_from_slice(value);
        }
        row.push(self.row_terminator);

        Ok(row)
    }

    fn check_row(&self, op: Operation, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        if key.is_empty() {
            return Err(KvError::EmptyKey);
        }

        match op {
            Operation::PutKey | Operation::Delete => {
                if value.is_some_and(|v| !v.is_empty()) {
                    return Err(KvError::OperationValueMismatch { op });
                }
                if key.contains(&self.row_terminator) {
                    return Err(KvError::InvalidKey {
                        key: key.to_vec(),
                        byte: self.row_terminator,
                    });
                }
            }
            Operation::PutKeyValue => {
                // The key is cut at the first separator on decode, so the
                // terminator cannot appear either.
                for byte in [self.value_separator, self.row_terminator] {
                    if key.contains(&byte) {
                        return Err(KvError::InvalidKey {
                            key: key.to_vec(),
                            byte,
                        });
                    }
                }
                if value.is_some_and(|v| v.contains(&self.row_terminator)) {
                    return Err(KvError::InvalidValue {
                        key: key.to_vec(),
                        byte: self.row_terminator,
                    });
                }
            }
        }

        Ok(())
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    /// Decode a whole row, terminator included
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Row<'a>> {
        if bytes.len() < MIN_ROW_SIZE {
            return Err(KvError::RowTooShort { len: bytes.len() });
        }

        let op = self
            .operation(bytes[0])
            .ok_or(KvError::UnknownOperation { marker: bytes[0] })?;

        if bytes[1] != self.key_prefix {
            return Err(KvError::malformed(format!(
                "second byte should be {:?} not {:?}",
                char::from(self.key_prefix),
                char::from(bytes[1])
            )));
        }

        let last = bytes[bytes.len() - 1];
        if last != self.row_terminator {
            return Err(KvError::malformed(format!(
                "last byte should be {:?} not {:?}",
                char::from(self.row_terminator),
                char::from(last)
            )));
        }

        let body = &bytes[2..bytes.len() - 1];
        let (key, value) = match op {
            Operation::PutKey | Operation::Delete => (body, None),
            Operation::PutKeyValue => {
                let split = body
                    .iter()
                    .position(|&b| b == self.value_separator)
                    .ok_or_else(|| {
                        KvError::malformed(format!(
                            "value separator {:?} not found",
                            char::from(self.value_separator)
                        ))
                    })?;
                (&body[..split], Some(&body[split + 1..]))
            }
        };

        if key.is_empty() {
            return Err(KvError::malformed("empty key"));
        }

        Ok(Row { op, key, value })
    }
}
