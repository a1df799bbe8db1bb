//! Error types for LineKV
//!
//! One closed error enum for every failure the codec and the store can
//! report. Callers match on [`KvError::kind`] rather than on instances.

use std::io;

use thiserror::Error;

use crate::format::Operation;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for LineKV operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // Encoding Errors (caller input)
    // -------------------------------------------------------------------------
    #[error("key is empty")]
    EmptyKey,

    #[error("invalid key {:?}: contains reserved byte {:?}", String::from_utf8_lossy(.key), as_char(.byte))]
    InvalidKey { key: Vec<u8>, byte: u8 },

    #[error("invalid value for key {:?}: contains reserved byte {:?}", String::from_utf8_lossy(.key), as_char(.byte))]
    InvalidValue { key: Vec<u8>, byte: u8 },

    #[error("{op} row must not carry a value")]
    OperationValueMismatch { op: Operation },

    // -------------------------------------------------------------------------
    // Decoding Errors (corrupt or foreign data)
    // -------------------------------------------------------------------------
    #[error("row too short: {len} bytes")]
    RowTooShort { len: usize },

    #[error("unknown operation marker {:?}", as_char(.marker))]
    UnknownOperation { marker: u8 },

    #[error("malformed row: {reason}")]
    MalformedRow { reason: String },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("key not found: {:?}", String::from_utf8_lossy(.key))]
    KeyNotFound { key: Vec<u8> },

    #[error("corrupt log at offset {offset}: {source}")]
    CorruptLog {
        offset: u64,
        #[source]
        source: Box<KvError>,
    },

    #[error("read key {:?} at offset {offset} with size {size}: {source}", String::from_utf8_lossy(.key))]
    Read {
        key: Vec<u8>,
        offset: u64,
        size: usize,
        #[source]
        source: io::Error,
    },

    #[error("decode key {:?} at offset {offset}: {source}", String::from_utf8_lossy(.key))]
    Decode {
        key: Vec<u8>,
        offset: u64,
        #[source]
        source: Box<KvError>,
    },

    #[error("append row: {source}")]
    Write {
        #[source]
        source: io::Error,
    },

    #[error("close data file: {source}")]
    Close {
        #[source]
        source: io::Error,
    },

    // -------------------------------------------------------------------------
    // I/O and Configuration Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

/// Discriminant of a [`KvError`], for comparing errors by kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyKey,
    InvalidKey,
    InvalidValue,
    OperationValueMismatch,
    RowTooShort,
    UnknownOperation,
    MalformedRow,
    KeyNotFound,
    CorruptLog,
    Read,
    Decode,
    Write,
    Close,
    Io,
    InvalidFormat,
}

impl KvError {
    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            KvError::EmptyKey => ErrorKind::EmptyKey,
            KvError::InvalidKey { .. } => ErrorKind::InvalidKey,
            KvError::InvalidValue { .. } => ErrorKind::InvalidValue,
            KvError::OperationValueMismatch { .. } => ErrorKind::OperationValueMismatch,
            KvError::RowTooShort { .. } => ErrorKind::RowTooShort,
            KvError::UnknownOperation { .. } => ErrorKind::UnknownOperation,
            KvError::MalformedRow { .. } => ErrorKind::MalformedRow,
            KvError::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            KvError::CorruptLog { .. } => ErrorKind::CorruptLog,
            KvError::Read { .. } => ErrorKind::Read,
            KvError::Decode { .. } => ErrorKind::Decode,
            KvError::Write { .. } => ErrorKind::Write,
            KvError::Close { .. } => ErrorKind::Close,
            KvError::Io(_) => ErrorKind::Io,
            KvError::InvalidFormat(_) => ErrorKind::InvalidFormat,
        }
    }

    /// Whether the error was caused by caller input that can be fixed and retried
    pub fn is_input_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::EmptyKey
                | ErrorKind::InvalidKey
                | ErrorKind::InvalidValue
                | ErrorKind::OperationValueMismatch
        )
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        KvError::MalformedRow {
            reason: reason.into(),
        }
    }
}

fn as_char(byte: &u8) -> char {
    char::from(*byte)
}
