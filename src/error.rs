//! Error types raised by the txpeaks library.

use crate::txpeaks_utils::FileFormat;
use thiserror::Error;

/// Errors that abort a txpeaks run. None of them is retried.
#[derive(Debug, Error)]
pub enum TxPeaksError {
    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A grouping key outside of `gene`, `transcript` and `uid` was requested.
    #[error("invalid key type `{0}` for the transcript collection; expected one of gene, transcript or uid")]
    InvalidKind(String),

    /// A record does not match the expected fixed layout of its file format.
    #[error("malformed {format} record at line {line}: {message}")]
    Format {
        format: FileFormat,
        line: usize,
        message: String,
    },

    /// Too many expression isoforms are missing from the annotation table.
    #[error("{unmatched} isoforms were not found in the annotation table (the limit is {limit}); were the expression and annotation files built from the same annotation?")]
    ReferenceMismatch { unmatched: usize, limit: usize },
}

impl TxPeaksError {
    pub(crate) fn format<T: ToString>(format: FileFormat, line: usize, message: T) -> Self {
        TxPeaksError::Format {
            format,
            line,
            message: message.to_string(),
        }
    }
}
