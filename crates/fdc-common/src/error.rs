//! Error types for FDC

use thiserror::Error;

/// Result type alias for FDC operations
pub type Result<T> = std::result::Result<T, FdcError>;

/// Errors raised while decoding shared FDC codes
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FdcError {
    #[error("Unknown document type: {0}")]
    UnknownDocType(String),

    #[error("Unknown dictionary table: {0}")]
    UnknownTable(String),
}
