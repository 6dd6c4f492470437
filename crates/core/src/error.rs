//! Error types for the quire PDF library.

use thiserror::Error;

/// Primary error type for PDF parsing and extraction.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A region of the file could not be parsed as PDF syntax.
    #[error("malformed PDF syntax: {0}")]
    MalformedSyntax(String),

    /// The cross-reference chain is unusable. Only surfaced when recovery
    /// is disabled or also failed.
    #[error("broken cross-reference table: {0}")]
    BrokenXRef(String),

    #[error("unresolved reference: {objid} {genno} R")]
    UnresolvedReference { objid: u32, genno: u32 },

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("key not found: {0}")]
    KeyError(String),

    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("encryption error: {0}")]
    EncryptionError(String),

    #[error("SASLprep: {0}")]
    SaslPrepError(String),

    /// Caller supplied an argument outside the accepted domain.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    /// Whether the error describes a damaged region the caller may skip.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TokenError { .. }
                | Self::UnexpectedEof
                | Self::MalformedSyntax(_)
                | Self::TypeError { .. }
        )
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
