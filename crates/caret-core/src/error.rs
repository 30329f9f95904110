//! Error types.
//!
//! Editing itself never fails: out-of-range offsets are clamped and no-ops are silent. These
//! errors only describe highlight requests that were rejected and workspace lookups.

use thiserror::Error;

use crate::workspace::DocumentId;

/// Errors produced while validating or running a highlight pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    /// The content snapshot was empty.
    #[error("refusing to highlight empty content")]
    EmptyContent,

    /// `colors.len() != text.len()`.
    #[error("color buffer size {colors} does not match text size {text}")]
    SizeMismatch {
        /// Text length in bytes.
        text: usize,
        /// Color buffer length.
        colors: usize,
    },

    /// The requested range is reversed or exceeds the content.
    #[error("invalid highlight range {start}..{end} for length {len}")]
    InvalidRange {
        /// Range start.
        start: usize,
        /// Range end.
        end: usize,
        /// Content length.
        len: usize,
    },

    /// The job observed its cancellation token.
    #[error("highlight job cancelled")]
    Cancelled,

    /// The tokenizer reported (or panicked with) a failure.
    #[error("tokenizer failed: {0}")]
    Tokenizer(String),
}

/// Errors produced by [`crate::Workspace`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No session with this id is open.
    #[error("unknown document {0:?}")]
    UnknownDocument(DocumentId),

    /// The workspace has no active session.
    #[error("no active document")]
    NoActiveDocument,

    /// A document with this uri is already open.
    #[error("uri already open: {0}")]
    UriAlreadyOpen(String),
}
