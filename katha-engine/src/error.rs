//! Error types for katha-engine
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation.

use thiserror::Error;

/// Main error type for the katha playback engine
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document loading or structure errors
    #[error("Document error: {0}")]
    Document(#[from] katha_common::Error),

    /// Caller requested a verse number absent from the document
    #[error("Unknown verse number: {0}")]
    UnknownVerseNumber(i32),

    /// Internal invariant violation: engine produced an index outside the
    /// document. Not a recoverable runtime condition.
    #[error("Item index {index} out of range for {section:?} section")]
    IndexOutOfRange {
        section: katha_common::SectionKind,
        index: usize,
    },

    /// The speech port cannot produce the requested voice/language
    #[error("Speech unavailable: {0}")]
    SpeechUnavailable(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the katha-engine Error
pub type Result<T> = std::result::Result<T, Error>;
