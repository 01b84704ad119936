use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Format errors
    #[error("Premature end of stream while {context}")]
    Truncated { context: &'static str },

    #[error("Illegal block with a negative or overflowed {field} length")]
    LengthOverflow { field: &'static str },

    #[error("Illegal back-reference offset {offset} (available history: {available} bytes)")]
    IllegalOffset { offset: usize, available: usize },

    // Internal errors
    #[error("Unknown stream state: {0}")]
    UnknownState(String),

    #[error("Decoder is unusable after an earlier error")]
    Poisoned,
}

impl Error {
    /// Whether the error is a retryable condition of the byte source rather
    /// than a failure of the stream
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Io(e) if matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted
            )
        )
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::Io(e) => e,
            Error::Truncated { .. } => std::io::Error::new(ErrorKind::UnexpectedEof, err),
            Error::UnknownState(_) | Error::Poisoned => std::io::Error::new(ErrorKind::Other, err),
            _ => std::io::Error::new(ErrorKind::InvalidData, err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
