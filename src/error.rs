//! Error types and handling for lazy streams
//!
//! Every failure is surfaced synchronously at the point where a thunk was
//! forced. The engine never retries and never caches a failed evaluation.

/// Main error type for stream operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Index at or beyond the end of a finite stream
    #[error("node index out of range: {index}")]
    IndexOutOfRange { index: usize },

    /// Slice step that is not a positive integer
    #[error("step must be a positive integer, not {step}")]
    InvalidStep { step: usize },

    /// A `Slot` was read before anything was bound into it
    #[error("slot was forced before it was bound")]
    UnboundCell,

    /// `zip_map` was given an empty list of input streams
    #[error("zip_map requires at least one input stream")]
    NoInputs,

    /// Failure raised by user code inside a thunk or mapped function
    #[error("Stream error: {0}")]
    Custom(String),
}

impl From<String> for StreamError {
    fn from(msg: String) -> Self {
        StreamError::Custom(msg)
    }
}

impl From<&str> for StreamError {
    fn from(msg: &str) -> Self {
        StreamError::Custom(msg.to_string())
    }
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;
