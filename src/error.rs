//! Error types for parq.

use thiserror::Error;

/// The main error type for parq operations.
#[derive(Debug, Error)]
pub enum ParqError {
    /// A call-site argument could not be bounded (unbalanced quotes or parens).
    #[error("Unbounded span at offset {position}: {message}")]
    UnboundedSpan { position: usize, message: String },

    /// The call site is dynamic but does not match a rewritable shape.
    #[error("Unsupported shape at offset {position}: {message}")]
    UnsupportedShape { position: usize, message: String },

    /// Configuration file unreadable or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParqError {
    /// Create an unbounded-span error at the given offset.
    pub fn unbounded(position: usize, message: impl Into<String>) -> Self {
        Self::UnboundedSpan {
            position,
            message: message.into(),
        }
    }

    /// Create an unsupported-shape error at the given offset.
    pub fn unsupported(position: usize, message: impl Into<String>) -> Self {
        Self::UnsupportedShape {
            position,
            message: message.into(),
        }
    }

    /// The bare message, without the variant prefix and offset.
    pub fn detail(&self) -> String {
        match self {
            Self::UnboundedSpan { message, .. } | Self::UnsupportedShape { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    /// Byte offset of the call site this error refers to, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::UnboundedSpan { position, .. } | Self::UnsupportedShape { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }

    /// Whether this error skips a single call site rather than a whole file.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::UnboundedSpan { .. } | Self::UnsupportedShape { .. }
        )
    }
}

/// Result type alias for parq operations.
pub type ParqResult<T> = Result<T, ParqError>;
