//! Errors - エラー型と分類
//!
//! claim 競争に負けるのはエラーではない（`SetNx::Exists` / `Dispatch::Duplicate`）。
//! ここに並ぶのは本物の失敗だけ。

use thiserror::Error;

/// Boxed error returned by user supplied handlers and filters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Operational classification of a [`LatchError`].
///
/// - Permanent: bad arguments or configuration; retrying cannot help
/// - Infrastructure: the store failed
/// - Application: user code (filter or handler) failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Permanent,
    Infrastructure,
    Application,
}

/// Failure of a conditional store other than "key already exists".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum LatchError {
    /// Malformed arguments, rejected before any I/O.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("shouldHandleEvent failed: {0}")]
    Filter(#[source] BoxError),

    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LatchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LatchError::Validation(_) | LatchError::Config(_) => ErrorKind::Permanent,
            LatchError::Storage(_) => ErrorKind::Infrastructure,
            LatchError::Filter(_) | LatchError::Handler(_) => ErrorKind::Application,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_convert_and_keep_their_message() {
        let err: LatchError = StoreError::Unavailable("connection reset".into()).into();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert_eq!(err.to_string(), "store unavailable: connection reset");
    }

    #[test]
    fn handler_errors_expose_their_source() {
        let inner: BoxError = "boom".into();
        let err = LatchError::Handler(inner);
        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(err.to_string(), "handler failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn validation_message_is_verbatim() {
        let err = LatchError::validation("\"path\" must be a non-empty string");
        assert_eq!(err.kind(), ErrorKind::Permanent);
        assert_eq!(err.to_string(), "\"path\" must be a non-empty string");
    }
}
