use thiserror::Error;

/// Result type for limiter-side operations
pub type Result<T> = std::result::Result<T, RateLimitError>;

/// Errors raised by the limiter itself
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    /// Invalid configuration, raised at construction
    #[error("invalid rate limiter configuration: {0}")]
    InvalidConfig(&'static str),

    /// A suspension was cancelled or timed out before admission completed.
    /// The gate slot is released and the dispatch never ran.
    #[error("admission wait interrupted before a slot was granted")]
    Interrupted,
}

/// Errors surfaced to an [`admit`](crate::SlidingWindow::admit) caller
///
/// Dispatch errors pass through unchanged; the limiter never interprets,
/// wraps silently, or retries them.
#[derive(Error, Debug)]
pub enum AdmitError<E> {
    /// The limiter failed before the dispatch collaborator was invoked
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),

    /// The dispatch collaborator reported an error
    #[error("dispatch failed: {0}")]
    Dispatch(#[source] E),
}

impl<E> AdmitError<E> {
    /// The collaborator's error, if dispatch is what failed
    pub fn into_dispatch_error(self) -> Option<E> {
        match self {
            AdmitError::RateLimit(_) => None,
            AdmitError::Dispatch(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = RateLimitError::InvalidConfig("capacity must be greater than 0");
        assert_eq!(err.to_string(), "invalid rate limiter configuration: capacity must be greater than 0");

        assert_eq!(RateLimitError::Interrupted.to_string(), "admission wait interrupted before a slot was granted");
    }

    #[test]
    fn test_admit_error_passthrough() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "downstream unavailable");
        let err: AdmitError<std::io::Error> = AdmitError::Dispatch(inner);

        assert!(err.to_string().starts_with("dispatch failed"));
        let inner = err.into_dispatch_error().unwrap();
        assert_eq!(inner.kind(), std::io::ErrorKind::ConnectionRefused);
    }

    #[test]
    fn test_rate_limit_error_converts() {
        let err: AdmitError<std::io::Error> = RateLimitError::Interrupted.into();
        assert!(matches!(err, AdmitError::RateLimit(RateLimitError::Interrupted)));
        assert!(err.into_dispatch_error().is_none());
    }
}
