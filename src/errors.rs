//! Error types for the object pool

use std::time::Duration;
use thiserror::Error;

/// Boxed error returned by factories and object teardown.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Timed out after {0:?} waiting for a pooled object")]
    Timeout(Duration),

    #[error("Object factory failed: {0}")]
    Creation(#[source] BoxError),

    #[error("Object factory produced an object that is not active")]
    InactiveObject,

    #[error("Pool is closed")]
    Closed,

    #[error("Pool cannot be closed - {0} object(s) are still checked out")]
    OutstandingItems(usize),

    #[error("Invalid pool configuration: {0}")]
    InvalidConfiguration(&'static str),

    #[error("Failed to destroy pooled object: {0}")]
    Destroy(#[source] BoxError),
}

impl PoolError {
    /// Whether retrying the same call later may succeed.
    ///
    /// Only [`PoolError::Timeout`] is temporary; every other error reflects
    /// pool state or a factory failure that the caller has to act on.
    pub fn is_temporary(&self) -> bool {
        matches!(self, PoolError::Timeout(_))
    }

    /// Whether the error came out of the object creation path.
    pub fn is_creation_error(&self) -> bool {
        matches!(self, PoolError::Creation(_) | PoolError::InactiveObject)
    }
}

pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn only_timeout_is_temporary() {
        assert!(PoolError::Timeout(Duration::from_millis(5)).is_temporary());
        assert!(!PoolError::Closed.is_temporary());
        assert!(!PoolError::OutstandingItems(1).is_temporary());
        assert!(!PoolError::Creation("boom".into()).is_temporary());
    }

    #[test]
    fn creation_errors_keep_their_source() {
        let err = PoolError::Creation("connection refused".into());
        assert!(err.is_creation_error());
        assert!(PoolError::InactiveObject.is_creation_error());
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("connection refused"));
        assert_eq!(err.to_string(), "Object factory failed: connection refused");
    }
}
