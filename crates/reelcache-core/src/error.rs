use thiserror::Error;

use crate::api::ApiError;
use crate::store::StoreError;

/// Errors surfaced by the foreground paths of the sync layer.
///
/// Remote and storage failures keep their own kinds so callers can tell a
/// network problem from a broken local store.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when retrying the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api(ApiError::Transport(_)) => true,
            Error::Api(ApiError::ResponseStatus { status, .. }) => {
                *status == 429 || (500..=599).contains(status)
            }
            Error::Api(ApiError::Decode(_)) => false,
            Error::Store(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(Error::from(ApiError::Transport("reset".into())).is_retryable());
        assert!(Error::from(ApiError::ResponseStatus { status: 503, message: None }).is_retryable());
        assert!(!Error::from(ApiError::ResponseStatus { status: 404, message: None }).is_retryable());
        assert!(!Error::from(ApiError::Decode("bad".into())).is_retryable());
        assert!(!Error::from(StoreError::NotFound(7)).is_retryable());
    }
}
