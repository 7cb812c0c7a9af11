use std::sync::Arc;

use thiserror::Error;

use crate::model::Brand;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the caller of [`ScreenResolver`](crate::ScreenResolver) and
/// [`FlagEvaluator`](crate::FlagEvaluator).
///
/// Provider failures and malformed stored trees never show up here: they are recovered inside the
/// pipeline and only logged.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// No published definition matches the request, even after falling back to the default
    /// segment.
    #[error("screen {screen_id:?} not found for brand {brand} (segment: {segment:?})")]
    NotFound {
        /// Requested screen id.
        screen_id: String,
        /// Requested brand.
        brand: Brand,
        /// Requested segment, before fallback.
        segment: Option<String>,
    },
    /// Caller-supplied parameters were rejected before resolution started.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A backing store could not be reached.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rejection of caller-supplied query parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid screenId {0:?}")]
    InvalidScreenId(String),
    #[error("unknown brand {0:?}")]
    UnknownBrand(String),
    #[error("invalid segment {0:?}")]
    InvalidSegment(String),
    #[error("invalid userId")]
    InvalidUserId,
}

/// Failure of a single data provider invocation.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("{0}")]
    Failed(String),
    #[error("invalid provider url")]
    InvalidUrl(#[source] url::ParseError),
    // reqwest::Error is not clonable, so we're wrapping it in an Arc.
    #[error(transparent)]
    Http(Arc<reqwest::Error>),
    #[error("provider panicked")]
    Panicked,
}

impl ProviderError {
    /// Shorthand for [`ProviderError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        ProviderError::Failed(message.into())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(value: reqwest::Error) -> Self {
        ProviderError::Http(Arc::new(value.without_url()))
    }
}

/// A backing store (screens, experiments, flags) failed to answer.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(Arc<std::io::Error>),
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}
