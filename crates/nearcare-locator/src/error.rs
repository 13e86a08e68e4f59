use std::time::Duration;

use thiserror::Error;

/// Coarse category of a failed provider attempt, used to tell callers why a
/// search ran out of endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The endpoint did not answer within the per-attempt deadline.
    Timeout,
    /// The endpoint answered, but not with a usable JSON payload.
    BadResponse,
    /// Connection-level failure (DNS, refused, reset, TLS).
    Unavailable,
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureClass::Timeout => write!(f, "timeout"),
            FailureClass::BadResponse => write!(f, "bad response"),
            FailureClass::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Why a single endpoint attempt failed. Always recoverable by moving on to
/// the next endpoint.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error("{url} did not respond within {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("unexpected content type {content_type:?} from {url}")]
    UnexpectedContentType {
        content_type: Option<String>,
        url: String,
    },

    #[error("JSON deserialization error for {url}: {source}")]
    Deserialize {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {url} has no elements array")]
    MissingElements { url: String },

    #[error("{url} reported a runtime error: {remark}")]
    ProviderRemark { url: String, remark: String },

    #[error("HTTP error from {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl AttemptFailure {
    /// Wraps a transport error, folding client-side timeouts into
    /// [`AttemptFailure::Timeout`].
    pub(crate) fn from_reqwest(url: &str, timeout: Duration, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            AttemptFailure::Timeout {
                url: url.to_owned(),
                timeout,
            }
        } else {
            AttemptFailure::Http {
                url: url.to_owned(),
                source,
            }
        }
    }

    #[must_use]
    pub fn classification(&self) -> FailureClass {
        match self {
            AttemptFailure::Timeout { .. } => FailureClass::Timeout,
            AttemptFailure::UnexpectedStatus { .. }
            | AttemptFailure::UnexpectedContentType { .. }
            | AttemptFailure::Deserialize { .. }
            | AttemptFailure::MissingElements { .. }
            | AttemptFailure::ProviderRemark { .. } => FailureClass::BadResponse,
            AttemptFailure::Http { .. } => FailureClass::Unavailable,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            AttemptFailure::Timeout { url, .. }
            | AttemptFailure::UnexpectedStatus { url, .. }
            | AttemptFailure::UnexpectedContentType { url, .. }
            | AttemptFailure::Deserialize { url, .. }
            | AttemptFailure::MissingElements { url }
            | AttemptFailure::ProviderRemark { url, .. }
            | AttemptFailure::Http { url, .. } => url,
        }
    }
}

/// Errors returned by [`crate::ProviderGateway::fetch`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no provider endpoints configured")]
    NoEndpoints,

    /// Every endpoint was tried once and none produced a usable response.
    #[error("all {attempts} provider endpoints failed; last failure ({classification}): {last}")]
    AllExhausted {
        attempts: usize,
        classification: FailureClass,
        #[source]
        last: Box<AttemptFailure>,
    },

    #[error("provider fetch cancelled")]
    Cancelled,
}

/// Terminal outcomes of a facility search other than a (possibly empty) list.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search query: {0}")]
    InvalidQuery(#[from] nearcare_core::CoreError),

    #[error("no provider endpoints configured")]
    NoEndpoints,

    #[error("facility search unavailable: all {attempts} providers failed (last failure: {classification})")]
    AllExhausted {
        attempts: usize,
        classification: FailureClass,
        #[source]
        last: Box<AttemptFailure>,
    },

    #[error("facility search cancelled")]
    Cancelled,
}

impl From<GatewayError> for SearchError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NoEndpoints => SearchError::NoEndpoints,
            GatewayError::AllExhausted {
                attempts,
                classification,
                last,
            } => SearchError::AllExhausted {
                attempts,
                classification,
                last,
            },
            GatewayError::Cancelled => SearchError::Cancelled,
        }
    }
}

/// Why the platform could not supply a live position.
#[derive(Debug, Error)]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location services are not supported on this platform")]
    Unsupported,

    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("location lookup HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
