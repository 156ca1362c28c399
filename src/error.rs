use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the scraping core.
///
/// Callers branch on [`Error::kind`], never on the rendered message.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("location `{input}` does not produce a usable slug")]
    InvalidLocation { input: String },

    #[error("timed out after {timeout:?} fetching {url}")]
    FetchTimeout { url: String, timeout: Duration },

    #[error("HTTP {status} fetching {url}")]
    FetchHttp { url: String, status: u16 },

    #[error("network error fetching {url}: {source}")]
    FetchNetwork {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP client could not be built: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("robots.txt disallows {url}")]
    RobotsDisallowed { url: String },

    #[error("job `{id}` not found")]
    JobNotFound { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidParameter,
    InvalidLocation,
    FetchTimeout,
    FetchHttp,
    FetchNetwork,
    RobotsDisallowed,
    JobNotFound,
}

impl ErrorKind {
    /// Bad input; retrying the same request cannot succeed.
    pub fn is_client_error(self) -> bool {
        matches!(self, Self::InvalidParameter | Self::InvalidLocation)
    }

    /// Upstream trouble a caller may retry with backoff.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::FetchTimeout | Self::FetchHttp | Self::FetchNetwork
        )
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::InvalidLocation { .. } => ErrorKind::InvalidLocation,
            Self::FetchTimeout { .. } => ErrorKind::FetchTimeout,
            Self::FetchHttp { .. } => ErrorKind::FetchHttp,
            Self::FetchNetwork { .. } | Self::ClientBuild(_) => ErrorKind::FetchNetwork,
            Self::RobotsDisallowed { .. } => ErrorKind::RobotsDisallowed,
            Self::JobNotFound { .. } => ErrorKind::JobNotFound,
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
