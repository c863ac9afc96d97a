use thiserror::Error;

/// Why an address search failed.
///
/// Views never show these details to the user; they collapse every variant
/// into one fixed message and keep this value for logging.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("search request to {url} failed with status: {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("search ended before settling: {0}")]
    Interrupted(String),
}

impl From<tokio::task::JoinError> for SearchError {
    fn from(err: tokio::task::JoinError) -> Self {
        SearchError::Interrupted(err.to_string())
    }
}
