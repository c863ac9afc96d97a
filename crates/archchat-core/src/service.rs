use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use reqwest::Client;
use serde_json::Value;
use tokio::task::{JoinError, JoinHandle};

use crate::address::{SearchRequest, SearchResult};
use crate::error::SearchError;

/// A search running on the tokio runtime, owned by whichever view started it
pub type SearchTask = JoinHandle<Result<SearchResult, SearchError>>;

/// Submit an address, get back a document reference or a failure.
///
/// Implementations make a single attempt per call and keep no state between
/// calls, so one instance can be shared by every view.
#[async_trait]
pub trait AddressSearch: Send + Sync {
    async fn search(&self, address: &str) -> Result<SearchResult, SearchError>;
}

/// HTTP client for the address search backend
#[derive(Clone)]
pub struct AddressClient {
    client: Client,
    base_url: String,
}

impl AddressClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

#[async_trait]
impl AddressSearch for AddressClient {
    async fn search(&self, address: &str) -> Result<SearchResult, SearchError> {
        let url = self.endpoint();
        tracing::debug!(%url, "sending address search");

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { address })
            .send()
            .await
            .map_err(|source| SearchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status { url, status });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|source| SearchError::Decode {
                url: url.clone(),
                source,
            })?;

        Ok(SearchResult::from_value(body))
    }
}

/// Run one search on the runtime so the caller's event loop keeps going.
pub fn spawn_search(service: &Arc<dyn AddressSearch>, address: String) -> SearchTask {
    let service = Arc::clone(service);
    tokio::spawn(async move { service.search(&address).await })
}

/// Flatten a joined [`SearchTask`] into a plain outcome; a panicked or
/// aborted task counts as a failed search.
pub fn join_outcome(
    joined: Result<Result<SearchResult, SearchError>, JoinError>,
) -> Result<SearchResult, SearchError> {
    joined.unwrap_or_else(|err| Err(err.into()))
}

/// Await a search in place, turning a panic inside the service into a
/// failure instead of unwinding through the view.
pub(crate) async fn search_settled(
    service: &Arc<dyn AddressSearch>,
    address: &str,
) -> Result<SearchResult, SearchError> {
    match AssertUnwindSafe(service.search(address)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "search panicked".to_string());
            Err(SearchError::Interrupted(reason))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, Copy)]
    pub(crate) enum Reply {
        Document(&'static str),
        NoDocument,
        Fail,
        Panic,
    }

    /// Canned search backend that records every address it was asked for
    pub(crate) struct StubSearch {
        reply: Reply,
        pub calls: Mutex<Vec<String>>,
    }

    impl StubSearch {
        pub(crate) fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AddressSearch for StubSearch {
        async fn search(&self, address: &str) -> Result<SearchResult, SearchError> {
            self.calls.lock().unwrap().push(address.to_string());
            match self.reply {
                Reply::Document(path) => Ok(SearchResult::from_value(
                    serde_json::json!({ "pptxPath": path }),
                )),
                Reply::NoDocument => Ok(SearchResult::from_value(serde_json::json!({}))),
                Reply::Fail => Err(SearchError::Status {
                    url: "http://stub/search".to_string(),
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                }),
                Reply::Panic => panic!("stub backend exploded"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Reply, StubSearch};
    use super::*;

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        assert_eq!(
            AddressClient::new("http://localhost:8000/").endpoint(),
            "http://localhost:8000/search"
        );
        assert_eq!(
            AddressClient::new("http://localhost:8000").endpoint(),
            "http://localhost:8000/search"
        );
    }

    #[tokio::test]
    async fn test_spawned_panic_becomes_failure() {
        let service: Arc<dyn AddressSearch> = StubSearch::new(Reply::Panic);
        let task = spawn_search(&service, "Nowhere".to_string());
        let outcome = join_outcome(task.await);
        assert!(matches!(outcome, Err(SearchError::Interrupted(_))));
    }

    #[tokio::test]
    async fn test_settled_search_catches_panic() {
        let service: Arc<dyn AddressSearch> = StubSearch::new(Reply::Panic);
        match search_settled(&service, "Nowhere").await {
            Err(SearchError::Interrupted(reason)) => assert!(reason.contains("exploded")),
            other => panic!("expected interrupted search, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_searches_are_independent() {
        let stub = StubSearch::new(Reply::NoDocument);
        let service: Arc<dyn AddressSearch> = stub.clone();
        let first = spawn_search(&service, "1 Main St".to_string());
        let second = spawn_search(&service, "1 Main St".to_string());
        assert!(join_outcome(first.await).is_ok());
        assert!(join_outcome(second.await).is_ok());
        assert_eq!(stub.call_count(), 2);
    }
}
