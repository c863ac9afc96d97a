//! Form-style address search: one input, a loading indicator, and the most
//! recent document reference or error.

use std::sync::Arc;

use crate::address::{DocumentRef, SearchResult};
use crate::error::SearchError;
use crate::service::{join_outcome, search_settled, spawn_search, AddressSearch, SearchTask};
use tokio::task::JoinError;

pub const SEARCH_ERROR_MESSAGE: &str = "Error processing address. Please try again.";

/// Identifies one request started by [`SearchView::begin`]. Only the newest
/// ticket may change the visible result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Loading,
    Success,
    Failure,
}

pub struct SearchView {
    service: Arc<dyn AddressSearch>,
    pub input: String,
    pptx_path: Option<DocumentRef>,
    error: Option<&'static str>,
    last_failure: Option<SearchError>,
    in_flight: usize,
    latest: u64,
    settled: bool,
}

impl SearchView {
    pub fn new(service: Arc<dyn AddressSearch>) -> Self {
        Self {
            service,
            input: String::new(),
            pptx_path: None,
            error: None,
            last_failure: None,
            in_flight: 0,
            latest: 0,
            settled: false,
        }
    }

    pub fn pptx_path(&self) -> Option<&DocumentRef> {
        self.pptx_path.as_ref()
    }

    /// User-facing error text of the last failed search
    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Underlying cause of the last failure, kept for diagnostics only
    pub fn last_failure(&self) -> Option<&SearchError> {
        self.last_failure.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn phase(&self) -> SearchPhase {
        if self.is_loading() {
            SearchPhase::Loading
        } else if self.error.is_some() {
            SearchPhase::Failure
        } else if self.settled {
            SearchPhase::Success
        } else {
            SearchPhase::Idle
        }
    }

    /// Enter the loading state and hand back the address to send, with the
    /// ticket that settles it.
    ///
    /// Returns `None` without touching any state when the input is blank.
    /// The previous result and error are cleared here, before any request
    /// goes out, so a stale document is never shown next to a live spinner.
    pub fn begin(&mut self) -> Option<(SearchTicket, String)> {
        if self.input.trim().is_empty() {
            return None;
        }

        self.pptx_path = None;
        self.error = None;
        self.last_failure = None;
        self.in_flight += 1;
        self.latest += 1;

        Some((SearchTicket(self.latest), self.input.clone()))
    }

    /// Record the outcome of a search started with [`SearchView::begin`].
    ///
    /// A superseded ticket only releases its share of the loading state; its
    /// result or error is dropped.
    pub fn settle(&mut self, ticket: SearchTicket, outcome: Result<SearchResult, SearchError>) {
        self.in_flight = self.in_flight.saturating_sub(1);

        if ticket.0 != self.latest {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.latest,
                ok = outcome.is_ok(),
                "dropping superseded address search"
            );
            return;
        }
        self.settled = true;

        match outcome {
            Ok(result) => {
                tracing::info!(
                    document = result.document().map(DocumentRef::as_str),
                    "address search completed"
                );
                self.pptx_path = result.pptx_path;
                self.error = None;
            }
            Err(err) => {
                tracing::error!(error = %err, "address search failed");
                self.pptx_path = None;
                self.error = Some(SEARCH_ERROR_MESSAGE);
                self.last_failure = Some(err);
            }
        }
    }

    pub fn settle_joined(
        &mut self,
        ticket: SearchTicket,
        joined: Result<Result<SearchResult, SearchError>, JoinError>,
    ) {
        self.settle(ticket, join_outcome(joined));
    }

    /// Run a whole search in place. Returns `false` if the input was blank
    /// and nothing was sent.
    pub async fn submit(&mut self) -> bool {
        let Some((ticket, address)) = self.begin() else {
            return false;
        };
        let outcome = search_settled(&self.service, &address).await;
        self.settle(ticket, outcome);
        true
    }

    /// Start a search on the runtime; the caller settles it later through
    /// [`SearchView::settle_joined`].
    pub fn spawn(&mut self) -> Option<(SearchTicket, SearchTask)> {
        let (ticket, address) = self.begin()?;
        Some((ticket, spawn_search(&self.service, address)))
    }
}
