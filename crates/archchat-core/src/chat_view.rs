//! Chat-style address search: a flat, append-only transcript.

use std::sync::Arc;

use tokio::task::JoinError;

use crate::address::{DocumentRef, SearchResult};
use crate::error::SearchError;
use crate::service::{join_outcome, search_settled, spawn_search, AddressSearch, SearchTask};
use crate::state::ChatMessage;

pub const CHAT_SUCCESS_MESSAGE: &str = "Here is your address information.";
pub const CHAT_ERROR_MESSAGE: &str = "Sorry, there was an error processing your request.";

pub struct ChatView {
    service: Arc<dyn AddressSearch>,
    pub input: String,
    messages: Vec<ChatMessage>,
    in_flight: usize,
}

impl ChatView {
    pub fn new(service: Arc<dyn AddressSearch>) -> Self {
        Self {
            service,
            input: String::new(),
            messages: Vec::new(),
            in_flight: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_waiting(&self) -> bool {
        self.in_flight > 0
    }

    /// Append the user's message, clear the input, and hand back the address
    /// to send. Blank input changes nothing and returns `None`.
    pub fn begin(&mut self) -> Option<String> {
        if self.input.trim().is_empty() {
            return None;
        }

        let address = std::mem::take(&mut self.input);
        self.messages.push(ChatMessage::user(address.clone()));
        self.in_flight += 1;

        Some(address)
    }

    /// Append exactly one assistant reply for a settled search.
    ///
    /// On success the result is handed back so a front end can show the
    /// document; the transcript itself only ever gets the canned reply.
    pub fn settle(&mut self, outcome: Result<SearchResult, SearchError>) -> Option<SearchResult> {
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome {
            Ok(result) => {
                tracing::debug!(
                    document = result.document().map(DocumentRef::as_str),
                    "chat search completed"
                );
                self.messages.push(ChatMessage::assistant(CHAT_SUCCESS_MESSAGE));
                Some(result)
            }
            Err(err) => {
                tracing::error!(error = %err, "chat search failed");
                self.messages.push(ChatMessage::assistant(CHAT_ERROR_MESSAGE));
                None
            }
        }
    }

    pub fn settle_joined(
        &mut self,
        joined: Result<Result<SearchResult, SearchError>, JoinError>,
    ) -> Option<SearchResult> {
        self.settle(join_outcome(joined))
    }

    pub async fn submit(&mut self) -> Option<SearchResult> {
        let address = self.begin()?;
        let outcome = search_settled(&self.service, &address).await;
        self.settle(outcome)
    }

    pub fn spawn(&mut self) -> Option<SearchTask> {
        let address = self.begin()?;
        Some(spawn_search(&self.service, address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{Reply, StubSearch};
    use crate::state::ChatRole;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_success_appends_user_then_canned_reply() {
        let stub = StubSearch::new(Reply::Document("/files/a.pptx"));
        let mut chat = ChatView::new(stub.clone());
        chat.input = "221B Baker Street".to_string();

        let result = chat.submit().await;

        assert!(result.is_some());
        assert_eq!(
            chat.messages(),
            &[
                ChatMessage::user("221B Baker Street"),
                ChatMessage::assistant(CHAT_SUCCESS_MESSAGE),
            ]
        );
        assert_eq!(chat.input, "");
        assert!(!chat.is_waiting());
    }

    #[tokio::test]
    async fn test_failure_appends_canned_error() {
        let mut chat = ChatView::new(StubSearch::new(Reply::Fail));
        chat.input = "Nowhere".to_string();

        assert_eq!(chat.submit().await, None);

        let last = chat.messages().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.text, CHAT_ERROR_MESSAGE);
        assert_eq!(chat.messages().len(), 2);
    }

    #[test]
    fn test_user_message_is_visible_before_request_settles() {
        let mut chat = ChatView::new(StubSearch::new(Reply::NoDocument));
        chat.input = "  221B Baker Street ".to_string();

        assert_eq!(chat.begin().as_deref(), Some("  221B Baker Street "));

        assert_eq!(chat.messages().len(), 1);
        assert!(chat.messages()[0].is_user());
        assert_eq!(chat.input, "");
        assert!(chat.is_waiting());
    }

    #[tokio::test]
    async fn test_blank_input_is_a_no_op() {
        let stub = StubSearch::new(Reply::NoDocument);
        let mut chat = ChatView::new(stub.clone());
        chat.input = "\t ".to_string();

        assert_eq!(chat.submit().await, None);

        assert!(chat.messages().is_empty());
        assert_eq!(chat.input, "\t ");
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_transcript_grows_by_two_per_settled_submit() {
        let mut chat = ChatView::new(StubSearch::new(Reply::NoDocument));
        let mut failing = ChatView::new(StubSearch::new(Reply::Fail));

        for n in 1..=4 {
            chat.input = format!("{n} Main Street");
            chat.submit().await;
            assert_eq!(chat.messages().len(), 2 * n);

            failing.input = format!("{n} Main Street");
            failing.submit().await;
            assert_eq!(failing.messages().len(), 2 * n);
        }
    }

    #[tokio::test]
    async fn test_overlapping_spawns_each_settle() {
        let stub = StubSearch::new(Reply::NoDocument);
        let mut chat = ChatView::new(stub.clone());

        chat.input = "1 Main Street".to_string();
        let first = chat.spawn().unwrap();
        chat.input = "2 Main Street".to_string();
        let second = chat.spawn().unwrap();
        assert_eq!(chat.messages().len(), 2);

        chat.settle_joined(second.await);
        assert!(chat.is_waiting());
        chat.settle_joined(first.await);

        assert!(!chat.is_waiting());
        assert_eq!(chat.messages().len(), 4);
        assert_eq!(stub.call_count(), 2);
    }
}
