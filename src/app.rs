use std::path::PathBuf;
use std::sync::Arc;

use archchat_core::{
    AddressClient, AddressSearch, ChatView, DocumentClient, DocumentViewer, Environment,
    ResolvedConfig, SearchTask, SearchTicket, SearchView,
};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Search,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub type DownloadTask = JoinHandle<anyhow::Result<Option<PathBuf>>>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub input_cursor: usize, // char position in the active screen's input

    // Search form state
    pub search: SearchView,
    pub search_task: Option<(SearchTicket, SearchTask)>,
    pub viewer: DocumentViewer,

    // Chat state
    pub chat: ChatView,
    pub chat_tasks: Vec<SearchTask>,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of transcript area for scroll calculations
    pub chat_width: u16,  // Width of transcript area for wrap calculations

    // Downloads
    pub documents: DocumentClient,
    pub download_dir: PathBuf,
    pub download_task: Option<DownloadTask>,
    pub status: Option<String>,

    // Backend
    pub api_url: String,
    pub environment: Environment,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(config: &ResolvedConfig) -> Self {
        let service: Arc<dyn AddressSearch> = Arc::new(AddressClient::new(&config.api_url));
        let documents = DocumentClient::new(&config.api_url);
        Self::with_services(service, documents, config)
    }

    /// Build the app around an explicit search service, shared by both screens
    pub fn with_services(
        service: Arc<dyn AddressSearch>,
        documents: DocumentClient,
        config: &ResolvedConfig,
    ) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Search,
            input_mode: InputMode::Editing,
            input_cursor: 0,

            search: SearchView::new(Arc::clone(&service)),
            search_task: None,
            viewer: DocumentViewer::new(None),

            chat: ChatView::new(service),
            chat_tasks: Vec::new(),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            documents,
            download_dir: config.download_dir.clone(),
            download_task: None,
            status: None,

            api_url: config.api_url.clone(),
            environment: config.environment,

            animation_frame: 0,
        }
    }

    pub fn input(&self) -> &str {
        match self.screen {
            Screen::Search => &self.search.input,
            Screen::Chat => &self.chat.input,
        }
    }

    pub fn input_mut(&mut self) -> &mut String {
        match self.screen {
            Screen::Search => &mut self.search.input,
            Screen::Chat => &mut self.chat.input,
        }
    }

    pub fn switch_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Search => Screen::Chat,
            Screen::Chat => Screen::Search,
        };
        self.input_cursor = self.input().chars().count();
    }

    pub fn is_busy(&self) -> bool {
        self.search.is_loading() || self.chat.is_waiting() || self.download_task.is_some()
    }

    /// Submit the search form. Ignored while the previous search is in flight.
    pub fn submit_search(&mut self) {
        if self.search_task.is_some() {
            return;
        }
        if let Some(task) = self.search.spawn() {
            self.status = None;
            self.search_task = Some(task);
            self.input_mode = InputMode::Normal;
        }
    }

    pub fn submit_chat(&mut self) {
        if let Some(task) = self.chat.spawn() {
            self.chat_tasks.push(task);
            self.input_cursor = 0;
            self.scroll_chat_to_bottom();
        }
    }

    /// Save the previewed document into the download directory
    pub fn start_download(&mut self) {
        if self.download_task.is_some() {
            return;
        }

        let link = self.viewer.download();
        if link.href.is_empty() {
            self.status = Some("No document to download yet".to_string());
            return;
        }

        let documents = self.documents.clone();
        let dir = self.download_dir.clone();
        self.status = Some(format!("Downloading {}", link.filename));
        self.download_task = Some(tokio::spawn(async move { documents.save(&link, &dir).await }));
    }

    /// Settle every background task that has finished since the last tick
    pub async fn poll_tasks(&mut self) {
        if self.search_task.as_ref().is_some_and(|(_, task)| task.is_finished()) {
            if let Some((ticket, task)) = self.search_task.take() {
                self.search.settle_joined(ticket, task.await);
                // The viewer follows the latest search result
                self.viewer.set_path(self.search.pptx_path().cloned());
            }
        }

        if self.chat_tasks.iter().any(|task| task.is_finished()) {
            let (finished, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.chat_tasks)
                .into_iter()
                .partition(|task| task.is_finished());
            self.chat_tasks = pending;

            for task in finished {
                self.chat.settle_joined(task.await);
            }
            self.scroll_chat_to_bottom();
        }

        if self.download_task.as_ref().is_some_and(|task| task.is_finished()) {
            if let Some(task) = self.download_task.take() {
                self.status = Some(match task.await {
                    Ok(Ok(Some(path))) => format!("Saved {}", path.display()),
                    Ok(Ok(None)) => "No document to download yet".to_string(),
                    Ok(Err(err)) => {
                        tracing::error!(error = %err, "document download failed");
                        "Download failed. Please try again.".to_string()
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "download task ended early");
                        "Download failed. Please try again.".to_string()
                    }
                });
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn chat_scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn chat_scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Scroll the transcript so the newest message (or the waiting indicator)
    /// is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Fall back to a sensible width before the first render
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        // The transcript only grows, so count in usize and clamp at the end
        let mut total_lines: usize = 0;

        for msg in self.chat.messages() {
            total_lines = total_lines.saturating_add(1); // "You:" / "Bot:" line
            for line in msg.text.lines() {
                // Character count, not byte length, for UTF-8 addresses
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add(char_count / wrap_width + 1);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.chat.is_waiting() {
            total_lines = total_lines.saturating_add(2); // "Bot:" + "Searching..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height as usize
        } else {
            20
        };

        self.chat_scroll = u16::try_from(total_lines.saturating_sub(visible_height)).unwrap_or(u16::MAX);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use archchat_core::{SearchError, SearchPhase, SearchResult};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Search backend that replays one canned response
    pub(crate) struct CannedSearch {
        pub body: Option<serde_json::Value>,
        pub calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AddressSearch for CannedSearch {
        async fn search(&self, address: &str) -> Result<SearchResult, SearchError> {
            self.calls.lock().unwrap().push(address.to_string());
            match &self.body {
                Some(body) => Ok(SearchResult::from_value(body.clone())),
                None => Err(SearchError::Interrupted("connection refused".to_string())),
            }
        }
    }

    pub(crate) fn test_app(body: Option<serde_json::Value>) -> (App, Arc<CannedSearch>) {
        let service = Arc::new(CannedSearch {
            body,
            calls: Mutex::new(Vec::new()),
        });
        let config = ResolvedConfig {
            environment: Environment::Development,
            api_url: "http://127.0.0.1:9".to_string(),
            download_dir: PathBuf::from("."),
        };
        let app = App::with_services(
            service.clone(),
            DocumentClient::new(&config.api_url),
            &config,
        );
        (app, service)
    }

    /// Poll until every search has settled
    pub(crate) async fn settle_all(app: &mut App) {
        for _ in 0..200 {
            app.poll_tasks().await;
            if app.search_task.is_none() && app.chat_tasks.is_empty() && app.download_task.is_none() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        panic!("background tasks never settled");
    }

    #[tokio::test]
    async fn test_search_result_reaches_viewer() {
        let (mut app, _) = test_app(Some(serde_json::json!({ "pptxPath": "/files/a.pptx" })));
        app.search.input = "221B Baker Street".to_string();

        app.submit_search();
        assert!(app.search.is_loading());
        settle_all(&mut app).await;

        assert_eq!(app.search.phase(), SearchPhase::Success);
        assert_eq!(app.viewer.src().map(|src| src.as_str()), Some("/files/a.pptx"));
    }

    #[tokio::test]
    async fn test_failed_search_clears_viewer() {
        let (mut app, _) = test_app(None);
        app.search.input = "Nowhere".to_string();

        app.submit_search();
        settle_all(&mut app).await;

        assert_eq!(app.search.phase(), SearchPhase::Failure);
        assert!(!app.search.is_loading());
        assert_eq!(app.viewer.src(), None);
    }

    #[tokio::test]
    async fn test_second_submit_ignored_while_loading() {
        let (mut app, service) = test_app(Some(serde_json::json!({})));
        app.search.input = "221B Baker Street".to_string();

        app.submit_search();
        app.submit_search();
        settle_all(&mut app).await;

        assert_eq!(service.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_chat_settles_every_submit() {
        let (mut app, _) = test_app(Some(serde_json::json!({})));
        app.screen = Screen::Chat;

        for address in ["1 Main Street", "2 Main Street", "3 Main Street"] {
            app.chat.input = address.to_string();
            app.submit_chat();
        }
        assert_eq!(app.chat.messages().len(), 3);
        settle_all(&mut app).await;

        assert_eq!(app.chat.messages().len(), 6);
        assert!(!app.chat.is_waiting());
    }

    #[test]
    fn test_scroll_to_bottom_survives_huge_transcript() {
        let (mut app, _) = test_app(None);
        app.chat_width = 40;
        app.chat_height = 10;

        for _ in 0..11_000 {
            app.chat.input = "221B Baker Street".to_string();
            app.chat.begin();
            app.chat.settle(Ok(SearchResult::default()));
        }
        app.scroll_chat_to_bottom();
        assert_eq!(app.chat_scroll, u16::MAX);

        app.chat_scroll_down(3);
        assert_eq!(app.chat_scroll, u16::MAX);
    }

    #[test]
    fn test_scroll_to_bottom_counts_wrapped_lines() {
        let (mut app, _) = test_app(None);
        app.chat_width = 10;
        app.chat_height = 2;
        app.chat.input = "x".repeat(25);
        app.chat.begin();

        app.scroll_chat_to_bottom();

        // label + 3 wrapped rows + blank + waiting indicator (2) - visible height
        assert_eq!(app.chat_scroll, 5);
    }

    #[tokio::test]
    async fn test_download_without_document_fetches_nothing() {
        let (mut app, _) = test_app(None);

        app.start_download();

        assert!(app.download_task.is_none());
        assert_eq!(app.status.as_deref(), Some("No document to download yet"));
    }

    #[test]
    fn test_switch_screen_keeps_inputs_apart() {
        let (mut app, _) = test_app(None);
        app.search.input = "221B".to_string();

        app.switch_screen();
        assert_eq!(app.screen, Screen::Chat);
        assert_eq!(app.input(), "");
        assert_eq!(app.input_cursor, 0);

        app.switch_screen();
        assert_eq!(app.input(), "221B");
        assert_eq!(app.input_cursor, 4);
    }
}
