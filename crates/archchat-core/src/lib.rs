pub mod address;
pub mod chat_view;
pub mod config;
pub mod documents;
pub mod error;
pub mod search_view;
pub mod service;
pub mod state;
pub mod viewer;

// Re-export main types for convenience
pub use address::{DocumentKind, DocumentRef, SearchResult};
pub use chat_view::ChatView;
pub use config::{Config, Environment, ResolvedConfig};
pub use documents::DocumentClient;
pub use error::SearchError;
pub use search_view::{SearchPhase, SearchTicket, SearchView};
pub use service::{AddressClient, AddressSearch, SearchTask};
pub use state::{ChatMessage, ChatRole};
pub use viewer::{DocumentViewer, DownloadLink, TrustedResourceUrl, DOWNLOAD_FILENAME};
