//! Inline preview of a generated document plus the download affordance.

use crate::address::{DocumentKind, DocumentRef};

/// Suggested name for every downloaded document, whatever it actually is
pub const DOWNLOAD_FILENAME: &str = "generated-presentation.pptx";

/// A URL the viewer has accepted for inline embedding.
///
/// Only built from a [`DocumentRef`], i.e. from a value the search backend
/// returned. User-typed text has no path into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedResourceUrl(String);

impl TrustedResourceUrl {
    fn trust(document: &DocumentRef) -> Self {
        Self(document.as_str().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A pending "save as" for the current document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub href: String,
    pub filename: String,
}

#[derive(Debug, Default)]
pub struct DocumentViewer {
    path: Option<DocumentRef>,
    src: Option<TrustedResourceUrl>,
}

impl DocumentViewer {
    pub fn new(path: Option<DocumentRef>) -> Self {
        let mut viewer = Self::default();
        viewer.initialize(path);
        viewer
    }

    /// Point the viewer at a document, or at nothing.
    pub fn initialize(&mut self, path: Option<DocumentRef>) {
        self.src = path.as_ref().map(TrustedResourceUrl::trust);
        self.path = path;
    }

    /// Re-initialize only when the document actually changed. Returns whether
    /// it did.
    pub fn set_path(&mut self, path: Option<DocumentRef>) -> bool {
        if self.path == path {
            return false;
        }
        self.initialize(path);
        true
    }

    pub fn path(&self) -> Option<&DocumentRef> {
        self.path.as_ref()
    }

    pub fn src(&self) -> Option<&TrustedResourceUrl> {
        self.src.as_ref()
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        self.path.as_ref().map(DocumentRef::kind)
    }

    /// Describe the download for the current document. Never fails; with no
    /// document the link simply has an empty href.
    pub fn download(&self) -> DownloadLink {
        DownloadLink {
            href: self
                .path
                .as_ref()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default(),
            filename: DOWNLOAD_FILENAME.to_string(),
        }
    }
}
