//! Wire models for the address search endpoint

use serde::Serialize;
use serde_json::{Map, Value};

/// Body of `POST {api_url}/search`
#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub address: &'a str,
}

/// A path or URL to a generated document, as returned by the backend.
///
/// There is deliberately no public constructor: the only way to obtain one is
/// by decoding a [`SearchResult`], so anything holding a `DocumentRef` came
/// from the search backend and never from what the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef(String);

impl DocumentRef {
    pub(crate) fn from_backend(path: &str) -> Self {
        Self(path.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_path(&self.0)
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pptx,
    Pdf,
    Other,
}

impl DocumentKind {
    pub fn from_path(path: &str) -> Self {
        // Ignore query strings and fragments when looking at the extension
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pptx" => DocumentKind::Pptx,
            "pdf" => DocumentKind::Pdf,
            _ => DocumentKind::Other,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentKind::Pptx => "Presentation (PPTX)",
            DocumentKind::Pdf => "PDF document",
            DocumentKind::Other => "Document",
        }
    }
}

/// Result of an address search.
///
/// Only `pptxPath` is interpreted; every other field of the response object is
/// kept as-is in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub pptx_path: Option<DocumentRef>,
    pub extra: Map<String, Value>,
}

impl SearchResult {
    /// Build a result from any JSON response body.
    ///
    /// Non-object bodies (including `null`) and a missing, empty or
    /// non-string `pptxPath` all mean "no document produced".
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut extra) = value else {
            return Self::default();
        };

        let pptx_path = extra
            .remove("pptxPath")
            .as_ref()
            .and_then(Value::as_str)
            .filter(|path| !path.is_empty())
            .map(DocumentRef::from_backend);

        Self { pptx_path, extra }
    }

    pub fn document(&self) -> Option<&DocumentRef> {
        self.pptx_path.as_ref()
    }
}
