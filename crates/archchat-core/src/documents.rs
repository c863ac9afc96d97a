use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Url};
use serde_json::Value;

use crate::viewer::DownloadLink;

/// Client for the document side of the backend: PDF generation and
/// fetching generated files to disk.
#[derive(Clone)]
pub struct DocumentClient {
    client: Client,
    base_url: String,
}

impl DocumentClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Ask the backend to render `data` as a PDF and return the raw bytes.
    pub async fn generate_pdf(&self, data: &Value) -> Result<Vec<u8>> {
        let url = format!("{}/generate-pdf", self.base_url);

        let response = self.client.post(&url).json(data).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("PDF generation failed with status: {}", response.status()));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Link to a file the backend serves under `/download/`.
    pub fn download_link(&self, file_name: &str) -> DownloadLink {
        DownloadLink {
            href: format!("{}/download/{}", self.base_url, file_name),
            filename: file_name.to_string(),
        }
    }

    /// Absolute hrefs are used as-is; anything else is relative to the API.
    pub fn resolve(&self, href: &str) -> Result<Url> {
        let base = Url::parse(&format!("{}/", self.base_url))
            .with_context(|| format!("invalid API base URL: {}", self.base_url))?;
        base.join(href)
            .with_context(|| format!("cannot resolve document link: {href}"))
    }

    /// Follow a download link and write the file into `dir`.
    ///
    /// An empty href has nothing behind it: nothing is fetched and `None` is
    /// returned.
    pub async fn save(&self, link: &DownloadLink, dir: &Path) -> Result<Option<PathBuf>> {
        if link.href.is_empty() {
            tracing::info!("no document to download");
            return Ok(None);
        }

        let url = self.resolve(&link.href)?;
        tracing::info!(%url, filename = %link.filename, "downloading document");

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Download of {} failed with status: {}", url, response.status()));
        }
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("cannot create {}", dir.display()))?;
        let target = dir.join(&link.filename);
        tokio::fs::write(&target, &bytes)
            .await
            .with_context(|| format!("cannot write {}", target.display()))?;

        Ok(Some(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_relative_path_against_api() {
        let docs = DocumentClient::new("http://localhost:8000/");
        assert_eq!(
            docs.resolve("/files/a.pptx").unwrap().as_str(),
            "http://localhost:8000/files/a.pptx"
        );
        assert_eq!(
            docs.resolve("files/a.pptx").unwrap().as_str(),
            "http://localhost:8000/files/a.pptx"
        );
    }

    #[test]
    fn test_resolve_keeps_absolute_url() {
        let docs = DocumentClient::new("http://localhost:8000");
        assert_eq!(
            docs.resolve("https://cdn.example.com/a.pdf").unwrap().as_str(),
            "https://cdn.example.com/a.pdf"
        );
    }

    #[test]
    fn test_download_link_for_named_file() {
        let docs = DocumentClient::new("http://localhost:8000");
        assert_eq!(
            docs.download_link("plan-101.pdf"),
            DownloadLink {
                href: "http://localhost:8000/download/plan-101.pdf".to_string(),
                filename: "plan-101.pdf".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_empty_link_fetches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let docs = DocumentClient::new("http://127.0.0.1:9");
        let link = DownloadLink {
            href: String::new(),
            filename: crate::viewer::DOWNLOAD_FILENAME.to_string(),
        };

        assert_eq!(docs.save(&link, dir.path()).await.unwrap(), None);
        assert!(!dir.path().join(crate::viewer::DOWNLOAD_FILENAME).exists());
    }
}
