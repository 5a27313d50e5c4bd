//! Fills a `LivePage` from the network or from a saved HTML snapshot.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::page::LivePage;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/115.0 JobScore/0.1";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone)]
pub struct PageLoader {
    client: Client,
}

impl PageLoader {
    pub fn new(timeout: Duration) -> Result<Self, LoadError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Downloads the document at `url`.
    pub async fn fetch_html(&self, url: &Url) -> Result<String, LoadError> {
        info!("Fetching {url}");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        debug!("Fetched {} bytes from {url}", body.len());
        Ok(body)
    }

    /// Builds a page for `url`, reading the document from `snapshot` when given
    /// and fetching it otherwise.
    pub async fn open(&self, url: Url, snapshot: Option<&Path>) -> Result<LivePage, LoadError> {
        let html = self.document_for(&url, snapshot).await?;
        Ok(LivePage::new(url, html))
    }

    /// Performs an in-app transition on an existing page.
    pub async fn navigate(
        &self,
        page: &LivePage,
        url: Url,
        snapshot: Option<&Path>,
    ) -> Result<(), LoadError> {
        let html = self.document_for(&url, snapshot).await?;
        page.navigate(url, html);
        Ok(())
    }

    async fn document_for(&self, url: &Url, snapshot: Option<&Path>) -> Result<String, LoadError> {
        match snapshot {
            Some(path) => read_snapshot(path).await,
            None => self.fetch_html(url).await,
        }
    }
}

pub async fn read_snapshot(path: &Path) -> Result<String, LoadError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })
}
