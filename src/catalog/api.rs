//! HTTP transport for the BiblioCommons endpoints.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::CatalogError;
use crate::user_agent::default_catalog_user_agent;

use super::http_client::{HttpTimeouts, build_catalog_http_client};
use super::{CatalogApi, CatalogQuery};

const SEARCH_PATH: &str = "search/rss";
const FULL_RECORD_PATH: &str = "item/full_record";
const QUERY_PARAM: &str = "custom_query";

/// Talks to one library system's BiblioCommons site (`https://<subdomain>.bibliocommons.com/`).
pub struct BiblioCommonsApi {
    client: Client,
    root: Url,
}

impl BiblioCommonsApi {
    /// Creates a client for the library system identified by `subdomain`, e.g. `sfpl`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidCatalogUrl`] if the subdomain does not form a
    /// valid host, or [`CatalogError::ClientBuild`] if the HTTP client fails.
    #[tracing::instrument(skip(timeouts))]
    pub fn new(subdomain: &str, timeouts: HttpTimeouts) -> Result<Self, CatalogError> {
        let base = format!("https://{}.bibliocommons.com/", subdomain.trim());
        Self::with_base_url(&base, timeouts)
    }

    /// Creates a client rooted at an arbitrary base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidCatalogUrl`] if `base_url` is not an absolute URL,
    /// or [`CatalogError::ClientBuild`] if the HTTP client fails.
    pub fn with_base_url(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, CatalogError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let root = Url::parse(&base)
            .map_err(|e| CatalogError::invalid_catalog_url(base_url, &e.to_string()))?;
        let client = build_catalog_http_client(default_catalog_user_agent(), timeouts)?;
        Ok(Self { client, root })
    }

    /// The root every endpoint is resolved against.
    #[must_use]
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// URL of one RSS search.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnstableApi`] if the path cannot be joined onto the root.
    pub fn search_url(&self, query: &CatalogQuery) -> Result<Url, CatalogError> {
        let mut url = self.join(SEARCH_PATH)?;
        url.query_pairs_mut().append_pair(QUERY_PARAM, query.as_str());
        Ok(url)
    }

    /// URL of one item's full record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnstableApi`] if the path cannot be joined onto the root.
    pub fn full_record_url(&self, item_id: u64) -> Result<Url, CatalogError> {
        self.join(&format!("{FULL_RECORD_PATH}/{item_id}"))
    }

    fn join(&self, path: &str) -> Result<Url, CatalogError> {
        self.root
            .join(path)
            .map_err(|e| CatalogError::unstable_api(path, &format!("cannot build endpoint URL: {e}")))
    }

    async fn fetch_text(&self, url: Url) -> Result<String, CatalogError> {
        debug!(url = %url, "Requesting catalog endpoint");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CatalogError::network(url.as_str(), &e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), url = %url, "Catalog returned error status");
            return Err(CatalogError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| CatalogError::network(url.as_str(), &format!("failed to read body: {e}")))
    }
}

impl std::fmt::Debug for BiblioCommonsApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiblioCommonsApi")
            .field("root", &self.root.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CatalogApi for BiblioCommonsApi {
    #[tracing::instrument(skip(self, query), fields(books = query.book_count()))]
    async fn search(&self, query: &CatalogQuery) -> Result<String, CatalogError> {
        let url = self.search_url(query)?;
        self.fetch_text(url).await
    }

    #[tracing::instrument(skip(self))]
    async fn full_record(&self, item_id: u64) -> Result<String, CatalogError> {
        let url = self.full_record_url(item_id)?;
        self.fetch_text(url).await
    }
}
