//! Ingestion facade: `fetch_books` and `search_books` over both sources.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::book::Book;
use crate::config::AppConfig;
use crate::error::AcquisitionResult;
use crate::fetch::{PayloadFetcher, ResilientFetcher};
use crate::sources::{CatalogAdapter, FetchSource, ListKind, RecommendationAdapter, SearchTarget};

/// Outcome of probing both credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStatus {
    pub catalog: bool,
    pub recommendation: bool,
}

/// Entry point for discovery fetches and searches.
#[derive(Clone)]
pub struct AcquisitionService {
    catalog: CatalogAdapter,
    recommendation: RecommendationAdapter,
    catalog_key: Option<String>,
    recommendation_key: Option<String>,
}

impl AcquisitionService {
    /// Create a service with no credentials over the given fetcher.
    pub fn new(fetcher: Arc<dyn PayloadFetcher>) -> Self {
        Self {
            catalog: CatalogAdapter::new(Arc::clone(&fetcher)),
            recommendation: RecommendationAdapter::new(fetcher),
            catalog_key: None,
            recommendation_key: None,
        }
    }

    /// Build the production service: resilient fetcher, keys, endpoint overrides.
    pub fn from_config(config: &AppConfig) -> Self {
        let fetcher: Arc<dyn PayloadFetcher> = Arc::new(ResilientFetcher::new(config.fetch.clone()));
        let mut service = Self::new(fetcher)
            .with_catalog_key(config.catalog_key())
            .with_recommendation_key(config.recommendation_key());
        if let Some(base_url) = &config.catalog.base_url {
            service.catalog = service.catalog.with_base_url(base_url.as_str());
        }
        if let Some(base_url) = &config.recommendation.base_url {
            service.recommendation = service.recommendation.with_base_url(base_url.as_str());
        }
        service
    }

    /// Set the catalog key; blank values count as missing.
    pub fn with_catalog_key(mut self, key: Option<&str>) -> Self {
        self.catalog_key = normalize_key(key);
        self
    }

    /// Set the recommendation key; blank values count as missing.
    pub fn with_recommendation_key(mut self, key: Option<&str>) -> Self {
        self.recommendation_key = normalize_key(key);
        self
    }

    /// Fetch one page of discovery candidates from `source`.
    ///
    /// Catalog sources without a catalog key yield an empty list without
    /// any request. The recommendation source without its key is a
    /// configuration error.
    pub async fn fetch_books(&self, source: FetchSource, page: u32) -> AcquisitionResult<Vec<Book>> {
        if source.uses_catalog() {
            let Some(key) = self.catalog_key.as_deref() else {
                info!(source = source.as_label(), "no catalog key configured; nothing to fetch");
                return Ok(Vec::new());
            };
            let books = match source {
                FetchSource::Bestseller => {
                    self.catalog.fetch_list(key, ListKind::Bestseller, page).await?
                }
                FetchSource::NewArrivals => {
                    self.catalog.fetch_list(key, ListKind::NewArrivals, page).await?
                }
                _ => self.catalog.fetch_combined(key, page).await?,
            };
            info!(source = source.as_label(), page, count = books.len(), "fetched candidates");
            return Ok(books);
        }

        let books = self
            .recommendation
            .fetch_page(self.recommendation_key.as_deref(), page)
            .await?;
        info!(source = source.as_label(), page, count = books.len(), "fetched candidates");
        Ok(books)
    }

    /// Search the catalog. An empty query or missing key returns nothing.
    pub async fn search_books(
        &self,
        query: &str,
        target: SearchTarget,
        page: u32,
    ) -> AcquisitionResult<Vec<Book>> {
        let query = query.trim();
        let Some(key) = self.catalog_key.as_deref() else {
            info!("no catalog key configured; skipping search");
            return Ok(Vec::new());
        };
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let books = self.catalog.search(key, query, target, page).await?;
        info!(?target, page, count = books.len(), "search finished");
        Ok(books)
    }

    /// Check both configured keys. Missing keys report `false`.
    pub async fn check_keys(&self) -> KeyStatus {
        let catalog = async {
            match self.catalog_key.as_deref() {
                Some(key) => self.catalog.check_key(key).await,
                None => false,
            }
        };
        let recommendation = async {
            match self.recommendation_key.as_deref() {
                Some(key) => self.recommendation.check_key(key).await,
                None => false,
            }
        };
        let (catalog, recommendation) = futures::future::join(catalog, recommendation).await;
        KeyStatus {
            catalog,
            recommendation,
        }
    }
}

fn normalize_key(key: Option<&str>) -> Option<String> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}
