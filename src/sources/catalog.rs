//! Catalog adapter for the JSON bookstore API.
//!
//! Supports three list modes (bestseller, new arrivals, both combined) and
//! keyword/title/author/publisher search. An upstream `errorCode` is a hard
//! failure; an empty or missing item list is an empty result.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::PAGE_SIZE;
use crate::book::{Book, WorkflowStage};
use crate::error::{AcquisitionError, AcquisitionResult};
use crate::fetch::PayloadFetcher;
use crate::pipeline::{exclude_genre, filter_recent, merge_last_seen, COMIC_MARKER};

/// Default catalog API root.
pub const CATALOG_BASE_URL: &str = "https://www.aladin.co.kr/ttb/api";

const API_VERSION: &str = "20131101";

/// Which curated list to pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Bestseller,
    NewArrivals,
}

impl ListKind {
    fn query_type(&self) -> &'static str {
        match self {
            ListKind::Bestseller => "Bestseller",
            ListKind::NewArrivals => "ItemNewSpecial",
        }
    }
}

/// Field a search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTarget {
    #[default]
    Keyword,
    Title,
    Author,
    Publisher,
}

impl SearchTarget {
    fn query_type(&self) -> &'static str {
        match self {
            SearchTarget::Keyword => "Keyword",
            SearchTarget::Title => "Title",
            SearchTarget::Author => "Author",
            SearchTarget::Publisher => "Publisher",
        }
    }
}

/// Adapter for the catalog API.
#[derive(Clone)]
pub struct CatalogAdapter {
    fetcher: Arc<dyn PayloadFetcher>,
    base_url: String,
}

impl CatalogAdapter {
    /// Create an adapter against the public catalog endpoint.
    pub fn new(fetcher: Arc<dyn PayloadFetcher>) -> Self {
        Self {
            fetcher,
            base_url: CATALOG_BASE_URL.to_string(),
        }
    }

    /// Point the adapter at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the list URL for one page.
    pub fn list_url(&self, key: &str, kind: ListKind, page: u32, max_results: u32) -> String {
        format!(
            "{}/ItemList.aspx?{}&QueryType={}",
            self.base_url,
            common_params(key, page, max_results),
            kind.query_type()
        )
    }

    /// Build the search URL for one page.
    pub fn search_url(&self, key: &str, query: &str, target: SearchTarget, page: u32) -> String {
        format!(
            "{}/ItemSearch.aspx?{}&Query={}&QueryType={}",
            self.base_url,
            common_params(key, page, PAGE_SIZE),
            urlencoding::encode(query),
            target.query_type()
        )
    }

    /// Fetch one curated list, comics excluded.
    pub async fn fetch_list(&self, key: &str, kind: ListKind, page: u32) -> AcquisitionResult<Vec<Book>> {
        let url = self.list_url(key.trim(), kind, page, PAGE_SIZE);
        let payload = self.fetcher.fetch_json(&url).await?;
        let books = parse_catalog_response(&payload)?;
        debug!(kind = ?kind, page, count = books.len(), "catalog list fetched");
        Ok(exclude_genre(books, COMIC_MARKER))
    }

    /// Fetch bestseller and new-arrival lists concurrently and merge them.
    ///
    /// Both requests are awaited before either result is inspected; if one
    /// of them failed the whole call fails.
    pub async fn fetch_combined(&self, key: &str, page: u32) -> AcquisitionResult<Vec<Book>> {
        let (bestsellers, new_arrivals) = futures::future::join(
            self.fetch_list(key, ListKind::Bestseller, page),
            self.fetch_list(key, ListKind::NewArrivals, page),
        )
        .await;

        Ok(merge_last_seen(vec![bestsellers?, new_arrivals?]))
    }

    /// Search the catalog, keeping recent, non-comic titles.
    pub async fn search(
        &self,
        key: &str,
        query: &str,
        target: SearchTarget,
        page: u32,
    ) -> AcquisitionResult<Vec<Book>> {
        self.search_as_of(key, query, target, page, Utc::now().date_naive())
            .await
    }

    /// [`search`](Self::search) with an explicit "today" for the recency window.
    pub async fn search_as_of(
        &self,
        key: &str,
        query: &str,
        target: SearchTarget,
        page: u32,
        today: NaiveDate,
    ) -> AcquisitionResult<Vec<Book>> {
        let url = self.search_url(key.trim(), query, target, page);
        let payload = self.fetcher.fetch_json(&url).await?;
        let books = parse_catalog_response(&payload)?;
        let total = books.len();
        let books = exclude_genre(filter_recent(books, today), COMIC_MARKER);
        debug!(total, kept = books.len(), "catalog search filtered");
        Ok(books)
    }

    /// Check a catalog key with a one-item list request.
    ///
    /// Returns `false` for an empty key, any failure, or an API error.
    pub async fn check_key(&self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() {
            return false;
        }
        let url = self.list_url(key, ListKind::Bestseller, 1, 1);
        match self.fetcher.fetch_json(&url).await {
            Ok(payload) => {
                error_code(&payload).is_none()
                    && payload.get("item").map(Value::is_array).unwrap_or(false)
            }
            Err(err) => {
                warn!(error = %err, "catalog key check failed");
                false
            }
        }
    }
}

fn common_params(key: &str, page: u32, max_results: u32) -> String {
    format!(
        "ttbkey={}&MaxResults={}&start={}&SearchTarget=Book&output=js&Version={}&Cover=Big&_t={}",
        urlencoding::encode(key),
        max_results,
        page.max(1),
        API_VERSION,
        Utc::now().timestamp_millis()
    )
}

/// The upstream error code, if the payload carries a non-empty one.
fn error_code(payload: &Value) -> Option<String> {
    match payload.get("errorCode")? {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Decode a catalog response body into books.
///
/// Ids are unique in the result. A repeated id keeps its first position and
/// the contents of its last occurrence.
pub fn parse_catalog_response(payload: &Value) -> AcquisitionResult<Vec<Book>> {
    if let Some(code) = error_code(payload) {
        let message = payload
            .get("errorMessage")
            .and_then(Value::as_str)
            .unwrap_or(code.as_str())
            .to_string();
        warn!(code = %code, message = %message, "catalog API reported an error");
        return Err(AcquisitionError::Source {
            source_name: "catalog".to_string(),
            code,
            message,
        });
    }

    let books = payload
        .get("item")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(map_catalog_item).collect())
        .unwrap_or_default();
    Ok(merge_last_seen(vec![books]))
}

/// Map one raw catalog item. Missing fields become empty strings or zero.
pub fn map_catalog_item(item: &Value) -> Book {
    let text = |name: &str| match item.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    let price = |name: &str| match item.get(name) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };

    let category = text("categoryName");

    Book {
        id: text("itemId"),
        title: text("title"),
        author: text("author"),
        publisher: text("publisher"),
        pub_date: text("pubDate"),
        cover: text("cover"),
        description: text("description"),
        isbn13: text("isbn13"),
        price_standard: price("priceStandard"),
        price_sales: price("priceSales"),
        link: text("link"),
        category_name: (!category.is_empty()).then_some(category),
        workflow_stage: WorkflowStage::Discovery,
    }
}
