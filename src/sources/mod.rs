//! Source adapters: two external catalogs normalized into [`Book`](crate::book::Book).
//!
//! - **CatalogAdapter**: JSON bookstore API (bestseller, new arrivals, search)
//! - **RecommendationAdapter**: XML librarian-recommendation feed
//!
//! The two have deliberately different failure policies: a catalog API
//! error is raised, while an unusable recommendation document yields an
//! empty page.

mod catalog;
mod recommendation;

use serde::{Deserialize, Serialize};

pub use catalog::{
    map_catalog_item, parse_catalog_response, CatalogAdapter, ListKind, SearchTarget,
    CATALOG_BASE_URL,
};
pub use recommendation::{
    parse_recommendations, row_bounds, strip_tags, RecommendationAdapter, ID_PREFIX,
    RECOMMENDATION_BASE_URL,
};

/// Items requested per page from either source.
pub const PAGE_SIZE: u32 = 50;

/// Where a discovery fetch pulls candidates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchSource {
    /// Bestseller and new-arrival lists fetched together and merged.
    #[default]
    Combined,
    Bestseller,
    NewArrivals,
    /// Librarian recommendations (XML feed).
    Recommended,
}

impl FetchSource {
    /// Whether this source is served by the catalog API.
    pub fn uses_catalog(&self) -> bool {
        !matches!(self, FetchSource::Recommended)
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            FetchSource::Combined => "combined",
            FetchSource::Bestseller => "bestseller",
            FetchSource::NewArrivals => "new-arrivals",
            FetchSource::Recommended => "recommended",
        }
    }
}
