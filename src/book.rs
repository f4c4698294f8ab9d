//! Canonical acquisition candidate shared by every source adapter.

use serde::{Deserialize, Serialize};

/// Delimiter between segments of a hierarchical category name.
pub const CATEGORY_DELIMITER: char = '>';

/// Triage stage of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// Candidate surfaced by a fetch or search.
    #[default]
    Discovery,
    /// Shortlisted for review.
    Review,
    /// Confirmed for the order; counts against the budget.
    Confirmed,
}

impl WorkflowStage {
    /// Stable label used in logs and CLI output.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkflowStage::Discovery => "discovery",
            WorkflowStage::Review => "review",
            WorkflowStage::Confirmed => "confirmed",
        }
    }
}

/// A book record normalized from one of the external sources.
///
/// Prices are plain integers in the catalog's currency unit. Sources that
/// publish no price (the recommendation feed) use `0`, which is a valid
/// value here and not a marker for missing data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique id; recommendation-feed ids carry a source prefix.
    pub id: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    /// Free-form publication date (may be year-only or unparsable).
    pub pub_date: String,
    /// Cover image URL, empty when unknown.
    pub cover: String,
    /// Plain-text description with markup stripped.
    pub description: String,
    pub isbn13: String,
    /// List price.
    pub price_standard: i64,
    /// Actual sale price; this is what the budget counts.
    pub price_sales: i64,
    /// External detail page, empty when the source has none.
    pub link: String,
    /// Hierarchical category, e.g. `Domestic>Fiction>Korean Fiction`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default)]
    pub workflow_stage: WorkflowStage,
}

impl Book {
    /// Create a discovery-stage book with empty metadata.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: String::new(),
            publisher: String::new(),
            pub_date: String::new(),
            cover: String::new(),
            description: String::new(),
            isbn13: String::new(),
            price_standard: 0,
            price_sales: 0,
            link: String::new(),
            category_name: None,
            workflow_stage: WorkflowStage::Discovery,
        }
    }

    /// Set the sale price.
    pub fn with_price_sales(mut self, price: i64) -> Self {
        self.price_sales = price;
        self
    }

    /// Set the category name.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_name = Some(category.into());
        self
    }

    /// Set the publication date.
    pub fn with_pub_date(mut self, pub_date: impl Into<String>) -> Self {
        self.pub_date = pub_date.into();
        self
    }

    /// Segments of the category name, outermost first.
    pub fn category_segments(&self) -> Vec<&str> {
        self.category_name
            .as_deref()
            .map(|c| c.split(CATEGORY_DELIMITER).map(str::trim).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book_starts_in_discovery() {
        let book = Book::new("1", "Title");
        assert_eq!(book.workflow_stage, WorkflowStage::Discovery);
        assert_eq!(book.price_sales, 0);
        assert!(book.category_name.is_none());
    }

    #[test]
    fn test_category_segments() {
        let book = Book::new("1", "T").with_category("국내도서>소설/시/희곡>한국소설");
        assert_eq!(
            book.category_segments(),
            vec!["국내도서", "소설/시/희곡", "한국소설"]
        );
        assert!(Book::new("2", "T").category_segments().is_empty());
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&WorkflowStage::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
    }
}
