//! Recommendation adapter for the librarian-recommendation XML feed.
//!
//! The feed needs its own credential and is paginated by 1-based row
//! bounds. It carries no prices and no detail link. A body that fails to
//! parse, or that embeds an error marker, degrades to an empty page rather
//! than failing the retrieval.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use anyhow::{anyhow, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::{debug, warn};

use super::PAGE_SIZE;
use crate::book::{Book, WorkflowStage};
use crate::error::{AcquisitionError, AcquisitionResult};
use crate::fetch::PayloadFetcher;
use crate::pipeline::merge_last_seen;

/// Default recommendation feed endpoint.
pub const RECOMMENDATION_BASE_URL: &str = "https://nl.go.kr/NL/search/openApi/saseoApi.do";

/// Prefix on synthesized ids; keeps them clear of numeric catalog ids.
pub const ID_PREFIX: &str = "nlk";

/// Substrings that mark an error document.
const ERROR_MARKERS: &[&str] = &["<error_code>", "<message>"];

const FIELDS: &[&str] = &[
    "recomtitle",
    "recomauthor",
    "recompublisher",
    "publishYear",
    "recomfilepath",
    "recomcontents",
    "recomisbn",
    "drCodeName",
    "recomNo",
];

/// 1-based inclusive row bounds for a page.
///
/// Computed in `u64` so every `u32` page number has exact bounds.
pub fn row_bounds(page: u32) -> (u64, u64) {
    let page = u64::from(page.max(1));
    let size = u64::from(PAGE_SIZE);
    ((page - 1) * size + 1, page * size)
}

/// Adapter for the recommendation feed.
#[derive(Clone)]
pub struct RecommendationAdapter {
    fetcher: Arc<dyn PayloadFetcher>,
    base_url: String,
}

impl RecommendationAdapter {
    /// Create an adapter against the public feed endpoint.
    pub fn new(fetcher: Arc<dyn PayloadFetcher>) -> Self {
        Self {
            fetcher,
            base_url: RECOMMENDATION_BASE_URL.to_string(),
        }
    }

    /// Point the adapter at a different endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn rows_url(&self, key: &str, start: u64, end: u64) -> String {
        format!(
            "{}?key={}&startRowNumApi={}&endRowNumApi={}",
            self.base_url,
            urlencoding::encode(key),
            start,
            end
        )
    }

    /// Build the URL for one page.
    pub fn page_url(&self, key: &str, page: u32) -> String {
        let (start, end) = row_bounds(page);
        self.rows_url(key, start, end)
    }

    /// Fetch one page of recommendations.
    ///
    /// Fails with a configuration error before any request when `key` is
    /// missing or blank. Fetch failures propagate; parse problems do not.
    pub async fn fetch_page(&self, key: Option<&str>, page: u32) -> AcquisitionResult<Vec<Book>> {
        let key = key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AcquisitionError::Configuration(
                    "a recommendation API key is required for this source".to_string(),
                )
            })?;

        let xml = self.fetcher.fetch_text(&self.page_url(key, page)).await?;
        let books = parse_recommendations(&xml);
        debug!(page, count = books.len(), "recommendation page fetched");
        Ok(books)
    }

    /// Check a recommendation key with a single-row request.
    ///
    /// Valid when the body has no error marker, parses, and contains a
    /// `totalCount` or `list` element.
    pub async fn check_key(&self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() {
            return false;
        }
        let xml = match self.fetcher.fetch_text(&self.rows_url(key, 1, 1)).await {
            Ok(xml) => xml,
            Err(err) => {
                warn!(error = %err, "recommendation key check failed");
                return false;
            }
        };
        if has_error_marker(&xml) {
            warn!("recommendation feed returned an error document");
            return false;
        }
        match has_any_element(&xml, &["totalCount", "list"]) {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, "recommendation key check could not parse response");
                false
            }
        }
    }
}

fn has_error_marker(xml: &str) -> bool {
    ERROR_MARKERS.iter().any(|m| xml.contains(m))
}

/// Decode a feed document into books, or nothing if it is unusable.
///
/// Ids are unique in the result. A repeated id keeps its first position and
/// the contents of its last occurrence.
pub fn parse_recommendations(xml: &str) -> Vec<Book> {
    if has_error_marker(xml) {
        warn!("recommendation feed returned an error document");
        return Vec::new();
    }

    match read_items(xml) {
        Ok(items) => {
            let books = items
                .iter()
                .enumerate()
                .map(|(index, item)| map_recommendation(item, index))
                .collect();
            merge_last_seen(vec![books])
        }
        Err(err) => {
            warn!(error = %err, "recommendation feed is not valid XML");
            Vec::new()
        }
    }
}

/// Text of the first occurrence of each known field inside one `item`.
#[derive(Debug, Default)]
struct RawItem {
    fields: HashMap<String, String>,
}

impl RawItem {
    fn get(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// A field being captured: name, nesting depth below it, and text so far.
struct OpenField {
    name: String,
    depth: usize,
    text: String,
}

fn read_items(xml: &str) -> Result<Vec<RawItem>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut items = Vec::new();
    let mut current: Option<RawItem> = None;
    let mut field: Option<OpenField> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if let Some(open) = field.as_mut() {
                    open.depth += 1;
                } else if name == "item" {
                    current = Some(RawItem::default());
                } else if current.is_some() && FIELDS.contains(&name.as_str()) {
                    field = Some(OpenField {
                        name,
                        depth: 0,
                        text: String::new(),
                    });
                }
            }
            Ok(Event::End(e)) => {
                if let Some(mut open) = field.take() {
                    if open.depth > 0 {
                        open.depth -= 1;
                        field = Some(open);
                    } else if let Some(item) = current.as_mut() {
                        item.fields
                            .entry(open.name)
                            .or_insert_with(|| open.text.trim().to_string());
                    }
                } else if e.local_name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                // `<item/>` still occupies a position in the feed.
                if field.is_none() && current.is_none() && e.local_name().as_ref() == b"item" {
                    items.push(RawItem::default());
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(open) = field.as_mut() {
                    let text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                    open.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(open) = field.as_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("XML parse error: {e}")),
            _ => {}
        }
        buf.clear();
    }

    if current.is_some() {
        return Err(anyhow!("XML parse error: unterminated <item>"));
    }

    Ok(items)
}

fn has_any_element(xml: &str, names: &[&str]) -> Result<bool> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut found = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                found |= names.contains(&name.as_str());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("XML parse error: {e}")),
            _ => {}
        }
        buf.clear();
    }

    Ok(found)
}

fn tag_pattern() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>?").expect("tag pattern is valid"))
}

/// Remove markup tags, leaving the text between them.
pub fn strip_tags(text: &str) -> String {
    tag_pattern().replace_all(text, "").into_owned()
}

fn map_recommendation(item: &RawItem, index: usize) -> Book {
    let recom_no = item.get("recomNo").trim();
    let id = if recom_no.is_empty() {
        format!("{}-{}", ID_PREFIX, index)
    } else {
        format!("{}-{}", ID_PREFIX, recom_no)
    };
    let category = item.get("drCodeName").to_string();

    Book {
        id,
        title: item.get("recomtitle").to_string(),
        author: item.get("recomauthor").to_string(),
        publisher: item.get("recompublisher").to_string(),
        pub_date: item.get("publishYear").to_string(),
        cover: item.get("recomfilepath").to_string(),
        description: strip_tags(item.get("recomcontents")),
        isbn13: item
            .get("recomisbn")
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
        price_standard: 0,
        price_sales: 0,
        link: String::new(),
        category_name: (!category.is_empty()).then_some(category),
        workflow_stage: WorkflowStage::Discovery,
    }
}
